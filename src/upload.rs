//! Multipart upload of an exported image to the configured endpoint.

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};

use crate::error::CropperError;
use crate::export::Blob;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: StatusCode, body: Value },

    #[error("upload request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upload response is not JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub action: String,
    pub blob: Blob,
    pub data: Map<String, Value>,
}

impl UploadRequest {
    pub fn new(
        action: Option<&str>,
        blob: Blob,
        data: Map<String, Value>,
    ) -> Result<Self, CropperError> {
        let action = action
            .filter(|action| !action.is_empty())
            .ok_or(CropperError::MissingAction)?;

        Ok(Self {
            action: action.to_owned(),
            blob,
            data,
        })
    }

    /// `file` part named "blob", then one text field per data entry.
    pub fn form(&self) -> Result<Form, UploadError> {
        let file = Part::bytes(self.blob.bytes.clone())
            .file_name("blob")
            .mime_str(self.blob.mime)?;

        Ok(self
            .data
            .iter()
            .fold(Form::new().part("file", file), |form, (key, value)| {
                form.text(key.clone(), field_value(value))
            }))
    }

    /// Resolves with the JSON body on 200, rejects with it otherwise.
    pub async fn send(&self, client: &reqwest::Client) -> Result<Value, UploadError> {
        log::info!(
            "uploading {} bytes ({}) to {}",
            self.blob.bytes.len(),
            self.blob.mime,
            self.action
        );

        let response = client
            .post(&self.action)
            .multipart(self.form()?)
            .send()
            .await?;

        let status = response.status();
        let body: Value = serde_json::from_slice(&response.bytes().await?)?;

        if status == StatusCode::OK {
            Ok(body)
        } else {
            log::warn!("upload to {} returned {status}", self.action);
            Err(UploadError::Rejected { status, body })
        }
    }
}

fn field_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn blob() -> Blob {
        Blob {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            mime: "image/jpeg",
        }
    }

    /// Answers one request with `status` and `body`, returning the raw request.
    async fn respond_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/upload", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            while !request.ends_with(b"--\r\n") {
                let read = socket.read(&mut chunk).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    #[test]
    fn missing_action_is_rejected() {
        let result = UploadRequest::new(None, blob(), Map::new());
        assert!(matches!(result, Err(CropperError::MissingAction)));
        assert_eq!(
            CropperError::MissingAction.to_string(),
            "must have action"
        );

        let result = UploadRequest::new(Some(""), blob(), Map::new());
        assert!(matches!(result, Err(CropperError::MissingAction)));
    }

    #[test]
    fn non_string_fields_are_stringified() {
        assert_eq!(field_value(&json!("42")), "42");
        assert_eq!(field_value(&json!(7)), "7");
        assert_eq!(field_value(&json!(true)), "true");
    }

    #[tokio::test]
    async fn ok_response_resolves_with_body() {
        let (url, server) = respond_once("200 OK", r#"{"url":"/img/1.jpg"}"#).await;
        let data = json!({ "user": "42", "tag": 7 }).as_object().cloned().unwrap();
        let request = UploadRequest::new(Some(&url), blob(), data).unwrap();

        let body = request.send(&reqwest::Client::new()).await.unwrap();
        let raw = server.await.unwrap();

        assert_eq!(body, json!({ "url": "/img/1.jpg" }));
        assert!(raw.starts_with("POST /upload"));
        assert!(raw.contains(r#"name="file"; filename="blob""#));
        assert!(raw.contains("image/jpeg"));
        assert!(raw.contains(r#"name="user""#));
        assert!(raw.contains(r#"name="tag""#));
    }

    #[tokio::test]
    async fn other_statuses_reject_with_body() {
        let (url, server) = respond_once("201 Created", r#"{"queued":true}"#).await;
        let request = UploadRequest::new(Some(&url), blob(), Map::new()).unwrap();

        let result = request.send(&reqwest::Client::new()).await;
        server.await.unwrap();

        match result {
            Err(UploadError::Rejected { status, body }) => {
                assert_eq!(status, StatusCode::CREATED);
                assert_eq!(body, json!({ "queued": true }));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
