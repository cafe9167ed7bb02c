//! Fetches and decodes the source image off the UI thread.

use std::time::Duration;

use image::DynamicImage;

use crate::error::CropperError;

#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Filesystem path or http(s) URL.
    Location(String),
    /// Already decoded pixels, e.g. from a file dialog or drag-and-drop.
    Decoded(DynamicImage),
}

impl ImageSource {
    fn is_remote(location: &str) -> bool {
        location.starts_with("http://") || location.starts_with("https://")
    }
}

/// Resolves `source` to pixels, failing with `LoadTimeout` when it takes
/// longer than `timeout`.
pub async fn load(source: ImageSource, timeout: Duration) -> Result<DynamicImage, CropperError> {
    let location = match source {
        ImageSource::Decoded(image) => return Ok(image),
        ImageSource::Location(location) => location,
    };

    let start = std::time::Instant::now();
    let image = tokio::time::timeout(timeout, fetch_and_decode(&location))
        .await
        .map_err(|_| {
            log::warn!("image load timed out: {location}");
            CropperError::LoadTimeout(timeout)
        })??;

    log::info!(
        "loaded {location} ({}x{}) in {}ms",
        image.width(),
        image.height(),
        start.elapsed().as_millis()
    );
    Ok(image)
}

async fn fetch_and_decode(location: &str) -> Result<DynamicImage, CropperError> {
    let bytes = if ImageSource::is_remote(location) {
        let response = reqwest::get(location).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    } else {
        tokio::fs::read(location).await?
    };

    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| CropperError::LoadTask(e.to_string()))?
        .map_err(CropperError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{name}", std::process::id()));
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn decoded_source_passes_through() {
        let image = DynamicImage::new_rgb8(3, 2);

        let loaded = load(ImageSource::Decoded(image), Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!((loaded.width(), loaded.height()), (3, 2));
    }

    #[tokio::test]
    async fn reads_and_decodes_files() {
        let path = write_png("loader-read.png", 12, 8);

        let loaded = load(
            ImageSource::Location(path.to_string_lossy().into_owned()),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        assert_eq!((loaded.width(), loaded.height()), (12, 8));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let result = load(
            ImageSource::Location("/definitely/not/here.png".into()),
            Duration::from_secs(10),
        )
        .await;

        assert!(matches!(result, Err(CropperError::Io(_))));
    }

    #[tokio::test]
    async fn garbage_bytes_fail_to_decode() {
        let path = std::env::temp_dir().join(format!("{}-loader-garbage.png", std::process::id()));
        std::fs::write(&path, b"not an image").unwrap();

        let result = load(
            ImageSource::Location(path.to_string_lossy().into_owned()),
            Duration::from_secs(10),
        )
        .await;

        assert!(matches!(result, Err(CropperError::Image(_))));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // accept and never answer
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let result = load(
            ImageSource::Location(format!("http://{addr}/photo.png")),
            Duration::from_millis(200),
        )
        .await;

        assert!(matches!(result, Err(CropperError::LoadTimeout(_))));
        server.abort();
    }
}
