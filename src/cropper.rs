//! The widget instance: owns the loaded image, the fitted source rectangle,
//! the crop box, the pointer state and the latest exports.

use image::DynamicImage;
use serde_json::Value;

use crate::config::CropperOptions;
use crate::crop_box::CropBox;
use crate::error::CropperError;
use crate::export::{Blob, ExportPolicy, ExportedImage, export_all};
use crate::fit::{Viewport, fit_source};
use crate::geometry::DeviceRect;
use crate::interaction::{CursorStyle, Interaction};
use crate::loader::{self, ImageSource};
use crate::overlay::Frame;
use crate::units::{DevicePixelRatio, LogicalPoint};
use crate::upload::UploadRequest;

/// The set of mount points a host can attach the widget to.
pub trait MountPoints {
    fn has_mount(&self, selector: &str) -> bool;
}

impl<S: AsRef<str>> MountPoints for [S] {
    fn has_mount(&self, selector: &str) -> bool {
        self.iter().any(|mount| mount.as_ref() == selector)
    }
}

impl<S: AsRef<str>, const N: usize> MountPoints for [S; N] {
    fn has_mount(&self, selector: &str) -> bool {
        self.as_slice().has_mount(selector)
    }
}

impl<S: AsRef<str>> MountPoints for Vec<S> {
    fn has_mount(&self, selector: &str) -> bool {
        self.as_slice().has_mount(selector)
    }
}

struct Session {
    image: DynamicImage,
    source: DeviceRect,
    crop_box: CropBox,
}

pub struct Cropper {
    options: CropperOptions,
    ratio: DevicePixelRatio,
    session: Option<Session>,
    interaction: Interaction,
    exports: Vec<ExportedImage>,
    export_generation: u64,
    client: reqwest::Client,
    disposed: bool,
}

impl Cropper {
    /// Fails when the container or the image wrapper is not mounted.
    pub fn new<M>(options: CropperOptions, mounts: &M) -> Result<Self, CropperError>
    where
        M: MountPoints + ?Sized,
    {
        let container = options
            .container
            .as_deref()
            .ok_or_else(|| CropperError::MissingMount("container".into()))?;
        if !mounts.has_mount(container) {
            return Err(CropperError::MissingMount(container.into()));
        }
        if !mounts.has_mount(options.image_wrapper()) {
            return Err(CropperError::MissingMount(options.image_wrapper().into()));
        }

        let ratio = DevicePixelRatio::new(options.device_pixel_ratio);
        log::debug!("cropper mounted on {container}, ratio {}", ratio.get());

        Ok(Self {
            options,
            ratio,
            session: None,
            interaction: Interaction::default(),
            exports: Vec::new(),
            export_generation: 0,
            client: reqwest::Client::new(),
            disposed: false,
        })
    }

    /// Loads the configured `url`, then fits, draws and exports.
    pub async fn load(&mut self) -> Result<(), CropperError> {
        self.ensure_live()?;
        let url = self.options.url.clone().ok_or(CropperError::MissingSource)?;
        let image = loader::load(ImageSource::Location(url), self.options.load_timeout()).await?;
        self.attach_image(image)
    }

    pub async fn load_from(&mut self, source: ImageSource) -> Result<(), CropperError> {
        self.ensure_live()?;
        let image = loader::load(source, self.options.load_timeout()).await?;
        self.attach_image(image)
    }

    /// Replaces the source image and starts over with a fresh crop box.
    pub fn attach_image(&mut self, image: DynamicImage) -> Result<(), CropperError> {
        self.ensure_live()?;

        let source = fit_source((image.width(), image.height()), &self.viewport())?;
        let requested_width = self
            .options
            .initial_box_width()
            .unwrap_or_else(|| self.ratio.length_to_logical(source.width));
        let crop_box =
            CropBox::initialize(source, self.options.aspect_ratio(), requested_width, self.ratio);

        log::info!(
            "source {}x{} fitted to {:?}, crop box {:?}",
            image.width(),
            image.height(),
            source,
            crop_box.rect()
        );

        self.interaction = Interaction::default();
        self.session = Some(Session {
            image,
            source,
            crop_box,
        });
        self.export()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.options.canvas_width, self.options.canvas_height, self.ratio)
    }

    pub fn device_pixel_ratio(&self) -> DevicePixelRatio {
        self.ratio
    }

    pub fn options(&self) -> &CropperOptions {
        &self.options
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    pub fn source_rect(&self) -> Option<DeviceRect> {
        self.session.as_ref().map(|session| session.source)
    }

    pub fn crop_box(&self) -> Option<&CropBox> {
        self.session.as_ref().map(|session| &session.crop_box)
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.session.as_ref().map(|session| &session.image)
    }

    /// Hover classification, or a drag step while dragging. Returns true
    /// when the crop box changed.
    pub fn pointer_moved(&mut self, point: LogicalPoint) -> Result<bool, CropperError> {
        let Some(session) = self.session.as_mut().filter(|_| !self.disposed) else {
            return Ok(false);
        };

        if !self.interaction.is_dragging() {
            self.interaction.hover(point, &session.crop_box, self.ratio);
            return Ok(false);
        }

        let changed = self.interaction.drag(point, &mut session.crop_box, self.ratio);
        if changed && self.options.export_policy == ExportPolicy::EveryMove {
            self.export()?;
        }
        Ok(changed)
    }

    /// Returns true when a drag started.
    pub fn pointer_pressed(&mut self, point: LogicalPoint) -> bool {
        match self.session.as_ref().filter(|_| !self.disposed) {
            Some(session) => self.interaction.press(point, &session.crop_box, self.ratio),
            None => false,
        }
    }

    /// Commits the drag. Returns true when one was in progress.
    pub fn pointer_released(&mut self) -> Result<bool, CropperError> {
        let was_dragging = self.interaction.release();
        if was_dragging && self.options.export_policy == ExportPolicy::OnRelease {
            self.export()?;
        }
        Ok(was_dragging)
    }

    /// Aborts the drag and restores the box as it was at press time.
    pub fn cancel_drag(&mut self) -> Result<bool, CropperError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };

        let cancelled = self.interaction.cancel(&mut session.crop_box);
        if cancelled {
            log::debug!("drag cancelled, box restored to {:?}", session.crop_box.rect());
            self.export()?;
        }
        Ok(cancelled)
    }

    pub fn cursor(&self) -> CursorStyle {
        self.interaction.cursor()
    }

    pub fn is_dragging(&self) -> bool {
        self.interaction.is_dragging()
    }

    pub fn frame(&self) -> Option<Frame> {
        self.session
            .as_ref()
            .map(|session| Frame::build(session.source, &session.crop_box))
    }

    pub fn exports(&self) -> &[ExportedImage] {
        &self.exports
    }

    /// Bumped every time the exports are regenerated.
    pub fn export_generation(&self) -> u64 {
        self.export_generation
    }

    /// First export as an encoded blob.
    pub fn get_data(&self) -> Result<Blob, CropperError> {
        self.ensure_live()?;
        self.exports
            .first()
            .map(|export| export.blob.clone())
            .ok_or(CropperError::NotLoaded)
    }

    /// Packages the first export and the `data` fields for `action`.
    pub fn upload_request(&self) -> Result<UploadRequest, CropperError> {
        self.ensure_live()?;
        if self.options.action.as_deref().is_none_or(str::is_empty) {
            return Err(CropperError::MissingAction);
        }
        UploadRequest::new(
            self.options.action.as_deref(),
            self.get_data()?,
            self.options.data.clone(),
        )
    }

    pub async fn upload(&self) -> Result<Value, CropperError> {
        let request = self.upload_request()?;
        Ok(request.send(&self.client).await?)
    }

    /// Re-fits the current image into the viewport, carrying the crop box
    /// over proportionally, and re-exports.
    pub fn refresh(&mut self) -> Result<(), CropperError> {
        self.ensure_live()?;
        let source = self.fit_for(&self.viewport())?;
        self.apply_source(source)
    }

    /// Changes the logical viewport size and refreshes. On error the
    /// previous size and geometry are kept.
    pub fn set_viewport_size(&mut self, width: f32, height: f32) -> Result<(), CropperError> {
        self.ensure_live()?;
        let source = self.fit_for(&Viewport::new(width, height, self.ratio))?;

        self.options.canvas_width = width;
        self.options.canvas_height = height;
        self.apply_source(source)
    }

    /// On error the previous ratio and geometry are kept.
    pub fn set_device_pixel_ratio(&mut self, ratio: f32) -> Result<(), CropperError> {
        self.ensure_live()?;
        let ratio = DevicePixelRatio::new(ratio);
        if ratio == self.ratio {
            return Ok(());
        }
        let viewport = Viewport::new(self.options.canvas_width, self.options.canvas_height, ratio);
        let source = self.fit_for(&viewport)?;

        self.ratio = ratio;
        self.apply_source(source)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Drops the image, the exports and any pointer state. Safe to call
    /// more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.session = None;
        self.exports.clear();
        self.interaction = Interaction::default();
        log::debug!("cropper disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn ensure_live(&self) -> Result<(), CropperError> {
        if self.disposed {
            Err(CropperError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Fits the current image into `viewport` without touching any state.
    /// `None` when no image is loaded.
    fn fit_for(&self, viewport: &Viewport) -> Result<Option<DeviceRect>, CropperError> {
        viewport.checked_usable_size()?;
        self.session
            .as_ref()
            .map(|session| fit_source((session.image.width(), session.image.height()), viewport))
            .transpose()
    }

    fn apply_source(&mut self, source: Option<DeviceRect>) -> Result<(), CropperError> {
        let (Some(source), Some(session)) = (source, self.session.as_mut()) else {
            return Ok(());
        };

        session.source = source;
        session.crop_box.refit(source);
        self.interaction = Interaction::default();

        log::debug!("refreshed: source {:?}, box {:?}", source, session.crop_box.rect());
        self.export()
    }

    fn export(&mut self) -> Result<(), CropperError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };

        self.exports = export_all(
            &session.crop_box.rect(),
            &session.image,
            &session.source,
            &self.options.sizes,
            self.ratio,
            self.options.export_format,
        )?;
        self.export_generation += 1;

        log::trace!(
            "export #{} produced {} images",
            self.export_generation,
            self.exports.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::OutputSpec;
    use crate::units::logical;

    const MOUNTS: [&str; 2] = ["#cropper", ".view-images"];

    fn options() -> CropperOptions {
        CropperOptions {
            container: Some("#cropper".into()),
            sizes: vec![OutputSpec::new(200.0, 150.0), OutputSpec::new(40.0, 30.0)],
            ..CropperOptions::default()
        }
    }

    fn loaded(options: CropperOptions) -> Cropper {
        let mut cropper = Cropper::new(options, &MOUNTS).unwrap();
        cropper.attach_image(DynamicImage::new_rgb8(800, 600)).unwrap();
        cropper
    }

    #[test]
    fn construction_requires_mounts() {
        let missing_container = CropperOptions {
            container: None,
            ..options()
        };
        assert!(matches!(
            Cropper::new(missing_container, &MOUNTS),
            Err(CropperError::MissingMount(_))
        ));

        assert!(matches!(
            Cropper::new(options(), &["#cropper"]),
            Err(CropperError::MissingMount(selector)) if selector == ".view-images"
        ));

        let mounts = vec!["#cropper".to_string(), ".view-images".to_string()];
        assert!(Cropper::new(options(), &mounts).is_ok());
    }

    #[test]
    fn attach_exports_every_size() {
        let cropper = loaded(options());

        assert_eq!(cropper.exports().len(), 2);
        assert_eq!(cropper.export_generation(), 1);
        assert_eq!(cropper.get_data().unwrap().mime, "image/jpeg");
        assert!(cropper.frame().is_some());
    }

    #[test]
    fn every_move_policy_exports_during_drag() {
        let mut cropper = loaded(options());

        assert!(cropper.pointer_pressed(logical(200.0, 200.0)));
        assert!(cropper.pointer_moved(logical(190.0, 200.0)).unwrap());
        assert!(cropper.pointer_moved(logical(180.0, 200.0)).unwrap());
        assert_eq!(cropper.export_generation(), 3);

        assert!(cropper.pointer_released().unwrap());
        assert_eq!(cropper.export_generation(), 3);
    }

    #[test]
    fn on_release_policy_defers_export() {
        let mut cropper = loaded(CropperOptions {
            export_policy: ExportPolicy::OnRelease,
            ..options()
        });

        cropper.pointer_pressed(logical(200.0, 200.0));
        cropper.pointer_moved(logical(190.0, 200.0)).unwrap();
        cropper.pointer_moved(logical(180.0, 200.0)).unwrap();
        assert_eq!(cropper.export_generation(), 1);

        cropper.pointer_released().unwrap();
        assert_eq!(cropper.export_generation(), 2);
    }

    #[test]
    fn hover_updates_cursor() {
        let mut cropper = loaded(options());

        cropper.pointer_moved(logical(200.0, 200.0)).unwrap();
        assert_eq!(cropper.cursor(), CursorStyle::Move);

        cropper.pointer_moved(logical(299.0, 274.0)).unwrap();
        assert_eq!(cropper.cursor(), CursorStyle::SeResize);

        cropper.pointer_moved(logical(1.0, 1.0)).unwrap();
        assert_eq!(cropper.cursor(), CursorStyle::Default);
    }

    #[test]
    fn cancel_drag_restores_box() {
        let mut cropper = loaded(options());
        let before = cropper.crop_box().unwrap().rect();

        cropper.pointer_pressed(logical(200.0, 200.0));
        cropper.pointer_moved(logical(250.0, 240.0)).unwrap();
        assert!(cropper.cancel_drag().unwrap());

        assert_eq!(cropper.crop_box().unwrap().rect(), before);
        assert!(!cropper.is_dragging());
        assert!(!cropper.cancel_drag().unwrap());
    }

    #[test]
    fn device_ratio_change_rescales_box() {
        let mut cropper = loaded(options());
        let before = cropper.crop_box().unwrap().rect();

        cropper.set_device_pixel_ratio(2.0).unwrap();

        let source = cropper.source_rect().unwrap();
        let after = cropper.crop_box().unwrap().rect();
        assert!((source.width - 790.0).abs() < 1e-3);
        assert!((after.width / before.width - 790.0 / 390.0).abs() < 1e-3);
        assert_eq!(cropper.exports()[0].image.width(), 400);
    }

    #[test]
    fn viewport_resize_refits_source() {
        let mut cropper = loaded(options());

        cropper.set_viewport_size(600.0, 600.0).unwrap();

        let source = cropper.source_rect().unwrap();
        assert!((source.width - 590.0).abs() < 1e-3);
        assert!(source.encloses(&cropper.crop_box().unwrap().rect(), 1e-3));
    }

    #[test]
    fn failed_ratio_change_keeps_previous_geometry() {
        let mut cropper = loaded(options());
        let source = cropper.source_rect().unwrap();
        let rect = cropper.crop_box().unwrap().rect();

        assert!(matches!(
            cropper.set_device_pixel_ratio(3.0),
            Err(CropperError::ImageTooSmall { .. })
        ));

        assert_eq!(cropper.device_pixel_ratio(), DevicePixelRatio::default());
        assert_eq!(cropper.source_rect().unwrap(), source);
        assert_eq!(cropper.crop_box().unwrap().rect(), rect);
        cropper.pointer_moved(logical(200.0, 200.0)).unwrap();
        assert_eq!(cropper.cursor(), CursorStyle::Move);

        // a later ratio that fits is still applied
        cropper.set_device_pixel_ratio(1.5).unwrap();
        assert_eq!(cropper.device_pixel_ratio().get(), 1.5);
    }

    #[test]
    fn failed_viewport_resize_keeps_previous_size() {
        let mut cropper = loaded(options());
        let source = cropper.source_rect().unwrap();

        assert!(matches!(
            cropper.set_viewport_size(1000.0, 1000.0),
            Err(CropperError::ImageTooSmall { .. })
        ));
        assert_eq!(cropper.options().canvas_width, 400.0);
        assert_eq!(cropper.options().canvas_height, 400.0);
        assert_eq!(cropper.source_rect().unwrap(), source);

        assert!(matches!(
            cropper.set_viewport_size(5.0, 5.0),
            Err(CropperError::ViewportTooSmall { .. })
        ));
        assert_eq!(cropper.options().canvas_width, 400.0);
        assert_eq!(cropper.source_rect().unwrap(), source);
    }

    #[test]
    fn empty_viewport_is_rejected_before_loading() {
        let mut cropper = Cropper::new(options(), &MOUNTS).unwrap();

        assert!(matches!(
            cropper.set_viewport_size(0.0, 300.0),
            Err(CropperError::ViewportTooSmall { .. })
        ));
        assert_eq!(cropper.options().canvas_width, 400.0);
        cropper.set_viewport_size(500.0, 500.0).unwrap();
        assert_eq!(cropper.options().canvas_width, 500.0);
    }

    #[test]
    fn upload_without_action_fails_synchronously() {
        let cropper = loaded(options());

        assert!(matches!(
            cropper.upload_request(),
            Err(CropperError::MissingAction)
        ));
    }

    #[test]
    fn upload_request_carries_first_export_and_data() {
        let mut data = serde_json::Map::new();
        data.insert("user".into(), Value::from("42"));
        let cropper = loaded(CropperOptions {
            action: Some("http://localhost/upload".into()),
            data,
            ..options()
        });

        let request = cropper.upload_request().unwrap();

        assert_eq!(request.blob, cropper.get_data().unwrap());
        assert_eq!(request.data.len(), 1);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut cropper = loaded(options());

        cropper.dispose();
        cropper.dispose();

        assert!(cropper.is_disposed());
        assert!(cropper.frame().is_none());
        assert!(!cropper.pointer_pressed(logical(200.0, 200.0)));
        assert!(matches!(cropper.get_data(), Err(CropperError::Disposed)));
        assert!(matches!(
            cropper.attach_image(DynamicImage::new_rgb8(800, 600)),
            Err(CropperError::Disposed)
        ));
    }
}
