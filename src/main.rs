#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use image::DynamicImage;
use image_cropper::geometry::DeviceRect;
use image_cropper::{
    Cropper, CropperError, CropperOptions, CursorStyle, DevicePixelRatio, DevicePoint, Frame,
    ImageSource, logical,
};
use serde_json::Value;
use tokio::sync::oneshot;

const CANVAS_MOUNT: &str = "#cropper";
const SIDE_PANEL_WIDTH: f32 = 260.0;

#[derive(Parser, Debug)]
#[command(version, about = "Fixed-ratio image cropper with multi-size export")]
struct Args {
    /// JSON file with cropper options (camelCase keys)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Image path or http(s) URL, overrides `url` from the options
    #[arg(long)]
    image: Option<String>,

    /// Canvas width in logical pixels
    #[arg(long)]
    width: Option<f32>,

    /// Canvas height in logical pixels
    #[arg(long)]
    height: Option<f32>,
}

type UploadResult = Result<Value, CropperError>;

struct CropperApp {
    cropper: Cropper,
    runtime: tokio::runtime::Runtime,
    texture: Option<egui::TextureHandle>,
    previews: Vec<egui::TextureHandle>,
    previews_generation: u64,
    pending_upload: Option<oneshot::Receiver<UploadResult>>,
    status: Option<String>,
}

impl CropperApp {
    fn new(args: Args) -> Result<Self, CropperError> {
        let mut options = match &args.options {
            Some(path) => CropperOptions::from_path(path)?,
            None => CropperOptions::default(),
        };
        if args.image.is_some() {
            options.url = args.image;
        }
        if let Some(width) = args.width {
            options.canvas_width = width;
        }
        if let Some(height) = args.height {
            options.canvas_height = height;
        }
        let container = options
            .container
            .get_or_insert_with(|| CANVAS_MOUNT.to_owned())
            .clone();

        let mounts = [container, options.image_wrapper().to_owned()];
        let mut cropper = Cropper::new(options, &mounts)?;
        let runtime = tokio::runtime::Runtime::new()?;

        let mut status = None;
        if cropper.options().url.is_some() {
            if let Err(e) = runtime.block_on(cropper.load()) {
                log::error!("initial load failed: {e}");
                status = Some(e.to_string());
            }
        }

        Ok(Self {
            cropper,
            runtime,
            texture: None,
            previews: Vec::new(),
            previews_generation: 0,
            pending_upload: None,
            status,
        })
    }

    fn open(&mut self, source: ImageSource) {
        let result = self
            .runtime
            .block_on(self.cropper.load_from(source));
        self.texture = None;
        self.previews_generation = 0;
        self.status = result.err().map(|e| {
            log::error!("failed to open image: {e}");
            e.to_string()
        });
    }

    fn sync_textures(&mut self, ctx: &egui::Context) {
        if self.texture.is_none() {
            if let Some(image) = self.cropper.image() {
                self.texture = Some(ctx.load_texture(
                    "source",
                    color_image(image),
                    egui::TextureOptions::LINEAR,
                ));
            }
        }

        if self.previews_generation != self.cropper.export_generation() {
            self.previews = self
                .cropper
                .exports()
                .iter()
                .enumerate()
                .map(|(i, export)| {
                    ctx.load_texture(
                        format!("preview-{i}"),
                        color_image(&export.image),
                        egui::TextureOptions::LINEAR,
                    )
                })
                .collect();
            self.previews_generation = self.cropper.export_generation();
        }
    }

    fn save_exports(&mut self) {
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        let extension = self.cropper.options().export_format.extension();
        for export in self.cropper.exports() {
            let path = dir.join(format!(
                "crop-{}x{}.{extension}",
                export.spec.width, export.spec.height
            ));
            if let Err(e) = std::fs::write(&path, &export.blob.bytes) {
                log::error!("failed to save {}: {e}", path.display());
                self.status = Some(format!("Failed to save image: {e}"));
                return;
            }
            log::info!("saved {}", path.display());
        }
        self.status = Some(format!("Saved {} image(s)", self.cropper.exports().len()));
    }

    fn start_upload(&mut self) {
        let request = match self.cropper.upload_request() {
            Ok(request) => request,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };

        let (tx, rx) = oneshot::channel();
        let client = self.cropper.client().clone();
        self.runtime.spawn(async move {
            let result = request.send(&client).await.map_err(CropperError::from);
            let _ = tx.send(result);
        });
        self.pending_upload = Some(rx);
        self.status = Some("Uploading...".into());
    }

    fn poll_upload(&mut self, ctx: &egui::Context) {
        let Some(rx) = self.pending_upload.as_mut() else {
            return;
        };

        match rx.try_recv() {
            Ok(result) => {
                self.status = Some(match result {
                    Ok(body) => format!("Uploaded: {body}"),
                    Err(e) => e.to_string(),
                });
                self.pending_upload = None;
            }
            Err(oneshot::error::TryRecvError::Empty) => ctx.request_repaint(),
            Err(oneshot::error::TryRecvError::Closed) => self.pending_upload = None,
        }
    }

    fn handle_pointer(&mut self, ctx: &egui::Context, response: &egui::Response, origin: egui::Pos2) {
        if let Err(e) = self.dispatch_pointer(ctx, response, origin) {
            log::error!("export failed: {e}");
            self.status = Some(e.to_string());
        }

        if response.hovered() || self.cropper.is_dragging() {
            ctx.set_cursor_icon(cursor_icon(self.cropper.cursor()));
        }
    }

    /// Forwards this frame's pointer input to the cropper in canvas-local
    /// logical coordinates.
    fn dispatch_pointer(
        &mut self,
        ctx: &egui::Context,
        response: &egui::Response,
        origin: egui::Pos2,
    ) -> Result<(), CropperError> {
        let (hover, pressed, released, escape) = ctx.input(|i| {
            (
                i.pointer.hover_pos(),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.key_pressed(egui::Key::Escape),
            )
        });

        if let Some(pos) = hover {
            let point = logical(pos.x - origin.x, pos.y - origin.y);
            self.cropper.pointer_moved(point)?;
            if pressed && response.hovered() {
                self.cropper.pointer_pressed(point);
            }
        }
        if released {
            self.cropper.pointer_released()?;
        }
        if escape {
            self.cropper.cancel_drag()?;
        }
        Ok(())
    }

    fn paint_canvas(&self, painter: &egui::Painter, origin: egui::Pos2, frame: &Frame) {
        let ratio = self.cropper.device_pixel_ratio();
        let to_screen = |point: DevicePoint| {
            let point = ratio.to_logical(point);
            origin + egui::vec2(point.x, point.y)
        };
        let rect = |rect: &DeviceRect| {
            egui::Rect::from_min_max(to_screen(rect.min()), to_screen(rect.max()))
        };

        let image_rect = rect(&frame.source);
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        // outer path is clockwise from top-left, inner counter-clockwise
        let outer = egui::Rect::from_min_max(
            to_screen(frame.shade.outer[0]),
            to_screen(frame.shade.outer[2]),
        );
        let inner = egui::Rect::from_min_max(
            to_screen(frame.shade.inner[0]),
            to_screen(frame.shade.inner[2]),
        );
        let shade = color(frame.shade.color);
        for band in [
            egui::Rect::from_min_max(outer.min, egui::pos2(outer.max.x, inner.min.y)),
            egui::Rect::from_min_max(egui::pos2(outer.min.x, inner.max.y), outer.max),
            egui::Rect::from_min_max(
                egui::pos2(outer.min.x, inner.min.y),
                egui::pos2(inner.min.x, inner.max.y),
            ),
            egui::Rect::from_min_max(
                egui::pos2(inner.max.x, inner.min.y),
                egui::pos2(outer.max.x, inner.max.y),
            ),
        ] {
            painter.rect_filled(band, 0.0, shade);
        }

        let border = egui::Stroke::new(1.0, color(frame.border_color));
        for segment in &frame.border {
            painter.line_segment([to_screen(segment.start), to_screen(segment.end)], border);
        }

        let grid = egui::Stroke::new(1.0, color(frame.grid_color));
        for dash in &frame.grid {
            painter.line_segment([to_screen(dash.start), to_screen(dash.end)], grid);
        }

        for handle in &frame.handles {
            painter.circle_filled(
                to_screen(handle.center),
                ratio.length_to_logical(handle.radius),
                color(frame.handle_color),
            );
        }
    }
}

impl eframe::App for CropperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let screen_ratio = DevicePixelRatio::new(ctx.pixels_per_point());
        if screen_ratio != self.cropper.device_pixel_ratio() {
            if let Err(e) = self.cropper.set_device_pixel_ratio(screen_ratio.get()) {
                log::error!("failed to apply pixel ratio: {e}");
                self.status = Some(e.to_string());
            }
        }

        // Handle dropped files
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.open(ImageSource::Location(path.to_string_lossy().into_owned()));
        }

        self.poll_upload(ctx);
        self.sync_textures(ctx);

        egui::SidePanel::right("previews")
            .exact_width(SIDE_PANEL_WIDTH)
            .show(ctx, |ui| {
                ui.heading("Previews");
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for (export, texture) in self.cropper.exports().iter().zip(&self.previews) {
                        let (width, height) = export.display_size();
                        ui.label(format!("{width} x {height}"));
                        ui.add(egui::Image::new((
                            texture.id(),
                            egui::vec2(width, height),
                        )));
                        ui.separator();
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Image", &["png", "jpg", "jpeg", "bmp"])
                        .pick_file()
                    {
                        match image::open(&path) {
                            Ok(image) => self.open(ImageSource::Decoded(image)),
                            Err(e) => self.status = Some(e.to_string()),
                        }
                    }
                }

                let loaded = self.cropper.is_loaded();
                if ui.add_enabled(loaded, egui::Button::new("Save Exports")).clicked() {
                    self.save_exports();
                }

                let can_upload =
                    loaded && self.cropper.options().action.is_some() && self.pending_upload.is_none();
                if ui.add_enabled(can_upload, egui::Button::new("Upload")).clicked() {
                    self.start_upload();
                }
            });

            if let Some(status) = &self.status {
                ui.label(status);
            }
            ui.separator();

            let options = self.cropper.options();
            let size = egui::vec2(options.canvas_width, options.canvas_height);
            let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
            let origin = response.rect.min;

            painter.rect_filled(response.rect, 0.0, egui::Color32::from_gray(32));
            self.handle_pointer(ctx, &response, origin);
            if let Some(frame) = self.cropper.frame() {
                self.paint_canvas(&painter, origin, &frame);
            }
        });
    }
}

impl Drop for CropperApp {
    fn drop(&mut self) {
        self.cropper.dispose();
    }
}

fn color_image(image: &DynamicImage) -> egui::ColorImage {
    let size = [image.width() as _, image.height() as _];
    let image_buffer = image.to_rgba8();
    let pixels = image_buffer.as_flat_samples();
    egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice())
}

fn color([r, g, b, a]: [u8; 4]) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

fn cursor_icon(cursor: CursorStyle) -> egui::CursorIcon {
    match cursor {
        CursorStyle::Default => egui::CursorIcon::Default,
        CursorStyle::Move => egui::CursorIcon::Move,
        CursorStyle::NwResize => egui::CursorIcon::ResizeNorthWest,
        CursorStyle::NeResize => egui::CursorIcon::ResizeNorthEast,
        CursorStyle::SwResize => egui::CursorIcon::ResizeSouthWest,
        CursorStyle::SeResize => egui::CursorIcon::ResizeSouthEast,
    }
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let app = match CropperApp::new(args) {
        Ok(app) => app,
        Err(e) => {
            log::error!("failed to start: {e}");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let options = app.cropper.options();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([
            options.canvas_width + SIDE_PANEL_WIDTH + 40.0,
            options.canvas_height + 100.0,
        ]),
        ..Default::default()
    };
    eframe::run_native(
        "Image Cropper",
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
}
