use egui_inpaint::SourceImage;
use futures::{FutureExt, future::BoxFuture};
use image::{Rgba, RgbaImage, imageops};
use log::info;

use super::{ClientError, GenerationClient, RenderRequest};

const OFFLINE_PROMPT: &str = "A bright scandinavian living room with a light oak floor, a low \
    slate-gray sofa, linen curtains and warm indirect evening light.";

/// Keyless stand-in for the remote backend: fabricates results locally so
/// the whole acquire-analyze-render-refine loop can be exercised without
/// credentials or a network. Renders are a deterministic warm restyle of the
/// input, honoring the in-painting mask the same way the real backend must.
#[derive(Default)]
pub struct OfflineClient;

fn warm(Rgba([r, g, b, a]): Rgba<u8>) -> Rgba<u8> {
    Rgba([
        (r / 4 * 3).saturating_add(64),
        (g / 4 * 3).saturating_add(32),
        (b / 2).saturating_add(16),
        a,
    ])
}

fn restyle(photo: &SourceImage, mask_png: Option<&[u8]>) -> Result<RgbaImage, ClientError> {
    let mut out = photo.image().clone();
    match mask_png {
        None => {
            for pixel in out.pixels_mut() {
                *pixel = warm(*pixel);
            }
        }
        Some(png) => {
            let mask = image::load_from_memory(png)?.to_luma8();
            if mask.dimensions() != out.dimensions() {
                return Err(ClientError::Payload(format!(
                    "mask is {:?}, photo is {:?}",
                    mask.dimensions(),
                    out.dimensions()
                )));
            }
            for (x, y, pixel) in out.enumerate_pixels_mut() {
                if mask.get_pixel(x, y).0[0] > 127 {
                    *pixel = warm(*pixel);
                }
            }
        }
    }
    Ok(out)
}

fn placeholder() -> RgbaImage {
    RgbaImage::from_fn(512, 384, |x, y| {
        if (x / 32 + y / 32) % 2 == 0 {
            Rgba([214, 202, 182, 255])
        } else {
            Rgba([96, 108, 122, 255])
        }
    })
}

fn encode(img: &RgbaImage) -> Result<Vec<u8>, ClientError> {
    let mut png = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}

fn spawn_encode(
    work: impl FnOnce() -> Result<RgbaImage, ClientError> + Send + 'static,
) -> BoxFuture<'static, Result<Vec<u8>, ClientError>> {
    let (tx, rx) = futures::channel::oneshot::channel();
    std::thread::spawn(move || {
        let _ = tx.send(work().and_then(|img| encode(&img)));
    });
    async move { rx.await.map_err(|_| ClientError::WorkerGone)? }.boxed()
}

impl GenerationClient for OfflineClient {
    fn analyze(&self, _photo: &SourceImage) -> BoxFuture<'static, Result<String, ClientError>> {
        info!("Offline analyze, returning canned prompt");
        std::future::ready(Ok(OFFLINE_PROMPT.to_string())).boxed()
    }

    fn render(&self, request: RenderRequest) -> BoxFuture<'static, Result<Vec<u8>, ClientError>> {
        spawn_encode(move || match &request.photo {
            Some(photo) => restyle(photo, request.mask_png.as_deref()),
            None => Ok(placeholder()),
        })
    }

    fn upscale(
        &self,
        photo: &SourceImage,
        factor: u8,
    ) -> BoxFuture<'static, Result<Vec<u8>, ClientError>> {
        let photo = photo.clone();
        spawn_encode(move || {
            let (w, h) = photo.image().dimensions();
            Ok(imageops::resize(
                photo.image(),
                w * factor.max(1) as u32,
                h * factor.max(1) as u32,
                imageops::FilterType::CatmullRom,
            ))
        })
    }

    fn label(&self) -> &'static str {
        "offline"
    }
}
