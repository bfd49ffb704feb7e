use egui_inpaint::SourceImage;
use futures::future::BoxFuture;

mod gemini;
mod offline;

pub use gemini::GeminiClient;
pub use offline::OfflineClient;

/// One generation request: the styling prompt, optionally conditioned on the
/// current photo, optionally restricted by an in-painting mask (PNG, white =
/// repaint, black = keep).
pub struct RenderRequest {
    pub prompt: String,
    pub photo: Option<SourceImage>,
    pub mask_png: Option<Vec<u8>>,
}

/// Multimodal backend the app talks to. One request per operation, no
/// retries; a failure surfaces as [`ClientError`] and the user decides
/// whether to try again.
///
/// All calls return immediately with a future the UI polls; the blocking
/// HTTP work happens on worker threads.
pub trait GenerationClient: Send + Sync {
    /// Describes the room on the photo as a re-usable styling prompt.
    fn analyze(&self, photo: &SourceImage) -> BoxFuture<'static, Result<String, ClientError>>;

    /// Produces a restyled render as PNG bytes.
    fn render(&self, request: RenderRequest) -> BoxFuture<'static, Result<Vec<u8>, ClientError>>;

    /// Returns an enlarged copy of `photo` as PNG bytes.
    fn upscale(
        &self,
        photo: &SourceImage,
        factor: u8,
    ) -> BoxFuture<'static, Result<Vec<u8>, ClientError>>;

    /// Short backend name for the status line.
    fn label(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Payload(String),
    #[error("response contained no image part")]
    MissingImage,
    #[error("response contained no text part")]
    MissingText,
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),
    #[error("worker thread vanished before sending a result")]
    WorkerGone,
}
