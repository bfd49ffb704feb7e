use std::{io, path::{Path, PathBuf}, sync::Arc};

use egui_inpaint::{AcquireError, SourceImage};
use futures::{FutureExt, future::BoxFuture};
use log::info;

/// Extensions accepted from drops and the open dialog.
const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff"];

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// A photo the user handed us, before decoding. Drops deliver either a path
/// (native) or raw bytes (some portals hand over content without one).
pub enum PhotoSource {
    Path(PathBuf),
    Bytes { name: String, bytes: Arc<[u8]> },
}

impl PhotoSource {
    pub fn name(&self) -> String {
        match self {
            PhotoSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            PhotoSource::Bytes { name, .. } => name.clone(),
        }
    }
}

/// First usable photo dropped onto the window this frame, if any.
pub fn dropped_photo(ctx: &egui::Context) -> Option<PhotoSource> {
    ctx.input(|i| {
        i.raw.dropped_files.iter().find_map(|file| {
            if let Some(path) = &file.path {
                is_supported(path).then(|| PhotoSource::Path(path.clone()))
            } else {
                file.bytes.clone().map(|bytes| PhotoSource::Bytes {
                    name: file.name.clone(),
                    bytes,
                })
            }
        })
    })
}

/// Modal file picker. `None` when the user cancels.
pub fn open_dialog() -> Option<PhotoSource> {
    rfd::FileDialog::new()
        .add_filter("room photos", EXTENSIONS)
        .pick_file()
        .map(PhotoSource::Path)
}

pub struct NamedPhoto {
    pub name: String,
    pub image: SourceImage,
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoLoadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Decode(#[from] AcquireError),
    #[error("decode worker vanished")]
    WorkerGone,
}

/// Reads and decodes on a worker thread; decoding multi-megapixel photos on
/// the UI thread would visibly stall the frame.
pub fn load_photo(source: PhotoSource) -> BoxFuture<'static, Result<NamedPhoto, PhotoLoadError>> {
    let name = source.name();
    let (tx, rx) = futures::channel::oneshot::channel();
    std::thread::spawn(move || {
        let result = decode_blocking(source);
        let _ = tx.send(result);
    });
    async move {
        let image = rx.await.map_err(|_| PhotoLoadError::WorkerGone)??;
        info!("Loaded photo {name} ({}x{})", image.width(), image.height());
        Ok(NamedPhoto { name, image })
    }
    .boxed()
}

fn decode_blocking(source: PhotoSource) -> Result<SourceImage, PhotoLoadError> {
    let bytes = match source {
        PhotoSource::Path(path) => std::fs::read(path)?.into(),
        PhotoSource::Bytes { bytes, .. } => bytes,
    };
    Ok(SourceImage::decode(&bytes)?)
}
