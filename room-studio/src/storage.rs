use std::{io, path::PathBuf};

use futures::{FutureExt, future::BoxFuture};
use itertools::Itertools;
use log::info;

/// Identifier of a persisted render: its path inside the session directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderId(String);

impl RenderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RenderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

pub struct StoredRender {
    pub id: RenderId,
    pub name: String,
}

/// PNG-per-render persistence under one session directory. All operations
/// run on worker threads and resolve futures the UI polls frame by frame.
pub struct SessionStore {
    base: PathBuf,
}

impl SessionStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Lists previously stored renders, oldest first (names embed a running
    /// number, so lexicographic order is creation order).
    pub fn list_renders(&self) -> BoxFuture<'static, io::Result<Vec<StoredRender>>> {
        let base = self.base.clone();
        let (tx, rx) = futures::channel::oneshot::channel();
        std::thread::spawn(move || {
            let _ = tx.send(list_blocking(base));
        });
        async move { rx.await.map_err(io::Error::other).and_then(|r| r) }.boxed()
    }

    pub fn load_render(&self, id: &RenderId) -> BoxFuture<'static, io::Result<Vec<u8>>> {
        let path = PathBuf::from(id.as_str());
        let (tx, rx) = futures::channel::oneshot::channel();
        std::thread::spawn(move || {
            let _ = tx.send(std::fs::read(path));
        });
        async move { rx.await.map_err(io::Error::other).and_then(|r| r) }.boxed()
    }

    /// Writes `<stem>.png`, creating the session directory on first use.
    pub fn save_render(
        &self,
        stem: &str,
        png: Vec<u8>,
    ) -> BoxFuture<'static, io::Result<RenderId>> {
        let base = self.base.clone();
        let path = base.join(format!("{stem}.png"));
        let (tx, rx) = futures::channel::oneshot::channel();
        std::thread::spawn(move || {
            let result = std::fs::create_dir_all(&base)
                .and_then(|()| std::fs::write(&path, &png))
                .map(|()| {
                    info!("Stored render at {path:?}");
                    RenderId(path.to_string_lossy().into_owned())
                });
            let _ = tx.send(result);
        });
        async move { rx.await.map_err(io::Error::other).and_then(|r| r) }.boxed()
    }
}

fn list_blocking(base: PathBuf) -> io::Result<Vec<StoredRender>> {
    let entries = match std::fs::read_dir(base) {
        Ok(entries) => entries,
        // A fresh session has no directory yet.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let is_png = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("png"));
            if !is_png {
                return None;
            }
            let name = path.file_stem()?.to_string_lossy().into_owned();
            Some(StoredRender {
                id: RenderId(path.to_str()?.into()),
                name,
            })
        })
        .sorted_unstable_by(|a, b| a.name.cmp(&b.name))
        .collect())
}
