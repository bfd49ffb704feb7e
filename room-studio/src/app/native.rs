use std::{io, sync::Arc};

use eframe::egui;
use log::{info, warn};

use super::RoomStudioApp;
use crate::{
    client::{GeminiClient, GenerationClient, OfflineClient},
    config::Config,
    storage::SessionStore,
};

pub fn run_native() -> Result<(), eframe::Error> {
    env_logger::init();
    let _ = dotenvy::dotenv();

    let config = match std::fs::File::open("config.json") {
        Ok(f) => serde_json::from_reader(f).map_err(|e| eframe::Error::AppCreation(Box::new(e)))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Config::default(),
        Err(e) => Err(eframe::Error::AppCreation(Box::new(e)))?,
    };

    let client: Arc<dyn GenerationClient> = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => Arc::new(GeminiClient::new(&config.api, key)),
        _ => {
            warn!("GEMINI_API_KEY is not set, using the offline renderer");
            Arc::new(OfflineClient)
        }
    };

    let session_dir = std::env::args()
        .nth(1)
        .map(Into::into)
        .unwrap_or_else(|| config.session_dir.clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(config.egui.viewport),
        ..Default::default()
    };

    info!("Run with config: {config:?}");
    eframe::run_native(
        "Room Studio",
        options,
        Box::new(move |cc| {
            Ok(Box::new(RoomStudioApp::new(
                cc,
                client,
                SessionStore::new(session_dir),
            )))
        }),
    )
}
