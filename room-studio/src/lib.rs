mod acquire;
mod app;
mod client;
mod config;
mod history;
mod job;
mod storage;

pub use app::run_native;
pub use config::Config;
