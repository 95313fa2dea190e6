pub mod app;
pub mod cache;
pub mod channel;
pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod host;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod origin;
pub mod protocol;
pub mod state;
pub mod storage;
pub mod timer;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
