pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod proxy;
pub mod state;
pub mod ui;
pub mod validation;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "todo_backend=debug,todo_proxy=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
