use std::sync::{Arc, Mutex};

use pulse_core::Verifier;
use pulse_storage::UserStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod bot;
mod config;
mod error;
mod routes;
mod sync;

use bot::BotClient;
use config::Config;
use routes::AppState;

#[tokio::main]
async fn main() {
    let config = Config::load();
    init_logging(&config);

    if config.bot_token.is_empty() {
        error!(event = "missing_bot_token");
        std::process::exit(1);
    }

    let store = match UserStore::open(&config.database) {
        Ok(store) => store,
        Err(err) => {
            error!(event = "store_open_failed", database = %config.database, error = %err);
            std::process::exit(1);
        }
    };
    info!(event = "store_ready", database = %config.database);

    let bot = match BotClient::new(config.bot_token.clone(), config.api_base.clone()) {
        Ok(bot) => bot,
        Err(err) => {
            error!(event = "bot_client_failed", error = %err);
            std::process::exit(1);
        }
    };

    let state = AppState {
        verifier: Arc::new(Verifier::new(&config.bot_token)),
        store: Arc::new(Mutex::new(store)),
        bot: Arc::new(bot),
    };
    let app = routes::build_router(state);

    let listener = match tokio::net::TcpListener::bind(&config.addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(event = "bind_failed", addr = %config.addr, error = %err);
            std::process::exit(1);
        }
    };
    info!(event = "server_start", addr = %config.addr);

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!(event = "shutdown_signal");
    };

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!(event = "server_error", error = %err);
    }
}

fn init_logging(config: &Config) {
    let level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
