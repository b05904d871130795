//! # Sexton
//!
//! Cemetery records search and admin server.
//!
//! A thin HTTP layer over the hosted record store that owns the
//! `cemetery_records` table. Public visitors search the table by partial or
//! exact field matches; an authenticated administrator can pull a single
//! record by memorial ID and edit it in place.
//!
//!
//!
//! # General Infrastructure
//! - All persistence lives in the hosted store, this process keeps no data
//!   beyond in-memory session tokens
//! - Every store operation is one awaited HTTP call, no retries, a failed
//!   call is reported to that request's caller immediately
//! - Sessions expire after ten minutes of inactivity, checked on each access
//!
//!
//!
//! # Routes
//! - `GET /` — landing page with the search form
//! - `GET /search` — filtered record list, 500 on store error
//! - `GET /loginPage`, `POST /login`, `GET /logout` — admin session flow
//! - `GET /updatePage` — record lookup form, behind the session gate
//! - `GET /getUpdateRecord` — prefilled edit form, behind the session gate
//! - `POST /updateRecord` — apply a partial update, behind the session gate
use std::time::Duration;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod pages;
pub mod records;
pub mod routes;
pub mod search;
pub mod session;
pub mod state;
pub mod store;

use routes::{
    get_update_record_handler, index_handler, login_handler, login_page_handler, logout_handler,
    search_handler, update_page_handler, update_record_handler,
};
use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new();

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/search", get(search_handler))
        .route("/loginPage", get(login_page_handler))
        .route("/login", post(login_handler))
        .route("/logout", get(logout_handler))
        .route("/updatePage", get(update_page_handler))
        .route("/getUpdateRecord", get(get_update_record_handler))
        .route("/updateRecord", post(update_record_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
