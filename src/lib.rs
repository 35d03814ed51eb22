//! Storefront API Library
//!
//! Product catalog backend: public browsing, admin maintenance, category
//! management, image uploads and chat checkout links.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, routing::get, Router};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
};

use crate::auth::{AuthRouterExt, AuthService};
use crate::config::{AppConfig, StorageBackend};

/// Room for base64 expansion and the JSON envelope around an upload.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", handlers::products::products_routes())
        .nest("/categories", handlers::categories::categories_routes())
}

/// Full application router with every cross-cutting layer applied.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let auth = state.auth.clone();

    let mut app = Router::<AppState>::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .nest("/api/v1", api_v1_routes().with_session(auth));

    if config.storage.backend == StorageBackend::Local {
        app = app.nest_service("/uploads", ServeDir::new(&config.storage.local_dir));
    }

    app.layer(DefaultBodyLimit::max(body_limit(&config)))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(cors_layer(&config))
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

fn body_limit(config: &AppConfig) -> usize {
    config.storage.max_upload_bytes.saturating_mul(4) / 3 + BODY_LIMIT_SLACK
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if config.is_development() {
        ::tracing::info!("Using permissive CORS because no origins are configured");
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}
