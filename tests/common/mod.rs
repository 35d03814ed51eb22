#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use storefront_api::{
    auth::{AuthService, SessionClaims},
    config::{AppConfig, StorageBackend},
    db::{self, DbConfig},
    entities::profile::{self, ProfileRole},
    handlers::AppServices,
    services::media::LocalStorage,
    AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const CHECKOUT_NUMBER: &str = "2250700000000";

/// Full application over a private in-memory SQLite database, with local
/// image storage in a temporary directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin_id: Uuid,
    pub user_id: Uuid,
    admin_token: String,
    user_token: String,
    uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let uploads = tempfile::tempdir().expect("create upload dir");

        let mut cfg = AppConfig::new("sqlite::memory:", "test");
        cfg.storage.backend = StorageBackend::Local;
        cfg.storage.local_dir = uploads.path().to_string_lossy().into_owned();
        cfg.storage.public_base_url = "http://localhost:8080/uploads".to_string();
        cfg.storage.max_upload_bytes = 1024;
        cfg.checkout.whatsapp_number = Some(CHECKOUT_NUMBER.to_string());
        customize(&mut cfg);

        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let admin_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        for (id, role) in [(admin_id, ProfileRole::Admin), (user_id, ProfileRole::User)] {
            profile::ActiveModel {
                id: Set(id),
                role: Set(role),
                created_at: Set(Utc::now()),
            }
            .insert(&*db_arc)
            .await
            .expect("seed profile");
        }

        let auth = Arc::new(AuthService::new(
            db_arc.clone(),
            &cfg.auth.jwt_secret,
            &cfg.auth.jwt_audience,
        ));
        let storage = Arc::new(LocalStorage::new(
            &cfg.storage.local_dir,
            &cfg.storage.public_base_url,
        ));
        let services = AppServices::new(db_arc.clone(), storage, &cfg);

        let admin_token = mint_token(&cfg, admin_id);
        let user_token = mint_token(&cfg, user_id);

        let state = AppState {
            db: db_arc,
            config: Arc::new(cfg),
            services,
            auth,
        };
        let router = storefront_api::build_router(state.clone());

        Self {
            router,
            state,
            admin_id,
            user_id,
            admin_token,
            user_token,
            uploads,
        }
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    pub fn user_token(&self) -> &str {
        &self.user_token
    }

    /// Token for an identity that has no profile row.
    pub fn stranger_token(&self) -> String {
        mint_token(&self.state.config, Uuid::new_v4())
    }

    pub fn uploads_dir(&self) -> &std::path::Path {
        self.uploads.path()
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let body = body.map(|json| serde_json::to_vec(&json).expect("serialize request body"));
        self.raw_request(method, uri, body, token, &[]).await
    }

    pub async fn raw_request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Vec<u8>>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = match body {
            Some(bytes) => {
                builder = builder.header("content-type", "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Admin request.
    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(self.admin_token())).await
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None, None).await
    }

    /// Creates a product through the API and returns its JSON.
    pub async fn create_product(&self, body: Value) -> Value {
        let response = self.admin(Method::POST, "/api/v1/products", Some(body)).await;
        assert_eq!(response.status(), 201, "product creation failed");
        json_body(response).await
    }

    pub async fn create_category(&self, name: &str) -> Value {
        let response = self
            .admin(Method::POST, "/api/v1/categories", Some(json!({ "name": name })))
            .await;
        assert_eq!(response.status(), 201, "category creation failed");
        json_body(response).await
    }
}

pub fn product_body(name: &str, price: Decimal) -> Value {
    json!({
        "name": name,
        "price": price,
        "stock": 5,
    })
}

pub fn mint_token(cfg: &AppConfig, sub: Uuid) -> String {
    let claims = SessionClaims {
        sub,
        aud: cfg.auth.jwt_audience.clone(),
        exp: Utc::now().timestamp() + 3600,
        email: Some(format!("{}@example.com", sub.simple())),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.auth.jwt_secret.as_bytes()),
    )
    .expect("encode session token")
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id field").to_string()
}
