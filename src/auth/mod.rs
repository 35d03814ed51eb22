//! Session verification and role resolution.
//!
//! Sessions are HS256 tokens minted by the external identity provider. The
//! middleware never rejects a request: a missing or invalid token simply
//! yields an anonymous [`AuthContext`]. Handlers that mutate the catalog
//! demand an admin through [`AdminContext`].

use crate::entities::{profile::ProfileRole, Profile};
use crate::errors::{ApiError, ServiceError};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Claims carried by identity-provider session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub aud: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token audience rejected")]
    WrongAudience,
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// A verified caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: ProfileRole,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == ProfileRole::Admin
    }
}

/// Per-request caller context; `identity` is `None` for anonymous callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub identity: Option<Identity>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn require_authenticated(&self) -> Result<&Identity, ServiceError> {
        self.identity
            .as_ref()
            .ok_or_else(|| ServiceError::Unauthorized("authentication required".into()))
    }

    pub fn require_admin(&self) -> Result<&Identity, ServiceError> {
        let identity = self.require_authenticated()?;
        if identity.is_admin() {
            Ok(identity)
        } else {
            Err(ServiceError::Forbidden("admin role required".into()))
        }
    }
}

pub struct AuthService {
    db: Arc<DatabaseConnection>,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(db: Arc<DatabaseConnection>, jwt_secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        validation.leeway = 30;
        Self {
            db,
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, TokenError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidAudience => TokenError::WrongAudience,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    /// Resolves the caller behind an optional bearer token. Profile lookup
    /// failures propagate; a caller without a profile is a plain user.
    #[instrument(skip_all)]
    pub async fn resolve_context(&self, token: Option<&str>) -> Result<AuthContext, ServiceError> {
        let Some(token) = token else {
            return Ok(AuthContext::anonymous());
        };

        let claims = match self.verify_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "ignoring unusable session token");
                return Ok(AuthContext::anonymous());
            }
        };

        let role = Profile::find_by_id(claims.sub)
            .one(&*self.db)
            .await?
            .map(|profile| profile.role)
            .unwrap_or_default();

        debug!(user_id = %claims.sub, ?role, "resolved session");
        Ok(AuthContext {
            identity: Some(Identity {
                id: claims.sub,
                email: claims.email,
                role,
            }),
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Attaches an [`AuthContext`] to every request.
pub async fn session_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = auth.resolve_context(bearer_token(request.headers())).await?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

pub trait AuthRouterExt {
    fn with_session(self, auth: Arc<AuthService>) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_session(self, auth: Arc<AuthService>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            auth,
            session_middleware,
        ))
    }
}

/// Extractor that admits only admins. Place it before any body extractor so
/// callers without rights are refused before their payload is parsed.
#[derive(Debug, Clone)]
pub struct AdminContext(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default();
        let identity = context.require_admin()?.clone();
        Ok(AdminContext(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use crate::entities::profile;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use sea_orm::{ActiveModelTrait, Set};

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn token(sub: Uuid, aud: &str, exp_offset: i64, secret: &str) -> String {
        let claims = SessionClaims {
            sub,
            aud: aud.into(),
            exp: Utc::now().timestamp() + exp_offset,
            email: Some("shop@example.com".into()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    async fn service() -> AuthService {
        let db = establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .unwrap();
        run_migrations(&db).await.unwrap();
        AuthService::new(Arc::new(db), SECRET, "authenticated")
    }

    #[tokio::test]
    async fn verify_token_classifies_failures() {
        let auth = service().await;
        let id = Uuid::new_v4();

        assert_eq!(
            auth.verify_token(&token(id, "authenticated", 3600, SECRET)).unwrap().sub,
            id
        );
        assert_eq!(
            auth.verify_token(&token(id, "authenticated", -3600, SECRET)).unwrap_err(),
            TokenError::Expired
        );
        assert_eq!(
            auth.verify_token(&token(id, "anon", 3600, SECRET)).unwrap_err(),
            TokenError::WrongAudience
        );
        assert_matches!(
            auth.verify_token(&token(id, "authenticated", 3600, "another-secret-long-enough-to-sign")),
            Err(TokenError::Invalid(_))
        );
    }

    #[tokio::test]
    async fn role_comes_from_profile_and_defaults_to_user() {
        let auth = service().await;
        let admin_id = Uuid::new_v4();
        profile::ActiveModel {
            id: Set(admin_id),
            role: Set(ProfileRole::Admin),
            created_at: Set(Utc::now()),
        }
        .insert(&*auth.db)
        .await
        .unwrap();

        let admin = auth
            .resolve_context(Some(&token(admin_id, "authenticated", 60, SECRET)))
            .await
            .unwrap();
        assert!(admin.require_admin().is_ok());

        let stranger = auth
            .resolve_context(Some(&token(Uuid::new_v4(), "authenticated", 60, SECRET)))
            .await
            .unwrap();
        assert_eq!(stranger.require_authenticated().unwrap().role, ProfileRole::User);
        assert_matches!(
            stranger.require_admin(),
            Err(ServiceError::Forbidden(_))
        );
    }

    #[tokio::test]
    async fn bad_or_missing_tokens_are_anonymous() {
        let auth = service().await;
        for candidate in [None, Some("garbage")] {
            let ctx = auth.resolve_context(candidate).await.unwrap();
            assert_eq!(ctx, AuthContext::anonymous());
            assert_matches!(
                ctx.require_admin(),
                Err(ServiceError::Unauthorized(_))
            );
        }
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, "bearer  xyz ".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("xyz"));
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
