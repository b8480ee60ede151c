use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::user::{Capability, Role};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Role,
}

/// The authenticated caller, passed explicitly to every service call. The raw
/// token is kept so it can be forwarded to the school API.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub role: Role,
    pub token: String,
}

impl AuthSession {
    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

pub fn decode_session(token: &str, secret: &str) -> Option<AuthSession> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .ok()
        .map(|data| AuthSession {
            user_id: data.claims.sub,
            role: data.claims.role,
            token: token.to_string(),
        })
}

pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return reject(StatusCode::UNAUTHORIZED, "missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return reject(StatusCode::UNAUTHORIZED, "bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return reject(StatusCode::UNAUTHORIZED, "unsupported_scheme");
    };

    match decode_session(token.trim(), &state.jwt_secret) {
        Some(session) => {
            tracing::debug!(
                user = %session.user_id,
                role = session.role.as_str(),
                "Authenticated request"
            );
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None => reject(StatusCode::UNAUTHORIZED, "invalid_token"),
    }
}

/// Route-group gate; runs after [`require_bearer_auth`].
pub async fn require_capability(
    State(capability): State<Capability>,
    req: Request,
    next: Next,
) -> Response {
    let Some(session) = req.extensions().get::<AuthSession>() else {
        return reject(StatusCode::UNAUTHORIZED, "missing_authorization");
    };
    if !session.can(capability) {
        tracing::warn!(
            user = %session.user_id,
            role = session.role.as_str(),
            ?capability,
            "Capability check failed"
        );
        return reject(StatusCode::FORBIDDEN, "forbidden");
    }
    next.run(req).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = crate::error::Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(|| crate::error::Error::Unauthorized("missing_authorization".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(role: Role, exp: usize, secret: &str) -> String {
        let claims = Claims {
            sub: "u1".to_string(),
            exp,
            role,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn decodes_valid_tokens() {
        let session =
            decode_session(&token(Role::Teacher, far_future(), "s3cret"), "s3cret").unwrap();
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.role, Role::Teacher);
        assert!(session.can(Capability::AuthorTests));
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        assert!(decode_session(&token(Role::Admin, far_future(), "other"), "s3cret").is_none());
        assert!(decode_session(&token(Role::Admin, 1_000, "s3cret"), "s3cret").is_none());
        assert!(decode_session("not.a.jwt", "s3cret").is_none());
    }
}
