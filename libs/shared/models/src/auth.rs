use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

impl JwtClaims {
    /// Application role: `app_metadata.role` when present, otherwise the top-level claim.
    pub fn app_role(&self) -> Option<String> {
        self.app_metadata
            .as_ref()
            .and_then(|meta| meta.get("role"))
            .and_then(|role| role.as_str())
            .map(str::to_string)
            .or_else(|| self.role.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MODERATOR: &str = "moderator";

/// The authenticated caller of a service operation.
///
/// Built once per request from the validated JWT and passed explicitly into
/// every service call; the raw token is forwarded to the store so row-level
/// security applies to the caller.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    token: String,
}

impl AuthContext {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Self { user, token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.user.id)
            .map_err(|_| AppError::Auth(format!("Invalid user id in token: {}", self.user.id)))
    }

    pub fn is_admin(&self) -> bool {
        self.user.role.as_deref() == Some(ROLE_ADMIN)
    }

    /// Admins and moderators both reach the dashboards.
    pub fn is_staff(&self) -> bool {
        matches!(self.user.role.as_deref(), Some(ROLE_ADMIN) | Some(ROLE_MODERATOR))
    }

    pub fn owns(&self, user_id: Uuid) -> bool {
        self.user.id == user_id.to_string()
    }
}
