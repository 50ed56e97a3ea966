//! Shared fixtures for handler tests: an in-memory state and helpers for
//! seeding authenticated callers.

use std::sync::Arc;

use axum::response::Response;
use uuid::Uuid;

use fundry_db::Database;
use fundry_rates::RateService;
use fundry_types::api::Claims;
use fundry_types::models::UserType;

use crate::auth::{AppState, AppStateInner};
use crate::config::PlatformConfig;

pub(crate) fn test_state() -> AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "test-secret".into(),
        config: PlatformConfig::default(),
        // No sources configured: rate resolution short-circuits to the fallback
        rates: RateService::new(vec![], fundry_rates::DEFAULT_TTL),
        http: reqwest::Client::new(),
    })
}

/// Insert a user row and hand back matching claims, as if the caller had
/// gone through register + require_auth.
pub(crate) fn claims_for(state: &AppState, email: &str, user_type: UserType) -> Claims {
    let id = Uuid::new_v4();
    state
        .db
        .create_user(&id.to_string(), email, "$argon2$hash", "Test User", user_type.as_str(), None)
        .unwrap();
    Claims {
        sub: id,
        email: email.to_string(),
        user_type,
        admin: false,
        exp: 4_102_444_800,
    }
}

pub(crate) async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
