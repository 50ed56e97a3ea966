use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use fundry_db::Database;
use fundry_rates::RateService;
use fundry_types::api::{
    Claims, LoginRequest, LoginResponse, OnboardingRequest, ProfileResponse, RegisterRequest,
    RegisterResponse,
};
use fundry_types::models::UserType;

use crate::config::PlatformConfig;
use crate::error::ApiError;
use crate::parse_sqlite_datetime;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub config: PlatformConfig,
    pub rates: RateService,
    pub http: reqwest::Client,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if !req.email.contains('@') || req.email.len() > 254 {
        return Err(ApiError::Validation("invalid email address".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    if req.full_name.trim().is_empty() {
        return Err(ApiError::Validation("full name is required".into()));
    }

    // Check if email is taken
    if state
        .db
        .get_user_by_email(&req.email)
        .map_err(ApiError::Internal)?
        .is_some()
    {
        return Err(ApiError::Conflict("email already registered".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();

    state
        .db
        .create_user(
            &user_id.to_string(),
            &req.email,
            &password_hash,
            req.full_name.trim(),
            req.user_type.as_str(),
            req.country.as_deref(),
        )
        .map_err(ApiError::Internal)?;

    let token = create_token(&state.jwt_secret, user_id, &req.email, req.user_type, false)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(&req.email)
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt password hash: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id: {}", e)))?;
    let user_type = UserType::parse(&user.user_type)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("corrupt user type")))?;

    let token = create_token(&state.jwt_secret, user_id, &user.email, user_type, false)?;

    Ok(Json(LoginResponse {
        user_id,
        email: user.email,
        user_type,
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let user_type = UserType::parse(&user.user_type)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("corrupt user type")))?;

    Ok(Json(ProfileResponse {
        user_id: claims.sub,
        email: user.email,
        full_name: user.full_name,
        user_type,
        country: user.country,
        is_email_verified: user.is_email_verified,
        onboarding_completed: user.onboarding_completed,
        created_at: parse_sqlite_datetime(&user.created_at),
    }))
}

/// Founder onboarding: records the business profile and marks onboarding
/// complete. Re-submitting replaces the profile.
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<OnboardingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.user_type != UserType::Founder {
        return Err(ApiError::Forbidden(
            "only founders complete business onboarding".into(),
        ));
    }
    if req.company_name.trim().is_empty() || req.sector.trim().is_empty() {
        return Err(ApiError::Validation(
            "company name and sector are required".into(),
        ));
    }
    let current_year = chrono::Utc::now().format("%Y").to_string().parse::<i32>().unwrap_or(2100);
    if req.incorporation_year < 1800 || req.incorporation_year > current_year {
        return Err(ApiError::Validation("implausible incorporation year".into()));
    }

    let profile_id = Uuid::new_v4();
    let user_id = claims.sub.to_string();

    state
        .db
        .upsert_business_profile(
            &profile_id.to_string(),
            &user_id,
            req.company_name.trim(),
            req.sector.trim(),
            &req.incorporation_country,
            req.incorporation_year,
            req.address.as_deref(),
        )
        .map_err(ApiError::Internal)?;
    state
        .db
        .set_onboarding_completed(&user_id)
        .map_err(ApiError::Internal)?;

    Ok(Json(serde_json::json!({ "onboarding_completed": true })))
}

fn create_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
    user_type: UserType,
    admin: bool,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        user_type,
        admin,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token encoding failed: {}", e)))?;

    Ok(token)
}
