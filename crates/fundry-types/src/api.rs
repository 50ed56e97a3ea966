use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    AgreementStatus, CampaignStatus, InvestmentStatus, PaymentStatus, Processor, UserType,
};

// -- JWT Claims --

/// JWT claims shared between the auth handlers and the require_auth
/// middleware. Canonical definition lives here in fundry-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub user_type: UserType,
    pub admin: bool,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub user_type: UserType,
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub user_type: UserType,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub user_type: UserType,
    pub country: Option<String>,
    pub is_email_verified: bool,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OnboardingRequest {
    pub company_name: String,
    pub sector: String,
    pub incorporation_country: String,
    pub incorporation_year: i32,
    pub address: Option<String>,
}

// -- Campaigns --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCampaignRequest {
    pub title: String,
    pub pitch: String,
    pub funding_goal_cents: i64,
    /// Defaults to the platform minimum ($25) when omitted.
    pub minimum_investment_cents: Option<i64>,
    pub deadline: Option<DateTime<Utc>>,
    pub discount_rate_bps: i64,
    pub valuation_cap_cents: i64,
    pub team: Option<serde_json::Value>,
    pub use_of_funds: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub pitch: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub discount_rate_bps: Option<i64>,
    pub valuation_cap_cents: Option<i64>,
    pub team: Option<serde_json::Value>,
    pub use_of_funds: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub status: CampaignStatus,
}

/// Aggregated on read from completed-payment investments.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignStats {
    pub total_raised_cents: i64,
    pub investor_count: i64,
    pub progress_percent: f64,
    /// True once total_raised ≥ funding_goal; the funded transition itself
    /// stays founder-triggered.
    pub goal_reached: bool,
}

#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub founder_id: Uuid,
    pub title: String,
    pub pitch: String,
    pub funding_goal_cents: i64,
    pub minimum_investment_cents: i64,
    pub deadline: Option<DateTime<Utc>>,
    pub status: CampaignStatus,
    pub discount_rate_bps: i64,
    pub valuation_cap_cents: i64,
    /// Only populated for the owning founder (or admin); the token is what
    /// makes unlisted access unlisted.
    pub private_link: Option<String>,
    pub team: Option<serde_json::Value>,
    pub use_of_funds: Option<serde_json::Value>,
    pub stats: CampaignStats,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUpdateRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub is_public: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CampaignUpdateResponse {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub title: String,
    pub body: String,
    pub is_public: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// -- Investment workflow --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PledgeRequest {
    pub amount_cents: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcceptTermsRequest {
    pub agree_to_terms: bool,
    pub accredited_investor: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignAgreementRequest {
    /// Typed full legal name, recorded verbatim as the signature.
    pub legal_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitPaymentRequest {
    /// "USD" routes to Stripe checkout, "NGN" to Budpay.
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct InitPaymentResponse {
    pub investment_id: Uuid,
    pub processor: Processor,
    pub checkout_url: String,
    pub transaction_id: String,
    /// Amount actually charged, in the checkout currency's minor unit.
    pub charge_amount: i64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentCallbackRequest {
    pub transaction_id: String,
    /// "success" or "failed", normalized from processor webhooks.
    pub outcome: String,
}

#[derive(Debug, Serialize)]
pub struct InvestmentResponse {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub campaign_title: String,
    pub investor_id: Uuid,
    pub amount_cents: i64,
    pub platform_fee_cents: i64,
    pub total_cents: i64,
    pub status: InvestmentStatus,
    pub payment_status: PaymentStatus,
    pub agreement_signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AgreementResponse {
    pub id: Uuid,
    pub investment_id: Uuid,
    pub status: AgreementStatus,
    pub investor_signature: Option<String>,
    pub founder_signature: Option<String>,
    pub terms: serde_json::Value,
    pub document: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterSignRequest {
    pub legal_name: String,
}

// -- File uploads --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordFileRequest {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    /// One of pitch_deck, logo, profile_photo, safe_agreement.
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct FileUploadResponse {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
}
