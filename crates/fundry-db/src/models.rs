/// Database row types — these map directly to SQLite rows.
/// Distinct from fundry-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub user_type: String,
    pub country: Option<String>,
    pub is_email_verified: bool,
    pub onboarding_completed: bool,
    pub created_at: String,
}

pub struct BusinessProfileRow {
    pub id: String,
    pub user_id: String,
    pub company_name: String,
    pub sector: String,
    pub incorporation_country: String,
    pub incorporation_year: i32,
    pub address: Option<String>,
    pub created_at: String,
}

pub struct CampaignRow {
    pub id: String,
    pub founder_id: String,
    pub business_profile_id: Option<String>,
    pub title: String,
    pub pitch: String,
    pub funding_goal_cents: i64,
    pub minimum_investment_cents: i64,
    pub deadline: Option<String>,
    pub status: String,
    pub discount_rate_bps: i64,
    pub valuation_cap_cents: i64,
    pub private_link: String,
    pub team: Option<String>,
    pub use_of_funds: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Read-side aggregation over completed-payment investments.
pub struct CampaignStatsRow {
    pub total_raised_cents: i64,
    pub investor_count: i64,
}

pub struct InvestmentRow {
    pub id: String,
    pub campaign_id: String,
    pub investor_id: String,
    pub amount_cents: i64,
    pub platform_fee_cents: i64,
    pub total_cents: i64,
    pub status: String,
    pub payment_status: String,
    pub terms_accepted: bool,
    pub agreement_signed: bool,
    pub signed_at: Option<String>,
    pub ip_address: Option<String>,
    pub processor: Option<String>,
    pub transaction_id: Option<String>,
    pub created_at: String,
}

/// InvestmentRow joined with its campaign title for listing.
pub struct InvestmentListRow {
    pub investment: InvestmentRow,
    pub campaign_title: String,
}

pub struct SafeAgreementRow {
    pub id: String,
    pub investment_id: String,
    pub investor_signature: Option<String>,
    pub founder_signature: Option<String>,
    pub terms: String,
    pub status: String,
    pub created_at: String,
}

pub struct CampaignUpdateRow {
    pub id: String,
    pub campaign_id: String,
    pub title: String,
    pub body: String,
    pub is_public: bool,
    pub scheduled_for: Option<String>,
    pub created_at: String,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub metadata: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

pub struct FileUploadRow {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub kind: String,
    pub created_at: String,
}
