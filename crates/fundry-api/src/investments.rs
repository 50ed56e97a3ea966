use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use fundry_agreement::{AgreementParams, TermsSnapshot, generate_agreement};
use fundry_db::models::{CampaignRow, InvestmentRow};
use fundry_types::api::{
    AcceptTermsRequest, AgreementResponse, Claims, InvestmentResponse, PledgeRequest,
    SignAgreementRequest,
};
use fundry_types::models::{AgreementStatus, CampaignStatus, InvestmentStatus, PaymentStatus};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{parse_sqlite_datetime, parse_uuid};

use fundry_agreement::format_usd;

/// Amount step: turn a pledge into a pending Investment row. The workflow
/// is resumable from here — every later step loads the row by id.
pub async fn pledge(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PledgeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let campaign = state
        .db
        .get_campaign(&campaign_id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("campaign not found".into()))?;

    if campaign.status != CampaignStatus::Active.as_str() {
        return Err(ApiError::Validation(
            "campaign is not accepting investments".into(),
        ));
    }
    if req.amount_cents < campaign.minimum_investment_cents {
        return Err(ApiError::Validation(format!(
            "pledge is below the campaign minimum of {}",
            format_usd(campaign.minimum_investment_cents)
        )));
    }

    let fee = state.config.platform_fee(req.amount_cents);
    let total = req.amount_cents + fee;
    let investment_id = Uuid::new_v4();

    state
        .db
        .create_investment(
            &investment_id.to_string(),
            &campaign.id,
            &claims.sub.to_string(),
            req.amount_cents,
            fee,
            total,
        )
        .map_err(ApiError::Internal)?;

    info!(
        "Investment {} pledged on campaign {} ({})",
        investment_id,
        campaign.id,
        format_usd(req.amount_cents)
    );

    let row = state
        .db
        .get_investment(&investment_id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("investment vanished after insert")))?;

    Ok((
        StatusCode::CREATED,
        Json(investment_response(row, campaign.title)?),
    ))
}

/// SAFE-review step: read-only render of what the investor would sign,
/// using the campaign's current terms. Nothing is persisted.
pub async fn safe_preview(
    State(state): State<AppState>,
    Path(investment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let (investment, campaign) = load_owned(&state, investment_id, &claims)?;

    let investor_name = investor_full_name(&state, &claims)?;
    let document = generate_agreement(&AgreementParams {
        company_name: company_name(&state, &campaign)?,
        investor_name,
        amount_cents: investment.amount_cents,
        discount_rate_bps: campaign.discount_rate_bps,
        valuation_cap_cents: campaign.valuation_cap_cents,
        governing_law: state.config.governing_law.clone(),
        agreement_date: chrono::Utc::now(),
    })
    .map_err(|e| ApiError::Validation(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "document": document,
        "discount_rate_bps": campaign.discount_rate_bps,
        "valuation_cap_cents": campaign.valuation_cap_cents,
        "amount_cents": investment.amount_cents,
    })))
}

/// Terms step: both attestations must be affirmatively checked.
pub async fn accept_terms(
    State(state): State<AppState>,
    Path(investment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AcceptTermsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (investment, _) = load_owned(&state, investment_id, &claims)?;

    if !req.agree_to_terms {
        return Err(ApiError::Validation(
            "you must agree to the investment terms".into(),
        ));
    }
    if !req.accredited_investor {
        return Err(ApiError::Validation(
            "accredited-investor self-certification is required".into(),
        ));
    }
    if investment.status == InvestmentStatus::Cancelled.as_str() {
        return Err(ApiError::Validation("this investment was cancelled".into()));
    }

    state
        .db
        .accept_terms(&investment.id)
        .map_err(ApiError::Internal)?;

    Ok(Json(serde_json::json!({ "terms_accepted": true })))
}

/// Signature step: records the typed legal name, commits the investment,
/// and snapshots the campaign terms onto the agreement so later campaign
/// edits can't change what was signed.
pub async fn sign(
    State(state): State<AppState>,
    Path(investment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Json(req): Json<SignAgreementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (investment, campaign) = load_owned(&state, investment_id, &claims)?;

    if req.legal_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "full legal name is required as signature".into(),
        ));
    }
    if !investment.terms_accepted {
        return Err(ApiError::Validation(
            "terms must be accepted before signing".into(),
        ));
    }
    if investment.agreement_signed {
        return Err(ApiError::Conflict("agreement already signed".into()));
    }
    if investment.status == InvestmentStatus::Cancelled.as_str() {
        return Err(ApiError::Validation("this investment was cancelled".into()));
    }

    let signed_at = chrono::Utc::now();
    let snapshot = TermsSnapshot {
        company_name: company_name(&state, &campaign)?,
        amount_cents: investment.amount_cents,
        discount_rate_bps: campaign.discount_rate_bps,
        valuation_cap_cents: campaign.valuation_cap_cents,
        governing_law: state.config.governing_law.clone(),
        signed_at,
    };
    let terms_json = snapshot
        .to_json()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("terms serialization failed: {}", e)))?;

    let agreement_id = Uuid::new_v4();
    state
        .db
        .sign_investment(
            &investment.id,
            &agreement_id.to_string(),
            req.legal_name.trim(),
            &terms_json,
            &signed_at.to_rfc3339(),
            client_ip(&headers).as_deref(),
        )
        .map_err(ApiError::Internal)?;

    info!(
        "Investment {} signed, agreement {} created",
        investment.id, agreement_id
    );

    let row = state
        .db
        .get_investment(&investment.id)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("investment vanished after signing")))?;

    Ok(Json(investment_response(row, campaign.title)?))
}

/// The caller's investments, newest first. Pending and committed rows are
/// how an abandoned workflow is surfaced for resume.
pub async fn list_my_investments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let investor_id = claims.sub.to_string();

    let rows = tokio::task::spawn_blocking(move || {
        db_state.db.list_investments_by_investor(&investor_id)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
    .map_err(ApiError::Internal)?;

    let responses = rows
        .into_iter()
        .map(|row| investment_response(row.investment, row.campaign_title))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(responses))
}

/// Signed agreement download: the document is re-rendered from the
/// immutable snapshot, never from the live campaign.
pub async fn get_agreement(
    State(state): State<AppState>,
    Path(investment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let (investment, _campaign) = load_owned(&state, investment_id, &claims)?;

    let agreement = state
        .db
        .get_agreement_by_investment(&investment.id)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("agreement not signed yet".into()))?;

    let snapshot = TermsSnapshot::from_json(&agreement.terms)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt terms snapshot: {}", e)))?;

    let investor_name = agreement
        .investor_signature
        .clone()
        .unwrap_or_else(|| claims.email.clone());

    let document = generate_agreement(&AgreementParams {
        company_name: snapshot.company_name.clone(),
        investor_name,
        amount_cents: snapshot.amount_cents,
        discount_rate_bps: snapshot.discount_rate_bps,
        valuation_cap_cents: snapshot.valuation_cap_cents,
        governing_law: snapshot.governing_law.clone(),
        agreement_date: snapshot.signed_at,
    })
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("snapshot render failed: {}", e)))?;

    let status = AgreementStatus::parse(&agreement.status)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("corrupt agreement status")))?;

    Ok(Json(AgreementResponse {
        id: parse_uuid(&agreement.id)?,
        investment_id: parse_uuid(&agreement.investment_id)?,
        status,
        investor_signature: agreement.investor_signature,
        founder_signature: agreement.founder_signature,
        terms: serde_json::from_str(&agreement.terms)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt terms json: {}", e)))?,
        document,
        created_at: parse_sqlite_datetime(&agreement.created_at),
    }))
}

/// Founder counter-signature, the only mutation a signed agreement admits.
pub async fn counter_sign(
    State(state): State<AppState>,
    Path(investment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<fundry_types::api::CounterSignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.legal_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "full legal name is required as signature".into(),
        ));
    }

    let investment = state
        .db
        .get_investment(&investment_id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("investment not found".into()))?;
    let campaign = state
        .db
        .get_campaign(&investment.campaign_id)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("orphaned investment")))?;

    if campaign.founder_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden(
            "only the campaign founder may counter-sign".into(),
        ));
    }

    let agreement = state
        .db
        .get_agreement_by_investment(&investment.id)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("agreement not signed yet".into()))?;

    state
        .db
        .counter_sign_agreement(&agreement.id, req.legal_name.trim())
        .map_err(ApiError::Internal)?;

    Ok(Json(serde_json::json!({ "counter_signed": true })))
}

// -- Helpers shared with payments.rs --

/// Load an investment and its campaign, enforcing that the caller owns it.
pub(crate) fn load_owned(
    state: &AppState,
    investment_id: Uuid,
    claims: &Claims,
) -> Result<(InvestmentRow, CampaignRow), ApiError> {
    let investment = state
        .db
        .get_investment(&investment_id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("investment not found".into()))?;

    if investment.investor_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden(
            "investment belongs to another investor".into(),
        ));
    }

    let campaign = state
        .db
        .get_campaign(&investment.campaign_id)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("orphaned investment")))?;

    Ok((investment, campaign))
}

/// Company name for agreement text: business profile if the founder
/// completed onboarding, campaign title otherwise.
pub(crate) fn company_name(state: &AppState, campaign: &CampaignRow) -> Result<String, ApiError> {
    let profile = state
        .db
        .get_business_profile(&campaign.founder_id)
        .map_err(ApiError::Internal)?;
    Ok(profile
        .map(|p| p.company_name)
        .unwrap_or_else(|| campaign.title.clone()))
}

fn investor_full_name(state: &AppState, claims: &Claims) -> Result<String, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(user.full_name)
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
}

pub(crate) fn investment_response(
    row: InvestmentRow,
    campaign_title: String,
) -> Result<InvestmentResponse, ApiError> {
    let status = InvestmentStatus::parse(&row.status)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("corrupt investment status")))?;
    let payment_status = PaymentStatus::parse(&row.payment_status)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("corrupt payment status")))?;

    Ok(InvestmentResponse {
        id: parse_uuid(&row.id)?,
        campaign_id: parse_uuid(&row.campaign_id)?,
        campaign_title,
        investor_id: parse_uuid(&row.investor_id)?,
        amount_cents: row.amount_cents,
        platform_fee_cents: row.platform_fee_cents,
        total_cents: row.total_cents,
        status,
        payment_status,
        agreement_signed: row.agreement_signed,
        signed_at: row.signed_at.as_deref().map(parse_sqlite_datetime),
        created_at: parse_sqlite_datetime(&row.created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{claims_for, test_state};
    use fundry_types::models::UserType;

    fn seed_active_campaign(state: &crate::auth::AppState, founder: &Claims) -> Uuid {
        let campaign_id = Uuid::new_v4();
        state
            .db
            .create_campaign(
                &campaign_id.to_string(),
                &founder.sub.to_string(),
                None,
                "Solar Micro-Grid",
                "Pay-as-you-go solar for rural communities.",
                5_000_000,
                2_500, // $25 minimum
                None,
                2000,
                100_000_000,
                &format!("link-{}", campaign_id),
                None,
                None,
            )
            .unwrap();
        state
            .db
            .update_campaign_status(&campaign_id.to_string(), "active")
            .unwrap();
        campaign_id
    }

    #[tokio::test]
    async fn pledge_below_campaign_minimum_is_rejected() {
        let state = test_state();
        let founder = claims_for(&state, "founder@example.com", UserType::Founder);
        let investor = claims_for(&state, "investor@example.com", UserType::Investor);
        let campaign_id = seed_active_campaign(&state, &founder);

        // $10 against the $25 minimum
        let err = pledge(
            State(state.clone()),
            Path(campaign_id),
            Extension(investor.clone()),
            Json(PledgeRequest { amount_cents: 1_000 }),
        )
        .await
        .err()
        .unwrap();
        match err {
            ApiError::Validation(msg) => assert!(msg.contains("$25.00"), "{}", msg),
            other => panic!("expected validation error, got {:?}", other),
        }

        // $100 clears the minimum
        let result = pledge(
            State(state),
            Path(campaign_id),
            Extension(investor),
            Json(PledgeRequest { amount_cents: 10_000 }),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn pledge_requires_an_active_campaign() {
        let state = test_state();
        let founder = claims_for(&state, "founder@example.com", UserType::Founder);
        let investor = claims_for(&state, "investor@example.com", UserType::Investor);
        let campaign_id = seed_active_campaign(&state, &founder);
        state
            .db
            .update_campaign_status(&campaign_id.to_string(), "paused")
            .unwrap();

        let err = pledge(
            State(state),
            Path(campaign_id),
            Extension(investor),
            Json(PledgeRequest { amount_cents: 10_000 }),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
