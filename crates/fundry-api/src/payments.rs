use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use fundry_db::queries::CompletionOutcome;
use fundry_rates::convert_usd_cents_to_kobo;
use fundry_types::api::{
    Claims, InitPaymentRequest, InitPaymentResponse, PaymentCallbackRequest,
};
use fundry_types::models::Processor;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::investments::load_owned;

use fundry_agreement::format_usd;

/// Payment step: create a hosted-checkout session with the processor for
/// the investor's currency and hand back the redirect URL. Completion is
/// never assumed here — it arrives through the callback.
pub async fn init_payment(
    State(state): State<AppState>,
    Path(investment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<InitPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (investment, campaign) = load_owned(&state, investment_id, &claims)?;

    if !investment.agreement_signed {
        return Err(ApiError::Validation(
            "the SAFE agreement must be signed before payment".into(),
        ));
    }
    if investment.payment_status == "completed" {
        return Err(ApiError::Conflict("this investment is already paid".into()));
    }
    if investment.payment_status == "processing" {
        return Err(ApiError::Conflict(
            "a payment for this investment is already in flight".into(),
        ));
    }

    let transaction_id = format!("fnd_{}", Uuid::new_v4().simple());

    let (processor, checkout_url, charge_amount, currency) = match req.currency.as_str() {
        "USD" => {
            let url = create_stripe_checkout(
                &state,
                &transaction_id,
                investment.total_cents,
                &campaign.title,
            )
            .await?;
            (Processor::Stripe, url, investment.total_cents, "USD")
        }
        "NGN" => {
            // Dual-currency path: convert the USD total at the cached rate
            let rate = state.rates.usd_to_ngn().await;
            let kobo = convert_usd_cents_to_kobo(investment.total_cents, rate.rate);
            info!(
                "Converting {} at {} NGN/USD ({}) for investment {}",
                format_usd(investment.total_cents),
                rate.rate,
                rate.source,
                investment.id
            );
            let url = create_budpay_checkout(&state, &transaction_id, kobo).await?;
            (Processor::Budpay, url, kobo, "NGN")
        }
        other => {
            return Err(ApiError::Validation(format!(
                "unsupported currency '{}', expected USD or NGN",
                other
            )));
        }
    };

    state
        .db
        .begin_payment(&investment.id, processor.as_str(), &transaction_id)
        .map_err(|e| ApiError::Conflict(e.to_string()))?;

    Ok(Json(InitPaymentResponse {
        investment_id,
        processor,
        checkout_url,
        transaction_id,
        charge_amount,
        currency: currency.to_string(),
    }))
}

/// Confirmation step, driven by the processor, not the client. Keyed by
/// transaction id and idempotent: replays and late duplicate webhooks
/// leave the investment exactly where the first success put it.
pub async fn payment_callback(
    State(state): State<AppState>,
    Json(req): Json<PaymentCallbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let success = match req.outcome.as_str() {
        "success" => true,
        "failed" => false,
        other => {
            return Err(ApiError::Validation(format!(
                "unknown payment outcome '{}'",
                other
            )));
        }
    };

    let (outcome, investment) = state
        .db
        .apply_payment_callback(&req.transaction_id, success)
        .map_err(ApiError::Internal)?;

    match outcome {
        CompletionOutcome::Completed => {
            let investment = investment
                .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("completed without a row")))?;
            info!(
                "Payment completed for investment {} (txn {})",
                investment.id, req.transaction_id
            );
            notify_completion(&state, &investment.id)?;
            Ok(Json(serde_json::json!({ "status": "completed" })))
        }
        CompletionOutcome::AlreadyCompleted => {
            // Replay: acknowledge without side effects
            info!("Duplicate callback for txn {}, ignoring", req.transaction_id);
            Ok(Json(serde_json::json!({ "status": "completed" })))
        }
        CompletionOutcome::Failed => {
            warn!("Payment failed for txn {}", req.transaction_id);
            Ok(Json(serde_json::json!({ "status": "failed" })))
        }
        CompletionOutcome::UnknownTransaction => Err(ApiError::NotFound(format!(
            "no investment for transaction '{}'",
            req.transaction_id
        ))),
    }
}

fn notify_completion(state: &AppState, investment_id: &str) -> Result<(), ApiError> {
    let investment = state
        .db
        .get_investment(investment_id)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("investment vanished")))?;
    let campaign = state
        .db
        .get_campaign(&investment.campaign_id)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("orphaned investment")))?;

    let metadata = serde_json::json!({
        "investment_id": investment.id,
        "campaign_id": campaign.id,
    })
    .to_string();

    state
        .db
        .insert_notification(
            &Uuid::new_v4().to_string(),
            &investment.investor_id,
            "investment_confirmed",
            "Investment confirmed",
            &format!(
                "Your {} investment in {} is complete. Your signed SAFE agreement is ready to download.",
                format_usd(investment.amount_cents),
                campaign.title
            ),
            Some(&metadata),
        )
        .map_err(ApiError::Internal)?;

    state
        .db
        .insert_notification(
            &Uuid::new_v4().to_string(),
            &campaign.founder_id,
            "new_investment",
            "New investment received",
            &format!(
                "{} was invested in {}.",
                format_usd(investment.amount_cents),
                campaign.title
            ),
            Some(&metadata),
        )
        .map_err(ApiError::Internal)?;

    Ok(())
}

// -- Processor intents --
//
// Both paths use the processors' hosted checkout; we only create the
// session and redirect. Webhook signature verification is handled at the
// deployment edge.

async fn create_stripe_checkout(
    state: &AppState,
    transaction_id: &str,
    amount_cents: i64,
    description: &str,
) -> Result<String, ApiError> {
    let Some(key) = state.config.stripe_secret_key.as_deref() else {
        return Err(ApiError::Payment("Stripe is not configured".into()));
    };

    let params = [
        ("mode", "payment".to_string()),
        ("client_reference_id", transaction_id.to_string()),
        ("success_url", state.config.checkout_return_url.clone()),
        ("cancel_url", state.config.checkout_return_url.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("line_items[0][price_data][currency]", "usd".to_string()),
        (
            "line_items[0][price_data][unit_amount]",
            amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            format!("Investment in {}", description),
        ),
    ];

    let body: serde_json::Value = state
        .http
        .post("https://api.stripe.com/v1/checkout/sessions")
        .bearer_auth(key)
        .form(&params)
        .send()
        .await
        .map_err(|e| ApiError::Payment(format!("Stripe request failed: {}", e)))?
        .error_for_status()
        .map_err(|e| ApiError::Payment(format!("Stripe rejected the session: {}", e)))?
        .json()
        .await
        .map_err(|e| ApiError::Payment(format!("Stripe response unreadable: {}", e)))?;

    body.get("url")
        .and_then(|u| u.as_str())
        .map(String::from)
        .ok_or_else(|| ApiError::Payment("Stripe session had no checkout url".into()))
}

async fn create_budpay_checkout(
    state: &AppState,
    transaction_id: &str,
    amount_kobo: i64,
) -> Result<String, ApiError> {
    let Some(key) = state.config.budpay_secret_key.as_deref() else {
        return Err(ApiError::Payment("Budpay is not configured".into()));
    };

    // Budpay takes the amount in naira
    let naira = format!("{}.{:02}", amount_kobo / 100, amount_kobo % 100);
    let payload = serde_json::json!({
        "amount": naira,
        "currency": "NGN",
        "reference": transaction_id,
        "callback": state.config.checkout_return_url,
    });

    let body: serde_json::Value = state
        .http
        .post("https://api.budpay.com/api/v2/transaction/initialize")
        .bearer_auth(key)
        .json(&payload)
        .send()
        .await
        .map_err(|e| ApiError::Payment(format!("Budpay request failed: {}", e)))?
        .error_for_status()
        .map_err(|e| ApiError::Payment(format!("Budpay rejected the transaction: {}", e)))?
        .json()
        .await
        .map_err(|e| ApiError::Payment(format!("Budpay response unreadable: {}", e)))?;

    body.get("data")
        .and_then(|d| d.get("authorization_url"))
        .and_then(|u| u.as_str())
        .map(String::from)
        .ok_or_else(|| ApiError::Payment("Budpay response had no authorization url".into()))
}
