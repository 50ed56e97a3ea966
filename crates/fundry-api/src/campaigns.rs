use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use fundry_db::models::{CampaignRow, CampaignUpdateRow};
use fundry_types::api::{
    CampaignResponse, CampaignStats, CampaignUpdateResponse, Claims, CreateCampaignRequest,
    CreateUpdateRequest, UpdateCampaignRequest, UpdateStatusRequest,
};
use fundry_types::models::{CampaignStatus, UserType};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{parse_sqlite_datetime, parse_uuid};

use fundry_agreement::format_usd;

#[derive(Debug, Deserialize)]
pub struct CampaignQuery {
    pub status: Option<CampaignStatus>,
}

pub async fn create_campaign(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.user_type != UserType::Founder {
        return Err(ApiError::Forbidden("only founders create campaigns".into()));
    }
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }
    if req.pitch.trim().is_empty() {
        return Err(ApiError::Validation("pitch is required".into()));
    }
    if req.funding_goal_cents <= 0 {
        return Err(ApiError::Validation("funding goal must be positive".into()));
    }
    if req.funding_goal_cents > state.config.funding_goal_cap_cents {
        return Err(ApiError::Validation(format!(
            "funding goal exceeds the platform cap of {}",
            format_usd(state.config.funding_goal_cap_cents)
        )));
    }
    let minimum = req
        .minimum_investment_cents
        .unwrap_or(state.config.default_minimum_investment_cents);
    if minimum <= 0 {
        return Err(ApiError::Validation(
            "minimum investment must be positive".into(),
        ));
    }
    if req.discount_rate_bps < 0 || req.discount_rate_bps > 10_000 {
        return Err(ApiError::Validation(
            "discount rate must be between 0 and 100%".into(),
        ));
    }
    if req.valuation_cap_cents <= 0 {
        return Err(ApiError::Validation("valuation cap must be positive".into()));
    }

    let campaign_id = Uuid::new_v4();
    let private_link = generate_private_link();
    let founder_id = claims.sub.to_string();

    let business_profile_id = state
        .db
        .get_business_profile(&founder_id)
        .map_err(ApiError::Internal)?
        .map(|p| p.id);

    state
        .db
        .create_campaign(
            &campaign_id.to_string(),
            &founder_id,
            business_profile_id.as_deref(),
            req.title.trim(),
            req.pitch.trim(),
            req.funding_goal_cents,
            minimum,
            req.deadline.map(|d| d.to_rfc3339()).as_deref(),
            req.discount_rate_bps,
            req.valuation_cap_cents,
            &private_link,
            req.team.map(|t| t.to_string()).as_deref(),
            req.use_of_funds.map(|u| u.to_string()).as_deref(),
        )
        .map_err(ApiError::Internal)?;

    info!("Campaign {} created by founder {}", campaign_id, founder_id);

    let row = state
        .db
        .get_campaign(&campaign_id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("campaign vanished after insert")))?;
    let response = build_response(&state, row, true)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Public listing. Anonymous callers only see viewable campaigns; an
/// authenticated founder additionally sees their own rows (drafts
/// included) with the private link attached.
pub async fn list_campaigns(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Query(query): Query<CampaignQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // Run blocking DB aggregation off the async runtime
    let db_state = state.clone();
    let status = query.status;
    let claims = claims.map(|Extension(c)| c);
    let responses = tokio::task::spawn_blocking(move || {
        let rows = db_state.db.list_campaigns(status.map(|s| s.as_str()))?;
        rows.into_iter()
            .filter(|row| {
                let viewable = CampaignStatus::parse(&row.status)
                    .map(|s| s.is_viewable())
                    .unwrap_or(false);
                viewable || claims.as_ref().is_some_and(|c| caller_owns(c, row))
            })
            .map(|row| {
                let owns = claims.as_ref().is_some_and(|c| caller_owns(c, &row));
                build_response(&db_state, row, owns).map_err(|e| anyhow::anyhow!("{}", e))
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
    .map_err(ApiError::Internal)?;

    Ok(Json(responses))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    claims: Option<Extension<Claims>>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_campaign(&campaign_id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("campaign not found".into()))?;

    let owns = claims.is_some_and(|Extension(c)| caller_owns(&c, &row));
    if !parse_status(&row.status)?.is_viewable() && !owns {
        return Err(ApiError::NotFound("campaign not found".into()));
    }

    Ok(Json(build_response(&state, row, owns)?))
}

/// Unlisted access through the unguessable token. Draft and cancelled
/// campaigns are invisible even with the link.
pub async fn get_campaign_by_private_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_campaign_by_private_link(&token)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("campaign not found".into()))?;

    let status = parse_status(&row.status)?;
    if !status.is_viewable() {
        return Err(ApiError::NotFound("campaign not found".into()));
    }

    // The caller already holds the token, so echoing it back leaks nothing
    Ok(Json(build_response(&state, row, true)?))
}

pub async fn update_campaign_status(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_campaign(&campaign_id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("campaign not found".into()))?;

    if row.founder_id != claims.sub.to_string() && !claims.admin {
        return Err(ApiError::Forbidden(
            "only the campaign founder may change its status".into(),
        ));
    }

    let current = parse_status(&row.status)?;
    if !current.can_transition(req.status, claims.admin) {
        return Err(ApiError::Validation(format!(
            "cannot transition campaign from {} to {}",
            current.as_str(),
            req.status.as_str()
        )));
    }

    state
        .db
        .update_campaign_status(&row.id, req.status.as_str())
        .map_err(ApiError::Internal)?;

    info!(
        "Campaign {} status {} -> {}",
        row.id,
        current.as_str(),
        req.status.as_str()
    );

    Ok(Json(serde_json::json!({ "status": req.status })))
}

/// Edit campaign fields. Allowed while the campaign is not terminal; signed
/// agreements are unaffected because their terms are snapshotted.
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCampaignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_campaign(&campaign_id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("campaign not found".into()))?;

    if row.founder_id != claims.sub.to_string() && !claims.admin {
        return Err(ApiError::Forbidden(
            "only the campaign founder may edit it".into(),
        ));
    }
    if parse_status(&row.status)?.is_terminal() {
        return Err(ApiError::Validation(
            "campaign is closed and can no longer be edited".into(),
        ));
    }
    if let Some(cap) = req.valuation_cap_cents {
        if cap <= 0 {
            return Err(ApiError::Validation("valuation cap must be positive".into()));
        }
    }
    if let Some(rate) = req.discount_rate_bps {
        if !(0..=10_000).contains(&rate) {
            return Err(ApiError::Validation(
                "discount rate must be between 0 and 100%".into(),
            ));
        }
    }

    state
        .db
        .update_campaign_fields(
            &row.id,
            req.title.as_deref(),
            req.pitch.as_deref(),
            req.deadline.map(|d| d.to_rfc3339()).as_deref(),
            req.discount_rate_bps,
            req.valuation_cap_cents,
            req.team.map(|t| t.to_string()).as_deref(),
            req.use_of_funds.map(|u| u.to_string()).as_deref(),
        )
        .map_err(ApiError::Internal)?;

    let updated = state
        .db
        .get_campaign(&row.id)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("campaign vanished during update")))?;

    Ok(Json(build_response(&state, updated, true)?))
}

// -- Campaign updates --

pub async fn create_campaign_update(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_campaign(&campaign_id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("campaign not found".into()))?;

    if row.founder_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden(
            "only the campaign founder may post updates".into(),
        ));
    }
    if req.title.trim().is_empty() || req.body.trim().is_empty() {
        return Err(ApiError::Validation("title and body are required".into()));
    }

    let update_id = Uuid::new_v4();
    state
        .db
        .insert_campaign_update(
            &update_id.to_string(),
            &row.id,
            req.title.trim(),
            &req.body,
            req.is_public,
            req.scheduled_for.map(|d| d.to_rfc3339()).as_deref(),
        )
        .map_err(ApiError::Internal)?;

    // Fan out a notification to everyone invested in this campaign
    let investor_ids = state
        .db
        .campaign_investor_ids(&row.id)
        .map_err(ApiError::Internal)?;
    for investor_id in investor_ids {
        state
            .db
            .insert_notification(
                &Uuid::new_v4().to_string(),
                &investor_id,
                "campaign_update",
                &format!("Update from {}", row.title),
                req.title.trim(),
                Some(&serde_json::json!({ "campaign_id": row.id, "update_id": update_id }).to_string()),
            )
            .map_err(ApiError::Internal)?;
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": update_id })),
    ))
}

/// Public feed of a campaign's updates. Anonymous callers get is_public
/// rows only; the founder (or admin) also gets the private ones.
pub async fn list_campaign_updates(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    claims: Option<Extension<Claims>>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_campaign(&campaign_id.to_string())
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("campaign not found".into()))?;

    let owns = claims.is_some_and(|Extension(c)| caller_owns(&c, &row));
    if !parse_status(&row.status)?.is_viewable() && !owns {
        return Err(ApiError::NotFound("campaign not found".into()));
    }

    let updates = state
        .db
        .list_campaign_updates(&row.id, owns)
        .map_err(ApiError::Internal)?;

    let responses = updates
        .into_iter()
        .map(update_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(responses))
}

// -- Helpers --

fn generate_private_link() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn parse_status(s: &str) -> Result<CampaignStatus, ApiError> {
    CampaignStatus::parse(s)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("corrupt campaign status '{}'", s)))
}

fn caller_owns(claims: &Claims, row: &CampaignRow) -> bool {
    claims.admin || row.founder_id == claims.sub.to_string()
}

/// Assemble the API shape: row plus stats aggregated from completed
/// payments. Progress is not capped, over-funding shows as >100%. The
/// private link only goes out when the caller owns the campaign.
pub(crate) fn build_response(
    state: &AppState,
    row: CampaignRow,
    include_private_link: bool,
) -> Result<CampaignResponse, ApiError> {
    let stats = state
        .db
        .campaign_stats(&row.id)
        .map_err(ApiError::Internal)?;

    let progress_percent = if row.funding_goal_cents > 0 {
        stats.total_raised_cents as f64 / row.funding_goal_cents as f64 * 100.0
    } else {
        0.0
    };

    Ok(CampaignResponse {
        id: parse_uuid(&row.id)?,
        founder_id: parse_uuid(&row.founder_id)?,
        title: row.title,
        pitch: row.pitch,
        funding_goal_cents: row.funding_goal_cents,
        minimum_investment_cents: row.minimum_investment_cents,
        deadline: row.deadline.as_deref().map(parse_sqlite_datetime),
        status: parse_status(&row.status)?,
        discount_rate_bps: row.discount_rate_bps,
        valuation_cap_cents: row.valuation_cap_cents,
        private_link: include_private_link.then_some(row.private_link),
        team: row.team.as_deref().and_then(|t| serde_json::from_str(t).ok()),
        use_of_funds: row
            .use_of_funds
            .as_deref()
            .and_then(|u| serde_json::from_str(u).ok()),
        stats: CampaignStats {
            total_raised_cents: stats.total_raised_cents,
            investor_count: stats.investor_count,
            goal_reached: stats.total_raised_cents >= row.funding_goal_cents,
            progress_percent,
        },
        created_at: parse_sqlite_datetime(&row.created_at),
    })
}

fn update_response(row: CampaignUpdateRow) -> Result<CampaignUpdateResponse, ApiError> {
    Ok(CampaignUpdateResponse {
        id: parse_uuid(&row.id)?,
        campaign_id: parse_uuid(&row.campaign_id)?,
        title: row.title,
        body: row.body,
        is_public: row.is_public,
        scheduled_for: row.scheduled_for.as_deref().map(parse_sqlite_datetime),
        created_at: parse_sqlite_datetime(&row.created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_json, claims_for, test_state};

    fn campaign_request(funding_goal_cents: i64) -> CreateCampaignRequest {
        CreateCampaignRequest {
            title: "Solar Micro-Grid".into(),
            pitch: "Pay-as-you-go solar for rural communities.".into(),
            funding_goal_cents,
            minimum_investment_cents: None,
            deadline: None,
            discount_rate_bps: 2000,
            valuation_cap_cents: 100_000_000,
            team: None,
            use_of_funds: None,
        }
    }

    #[tokio::test]
    async fn funding_goal_above_cap_is_rejected() {
        let state = test_state();
        let founder = claims_for(&state, "founder@example.com", UserType::Founder);

        // $150,000 goal against the $100,000 default cap
        let err = create_campaign(
            State(state.clone()),
            Extension(founder.clone()),
            Json(campaign_request(15_000_000)),
        )
        .await
        .err()
        .unwrap();
        match err {
            ApiError::Validation(msg) => assert!(msg.contains("$100,000.00"), "{}", msg),
            other => panic!("expected validation error, got {:?}", other),
        }

        // Exactly at the cap is fine
        let result = create_campaign(
            State(state),
            Extension(founder),
            Json(campaign_request(10_000_000)),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn private_link_is_withheld_from_public_callers() {
        let state = test_state();
        let founder = claims_for(&state, "founder@example.com", UserType::Founder);

        let created = body_json(
            create_campaign(
                State(state.clone()),
                Extension(founder.clone()),
                Json(campaign_request(5_000_000)),
            )
            .await
            .unwrap()
            .into_response(),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();
        assert!(created["private_link"].is_string());

        state.db.update_campaign_status(&id, "active").unwrap();

        // Anonymous list: campaign visible, link withheld
        let listed = body_json(
            list_campaigns(State(state.clone()), None, Query(CampaignQuery { status: None }))
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert!(listed[0]["private_link"].is_null());

        // Anonymous get by id: same
        let fetched = body_json(
            get_campaign(State(state.clone()), Path(id.parse().unwrap()), None)
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert!(fetched["private_link"].is_null());

        // The founder gets their link back
        let fetched = body_json(
            get_campaign(
                State(state),
                Path(id.parse().unwrap()),
                Some(Extension(founder)),
            )
            .await
            .unwrap()
            .into_response(),
        )
        .await;
        assert!(fetched["private_link"].is_string());
    }

    #[tokio::test]
    async fn drafts_are_invisible_to_public_callers() {
        let state = test_state();
        let founder = claims_for(&state, "founder@example.com", UserType::Founder);

        // Left in draft
        let created = body_json(
            create_campaign(
                State(state.clone()),
                Extension(founder.clone()),
                Json(campaign_request(5_000_000)),
            )
            .await
            .unwrap()
            .into_response(),
        )
        .await;
        let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();

        let listed = body_json(
            list_campaigns(State(state.clone()), None, Query(CampaignQuery { status: None }))
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert!(listed.as_array().unwrap().is_empty());

        let err = get_campaign(State(state.clone()), Path(id), None).await.err();
        assert!(matches!(err, Some(ApiError::NotFound(_))));

        // The founder still sees their own draft in the list
        let mine = body_json(
            list_campaigns(
                State(state),
                Some(Extension(founder)),
                Query(CampaignQuery { status: None }),
            )
            .await
            .unwrap()
            .into_response(),
        )
        .await;
        assert_eq!(mine.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn anonymous_callers_see_only_public_updates() {
        let state = test_state();
        let founder = claims_for(&state, "founder@example.com", UserType::Founder);

        let created = body_json(
            create_campaign(
                State(state.clone()),
                Extension(founder.clone()),
                Json(campaign_request(5_000_000)),
            )
            .await
            .unwrap()
            .into_response(),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();
        state.db.update_campaign_status(&id, "active").unwrap();

        let public_update = Uuid::new_v4().to_string();
        let private_update = Uuid::new_v4().to_string();
        state
            .db
            .insert_campaign_update(&public_update, &id, "Milestone reached", "We shipped.", true, None)
            .unwrap();
        state
            .db
            .insert_campaign_update(&private_update, &id, "Investor briefing", "Numbers.", false, None)
            .unwrap();
        let campaign_id: Uuid = id.parse().unwrap();

        let public = body_json(
            list_campaign_updates(State(state.clone()), Path(campaign_id), None)
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert_eq!(public.as_array().unwrap().len(), 1);
        assert_eq!(public[0]["title"], "Milestone reached");

        let owners = body_json(
            list_campaign_updates(State(state), Path(campaign_id), Some(Extension(founder)))
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert_eq!(owners.as_array().unwrap().len(), 2);
    }
}
