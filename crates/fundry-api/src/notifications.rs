use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use fundry_db::queries::MarkReadOutcome;
use fundry_types::api::{Claims, NotificationListResponse, NotificationResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{parse_sqlite_datetime, parse_uuid};

/// Newest-first notification feed, polled by the client.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();

    let rows = state
        .db
        .list_notifications(&user_id)
        .map_err(ApiError::Internal)?;
    let unread_count = state
        .db
        .unread_notification_count(&user_id)
        .map_err(ApiError::Internal)?;

    let notifications = rows
        .into_iter()
        .map(|row| {
            Ok(NotificationResponse {
                id: parse_uuid(&row.id)?,
                kind: row.kind,
                title: row.title,
                message: row.message,
                metadata: row.metadata.as_deref().and_then(|m| serde_json::from_str(m).ok()),
                is_read: row.is_read,
                created_at: parse_sqlite_datetime(&row.created_at),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Json(NotificationListResponse {
        notifications,
        unread_count,
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .db
        .mark_notification_read(&notification_id.to_string(), &claims.sub.to_string())
        .map_err(ApiError::Internal)?;

    match outcome {
        MarkReadOutcome::Updated => Ok(Json(serde_json::json!({ "is_read": true }))),
        MarkReadOutcome::NotOwner => Err(ApiError::Forbidden(
            "notification belongs to another user".into(),
        )),
        MarkReadOutcome::Missing => Err(ApiError::NotFound("notification not found".into())),
    }
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = state
        .db
        .mark_all_notifications_read(&claims.sub.to_string())
        .map_err(ApiError::Internal)?;

    Ok(Json(serde_json::json!({ "marked_read": changed })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_json, claims_for, test_state};
    use axum::response::IntoResponse;
    use fundry_types::models::UserType;

    #[tokio::test]
    async fn corrupt_notification_id_is_an_error_not_a_nil_uuid() {
        let state = test_state();
        let user = claims_for(&state, "a@example.com", UserType::Investor);
        state
            .db
            .insert_notification("not-a-uuid", &user.sub.to_string(), "campaign_update", "t", "m", None)
            .unwrap();

        let result = list_notifications(State(state), Extension(user)).await;
        assert!(matches!(result.err(), Some(ApiError::Internal(_))));
    }

    #[tokio::test]
    async fn list_reports_unread_count() {
        let state = test_state();
        let user = claims_for(&state, "a@example.com", UserType::Investor);
        for _ in 0..2 {
            state
                .db
                .insert_notification(
                    &Uuid::new_v4().to_string(),
                    &user.sub.to_string(),
                    "campaign_update",
                    "Update",
                    "msg",
                    None,
                )
                .unwrap();
        }

        let body = body_json(
            list_notifications(State(state), Extension(user))
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert_eq!(body["unread_count"], 2);
        assert_eq!(body["notifications"].as_array().unwrap().len(), 2);
    }
}
