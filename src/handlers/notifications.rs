use crate::{errors::ServiceError, services::notifications::EmailKind, AppState};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;

const VALID_TYPES: &str = "welcome, orderShipped, orderDelivered, orderCancelled";

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendEmailRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
}

/// Dispatch a transactional notification through the mail collaborator
#[utoipa::path(
    post,
    path = "/api/send-email",
    request_body = SendEmailRequest,
    responses(
        (status = 200, description = "Notification dispatched", body = SendEmailResponse),
        (status = 400, description = "Missing fields or unknown type", body = crate::errors::ErrorResponse),
        (status = 500, description = "Mail provider failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Notifications"
)]
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendEmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (to, subject, kind, data) = match (
        payload.to,
        payload.subject,
        payload.kind,
        payload.data,
    ) {
        (Some(to), Some(subject), Some(kind), Some(data)) => (to, subject, kind, data),
        _ => {
            return Err(ServiceError::BadRequest(
                "Missing required fields: to, subject, type, data".to_string(),
            ))
        }
    };

    let kind = EmailKind::from_str(&kind).map_err(|_| {
        ServiceError::BadRequest(format!(
            "Invalid email type. Must be one of: {}",
            VALID_TYPES
        ))
    })?;

    let message_id = state
        .services
        .notifications
        .send(&to, &subject, kind, &data)
        .await?;

    Ok((
        StatusCode::OK,
        Json(SendEmailResponse {
            success: true,
            message: "Email sent successfully".to_string(),
            message_id,
        }),
    ))
}
