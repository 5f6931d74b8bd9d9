use axum::{
    extract::{Json, Path},
    http::StatusCode,
};
use contracts::system::agents::{Agent, ChangePasswordDto, CreateAgentDto, UpdateAgentDto};

use crate::system::agents::service;
use crate::system::auth::extractor::CurrentSession;

/// List all agents (admin only)
pub async fn list(CurrentSession(_session): CurrentSession) -> Result<Json<Vec<Agent>>, StatusCode> {
    let agents = service::list_all()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(agents))
}

/// Get agent by ID (admin only)
pub async fn get_by_id(
    CurrentSession(_session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<Agent>, StatusCode> {
    let agent = service::get_by_id(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(agent))
}

/// Create agent (admin only)
pub async fn create(
    CurrentSession(session): CurrentSession,
    Json(dto): Json<CreateAgentDto>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let agent_id = service::create(dto, Some(session.agent_id))
        .await
        .map_err(|e| {
            tracing::error!("Failed to create agent: {}", e);
            StatusCode::BAD_REQUEST
        })?;

    Ok(Json(serde_json::json!({"id": agent_id})))
}

/// Update agent (admin only)
pub async fn update(
    CurrentSession(_session): CurrentSession,
    Path(id): Path<String>,
    Json(mut dto): Json<UpdateAgentDto>,
) -> Result<StatusCode, StatusCode> {
    dto.id = id;

    service::update(dto).await.map_err(|e| {
        tracing::error!("Failed to update agent: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(StatusCode::OK)
}

/// Delete agent (admin only)
pub async fn delete(
    CurrentSession(_session): CurrentSession,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let deleted = service::delete(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if deleted {
        Ok(StatusCode::OK)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// Change password (own, or any agent's when admin)
pub async fn change_password(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(mut dto): Json<ChangePasswordDto>,
) -> Result<StatusCode, StatusCode> {
    dto.agent_id = id;

    service::change_password(dto, &session.agent_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to change password: {}", e);
            StatusCode::BAD_REQUEST
        })?;

    Ok(StatusCode::OK)
}
