use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub agent: AgentInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String, // agent_id
    pub name: String,
    pub role: Role,
    pub exp: usize, // expiration timestamp
    pub iat: usize, // issued at
}

/// Явное значение сессии, передаётся в каждый вызов оркестратора.
/// Ядро — чистая функция (state, action, actor), скрытого глобального
/// состояния сессии нет.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub agent_id: String,
    pub agent_name: String,
    pub role: Role,
    pub login_time: DateTime<Utc>,
}

impl Session {
    pub fn new(agent_id: impl Into<String>, agent_name: impl Into<String>, role: Role) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            role,
            login_time: Utc::now(),
        }
    }
}
