use anyhow::Result;
use chrono::Utc;
use contracts::enums::Role;
use contracts::system::agents::{Agent, ChangePasswordDto, CreateAgentDto, UpdateAgentDto};

use super::repository;
use crate::system::auth::password;

/// Create a new agent
pub async fn create(dto: CreateAgentDto, created_by: Option<String>) -> Result<String> {
    if dto.name.trim().is_empty() {
        return Err(anyhow::anyhow!("Name cannot be empty"));
    }
    if !dto.email.contains('@') {
        return Err(anyhow::anyhow!("Invalid email format"));
    }

    if repository::get_by_email(&dto.email).await?.is_some() {
        return Err(anyhow::anyhow!("Email already registered"));
    }

    password::validate_password_strength(&dto.password)?;
    let password_hash = password::hash_password(&dto.password)?;

    let agent_id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    let agent = Agent {
        id: agent_id.clone(),
        name: dto.name,
        email: dto.email,
        phone: dto.phone.unwrap_or_default(),
        role: dto.role,
        active: true,
        created_at: now.clone(),
        updated_at: now,
        last_login: None,
        created_by,
    };

    repository::create_with_password(&agent, &password_hash).await?;

    Ok(agent_id)
}

/// Update agent profile and role
pub async fn update(dto: UpdateAgentDto) -> Result<()> {
    let mut agent = repository::get_by_id(&dto.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Agent not found"))?;

    if !dto.email.contains('@') {
        return Err(anyhow::anyhow!("Invalid email format"));
    }

    agent.name = dto.name;
    agent.email = dto.email;
    agent.phone = dto.phone.unwrap_or_default();
    agent.role = dto.role;
    agent.active = dto.active;
    agent.updated_at = Utc::now().to_rfc3339();

    repository::update(&agent).await?;

    Ok(())
}

/// Delete agent
pub async fn delete(id: &str) -> Result<bool> {
    repository::delete(id).await
}

/// Get agent by ID
pub async fn get_by_id(id: &str) -> Result<Option<Agent>> {
    repository::get_by_id(id).await
}

/// List all agents
pub async fn list_all() -> Result<Vec<Agent>> {
    repository::list_all().await
}

/// Change agent password
pub async fn change_password(dto: ChangePasswordDto, requester_id: &str) -> Result<()> {
    repository::get_by_id(&dto.agent_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Agent not found"))?;

    let requester = repository::get_by_id(requester_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Requester not found"))?;

    if dto.agent_id != requester_id {
        // Changing someone else's password requires the admin role
        if requester.role != Role::Admin {
            return Err(anyhow::anyhow!("Permission denied"));
        }
    } else if let Some(ref old_password) = dto.old_password {
        let current_hash = repository::get_password_hash(&dto.agent_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Password hash not found"))?;

        if !password::verify_password(old_password, &current_hash)? {
            return Err(anyhow::anyhow!("Invalid old password"));
        }
    }

    password::validate_password_strength(&dto.new_password)?;
    let new_hash = password::hash_password(&dto.new_password)?;

    repository::update_password(&dto.agent_id, &new_hash).await?;

    Ok(())
}

/// Verify agent credentials (for login)
pub async fn verify_credentials(email: &str, password_raw: &str) -> Result<Option<Agent>> {
    let agent = match repository::get_by_email(email).await? {
        Some(a) => a,
        None => return Ok(None),
    };

    if !agent.active {
        return Err(anyhow::anyhow!("Agent account is inactive"));
    }

    let password_hash = repository::get_password_hash(&agent.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Password hash not found"))?;

    if !password::verify_password(password_raw, &password_hash)? {
        return Ok(None);
    }

    let _ = repository::update_last_login(&agent.id).await;

    Ok(Some(agent))
}
