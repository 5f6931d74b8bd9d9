use anyhow::{Context, Result};
use contracts::enums::Role;
use contracts::system::agents::Agent;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use crate::shared::data::db::get_connection;

fn agent_from_row(row: &sea_orm::QueryResult) -> Result<Agent> {
    let role_raw: String = row.try_get("", "role")?;
    Ok(Agent {
        id: row.try_get("", "id")?,
        name: row.try_get("", "name")?,
        email: row.try_get("", "email")?,
        phone: row.try_get("", "phone")?,
        role: Role::from_code(&role_raw)
            .ok_or_else(|| anyhow::anyhow!("Unknown role '{}' in store", role_raw))?,
        active: row.try_get::<i32>("", "active")? != 0,
        created_at: row.try_get("", "created_at")?,
        updated_at: row.try_get("", "updated_at")?,
        last_login: row.try_get("", "last_login").ok(),
        created_by: row.try_get("", "created_by").ok(),
    })
}

const AGENT_COLUMNS: &str =
    "id, name, email, phone, role, active, created_at, updated_at, last_login, created_by";

/// Create agent with password hash
pub async fn create_with_password(agent: &Agent, password_hash: &str) -> Result<()> {
    let conn = get_connection();

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO sys_agents (id, name, email, phone, password_hash, role, active, created_at, updated_at, last_login, created_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            agent.id.clone().into(),
            agent.name.clone().into(),
            agent.email.clone().into(),
            agent.phone.clone().into(),
            password_hash.to_string().into(),
            agent.role.code().into(),
            (if agent.active { 1 } else { 0 }).into(),
            agent.created_at.clone().into(),
            agent.updated_at.clone().into(),
            agent.last_login.clone().into(),
            agent.created_by.clone().into(),
        ],
    ))
    .await
    .context("Failed to insert agent")?;

    Ok(())
}

/// Get agent by ID
pub async fn get_by_id(id: &str) -> Result<Option<Agent>> {
    let conn = get_connection();

    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("SELECT {} FROM sys_agents WHERE id = ?", AGENT_COLUMNS),
            [id.into()],
        ))
        .await?;

    result.map(|row| agent_from_row(&row)).transpose()
}

/// Get agent by login email
pub async fn get_by_email(email: &str) -> Result<Option<Agent>> {
    let conn = get_connection();

    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("SELECT {} FROM sys_agents WHERE email = ?", AGENT_COLUMNS),
            [email.into()],
        ))
        .await?;

    result.map(|row| agent_from_row(&row)).transpose()
}

/// Get password hash for agent
pub async fn get_password_hash(agent_id: &str) -> Result<Option<String>> {
    let conn = get_connection();

    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT password_hash FROM sys_agents WHERE id = ?",
            [agent_id.into()],
        ))
        .await?;

    match result {
        Some(row) => {
            let hash: String = row.try_get("", "password_hash")?;
            Ok(Some(hash))
        }
        None => Ok(None),
    }
}

/// List all agents
pub async fn list_all() -> Result<Vec<Agent>> {
    let conn = get_connection();

    let rows = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!(
                "SELECT {} FROM sys_agents ORDER BY created_at DESC",
                AGENT_COLUMNS
            ),
        ))
        .await?;

    rows.iter().map(agent_from_row).collect()
}

/// Update agent profile fields
pub async fn update(agent: &Agent) -> Result<()> {
    let conn = get_connection();

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_agents \
         SET name = ?, email = ?, phone = ?, role = ?, active = ?, updated_at = ? \
         WHERE id = ?",
        [
            agent.name.clone().into(),
            agent.email.clone().into(),
            agent.phone.clone().into(),
            agent.role.code().into(),
            (if agent.active { 1 } else { 0 }).into(),
            agent.updated_at.clone().into(),
            agent.id.clone().into(),
        ],
    ))
    .await
    .context("Failed to update agent")?;

    Ok(())
}

/// Delete agent (hard delete)
pub async fn delete(id: &str) -> Result<bool> {
    let conn = get_connection();

    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "DELETE FROM sys_agents WHERE id = ?",
            [id.into()],
        ))
        .await
        .context("Failed to delete agent")?;

    Ok(result.rows_affected() > 0)
}

/// Update last login timestamp
pub async fn update_last_login(id: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let conn = get_connection();

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_agents SET last_login = ? WHERE id = ?",
        [now.into(), id.to_string().into()],
    ))
    .await
    .context("Failed to update last login")?;

    Ok(())
}

/// Count total agents
pub async fn count_agents() -> Result<usize> {
    let conn = get_connection();

    let result = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) as count FROM sys_agents".to_string(),
        ))
        .await?;

    match result {
        Some(row) => {
            let count: i64 = row.try_get("", "count")?;
            Ok(count as usize)
        }
        None => Ok(0),
    }
}

/// Update agent password
pub async fn update_password(id: &str, password_hash: &str) -> Result<()> {
    let conn = get_connection();

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_agents SET password_hash = ?, updated_at = ? WHERE id = ?",
        [
            password_hash.to_string().into(),
            chrono::Utc::now().to_rfc3339().into(),
            id.to_string().into(),
        ],
    ))
    .await
    .context("Failed to update password")?;

    Ok(())
}
