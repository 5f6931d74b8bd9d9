use anyhow::Result;

/// Ensure admin agent exists (create if table is empty)
pub async fn ensure_admin_agent_exists() -> Result<()> {
    use crate::system::agents::{repository, service};
    use contracts::enums::Role;
    use contracts::system::agents::CreateAgentDto;

    let count = repository::count_agents().await?;

    if count == 0 {
        tracing::info!("No agents found. Creating default admin agent...");

        let admin_dto = CreateAgentDto {
            name: "Administrator".to_string(),
            email: "admin@local".to_string(),
            password: "admin123".to_string(),
            phone: None,
            role: Role::Admin,
        };

        let admin_id = service::create(admin_dto, None).await?;

        tracing::warn!("═══════════════════════════════════════════════");
        tracing::warn!("  Default admin agent created!");
        tracing::warn!("  Email:    admin@local");
        tracing::warn!("  Password: admin123");
        tracing::warn!("  Agent ID: {}", admin_id);
        tracing::warn!("  PLEASE CHANGE THE PASSWORD IMMEDIATELY!");
        tracing::warn!("═══════════════════════════════════════════════");
    }

    Ok(())
}
