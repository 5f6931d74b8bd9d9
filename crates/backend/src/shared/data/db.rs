use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Minimal schema bootstrap: parent row, the five child tables keyed by
/// consumer_account_id, and the system tables for agents/auth.
const SCHEMA_BOOTSTRAP: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS a001_consumer_account (
        id TEXT PRIMARY KEY NOT NULL,
        consumer_number TEXT NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        address TEXT NOT NULL DEFAULT '',
        registered_at TEXT NOT NULL,
        registered_by TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL,
        bill_details_excel TEXT NOT NULL DEFAULT '',
        evaluation_sheet TEXT,
        evaluation_uploaded_by TEXT,
        evaluation_uploaded_at TEXT,
        proposal_sheet TEXT,
        proposal_uploaded_by TEXT,
        proposal_uploaded_at TEXT,
        assigned_to TEXT,
        last_updated TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a001_bill_file (
        id TEXT PRIMARY KEY NOT NULL,
        consumer_account_id TEXT NOT NULL,
        file_name TEXT NOT NULL,
        month TEXT NOT NULL,
        year INTEGER NOT NULL,
        download_url TEXT NOT NULL DEFAULT ''
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_a001_bill_file_account
        ON a001_bill_file (consumer_account_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a001_work_list_item (
        id TEXT PRIMARY KEY NOT NULL,
        consumer_account_id TEXT NOT NULL,
        description TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT '',
        priority TEXT NOT NULL DEFAULT 'medium',
        completed_at TEXT
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_a001_work_list_item_account
        ON a001_work_list_item (consumer_account_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a001_note (
        id TEXT PRIMARY KEY NOT NULL,
        consumer_account_id TEXT NOT NULL,
        text TEXT NOT NULL,
        created_by TEXT NOT NULL,
        created_by_name TEXT NOT NULL DEFAULT '',
        action TEXT,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_a001_note_account
        ON a001_note (consumer_account_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a001_audit_log (
        id TEXT PRIMARY KEY NOT NULL,
        consumer_account_id TEXT NOT NULL,
        action TEXT NOT NULL,
        performed_by TEXT NOT NULL,
        performed_by_name TEXT NOT NULL DEFAULT '',
        details TEXT,
        timestamp TEXT NOT NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_a001_audit_log_account
        ON a001_audit_log (consumer_account_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a001_payment (
        consumer_account_id TEXT PRIMARY KEY NOT NULL,
        service_fee TEXT NOT NULL,
        payment_type TEXT NOT NULL,
        number_of_installments INTEGER,
        amount_per_installment TEXT,
        transaction_id TEXT,
        transaction_date TEXT,
        receipt_url TEXT,
        paid_by TEXT,
        paid_at TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sys_agents (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone TEXT NOT NULL DEFAULT '',
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT,
        updated_at TEXT,
        last_login TEXT,
        created_by TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sys_refresh_tokens (
        id TEXT PRIMARY KEY NOT NULL,
        agent_id TEXT NOT NULL,
        token_hash TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        revoked_at TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sys_settings (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    );
    "#,
];

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/app.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    for statement in SCHEMA_BOOTSTRAP {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            statement.to_string(),
        ))
        .await?;
    }

    tracing::info!("Database initialized at {}", db_file);

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}
