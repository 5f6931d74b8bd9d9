use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::domain::a001_consumer::aggregate::{
    AuditEntry, BillFile, Consumer, ConsumerId, InstallmentPlan, Note, Payment, WorkListItem,
};
use contracts::domain::common::{EntityMetadata, WorkflowError};
use contracts::enums::{ConsumerStatus, DashboardTab, PaymentType, WorkPriority};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseTransaction, Set, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_consumer_account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub consumer_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub registered_at: String,
    pub registered_by: String,
    pub status: String,
    pub bill_details_excel: String,
    pub evaluation_sheet: Option<String>,
    pub evaluation_uploaded_by: Option<String>,
    pub evaluation_uploaded_at: Option<String>,
    pub proposal_sheet: Option<String>,
    pub proposal_uploaded_by: Option<String>,
    pub proposal_uploaded_at: Option<String>,
    pub assigned_to: Option<String>,
    pub last_updated: String,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn parse_status(raw: &str) -> ConsumerStatus {
    ConsumerStatus::from_label(raw).unwrap_or_else(|| {
        tracing::warn!("Unknown consumer status '{}' in store, treating as Inactive", raw);
        ConsumerStatus::Inactive
    })
}

fn parse_ts(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>().unwrap_or_else(|_| Utc::now())
}

fn parse_ts_opt(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| s.parse::<DateTime<Utc>>().ok())
}

impl From<Model> for Consumer {
    /// Собирает агрегат из родительской строки; дочерние коллекции
    /// заполняет loader
    fn from(m: Model) -> Self {
        let registered_at = parse_ts(&m.registered_at);
        let metadata = EntityMetadata {
            created_at: registered_at,
            updated_at: parse_ts(&m.last_updated),
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        Consumer {
            id: ConsumerId::new(uuid),
            consumer_number: m.consumer_number,
            name: m.name,
            email: m.email,
            phone: m.phone,
            address: m.address,
            registered_at,
            registered_by: m.registered_by,
            status: parse_status(&m.status),
            bill_files: Vec::new(),
            bill_details_excel: m.bill_details_excel,
            evaluation_sheet: m.evaluation_sheet,
            evaluation_uploaded_by: m.evaluation_uploaded_by,
            evaluation_uploaded_at: parse_ts_opt(m.evaluation_uploaded_at),
            proposal_sheet: m.proposal_sheet,
            proposal_uploaded_by: m.proposal_uploaded_by,
            proposal_uploaded_at: parse_ts_opt(m.proposal_uploaded_at),
            work_list: Vec::new(),
            notes: Vec::new(),
            payment: None,
            assigned_to: m.assigned_to,
            metadata,
        }
    }
}

fn store_err(e: impl std::fmt::Display) -> WorkflowError {
    WorkflowError::Store(e.to_string())
}

// ============================================================================
// Parent queries
// ============================================================================

pub async fn get_by_id(id: &str) -> Result<Option<Model>> {
    let db = get_connection();
    Ok(Entity::find_by_id(id).one(db).await?)
}

pub async fn find_by_consumer_number(number: &str) -> Result<Option<Model>> {
    let db = get_connection();
    Ok(Entity::find()
        .filter(Column::ConsumerNumber.eq(number))
        .one(db)
        .await?)
}

/// Ключ сортировки списка на дашборде
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsumerSort {
    /// Недавно изменённые первыми
    #[default]
    LastUpdated,
    Name,
    Status,
}

impl ConsumerSort {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "last_updated" => Some(Self::LastUpdated),
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    fn order_clause(self) -> &'static str {
        match self {
            Self::LastUpdated => "last_updated DESC",
            Self::Name => "name COLLATE NOCASE ASC",
            Self::Status => "status ASC, last_updated DESC",
        }
    }
}

/// Экранирование метасимволов LIKE; шаблон всегда идёт bind-параметром
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Список родительских строк для дашборда: фильтр по вкладке через
/// вычисленный IN-список статусов, поиск по номеру/имени/email/телефону
pub async fn list_parents(
    tab: Option<DashboardTab>,
    search: Option<&str>,
    sort: ConsumerSort,
) -> Result<Vec<Model>> {
    let db = get_connection();

    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<sea_orm::Value> = Vec::new();

    if let Some(tab) = tab {
        // Метки статусов — внутренние константы, не пользовательский ввод
        let labels: Vec<String> = ConsumerStatus::all()
            .into_iter()
            .filter(|s| s.in_tab(tab))
            .map(|s| format!("'{}'", s.label()))
            .collect();
        conditions.push(format!("status IN ({})", labels.join(", ")));
    }

    if let Some(search) = search {
        let trimmed = search.trim();
        if !trimmed.is_empty() {
            let pattern = format!("%{}%", escape_like(trimmed));
            conditions.push(
                "(consumer_number LIKE ? ESCAPE '\\' OR name LIKE ? ESCAPE '\\' \
                 OR email LIKE ? ESCAPE '\\' OR phone LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            for _ in 0..4 {
                values.push(pattern.clone().into());
            }
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT * FROM a001_consumer_account {} ORDER BY {}",
        where_clause,
        sort.order_clause()
    );

    let models = Entity::find()
        .from_raw_sql(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            values,
        ))
        .all(db)
        .await?;

    Ok(models)
}

// ============================================================================
// Registration
// ============================================================================

/// Регистрация в одной транзакции: родительская строка, помесячные
/// счета, стартовая заметка и запись аудита
pub async fn insert_registration(
    consumer: &Consumer,
    note: &Note,
    audit: &AuditEntry,
) -> Result<(), WorkflowError> {
    let db = get_connection();
    let txn = db.begin().await.map_err(store_err)?;

    let id_str = consumer.to_string_id();

    let active_model = ActiveModel {
        id: Set(id_str.clone()),
        consumer_number: Set(consumer.consumer_number.clone()),
        name: Set(consumer.name.clone()),
        email: Set(consumer.email.clone()),
        phone: Set(consumer.phone.clone()),
        address: Set(consumer.address.clone()),
        registered_at: Set(consumer.registered_at.to_rfc3339()),
        registered_by: Set(consumer.registered_by.clone()),
        status: Set(consumer.status.label().to_string()),
        bill_details_excel: Set(consumer.bill_details_excel.clone()),
        evaluation_sheet: Set(None),
        evaluation_uploaded_by: Set(None),
        evaluation_uploaded_at: Set(None),
        proposal_sheet: Set(None),
        proposal_uploaded_by: Set(None),
        proposal_uploaded_at: Set(None),
        assigned_to: Set(consumer.assigned_to.clone()),
        last_updated: Set(consumer.last_updated().to_rfc3339()),
        version: Set(consumer.metadata.version),
    };
    Entity::insert(active_model)
        .exec(&txn)
        .await
        .map_err(store_err)?;

    for bill_file in &consumer.bill_files {
        insert_bill_file_txn(&txn, &id_str, bill_file)
            .await
            .map_err(store_err)?;
    }

    insert_note_txn(&txn, &id_str, note)
        .await
        .map_err(store_err)?;
    insert_audit_txn(&txn, &id_str, audit)
        .await
        .map_err(store_err)?;

    txn.commit().await.map_err(store_err)?;
    Ok(())
}

async fn insert_bill_file_txn(
    txn: &DatabaseTransaction,
    consumer_id: &str,
    bill_file: &BillFile,
) -> Result<(), DbErr> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO a001_bill_file (id, consumer_account_id, file_name, month, year, download_url) \
         VALUES (?, ?, ?, ?, ?, ?)",
        vec![
            Uuid::new_v4().to_string().into(),
            consumer_id.into(),
            bill_file.file_name.clone().into(),
            bill_file.month.clone().into(),
            bill_file.year.into(),
            bill_file.download_url.clone().into(),
        ],
    );
    txn.execute(stmt).await?;
    Ok(())
}

async fn insert_note_txn(
    txn: &DatabaseTransaction,
    consumer_id: &str,
    note: &Note,
) -> Result<(), DbErr> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO a001_note (id, consumer_account_id, text, created_by, created_by_name, action, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        vec![
            note.id.clone().into(),
            consumer_id.into(),
            note.text.clone().into(),
            note.created_by.clone().into(),
            note.created_by_name.clone().into(),
            note.action.clone().into(),
            note.created_at.to_rfc3339().into(),
        ],
    );
    txn.execute(stmt).await?;
    Ok(())
}

async fn insert_audit_txn(
    txn: &DatabaseTransaction,
    consumer_id: &str,
    entry: &AuditEntry,
) -> Result<(), DbErr> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO a001_audit_log (id, consumer_account_id, action, performed_by, performed_by_name, details, timestamp) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        vec![
            entry.id.clone().into(),
            consumer_id.into(),
            entry.action.clone().into(),
            entry.performed_by.clone().into(),
            entry.performed_by_name.clone().into(),
            entry.details.clone().into(),
            entry.timestamp.to_rfc3339().into(),
        ],
    );
    txn.execute(stmt).await?;
    Ok(())
}

// ============================================================================
// Guarded transition
// ============================================================================

/// Загрузка листа оценки/предложения вместе с переходом статуса
#[derive(Debug, Clone)]
pub struct SheetUpload {
    pub url: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Изменения родительской строки, применяемые одним guarded UPDATE
#[derive(Debug, Clone, Default)]
pub struct ParentPatch {
    pub status: Option<ConsumerStatus>,
    pub evaluation: Option<SheetUpload>,
    pub proposal: Option<SheetUpload>,
}

/// Смена статуса + заметка журнала + (опционально) платёжная подзапись —
/// атомарно, под optimistic lock по version.
///
/// UPDATE ... WHERE id = ? AND version = ?; ноль затронутых строк
/// означает либо исчезнувший счёт (NotFound), либо гонку записи
/// (ConcurrentModification).
pub async fn apply_transition(
    consumer_id: &str,
    expected_version: i32,
    patch: &ParentPatch,
    note: Option<&Note>,
    payment: Option<&Payment>,
) -> Result<(), WorkflowError> {
    let db = get_connection();
    let txn = db.begin().await.map_err(store_err)?;

    let mut sets = vec!["last_updated = ?".to_string(), "version = version + 1".to_string()];
    let mut values: Vec<sea_orm::Value> = vec![Utc::now().to_rfc3339().into()];

    if let Some(status) = patch.status {
        sets.push("status = ?".to_string());
        values.push(status.label().into());
    }
    if let Some(ref upload) = patch.evaluation {
        sets.push("evaluation_sheet = ?".to_string());
        sets.push("evaluation_uploaded_by = ?".to_string());
        sets.push("evaluation_uploaded_at = ?".to_string());
        values.push(upload.url.clone().into());
        values.push(upload.uploaded_by.clone().into());
        values.push(upload.uploaded_at.to_rfc3339().into());
    }
    if let Some(ref upload) = patch.proposal {
        sets.push("proposal_sheet = ?".to_string());
        sets.push("proposal_uploaded_by = ?".to_string());
        sets.push("proposal_uploaded_at = ?".to_string());
        values.push(upload.url.clone().into());
        values.push(upload.uploaded_by.clone().into());
        values.push(upload.uploaded_at.to_rfc3339().into());
    }

    values.push(consumer_id.into());
    values.push(expected_version.into());

    let sql = format!(
        "UPDATE a001_consumer_account SET {} WHERE id = ? AND version = ?",
        sets.join(", ")
    );
    let result = txn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            values,
        ))
        .await
        .map_err(store_err)?;

    if result.rows_affected() == 0 {
        txn.rollback().await.map_err(store_err)?;
        let exists = get_by_id(consumer_id).await.map_err(store_err)?.is_some();
        return if exists {
            Err(WorkflowError::ConcurrentModification)
        } else {
            Err(WorkflowError::not_found(consumer_id))
        };
    }

    if let Some(note) = note {
        insert_note_txn(&txn, consumer_id, note)
            .await
            .map_err(store_err)?;
    }

    if let Some(payment) = payment {
        upsert_payment_txn(&txn, consumer_id, payment)
            .await
            .map_err(store_err)?;
    }

    txn.commit().await.map_err(store_err)?;
    Ok(())
}

async fn upsert_payment_txn(
    txn: &DatabaseTransaction,
    consumer_id: &str,
    payment: &Payment,
) -> Result<(), DbErr> {
    let (installments, per_installment) = match &payment.installment_plan {
        Some(plan) => (
            Some(plan.number_of_installments as i32),
            Some(plan.amount_per_installment.to_string()),
        ),
        None => (None, None),
    };

    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT OR REPLACE INTO a001_payment \
         (consumer_account_id, service_fee, payment_type, number_of_installments, \
          amount_per_installment, transaction_id, transaction_date, receipt_url, paid_by, paid_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            consumer_id.into(),
            payment.service_fee.to_string().into(),
            payment.payment_type.code().into(),
            installments.into(),
            per_installment.into(),
            payment.transaction_id.clone().into(),
            payment.transaction_date.clone().into(),
            payment.receipt_url.clone().into(),
            payment.paid_by.clone().into(),
            payment.paid_at.map(|t| t.to_rfc3339()).into(),
        ],
    );
    txn.execute(stmt).await?;
    Ok(())
}

// ============================================================================
// Journal and work list
// ============================================================================

/// Добавление свободного комментария: append в журнал + touch
/// last_updated, без смены версии
pub async fn append_note(consumer_id: &str, note: &Note) -> Result<(), WorkflowError> {
    let db = get_connection();
    let txn = db.begin().await.map_err(store_err)?;

    let result = txn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE a001_consumer_account SET last_updated = ? WHERE id = ?",
            vec![Utc::now().to_rfc3339().into(), consumer_id.into()],
        ))
        .await
        .map_err(store_err)?;

    if result.rows_affected() == 0 {
        txn.rollback().await.map_err(store_err)?;
        return Err(WorkflowError::not_found(consumer_id));
    }

    insert_note_txn(&txn, consumer_id, note)
        .await
        .map_err(store_err)?;

    txn.commit().await.map_err(store_err)?;
    Ok(())
}

/// Полная замена рабочего списка под optimistic lock
pub async fn save_work_list(
    consumer_id: &str,
    expected_version: i32,
    items: &[WorkListItem],
) -> Result<(), WorkflowError> {
    let db = get_connection();
    let txn = db.begin().await.map_err(store_err)?;

    let result = txn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE a001_consumer_account SET last_updated = ?, version = version + 1 \
             WHERE id = ? AND version = ?",
            vec![
                Utc::now().to_rfc3339().into(),
                consumer_id.into(),
                expected_version.into(),
            ],
        ))
        .await
        .map_err(store_err)?;

    if result.rows_affected() == 0 {
        txn.rollback().await.map_err(store_err)?;
        let exists = get_by_id(consumer_id).await.map_err(store_err)?.is_some();
        return if exists {
            Err(WorkflowError::ConcurrentModification)
        } else {
            Err(WorkflowError::not_found(consumer_id))
        };
    }

    txn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "DELETE FROM a001_work_list_item WHERE consumer_account_id = ?",
        vec![consumer_id.into()],
    ))
    .await
    .map_err(store_err)?;

    for item in items {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT INTO a001_work_list_item \
             (id, consumer_account_id, description, category, priority, completed_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            vec![
                item.id.clone().into(),
                consumer_id.into(),
                item.description.clone().into(),
                item.category.clone().into(),
                item.priority.code().into(),
                item.completed_at.map(|t| t.to_rfc3339()).into(),
            ],
        );
        txn.execute(stmt).await.map_err(store_err)?;
    }

    txn.commit().await.map_err(store_err)?;
    Ok(())
}

/// Запись аудита вне транзакции перехода (административные события)
pub async fn insert_audit_entry(consumer_id: &str, entry: &AuditEntry) -> Result<()> {
    let db = get_connection();
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO a001_audit_log (id, consumer_account_id, action, performed_by, performed_by_name, details, timestamp) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        vec![
            entry.id.clone().into(),
            consumer_id.into(),
            entry.action.clone().into(),
            entry.performed_by.clone().into(),
            entry.performed_by_name.clone().into(),
            entry.details.clone().into(),
            entry.timestamp.to_rfc3339().into(),
        ],
    );
    db.execute(stmt).await?;
    Ok(())
}

// ============================================================================
// Batch child loads
// ============================================================================

fn in_placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn ids_to_values(ids: &[String]) -> Vec<sea_orm::Value> {
    ids.iter().map(|id| id.clone().into()).collect()
}

/// Помесячные счета для набора лицевых счетов одним запросом
pub async fn load_bill_files(ids: &[String]) -> Result<HashMap<String, Vec<BillFile>>> {
    let mut map: HashMap<String, Vec<BillFile>> = HashMap::new();
    if ids.is_empty() {
        return Ok(map);
    }

    let db = get_connection();
    let sql = format!(
        "SELECT consumer_account_id, file_name, month, year, download_url \
         FROM a001_bill_file WHERE consumer_account_id IN ({}) \
         ORDER BY year, month",
        in_placeholders(ids.len())
    );
    let rows = db
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            ids_to_values(ids),
        ))
        .await?;

    for row in rows {
        let consumer_id: String = row.try_get("", "consumer_account_id")?;
        map.entry(consumer_id).or_default().push(BillFile {
            file_name: row.try_get("", "file_name").unwrap_or_default(),
            month: row.try_get("", "month").unwrap_or_default(),
            year: row.try_get::<i32>("", "year").unwrap_or_default(),
            download_url: row.try_get("", "download_url").unwrap_or_default(),
        });
    }
    Ok(map)
}

pub async fn load_work_lists(ids: &[String]) -> Result<HashMap<String, Vec<WorkListItem>>> {
    let mut map: HashMap<String, Vec<WorkListItem>> = HashMap::new();
    if ids.is_empty() {
        return Ok(map);
    }

    let db = get_connection();
    let sql = format!(
        "SELECT id, consumer_account_id, description, category, priority, completed_at \
         FROM a001_work_list_item WHERE consumer_account_id IN ({})",
        in_placeholders(ids.len())
    );
    let rows = db
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            ids_to_values(ids),
        ))
        .await?;

    for row in rows {
        let consumer_id: String = row.try_get("", "consumer_account_id")?;
        let priority_raw: String = row.try_get("", "priority").unwrap_or_default();
        map.entry(consumer_id).or_default().push(WorkListItem {
            id: row.try_get("", "id").unwrap_or_default(),
            description: row.try_get("", "description").unwrap_or_default(),
            category: row.try_get("", "category").unwrap_or_default(),
            priority: WorkPriority::from_code(&priority_raw).unwrap_or(WorkPriority::Medium),
            completed_at: parse_ts_opt(row.try_get("", "completed_at").ok()),
        });
    }
    Ok(map)
}

/// Журнал заметок в хронологическом порядке
pub async fn load_notes(ids: &[String]) -> Result<HashMap<String, Vec<Note>>> {
    let mut map: HashMap<String, Vec<Note>> = HashMap::new();
    if ids.is_empty() {
        return Ok(map);
    }

    let db = get_connection();
    let sql = format!(
        "SELECT id, consumer_account_id, text, created_by, created_by_name, action, created_at \
         FROM a001_note WHERE consumer_account_id IN ({}) \
         ORDER BY created_at ASC",
        in_placeholders(ids.len())
    );
    let rows = db
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            ids_to_values(ids),
        ))
        .await?;

    for row in rows {
        let consumer_id: String = row.try_get("", "consumer_account_id")?;
        let created_at_raw: String = row.try_get("", "created_at").unwrap_or_default();
        map.entry(consumer_id).or_default().push(Note {
            id: row.try_get("", "id").unwrap_or_default(),
            text: row.try_get("", "text").unwrap_or_default(),
            created_by: row.try_get("", "created_by").unwrap_or_default(),
            created_by_name: row.try_get("", "created_by_name").unwrap_or_default(),
            created_at: parse_ts(&created_at_raw),
            action: row.try_get("", "action").ok(),
        });
    }
    Ok(map)
}

pub async fn load_payments(ids: &[String]) -> Result<HashMap<String, Payment>> {
    let mut map: HashMap<String, Payment> = HashMap::new();
    if ids.is_empty() {
        return Ok(map);
    }

    let db = get_connection();
    let sql = format!(
        "SELECT consumer_account_id, service_fee, payment_type, number_of_installments, \
         amount_per_installment, transaction_id, transaction_date, receipt_url, paid_by, paid_at \
         FROM a001_payment WHERE consumer_account_id IN ({})",
        in_placeholders(ids.len())
    );
    let rows = db
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            ids_to_values(ids),
        ))
        .await?;

    for row in rows {
        let consumer_id: String = row.try_get("", "consumer_account_id")?;
        let fee_raw: String = row.try_get("", "service_fee").unwrap_or_default();
        let type_raw: String = row.try_get("", "payment_type").unwrap_or_default();

        let installment_plan = match (
            row.try_get::<i32>("", "number_of_installments").ok(),
            row.try_get::<String>("", "amount_per_installment").ok(),
        ) {
            (Some(n), Some(amount)) if n > 0 => Some(InstallmentPlan {
                number_of_installments: n as u32,
                amount_per_installment: Decimal::from_str(&amount).unwrap_or_default(),
            }),
            _ => None,
        };

        map.insert(
            consumer_id,
            Payment {
                service_fee: Decimal::from_str(&fee_raw).unwrap_or_default(),
                payment_type: PaymentType::from_code(&type_raw).unwrap_or(PaymentType::Full),
                installment_plan,
                transaction_id: row.try_get("", "transaction_id").ok(),
                transaction_date: row.try_get("", "transaction_date").ok(),
                receipt_url: row.try_get("", "receipt_url").ok(),
                paid_by: row.try_get("", "paid_by").ok(),
                paid_at: parse_ts_opt(row.try_get("", "paid_at").ok()),
            },
        );
    }
    Ok(map)
}

/// Аудит одного счёта, новые записи первыми
pub async fn load_audit_trail(consumer_id: &str) -> Result<Vec<AuditEntry>> {
    let db = get_connection();
    let rows = db
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT id, action, performed_by, performed_by_name, details, timestamp \
             FROM a001_audit_log WHERE consumer_account_id = ? \
             ORDER BY timestamp DESC",
            vec![consumer_id.into()],
        ))
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let timestamp_raw: String = row.try_get("", "timestamp").unwrap_or_default();
            AuditEntry {
                id: row.try_get("", "id").unwrap_or_default(),
                action: row.try_get("", "action").unwrap_or_default(),
                performed_by: row.try_get("", "performed_by").unwrap_or_default(),
                performed_by_name: row.try_get("", "performed_by_name").unwrap_or_default(),
                timestamp: parse_ts(&timestamp_raw),
                details: row.try_get("", "details").ok(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
