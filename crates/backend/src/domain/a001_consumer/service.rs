use chrono::Utc;
use contracts::domain::a001_consumer::aggregate::{
    AuditEntry, Consumer, Note, RegisterConsumerDto, WorkListItem, WorkListItemDto,
};
use contracts::domain::a001_consumer::workflow::{self, WorkflowAction};
use contracts::domain::common::WorkflowError;
use contracts::enums::{DashboardTab, PaymentType};
use contracts::system::auth::Session;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{loader, repository};
use crate::shared::export;

/// Полный агрегат плюс журнал аудита для детального экрана
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerDetail {
    pub consumer: Consumer,
    pub audit_trail: Vec<AuditEntry>,
}

fn store_err(e: impl std::fmt::Display) -> WorkflowError {
    WorkflowError::Store(e.to_string())
}

fn not_permitted(action: WorkflowAction, session: &Session) -> WorkflowError {
    WorkflowError::ActionNotAvailable {
        action: action.code().to_string(),
        role: session.role.code().to_string(),
    }
}

async fn load_or_not_found(consumer_id: &str) -> Result<Consumer, WorkflowError> {
    loader::load(consumer_id)
        .await
        .map_err(store_err)?
        .ok_or_else(|| WorkflowError::not_found(consumer_id))
}

/// Запись аудита вне транзакции перехода: неуспех не откатывает
/// уже применённый переход, только пишется в лог
async fn audit_best_effort(consumer_id: &str, entry: AuditEntry) {
    if let Err(e) = repository::insert_audit_entry(consumer_id, &entry).await {
        tracing::warn!(
            "Audit write failed for consumer {} (action '{}'): {}",
            consumer_id,
            entry.action,
            e
        );
    }
}

// ============================================================================
// Registration / queries
// ============================================================================

pub async fn register(
    session: &Session,
    dto: RegisterConsumerDto,
) -> Result<Consumer, WorkflowError> {
    dto.validate()?;

    if let Some(existing) = repository::find_by_consumer_number(&dto.consumer_number)
        .await
        .map_err(store_err)?
    {
        return Err(WorkflowError::validation(format!(
            "consumer number {} is already registered (account {})",
            dto.consumer_number, existing.id
        )));
    }

    let consumer = Consumer::new_for_registration(dto, session.agent_id.clone());
    let consumer_id = consumer.to_string_id();

    let note = Note::new(
        "Consumer registered",
        session.agent_id.clone(),
        session.agent_name.clone(),
        Some("Registration"),
    );
    let mut audit = AuditEntry::new(
        "Consumer Registered",
        session.agent_id.clone(),
        session.agent_name.clone(),
    );
    audit.details = Some(format!("Consumer number {}", consumer.consumer_number));

    repository::insert_registration(&consumer, &note, &audit).await?;

    tracing::info!(
        "Registered consumer {} ({}) by agent {}",
        consumer.consumer_number,
        consumer_id,
        session.agent_id
    );

    load_or_not_found(&consumer_id).await
}

pub async fn get(consumer_id: &str) -> Result<ConsumerDetail, WorkflowError> {
    let consumer = load_or_not_found(consumer_id).await?;
    let audit_trail = repository::load_audit_trail(consumer_id)
        .await
        .map_err(store_err)?;
    Ok(ConsumerDetail {
        consumer,
        audit_trail,
    })
}

pub async fn list(
    tab: Option<DashboardTab>,
    search: Option<&str>,
    sort: repository::ConsumerSort,
) -> Result<Vec<Consumer>, WorkflowError> {
    loader::load_all(tab, search, sort).await.map_err(store_err)
}

pub async fn export_csv(
    tab: Option<DashboardTab>,
    search: Option<&str>,
    sort: repository::ConsumerSort,
) -> Result<String, WorkflowError> {
    let consumers = list(tab, search, sort).await?;
    export::consumers_to_csv(&consumers).map_err(store_err)
}

/// Действия, доступные этому агенту для счёта в его текущем статусе
pub async fn available_actions(
    session: &Session,
    consumer_id: &str,
) -> Result<Vec<WorkflowAction>, WorkflowError> {
    let consumer = load_or_not_found(consumer_id).await?;
    Ok(workflow::available_actions(session.role, consumer.status))
}

// ============================================================================
// Workflow transitions
// ============================================================================

/// Обычное действие пайплайна: роль → легальность перехода → атомарное
/// применение (статус + заметка под optimistic lock). Необязательный
/// свободный текст актора попадает в заметку перехода; метка действия
/// ставится всегда.
pub async fn apply_action(
    session: &Session,
    consumer_id: &str,
    action_code: &str,
    note_text: Option<&str>,
) -> Result<Consumer, WorkflowError> {
    let action = WorkflowAction::from_code(action_code)
        .ok_or_else(|| WorkflowError::validation(format!("unknown action '{}'", action_code)))?;

    if !workflow::role_permits(session.role, action) {
        return Err(not_permitted(action, session));
    }

    let consumer = load_or_not_found(consumer_id).await?;
    let plan = workflow::plan_action(consumer.status, action)?;

    let text = note_text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(plan.label);
    let note = Note::new(
        text,
        session.agent_id.clone(),
        session.agent_name.clone(),
        Some(plan.label),
    );
    let patch = repository::ParentPatch {
        status: plan.new_status,
        ..Default::default()
    };
    repository::apply_transition(
        consumer_id,
        consumer.metadata.version,
        &patch,
        Some(&note),
        None,
    )
    .await?;

    tracing::info!(
        "Consumer {}: {} -> {:?} by agent {} ({})",
        consumer_id,
        consumer.status,
        plan.new_status,
        session.agent_id,
        plan.label
    );
    audit_best_effort(
        consumer_id,
        AuditEntry::new(plan.label, session.agent_id.clone(), session.agent_name.clone()),
    )
    .await;

    load_or_not_found(consumer_id).await
}

/// Завершение оценки вместе с загруженным листом расчётов
pub async fn attach_evaluation(
    session: &Session,
    consumer_id: &str,
    sheet_url: &str,
) -> Result<Consumer, WorkflowError> {
    let action = WorkflowAction::CompleteEvaluation;
    if !workflow::role_permits(session.role, action) {
        return Err(not_permitted(action, session));
    }
    if sheet_url.trim().is_empty() {
        return Err(WorkflowError::validation("evaluation sheet url is required"));
    }

    let consumer = load_or_not_found(consumer_id).await?;
    let plan = workflow::plan_action(consumer.status, action)?;

    let note = Note::new(
        plan.label,
        session.agent_id.clone(),
        session.agent_name.clone(),
        Some(plan.label),
    );
    let patch = repository::ParentPatch {
        status: plan.new_status,
        evaluation: Some(repository::SheetUpload {
            url: sheet_url.to_string(),
            uploaded_by: session.agent_id.clone(),
            uploaded_at: Utc::now(),
        }),
        ..Default::default()
    };
    repository::apply_transition(
        consumer_id,
        consumer.metadata.version,
        &patch,
        Some(&note),
        None,
    )
    .await?;

    audit_best_effort(
        consumer_id,
        AuditEntry::new(plan.label, session.agent_id.clone(), session.agent_name.clone()),
    )
    .await;

    load_or_not_found(consumer_id).await
}

/// Завершение подготовки предложения вместе с листом предложения
pub async fn attach_proposal(
    session: &Session,
    consumer_id: &str,
    sheet_url: &str,
) -> Result<Consumer, WorkflowError> {
    let action = WorkflowAction::CompleteProposal;
    if !workflow::role_permits(session.role, action) {
        return Err(not_permitted(action, session));
    }
    if sheet_url.trim().is_empty() {
        return Err(WorkflowError::validation("proposal sheet url is required"));
    }

    let consumer = load_or_not_found(consumer_id).await?;
    let plan = workflow::plan_action(consumer.status, action)?;

    let note = Note::new(
        plan.label,
        session.agent_id.clone(),
        session.agent_name.clone(),
        Some(plan.label),
    );
    let patch = repository::ParentPatch {
        status: plan.new_status,
        proposal: Some(repository::SheetUpload {
            url: sheet_url.to_string(),
            uploaded_by: session.agent_id.clone(),
            uploaded_at: Utc::now(),
        }),
        ..Default::default()
    };
    repository::apply_transition(
        consumer_id,
        consumer.metadata.version,
        &patch,
        Some(&note),
        None,
    )
    .await?;

    audit_best_effort(
        consumer_id,
        AuditEntry::new(plan.label, session.agent_id.clone(), session.agent_name.clone()),
    )
    .await;

    load_or_not_found(consumer_id).await
}

/// Вырожденный переход: прикрепляет платёжную подзапись, статус
/// не меняется, версия растёт
pub async fn enable_payment(
    session: &Session,
    consumer_id: &str,
    service_fee: Decimal,
    payment_type: PaymentType,
    installments: Option<u32>,
) -> Result<Consumer, WorkflowError> {
    let action = WorkflowAction::EnablePayment;
    if !workflow::role_permits(session.role, action) {
        return Err(not_permitted(action, session));
    }

    let consumer = load_or_not_found(consumer_id).await?;
    let plan = workflow::plan_enable_payment(consumer.status, service_fee, payment_type, installments)?;

    let note = Note::new(
        plan.note_text.clone(),
        session.agent_id.clone(),
        session.agent_name.clone(),
        Some(plan.label),
    );
    repository::apply_transition(
        consumer_id,
        consumer.metadata.version,
        &repository::ParentPatch::default(),
        Some(&note),
        Some(&plan.payment),
    )
    .await?;

    audit_best_effort(
        consumer_id,
        AuditEntry::new(plan.label, session.agent_id.clone(), session.agent_name.clone()),
    )
    .await;

    load_or_not_found(consumer_id).await
}

pub async fn mark_paid(
    session: &Session,
    consumer_id: &str,
    transaction_id: &str,
    transaction_date: &str,
    receipt_url: Option<String>,
) -> Result<Consumer, WorkflowError> {
    let action = WorkflowAction::MarkPaid;
    if !workflow::role_permits(session.role, action) {
        return Err(not_permitted(action, session));
    }

    let consumer = load_or_not_found(consumer_id).await?;
    let mut plan = workflow::plan_mark_paid(
        consumer.status,
        consumer.payment.as_ref(),
        transaction_id,
        transaction_date,
        &session.agent_id,
    )?;
    plan.payment.receipt_url = receipt_url;

    let note = Note::new(
        plan.note_text.clone(),
        session.agent_id.clone(),
        session.agent_name.clone(),
        Some(plan.label),
    );
    let patch = repository::ParentPatch {
        status: Some(plan.new_status),
        ..Default::default()
    };
    repository::apply_transition(
        consumer_id,
        consumer.metadata.version,
        &patch,
        Some(&note),
        Some(&plan.payment),
    )
    .await?;

    tracing::info!(
        "Consumer {} marked paid (txn {}) by agent {}",
        consumer_id,
        transaction_id,
        session.agent_id
    );
    audit_best_effort(
        consumer_id,
        AuditEntry::new(plan.label, session.agent_id.clone(), session.agent_name.clone()),
    )
    .await;

    load_or_not_found(consumer_id).await
}

// ============================================================================
// Journal and work list
// ============================================================================

/// Свободный комментарий: append-only, без метки действия
pub async fn add_comment(
    session: &Session,
    consumer_id: &str,
    text: &str,
) -> Result<Consumer, WorkflowError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::validation("comment text cannot be empty"));
    }

    // Existence check up front so the journal never references a ghost
    load_or_not_found(consumer_id).await?;

    let note = Note::new(
        trimmed,
        session.agent_id.clone(),
        session.agent_name.clone(),
        None,
    );
    repository::append_note(consumer_id, &note).await?;

    load_or_not_found(consumer_id).await
}

/// Полная замена рабочего списка; completed_at сохраняется для позиций
/// с известным id, остающихся завершёнными
pub async fn save_work_list(
    session: &Session,
    consumer_id: &str,
    items: Vec<WorkListItemDto>,
) -> Result<Consumer, WorkflowError> {
    let consumer = load_or_not_found(consumer_id).await?;

    let resolved: Vec<WorkListItem> = items
        .into_iter()
        .map(|dto| {
            let id = dto
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let completed_at = if dto.completed {
                consumer
                    .work_list
                    .iter()
                    .find(|existing| existing.id == id)
                    .and_then(|existing| existing.completed_at)
                    .or_else(|| Some(Utc::now()))
            } else {
                None
            };
            WorkListItem {
                id,
                description: dto.description,
                category: dto.category,
                priority: dto.priority,
                completed_at,
            }
        })
        .collect();

    repository::save_work_list(consumer_id, consumer.metadata.version, &resolved).await?;

    tracing::debug!(
        "Work list for consumer {} replaced ({} items) by agent {}",
        consumer_id,
        resolved.len(),
        session.agent_id
    );

    load_or_not_found(consumer_id).await
}
