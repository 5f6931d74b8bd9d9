use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::domain::a001_consumer::aggregate::{
    Consumer, RegisterConsumerDto, WorkListItemDto,
};
use contracts::domain::common::WorkflowError;
use contracts::enums::{DashboardTab, PaymentType};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::domain::a001_consumer::{repository, service};
use crate::system::auth::extractor::CurrentSession;

/// Отображение ошибок пайплайна на HTTP-статусы
fn error_response(err: WorkflowError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
        WorkflowError::ActionNotAvailable { .. } => StatusCode::FORBIDDEN,
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::IllegalTransition { .. }
        | WorkflowError::ConcurrentModification
        | WorkflowError::MissingPayment => StatusCode::CONFLICT,
        WorkflowError::Store(_) => StatusCode::BAD_GATEWAY,
    };
    if status == StatusCode::BAD_GATEWAY {
        tracing::error!("Store error: {}", err);
    }
    (status, Json(json!({ "error": err.to_string() })))
}

type HandlerError = (StatusCode, Json<serde_json::Value>);

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tab: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

fn parse_tab(raw: Option<&str>) -> Result<Option<DashboardTab>, HandlerError> {
    match raw {
        None => Ok(None),
        Some(code) => DashboardTab::from_code(code).map(Some).ok_or_else(|| {
            error_response(WorkflowError::validation(format!(
                "unknown dashboard tab '{}'",
                code
            )))
        }),
    }
}

fn parse_sort(raw: Option<&str>) -> Result<repository::ConsumerSort, HandlerError> {
    match raw {
        None => Ok(repository::ConsumerSort::default()),
        Some(code) => repository::ConsumerSort::from_code(code).ok_or_else(|| {
            error_response(WorkflowError::validation(format!(
                "unknown sort key '{}'",
                code
            )))
        }),
    }
}

/// GET /api/consumers
pub async fn list(
    CurrentSession(_session): CurrentSession,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Consumer>>, HandlerError> {
    let tab = parse_tab(query.tab.as_deref())?;
    let sort = parse_sort(query.sort.as_deref())?;
    let consumers = service::list(tab, query.search.as_deref(), sort)
        .await
        .map_err(error_response)?;
    Ok(Json(consumers))
}

/// GET /api/consumers/export — CSV выгрузка текущей выборки
pub async fn export(
    CurrentSession(_session): CurrentSession,
    Query(query): Query<ListQuery>,
) -> Result<Response, HandlerError> {
    let tab = parse_tab(query.tab.as_deref())?;
    let sort = parse_sort(query.sort.as_deref())?;
    let csv_text = service::export_csv(tab, query.search.as_deref(), sort)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"consumers.csv\"",
            ),
        ],
        csv_text,
    )
        .into_response())
}

/// POST /api/consumers — регистрация лицевого счёта
pub async fn register(
    CurrentSession(session): CurrentSession,
    Json(dto): Json<RegisterConsumerDto>,
) -> Result<(StatusCode, Json<Consumer>), HandlerError> {
    let consumer = service::register(&session, dto)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(consumer)))
}

/// GET /api/consumers/:id — агрегат с журналом аудита
pub async fn get_by_id(
    CurrentSession(_session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<service::ConsumerDetail>, HandlerError> {
    let detail = service::get(&id).await.map_err(error_response)?;
    Ok(Json(detail))
}

/// GET /api/consumers/:id/actions — действия, доступные текущему агенту
pub async fn available_actions(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<Vec<String>>, HandlerError> {
    let actions = service::available_actions(&session, &id)
        .await
        .map_err(error_response)?;
    Ok(Json(actions.iter().map(|a| a.code().to_string()).collect()))
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    /// Необязательный комментарий актора к переходу
    pub note: Option<String>,
}

/// POST /api/consumers/:id/actions
pub async fn apply_action(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<Consumer>, HandlerError> {
    let consumer = service::apply_action(&session, &id, &request.action, request.note.as_deref())
        .await
        .map_err(error_response)?;
    Ok(Json(consumer))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRequest {
    pub sheet_url: String,
}

/// POST /api/consumers/:id/evaluation — лист оценки + Evaluation Done
pub async fn attach_evaluation(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(request): Json<SheetRequest>,
) -> Result<Json<Consumer>, HandlerError> {
    let consumer = service::attach_evaluation(&session, &id, &request.sheet_url)
        .await
        .map_err(error_response)?;
    Ok(Json(consumer))
}

/// POST /api/consumers/:id/proposal — лист предложения + Proposal Done
pub async fn attach_proposal(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(request): Json<SheetRequest>,
) -> Result<Json<Consumer>, HandlerError> {
    let consumer = service::attach_proposal(&session, &id, &request.sheet_url)
        .await
        .map_err(error_response)?;
    Ok(Json(consumer))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnablePaymentRequest {
    pub service_fee: Decimal,
    pub payment_type: PaymentType,
    pub number_of_installments: Option<u32>,
}

/// POST /api/consumers/:id/payment/enable
pub async fn enable_payment(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(request): Json<EnablePaymentRequest>,
) -> Result<Json<Consumer>, HandlerError> {
    let consumer = service::enable_payment(
        &session,
        &id,
        request.service_fee,
        request.payment_type,
        request.number_of_installments,
    )
    .await
    .map_err(error_response)?;
    Ok(Json(consumer))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidRequest {
    pub transaction_id: String,
    pub transaction_date: String,
    pub receipt_url: Option<String>,
}

/// POST /api/consumers/:id/payment/paid
pub async fn mark_paid(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(request): Json<MarkPaidRequest>,
) -> Result<Json<Consumer>, HandlerError> {
    let consumer = service::mark_paid(
        &session,
        &id,
        &request.transaction_id,
        &request.transaction_date,
        request.receipt_url,
    )
    .await
    .map_err(error_response)?;
    Ok(Json(consumer))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// POST /api/consumers/:id/comments — свободный комментарий в журнал
pub async fn add_comment(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<Consumer>, HandlerError> {
    let consumer = service::add_comment(&session, &id, &request.text)
        .await
        .map_err(error_response)?;
    Ok(Json(consumer))
}

#[derive(Debug, Deserialize)]
pub struct WorkListRequest {
    pub items: Vec<WorkListItemDto>,
}

/// PUT /api/consumers/:id/worklist — полная замена рабочего списка
pub async fn save_work_list(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(request): Json<WorkListRequest>,
) -> Result<Json<Consumer>, HandlerError> {
    let consumer = service::save_work_list(&session, &id, request.items)
        .await
        .map_err(error_response)?;
    Ok(Json(consumer))
}
