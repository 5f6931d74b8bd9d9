use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{EntityMetadata, WorkflowError};
use crate::enums::{ConsumerStatus, PaymentType, WorkPriority};

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsumerId(pub Uuid);

impl ConsumerId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }

    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

// ============================================================================
// Child records
// ============================================================================

/// Ссылка на помесячный счёт, загруженный при регистрации
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillFile {
    pub file_name: String,
    pub month: String,
    pub year: i32,
    pub download_url: String,
}

/// Позиция рабочего списка
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkListItem {
    pub id: String,
    pub description: String,
    pub category: String,
    pub priority: WorkPriority,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Запись журнала заметок
///
/// Журнал append-only: каждая смена статуса добавляет ровно одну заметку
/// с меткой действия, свободные комментарии идут без метки.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub text: String,
    pub created_by: String,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub action: Option<String>,
}

impl Note {
    pub fn new(
        text: impl Into<String>,
        created_by: impl Into<String>,
        created_by_name: impl Into<String>,
        action: Option<&str>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            created_by: created_by.into(),
            created_by_name: created_by_name.into(),
            created_at: Utc::now(),
            action: action.map(|a| a.to_string()),
        }
    }
}

/// Запись аудита (пишется слоем хранилища при регистрации и
/// административных событиях)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub action: String,
    pub performed_by: String,
    pub performed_by_name: String,
    pub timestamp: DateTime<Utc>,
    pub details: Option<String>,
}

impl AuditEntry {
    pub fn new(
        action: impl Into<String>,
        performed_by: impl Into<String>,
        performed_by_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            action: action.into(),
            performed_by: performed_by.into(),
            performed_by_name: performed_by_name.into(),
            timestamp: Utc::now(),
            details: None,
        }
    }
}

/// План рассрочки: сумма одного платежа всегда выводится из сбора
/// на стороне сервера, клиентское значение не принимается
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPlan {
    pub number_of_installments: u32,
    pub amount_per_installment: Decimal,
}

impl InstallmentPlan {
    pub fn derive(service_fee: Decimal, number_of_installments: u32) -> Result<Self, WorkflowError> {
        if number_of_installments < 1 {
            return Err(WorkflowError::validation(
                "number of installments must be at least 1",
            ));
        }
        let amount = (service_fee / Decimal::from(number_of_installments)).round_dp(2);
        Ok(Self {
            number_of_installments,
            amount_per_installment: amount,
        })
    }
}

/// Платёжная подзапись лицевого счёта
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub service_fee: Decimal,
    pub payment_type: PaymentType,
    pub installment_plan: Option<InstallmentPlan>,
    pub transaction_id: Option<String>,
    pub transaction_date: Option<String>,
    pub receipt_url: Option<String>,
    pub paid_by: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Платёж проведён (transaction_id установлен ⇔ статус Paid)
    pub fn is_paid(&self) -> bool {
        self.transaction_id.is_some()
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Лицевой счёт потребителя — центральный агрегат пайплайна
/// регистрация → оценка → предложение → продажи → оплата
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    pub id: ConsumerId,
    /// 12-значный внешний номер, неизменяемый после регистрации
    pub consumer_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub registered_at: DateTime<Utc>,
    pub registered_by: String,
    pub status: ConsumerStatus,
    pub bill_files: Vec<BillFile>,
    pub bill_details_excel: String,
    pub evaluation_sheet: Option<String>,
    pub evaluation_uploaded_by: Option<String>,
    pub evaluation_uploaded_at: Option<DateTime<Utc>>,
    pub proposal_sheet: Option<String>,
    pub proposal_uploaded_by: Option<String>,
    pub proposal_uploaded_at: Option<DateTime<Utc>>,
    pub work_list: Vec<WorkListItem>,
    pub notes: Vec<Note>,
    pub payment: Option<Payment>,
    pub assigned_to: Option<String>,
    /// Метаданные жизненного цикла; `updated_at` служит last_updated,
    /// `version` — для optimistic locking
    pub metadata: EntityMetadata,
}

impl Consumer {
    pub fn new_for_registration(dto: RegisterConsumerDto, registered_by: String) -> Self {
        let now = Utc::now();
        Self {
            id: ConsumerId::new_v4(),
            consumer_number: dto.consumer_number,
            name: dto.name,
            email: dto.email,
            phone: dto.phone,
            address: dto.address,
            registered_at: now,
            registered_by,
            status: ConsumerStatus::EvaluationPending,
            bill_files: dto
                .bill_files
                .into_iter()
                .map(|bf| BillFile {
                    file_name: bf.file_name,
                    month: bf.month,
                    year: bf.year,
                    download_url: bf.download_url,
                })
                .collect(),
            bill_details_excel: dto.bill_details_excel.unwrap_or_default(),
            evaluation_sheet: None,
            evaluation_uploaded_by: None,
            evaluation_uploaded_at: None,
            proposal_sheet: None,
            proposal_uploaded_by: None,
            proposal_uploaded_at: None,
            work_list: Vec::new(),
            notes: Vec::new(),
            payment: None,
            assigned_to: dto.assigned_to,
            metadata: EntityMetadata::new(),
        }
    }

    pub fn to_string_id(&self) -> String {
        self.id.as_string()
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.metadata.updated_at
    }
}

// ============================================================================
// DTO
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillFileDto {
    pub file_name: String,
    pub month: String,
    pub year: i32,
    #[serde(default)]
    pub download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkListItemDto {
    /// None для новых позиций; известный id сохраняет completed_at
    pub id: Option<String>,
    pub description: String,
    pub category: String,
    pub priority: WorkPriority,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterConsumerDto {
    pub consumer_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub bill_files: Vec<BillFileDto>,
    pub bill_details_excel: Option<String>,
    pub assigned_to: Option<String>,
}

impl RegisterConsumerDto {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.consumer_number.len() != 12
            || !self.consumer_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err(WorkflowError::validation(
                "consumer number must be exactly 12 digits",
            ));
        }
        if self.name.trim().is_empty() {
            return Err(WorkflowError::validation("name cannot be empty"));
        }
        if !self.email.contains('@') {
            return Err(WorkflowError::validation("invalid email format"));
        }
        if self.phone.trim().is_empty() {
            return Err(WorkflowError::validation("phone cannot be empty"));
        }
        if self.address.trim().is_empty() {
            return Err(WorkflowError::validation("address cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> RegisterConsumerDto {
        RegisterConsumerDto {
            consumer_number: "100123456789".to_string(),
            name: "Test Consumer".to_string(),
            email: "test@example.com".to_string(),
            phone: "9876543210".to_string(),
            address: "Pune, MH".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_dto_valid() {
        assert!(dto().validate().is_ok());
    }

    #[test]
    fn test_register_dto_rejects_bad_consumer_number() {
        let mut d = dto();
        d.consumer_number = "12345".to_string();
        assert!(matches!(d.validate(), Err(WorkflowError::Validation(_))));

        d.consumer_number = "10012345678X".to_string();
        assert!(matches!(d.validate(), Err(WorkflowError::Validation(_))));
    }

    #[test]
    fn test_register_dto_rejects_bad_email() {
        let mut d = dto();
        d.email = "not-an-email".to_string();
        assert!(matches!(d.validate(), Err(WorkflowError::Validation(_))));
    }

    #[test]
    fn test_new_for_registration_starts_in_evaluation_pending() {
        let consumer = Consumer::new_for_registration(dto(), "agent-1".to_string());
        assert_eq!(consumer.status, ConsumerStatus::EvaluationPending);
        assert!(consumer.notes.is_empty());
        assert!(consumer.payment.is_none());
        assert_eq!(consumer.metadata.version, 0);
    }

    #[test]
    fn test_installment_plan_even_split() {
        let plan = InstallmentPlan::derive(Decimal::from(12000), 3).unwrap();
        assert_eq!(plan.amount_per_installment, Decimal::from(4000));
    }

    #[test]
    fn test_installment_plan_uneven_split_is_consistent() {
        let plan = InstallmentPlan::derive(Decimal::from(10000), 3).unwrap();
        // Store-computed, rounded to 2 decimal places
        assert_eq!(plan.amount_per_installment.to_string(), "3333.33");
    }

    #[test]
    fn test_installment_plan_rejects_zero_installments() {
        assert!(InstallmentPlan::derive(Decimal::from(5000), 0).is_err());
    }
}
