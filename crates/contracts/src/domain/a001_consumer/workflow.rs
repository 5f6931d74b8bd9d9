//! Машина состояний жизненного цикла лицевого счёта
//!
//! Чистые функции: по текущему статусу и запрошенному действию вычисляют
//! новый статус и единственную сопровождающую заметку. Никакого состояния,
//! никакого ввода-вывода — хранилище применяет результат атомарно.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::{InstallmentPlan, Payment};
use crate::domain::common::WorkflowError;
use crate::enums::{ConsumerStatus, PaymentType, Role};

/// Действия, меняющие состояние пайплайна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowAction {
    #[serde(rename = "complete_evaluation")]
    CompleteEvaluation,
    #[serde(rename = "send_proposal")]
    SendProposal,
    #[serde(rename = "re_evaluation")]
    ReEvaluation,
    #[serde(rename = "complete_proposal")]
    CompleteProposal,
    #[serde(rename = "forward_proposal")]
    ForwardProposal,
    #[serde(rename = "re_proposal")]
    ReProposal,
    #[serde(rename = "enable_payment")]
    EnablePayment,
    #[serde(rename = "take_followup")]
    TakeFollowup,
    #[serde(rename = "mark_paid")]
    MarkPaid,
    #[serde(rename = "mark_inactive")]
    MarkInactive,
    #[serde(rename = "next_month")]
    NextMonth,
}

const EVALUATION_APPROVED: &[ConsumerStatus] = &[
    ConsumerStatus::EvaluationDone,
    ConsumerStatus::ReEvaluationDone,
];

const PROPOSAL_APPROVED: &[ConsumerStatus] = &[
    ConsumerStatus::ProposalDone,
    ConsumerStatus::ReProposalDone,
];

/// Подстатусы продаж, из которых менеджер принимает решение
const SALES_REPLY: &[ConsumerStatus] = &[
    ConsumerStatus::SalesForwardRejected,
    ConsumerStatus::SalesFollowupRejected,
    ConsumerStatus::SalesReply,
];

const RE_EVALUATION_SOURCES: &[ConsumerStatus] = &[
    ConsumerStatus::EvaluationDone,
    ConsumerStatus::ReEvaluationDone,
    ConsumerStatus::ProposalDone,
    ConsumerStatus::ReProposalDone,
    ConsumerStatus::SalesForwardRejected,
    ConsumerStatus::SalesFollowupRejected,
    ConsumerStatus::SalesReply,
];

const RE_PROPOSAL_SOURCES: &[ConsumerStatus] = &[
    ConsumerStatus::ProposalDone,
    ConsumerStatus::ReProposalDone,
    ConsumerStatus::SalesForwardRejected,
    ConsumerStatus::SalesFollowupRejected,
    ConsumerStatus::SalesReply,
];

const EVALUATION_IN_PROGRESS: &[ConsumerStatus] = &[
    ConsumerStatus::EvaluationPending,
    ConsumerStatus::ReEvaluationPending,
];

const PROPOSAL_IN_PROGRESS: &[ConsumerStatus] = &[
    ConsumerStatus::ProposalPending,
    ConsumerStatus::ReProposalPending,
];

impl WorkflowAction {
    /// Машинный код действия
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowAction::CompleteEvaluation => "complete_evaluation",
            WorkflowAction::SendProposal => "send_proposal",
            WorkflowAction::ReEvaluation => "re_evaluation",
            WorkflowAction::CompleteProposal => "complete_proposal",
            WorkflowAction::ForwardProposal => "forward_proposal",
            WorkflowAction::ReProposal => "re_proposal",
            WorkflowAction::EnablePayment => "enable_payment",
            WorkflowAction::TakeFollowup => "take_followup",
            WorkflowAction::MarkPaid => "mark_paid",
            WorkflowAction::MarkInactive => "mark_inactive",
            WorkflowAction::NextMonth => "next_month",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "complete_evaluation" => Some(WorkflowAction::CompleteEvaluation),
            "send_proposal" => Some(WorkflowAction::SendProposal),
            "re_evaluation" => Some(WorkflowAction::ReEvaluation),
            "complete_proposal" => Some(WorkflowAction::CompleteProposal),
            "forward_proposal" => Some(WorkflowAction::ForwardProposal),
            "re_proposal" => Some(WorkflowAction::ReProposal),
            "enable_payment" => Some(WorkflowAction::EnablePayment),
            "take_followup" => Some(WorkflowAction::TakeFollowup),
            "mark_paid" => Some(WorkflowAction::MarkPaid),
            "mark_inactive" => Some(WorkflowAction::MarkInactive),
            "next_month" => Some(WorkflowAction::NextMonth),
            _ => None,
        }
    }

    /// Допустимые исходные статусы; `None` — действие доступно из любого
    pub fn legal_sources(&self) -> Option<&'static [ConsumerStatus]> {
        match self {
            WorkflowAction::CompleteEvaluation => Some(EVALUATION_IN_PROGRESS),
            WorkflowAction::SendProposal => Some(EVALUATION_APPROVED),
            WorkflowAction::ReEvaluation => Some(RE_EVALUATION_SOURCES),
            WorkflowAction::CompleteProposal => Some(PROPOSAL_IN_PROGRESS),
            WorkflowAction::ForwardProposal => Some(PROPOSAL_APPROVED),
            WorkflowAction::ReProposal => Some(RE_PROPOSAL_SOURCES),
            WorkflowAction::EnablePayment => Some(PROPOSAL_APPROVED),
            WorkflowAction::TakeFollowup => Some(SALES_REPLY),
            // Conservative reading: paid only out of the sales-reply family
            WorkflowAction::MarkPaid => Some(SALES_REPLY),
            WorkflowAction::MarkInactive => None,
            WorkflowAction::NextMonth => None,
        }
    }

    fn legal_from(&self, status: ConsumerStatus) -> bool {
        self.legal_sources().map_or(true, |s| s.contains(&status))
    }
}

/// Результат планирования перехода: новый статус (если меняется)
/// и метка для заметки журнала
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlan {
    pub new_status: Option<ConsumerStatus>,
    pub label: &'static str,
}

/// Результат `enable_payment`: вырожденный переход, статус не меняется
#[derive(Debug, Clone, PartialEq)]
pub struct EnablePaymentPlan {
    pub payment: Payment,
    pub label: &'static str,
    pub note_text: String,
}

/// Результат `mark_paid`
#[derive(Debug, Clone, PartialEq)]
pub struct MarkPaidPlan {
    pub payment: Payment,
    pub new_status: ConsumerStatus,
    pub label: &'static str,
    pub note_text: String,
}

fn illegal(action: WorkflowAction, from: ConsumerStatus) -> WorkflowError {
    WorkflowError::IllegalTransition {
        action: action.code().to_string(),
        from: from.label().to_string(),
    }
}

/// Спланировать обычный переход статуса
///
/// `enable_payment` и `mark_paid` сюда не попадают: у них своя полезная
/// нагрузка и свои функции планирования ниже.
pub fn plan_action(
    current: ConsumerStatus,
    action: WorkflowAction,
) -> Result<ActionPlan, WorkflowError> {
    if !action.legal_from(current) {
        return Err(illegal(action, current));
    }

    let plan = match action {
        WorkflowAction::CompleteEvaluation => ActionPlan {
            new_status: Some(if current == ConsumerStatus::ReEvaluationPending {
                ConsumerStatus::ReEvaluationDone
            } else {
                ConsumerStatus::EvaluationDone
            }),
            label: "Evaluation Completed",
        },
        WorkflowAction::SendProposal => ActionPlan {
            new_status: Some(ConsumerStatus::ProposalPending),
            label: "Sent for Proposal",
        },
        WorkflowAction::ReEvaluation => ActionPlan {
            new_status: Some(ConsumerStatus::ReEvaluationPending),
            label: "Sent for Re-Evaluation",
        },
        WorkflowAction::CompleteProposal => ActionPlan {
            new_status: Some(if current == ConsumerStatus::ReProposalPending {
                ConsumerStatus::ReProposalDone
            } else {
                ConsumerStatus::ProposalDone
            }),
            label: "Proposal Completed",
        },
        WorkflowAction::ForwardProposal => ActionPlan {
            new_status: Some(ConsumerStatus::ForwardProposal),
            label: "Forwarded Proposal to Sales",
        },
        WorkflowAction::ReProposal => ActionPlan {
            new_status: Some(ConsumerStatus::ReProposalPending),
            label: "Sent for Re-Proposal",
        },
        WorkflowAction::TakeFollowup => ActionPlan {
            new_status: Some(ConsumerStatus::FollowUpPending),
            label: "Taken for Follow-up",
        },
        // Toggle: из Inactive действие возвращает счёт в начало пайплайна
        WorkflowAction::MarkInactive => {
            if current == ConsumerStatus::Inactive {
                ActionPlan {
                    new_status: Some(ConsumerStatus::EvaluationPending),
                    label: "Marked as Active",
                }
            } else {
                ActionPlan {
                    new_status: Some(ConsumerStatus::Inactive),
                    label: "Marked as Inactive",
                }
            }
        }
        WorkflowAction::NextMonth => ActionPlan {
            new_status: Some(ConsumerStatus::NextMonthProspect),
            label: "Moved to Next Month Prospect",
        },
        WorkflowAction::EnablePayment | WorkflowAction::MarkPaid => {
            return Err(WorkflowError::validation(format!(
                "action '{}' carries a payment payload, use its dedicated operation",
                action.code()
            )));
        }
    };

    Ok(plan)
}

/// Спланировать `enable_payment`: прикрепляет платёжную подзапись,
/// не меняя статус
pub fn plan_enable_payment(
    current: ConsumerStatus,
    service_fee: Decimal,
    payment_type: PaymentType,
    installments: Option<u32>,
) -> Result<EnablePaymentPlan, WorkflowError> {
    if !WorkflowAction::EnablePayment.legal_from(current) {
        return Err(illegal(WorkflowAction::EnablePayment, current));
    }
    if service_fee <= Decimal::ZERO {
        return Err(WorkflowError::validation("service fee must be positive"));
    }

    let installment_plan = match payment_type {
        PaymentType::Full => None,
        PaymentType::Installment => {
            let n = installments.ok_or_else(|| {
                WorkflowError::validation("number of installments is required for installment type")
            })?;
            Some(InstallmentPlan::derive(service_fee, n)?)
        }
    };

    let payment = Payment {
        service_fee,
        payment_type,
        installment_plan,
        transaction_id: None,
        transaction_date: None,
        receipt_url: None,
        paid_by: None,
        paid_at: None,
    };

    Ok(EnablePaymentPlan {
        payment,
        label: "Payment Enabled",
        note_text: format!("Payment enabled: ₹{} ({})", service_fee, payment_type.code()),
    })
}

/// Спланировать `mark_paid`: требует ранее включённый платёж
pub fn plan_mark_paid(
    current: ConsumerStatus,
    existing: Option<&Payment>,
    transaction_id: &str,
    transaction_date: &str,
    paid_by: &str,
) -> Result<MarkPaidPlan, WorkflowError> {
    if !WorkflowAction::MarkPaid.legal_from(current) {
        return Err(illegal(WorkflowAction::MarkPaid, current));
    }
    let payment = existing.ok_or(WorkflowError::MissingPayment)?;
    if transaction_id.trim().is_empty() {
        return Err(WorkflowError::validation("transaction id is required"));
    }
    if transaction_date.trim().is_empty() {
        return Err(WorkflowError::validation("transaction date is required"));
    }

    let mut payment = payment.clone();
    payment.transaction_id = Some(transaction_id.to_string());
    payment.transaction_date = Some(transaction_date.to_string());
    payment.paid_by = Some(paid_by.to_string());
    payment.paid_at = Some(Utc::now());

    Ok(MarkPaidPlan {
        payment,
        new_status: ConsumerStatus::Paid,
        label: "Marked as Paid",
        note_text: format!("Payment received - Transaction ID: {}", transaction_id),
    })
}

// ============================================================================
// Role gating
// ============================================================================

const UNIVERSAL_ACTIONS: &[WorkflowAction] =
    &[WorkflowAction::MarkInactive, WorkflowAction::NextMonth];

const ADMIN_ACTIONS: &[WorkflowAction] = &[
    WorkflowAction::CompleteEvaluation,
    WorkflowAction::SendProposal,
    WorkflowAction::ReEvaluation,
    WorkflowAction::CompleteProposal,
    WorkflowAction::ForwardProposal,
    WorkflowAction::ReProposal,
    WorkflowAction::EnablePayment,
    WorkflowAction::TakeFollowup,
    WorkflowAction::MarkPaid,
    WorkflowAction::MarkInactive,
    WorkflowAction::NextMonth,
];

const EVALUATOR_ACTIONS: &[WorkflowAction] = &[
    WorkflowAction::CompleteEvaluation,
    WorkflowAction::SendProposal,
    WorkflowAction::ReEvaluation,
    WorkflowAction::MarkInactive,
    WorkflowAction::NextMonth,
];

const PROPOSAL_MAKER_ACTIONS: &[WorkflowAction] = &[
    WorkflowAction::CompleteProposal,
    WorkflowAction::EnablePayment,
    WorkflowAction::ForwardProposal,
    WorkflowAction::ReProposal,
    WorkflowAction::ReEvaluation,
    WorkflowAction::MarkInactive,
    WorkflowAction::NextMonth,
];

const SALES_ACTIONS: &[WorkflowAction] = &[
    WorkflowAction::MarkPaid,
    WorkflowAction::TakeFollowup,
    WorkflowAction::ReProposal,
    WorkflowAction::ReEvaluation,
    WorkflowAction::MarkInactive,
    WorkflowAction::NextMonth,
];

/// Действия, на которые роль имеет право в принципе (без учёта статуса)
pub fn role_actions(role: Role) -> &'static [WorkflowAction] {
    match role {
        Role::Admin => ADMIN_ACTIONS,
        Role::Evaluator => EVALUATOR_ACTIONS,
        Role::ProposalMaker => PROPOSAL_MAKER_ACTIONS,
        Role::Sales => SALES_ACTIONS,
    }
}

/// Роль имеет право на действие (независимо от статуса счёта)
pub fn role_permits(role: Role, action: WorkflowAction) -> bool {
    role_actions(role).contains(&action)
}

/// Действия, доступные роли для счёта в данном статусе.
///
/// Производная витрина для UI; сервер всё равно перепроверяет и роль,
/// и легальность перехода при каждом вызове.
pub fn available_actions(role: Role, status: ConsumerStatus) -> Vec<WorkflowAction> {
    role_actions(role)
        .iter()
        .copied()
        .filter(|a| a.legal_from(status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_proposal_from_evaluation_done() {
        let plan = plan_action(ConsumerStatus::EvaluationDone, WorkflowAction::SendProposal)
            .unwrap();
        assert_eq!(plan.new_status, Some(ConsumerStatus::ProposalPending));
        assert_eq!(plan.label, "Sent for Proposal");
    }

    #[test]
    fn test_send_proposal_from_evaluation_pending_is_illegal() {
        let err = plan_action(
            ConsumerStatus::EvaluationPending,
            WorkflowAction::SendProposal,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::IllegalTransition { .. }));
    }

    #[test]
    fn test_re_evaluation_from_sales_reply() {
        let plan =
            plan_action(ConsumerStatus::SalesReply, WorkflowAction::ReEvaluation).unwrap();
        assert_eq!(plan.new_status, Some(ConsumerStatus::ReEvaluationPending));
        assert_eq!(plan.label, "Sent for Re-Evaluation");
    }

    #[test]
    fn test_forward_proposal_sources() {
        assert!(plan_action(
            ConsumerStatus::ProposalDone,
            WorkflowAction::ForwardProposal
        )
        .is_ok());
        assert!(plan_action(
            ConsumerStatus::ReProposalDone,
            WorkflowAction::ForwardProposal
        )
        .is_ok());
        assert!(plan_action(
            ConsumerStatus::ProposalPending,
            WorkflowAction::ForwardProposal
        )
        .is_err());
    }

    #[test]
    fn test_complete_evaluation_tracks_re_evaluation() {
        let plan = plan_action(
            ConsumerStatus::ReEvaluationPending,
            WorkflowAction::CompleteEvaluation,
        )
        .unwrap();
        assert_eq!(plan.new_status, Some(ConsumerStatus::ReEvaluationDone));

        let plan = plan_action(
            ConsumerStatus::EvaluationPending,
            WorkflowAction::CompleteEvaluation,
        )
        .unwrap();
        assert_eq!(plan.new_status, Some(ConsumerStatus::EvaluationDone));
    }

    #[test]
    fn test_mark_inactive_toggles() {
        let plan =
            plan_action(ConsumerStatus::EvaluationDone, WorkflowAction::MarkInactive).unwrap();
        assert_eq!(plan.new_status, Some(ConsumerStatus::Inactive));
        assert_eq!(plan.label, "Marked as Inactive");

        // Round trip: из Inactive возврат в Evaluation Pending
        let plan = plan_action(ConsumerStatus::Inactive, WorkflowAction::MarkInactive).unwrap();
        assert_eq!(plan.new_status, Some(ConsumerStatus::EvaluationPending));
        assert_eq!(plan.label, "Marked as Active");
    }

    #[test]
    fn test_next_month_from_any_state() {
        for status in ConsumerStatus::all() {
            let plan = plan_action(status, WorkflowAction::NextMonth).unwrap();
            assert_eq!(plan.new_status, Some(ConsumerStatus::NextMonthProspect));
        }
    }

    #[test]
    fn test_plan_action_rejects_payment_actions() {
        assert!(matches!(
            plan_action(ConsumerStatus::ProposalDone, WorkflowAction::EnablePayment),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_enable_payment_keeps_status() {
        let plan = plan_enable_payment(
            ConsumerStatus::ProposalDone,
            Decimal::from(12000),
            PaymentType::Installment,
            Some(3),
        )
        .unwrap();
        assert_eq!(plan.label, "Payment Enabled");
        let installment = plan.payment.installment_plan.unwrap();
        assert_eq!(installment.amount_per_installment, Decimal::from(4000));
        assert!(plan.payment.transaction_id.is_none());
    }

    #[test]
    fn test_enable_payment_rejects_non_positive_fee() {
        assert!(matches!(
            plan_enable_payment(
                ConsumerStatus::ProposalDone,
                Decimal::ZERO,
                PaymentType::Full,
                None
            ),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_enable_payment_requires_installment_count() {
        assert!(matches!(
            plan_enable_payment(
                ConsumerStatus::ProposalDone,
                Decimal::from(5000),
                PaymentType::Installment,
                None
            ),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_mark_paid_requires_prior_payment() {
        let err = plan_mark_paid(ConsumerStatus::SalesReply, None, "TXN-1", "2026-08-01", "a1")
            .unwrap_err();
        assert_eq!(err, WorkflowError::MissingPayment);
    }

    #[test]
    fn test_mark_paid_sets_transaction_and_status() {
        let enabled = plan_enable_payment(
            ConsumerStatus::ProposalDone,
            Decimal::from(8000),
            PaymentType::Full,
            None,
        )
        .unwrap();
        let plan = plan_mark_paid(
            ConsumerStatus::SalesReply,
            Some(&enabled.payment),
            "TXN-42",
            "2026-08-01",
            "agent-7",
        )
        .unwrap();
        assert_eq!(plan.new_status, ConsumerStatus::Paid);
        assert_eq!(plan.payment.transaction_id.as_deref(), Some("TXN-42"));
        assert!(plan.payment.is_paid());
        assert_eq!(plan.note_text, "Payment received - Transaction ID: TXN-42");
    }

    #[test]
    fn test_mark_paid_restricted_to_sales_reply_family() {
        let enabled = plan_enable_payment(
            ConsumerStatus::ProposalDone,
            Decimal::from(8000),
            PaymentType::Full,
            None,
        )
        .unwrap();
        let err = plan_mark_paid(
            ConsumerStatus::ProposalDone,
            Some(&enabled.payment),
            "TXN-42",
            "2026-08-01",
            "agent-7",
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::IllegalTransition { .. }));
    }

    #[test]
    fn test_universal_actions_available_to_every_role() {
        for role in Role::all() {
            for status in ConsumerStatus::all() {
                let actions = available_actions(role, status);
                assert!(actions.contains(&WorkflowAction::MarkInactive));
                assert!(actions.contains(&WorkflowAction::NextMonth));
            }
        }
    }

    #[test]
    fn test_sales_role_cannot_send_proposal() {
        assert!(!role_permits(Role::Sales, WorkflowAction::SendProposal));
        let actions = available_actions(Role::Sales, ConsumerStatus::EvaluationDone);
        assert!(!actions.contains(&WorkflowAction::SendProposal));
    }

    #[test]
    fn test_proposal_maker_sees_approval_actions_on_proposal_done() {
        let actions = available_actions(Role::ProposalMaker, ConsumerStatus::ProposalDone);
        assert!(actions.contains(&WorkflowAction::EnablePayment));
        assert!(actions.contains(&WorkflowAction::ForwardProposal));
        assert!(actions.contains(&WorkflowAction::ReProposal));
        assert!(actions.contains(&WorkflowAction::ReEvaluation));
        assert!(!actions.contains(&WorkflowAction::MarkPaid));
    }

    #[test]
    fn test_action_codes_round_trip() {
        for action in ADMIN_ACTIONS {
            assert_eq!(WorkflowAction::from_code(action.code()), Some(*action));
        }
    }
}
