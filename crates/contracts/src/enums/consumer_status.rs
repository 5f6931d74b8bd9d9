use serde::{Deserialize, Serialize};

/// Статусы жизненного цикла лицевого счёта (закрытый набор)
///
/// Сериализуется теми же строками, что хранятся в таблице
/// `a001_consumer_account.status` — человекочитаемые метки этапов плюс
/// машинные подстатусы стадии продаж.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumerStatus {
    #[serde(rename = "Evaluation Pending")]
    EvaluationPending,
    #[serde(rename = "Evaluation Done")]
    EvaluationDone,
    #[serde(rename = "Re-Evaluation Pending")]
    ReEvaluationPending,
    #[serde(rename = "Re-Evaluation Done")]
    ReEvaluationDone,
    #[serde(rename = "Proposal Pending")]
    ProposalPending,
    #[serde(rename = "Proposal Done")]
    ProposalDone,
    #[serde(rename = "Re-Proposal Pending")]
    ReProposalPending,
    #[serde(rename = "Re-Proposal Done")]
    ReProposalDone,
    #[serde(rename = "Forward Proposal")]
    ForwardProposal,
    #[serde(rename = "Sales Decision")]
    SalesDecision,
    #[serde(rename = "Follow-up Pending")]
    FollowUpPending,
    #[serde(rename = "Follow-up Decision")]
    FollowUpDecision,
    #[serde(rename = "Paid")]
    Paid,
    #[serde(rename = "Inactive")]
    Inactive,
    #[serde(rename = "Next Month Prospect")]
    NextMonthProspect,
    #[serde(rename = "sales_forward_pending")]
    SalesForwardPending,
    #[serde(rename = "sales_forward_rejected")]
    SalesForwardRejected,
    #[serde(rename = "sales_reply")]
    SalesReply,
    #[serde(rename = "sales_followup_pending")]
    SalesFollowupPending,
    #[serde(rename = "sales_followup_rejected")]
    SalesFollowupRejected,
}

/// Семейство этапов пайплайна
///
/// Вычисляется в одном месте; все экраны и отчёты обязаны использовать
/// `ConsumerStatus::stage()` вместо собственных списков статусов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageFamily {
    Evaluation,
    Proposal,
    Sales,
    Terminal,
}

/// Вкладки дашборда (производная, не авторитетная группировка)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashboardTab {
    Active,
    Paid,
    Evaluation,
    Proposal,
    Sales,
}

impl ConsumerStatus {
    /// Метка статуса, как она хранится в БД и показывается в UI
    pub fn label(&self) -> &'static str {
        match self {
            ConsumerStatus::EvaluationPending => "Evaluation Pending",
            ConsumerStatus::EvaluationDone => "Evaluation Done",
            ConsumerStatus::ReEvaluationPending => "Re-Evaluation Pending",
            ConsumerStatus::ReEvaluationDone => "Re-Evaluation Done",
            ConsumerStatus::ProposalPending => "Proposal Pending",
            ConsumerStatus::ProposalDone => "Proposal Done",
            ConsumerStatus::ReProposalPending => "Re-Proposal Pending",
            ConsumerStatus::ReProposalDone => "Re-Proposal Done",
            ConsumerStatus::ForwardProposal => "Forward Proposal",
            ConsumerStatus::SalesDecision => "Sales Decision",
            ConsumerStatus::FollowUpPending => "Follow-up Pending",
            ConsumerStatus::FollowUpDecision => "Follow-up Decision",
            ConsumerStatus::Paid => "Paid",
            ConsumerStatus::Inactive => "Inactive",
            ConsumerStatus::NextMonthProspect => "Next Month Prospect",
            ConsumerStatus::SalesForwardPending => "sales_forward_pending",
            ConsumerStatus::SalesForwardRejected => "sales_forward_rejected",
            ConsumerStatus::SalesReply => "sales_reply",
            ConsumerStatus::SalesFollowupPending => "sales_followup_pending",
            ConsumerStatus::SalesFollowupRejected => "sales_followup_rejected",
        }
    }

    /// Парсинг из метки
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().into_iter().find(|s| s.label() == label)
    }

    /// Все статусы
    pub fn all() -> Vec<ConsumerStatus> {
        vec![
            ConsumerStatus::EvaluationPending,
            ConsumerStatus::EvaluationDone,
            ConsumerStatus::ReEvaluationPending,
            ConsumerStatus::ReEvaluationDone,
            ConsumerStatus::ProposalPending,
            ConsumerStatus::ProposalDone,
            ConsumerStatus::ReProposalPending,
            ConsumerStatus::ReProposalDone,
            ConsumerStatus::ForwardProposal,
            ConsumerStatus::SalesDecision,
            ConsumerStatus::FollowUpPending,
            ConsumerStatus::FollowUpDecision,
            ConsumerStatus::Paid,
            ConsumerStatus::Inactive,
            ConsumerStatus::NextMonthProspect,
            ConsumerStatus::SalesForwardPending,
            ConsumerStatus::SalesForwardRejected,
            ConsumerStatus::SalesReply,
            ConsumerStatus::SalesFollowupPending,
            ConsumerStatus::SalesFollowupRejected,
        ]
    }

    /// Семейство этапов, к которому относится статус
    pub fn stage(&self) -> StageFamily {
        match self {
            ConsumerStatus::EvaluationPending
            | ConsumerStatus::EvaluationDone
            | ConsumerStatus::ReEvaluationPending
            | ConsumerStatus::ReEvaluationDone => StageFamily::Evaluation,

            ConsumerStatus::ProposalPending
            | ConsumerStatus::ProposalDone
            | ConsumerStatus::ReProposalPending
            | ConsumerStatus::ReProposalDone => StageFamily::Proposal,

            ConsumerStatus::ForwardProposal
            | ConsumerStatus::SalesDecision
            | ConsumerStatus::FollowUpPending
            | ConsumerStatus::FollowUpDecision
            | ConsumerStatus::SalesForwardPending
            | ConsumerStatus::SalesForwardRejected
            | ConsumerStatus::SalesReply
            | ConsumerStatus::SalesFollowupPending
            | ConsumerStatus::SalesFollowupRejected => StageFamily::Sales,

            ConsumerStatus::Paid | ConsumerStatus::Inactive | ConsumerStatus::NextMonthProspect => {
                StageFamily::Terminal
            }
        }
    }

    /// Статус завершает пайплайн (Paid / Inactive / Next Month Prospect)
    pub fn is_terminal(&self) -> bool {
        self.stage() == StageFamily::Terminal
    }

    /// Попадает ли статус во вкладку дашборда
    pub fn in_tab(&self, tab: DashboardTab) -> bool {
        match tab {
            DashboardTab::Active => !self.is_terminal(),
            DashboardTab::Paid => *self == ConsumerStatus::Paid,
            DashboardTab::Evaluation => self.stage() == StageFamily::Evaluation,
            DashboardTab::Proposal => self.stage() == StageFamily::Proposal,
            DashboardTab::Sales => self.stage() == StageFamily::Sales,
        }
    }
}

impl std::fmt::Display for ConsumerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl DashboardTab {
    pub fn code(&self) -> &'static str {
        match self {
            DashboardTab::Active => "active",
            DashboardTab::Paid => "paid",
            DashboardTab::Evaluation => "evaluation",
            DashboardTab::Proposal => "proposal",
            DashboardTab::Sales => "sales",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "active" => Some(DashboardTab::Active),
            "paid" => Some(DashboardTab::Paid),
            "evaluation" => Some(DashboardTab::Evaluation),
            "proposal" => Some(DashboardTab::Proposal),
            "sales" => Some(DashboardTab::Sales),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for status in ConsumerStatus::all() {
            assert_eq!(ConsumerStatus::from_label(status.label()), Some(status));
        }
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&ConsumerStatus::SalesForwardRejected).unwrap();
        assert_eq!(json, "\"sales_forward_rejected\"");
        let back: ConsumerStatus = serde_json::from_str("\"Evaluation Pending\"").unwrap();
        assert_eq!(back, ConsumerStatus::EvaluationPending);
    }

    #[test]
    fn test_stage_families_cover_all_statuses() {
        let sales: Vec<_> = ConsumerStatus::all()
            .into_iter()
            .filter(|s| s.stage() == StageFamily::Sales)
            .collect();
        // The sales stage is the specific nine-member set
        assert_eq!(sales.len(), 9);
        assert!(sales.contains(&ConsumerStatus::ForwardProposal));
        assert!(sales.contains(&ConsumerStatus::SalesReply));

        let terminal: Vec<_> = ConsumerStatus::all()
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                ConsumerStatus::Paid,
                ConsumerStatus::Inactive,
                ConsumerStatus::NextMonthProspect
            ]
        );
    }

    #[test]
    fn test_active_tab_excludes_terminal() {
        assert!(ConsumerStatus::EvaluationPending.in_tab(DashboardTab::Active));
        assert!(ConsumerStatus::SalesReply.in_tab(DashboardTab::Active));
        assert!(!ConsumerStatus::Paid.in_tab(DashboardTab::Active));
        assert!(!ConsumerStatus::Inactive.in_tab(DashboardTab::Active));
        assert!(!ConsumerStatus::NextMonthProspect.in_tab(DashboardTab::Active));
    }

    #[test]
    fn test_paid_tab() {
        assert!(ConsumerStatus::Paid.in_tab(DashboardTab::Paid));
        assert!(!ConsumerStatus::EvaluationDone.in_tab(DashboardTab::Paid));
    }
}
