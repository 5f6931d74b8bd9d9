use serde::{Deserialize, Serialize};

/// Роли сотрудников back-office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "evaluator")]
    Evaluator,
    #[serde(rename = "proposal_maker")]
    ProposalMaker,
    #[serde(rename = "sales")]
    Sales,
}

impl Role {
    /// Получить код роли
    pub fn code(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Evaluator => "evaluator",
            Role::ProposalMaker => "proposal_maker",
            Role::Sales => "sales",
        }
    }

    /// Получить человекочитаемое название
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Evaluator => "Evaluator",
            Role::ProposalMaker => "Proposal Maker",
            Role::Sales => "Sales",
        }
    }

    /// Получить все роли
    pub fn all() -> Vec<Role> {
        vec![Role::Admin, Role::Evaluator, Role::ProposalMaker, Role::Sales]
    }

    /// Парсинг из строки
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "admin" => Some(Role::Admin),
            "evaluator" => Some(Role::Evaluator),
            "proposal_maker" => Some(Role::ProposalMaker),
            "sales" => Some(Role::Sales),
            _ => None,
        }
    }
}
