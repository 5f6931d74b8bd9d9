use serde::{Deserialize, Serialize};

/// Приоритет позиции рабочего списка
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkPriority {
    #[serde(rename = "high")]
    High,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "low")]
    Low,
}

impl WorkPriority {
    pub fn code(&self) -> &'static str {
        match self {
            WorkPriority::High => "high",
            WorkPriority::Medium => "medium",
            WorkPriority::Low => "low",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "high" => Some(WorkPriority::High),
            "medium" => Some(WorkPriority::Medium),
            "low" => Some(WorkPriority::Low),
            _ => None,
        }
    }
}
