use serde::{Deserialize, Serialize};

/// Способ оплаты сервисного сбора
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    #[serde(rename = "full")]
    Full,
    #[serde(rename = "installment")]
    Installment,
}

impl PaymentType {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentType::Full => "full",
            PaymentType::Installment => "installment",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "full" => Some(PaymentType::Full),
            "installment" => Some(PaymentType::Installment),
            _ => None,
        }
    }
}
