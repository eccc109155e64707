use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::utc_timestamp;

/// Balance snapshot reported by the billing system for a line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreditSummary {
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub available_credit: Decimal,
    pub last_updated: DateTime<Utc>,
    pub credit_status: String,
    pub pending_transactions: u32,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub voice_balance: Decimal,
    pub data_balance: String,
    pub sms_balance: u32,
    pub active_bundles: Vec<ActiveBundle>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBundle {
    pub name: String,
    pub remaining: String,
    pub expiry: DateTime<Utc>,
}

impl CreditSummary {
    pub fn synthetic(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            available_credit: Decimal::new(10000, 2),
            last_updated: utc_timestamp(2024, 3, 20, 10, 30, 0),
            credit_status: "normal".to_string(),
            pending_transactions: 0,
            currency: "USD".to_string(),
            voice_balance: Decimal::new(5000, 2),
            data_balance: "2.5GB".to_string(),
            sms_balance: 100,
            active_bundles: vec![ActiveBundle {
                name: "Premium Data".to_string(),
                remaining: "1.5GB".to_string(),
                expiry: utc_timestamp(2024, 3, 25, 23, 59, 59),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CreditSummary;

    #[test]
    fn synthetic_summary_echoes_user() {
        let value = serde_json::to_value(CreditSummary::synthetic("+14155550123")).expect("json");

        assert_eq!(value["user_id"], "+14155550123");
        assert_eq!(value["available_credit"], 100.0);
        assert_eq!(value["active_bundles"][0]["expiry"], "2024-03-25T23:59:59Z");
    }
}
