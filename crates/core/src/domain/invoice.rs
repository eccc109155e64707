use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::utc_timestamp;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub String);

impl InvoiceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Overdue,
    Paid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: InvoiceId,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: InvoiceStatus,
    pub description: String,
}

impl Invoice {
    /// The single overdue invoice every fresh store starts with.
    pub fn march_2024_service_charge() -> Self {
        Self {
            invoice_id: InvoiceId("INV-2024-0342".to_string()),
            issue_date: utc_timestamp(2024, 3, 1, 0, 0, 0),
            due_date: utc_timestamp(2024, 3, 15, 23, 59, 59),
            amount: Decimal::new(8999, 2),
            status: InvoiceStatus::Overdue,
            description: "Monthly service charge - March 2024".to_string(),
        }
    }

    pub fn mark_paid(&mut self) {
        self.status = InvoiceStatus::Paid;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Invoice, InvoiceStatus};

    #[test]
    fn paying_is_idempotent() {
        let mut invoice = Invoice::march_2024_service_charge();
        invoice.mark_paid();
        assert_eq!(invoice.status, InvoiceStatus::Paid);

        invoice.mark_paid();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[test]
    fn seeded_invoice_serializes_with_wire_field_names() {
        let value = serde_json::to_value(Invoice::march_2024_service_charge()).expect("serialize");

        assert_eq!(
            value,
            json!({
                "invoice_id": "INV-2024-0342",
                "issue_date": "2024-03-01T00:00:00Z",
                "due_date": "2024-03-15T23:59:59Z",
                "amount": 89.99,
                "status": "overdue",
                "description": "Monthly service charge - March 2024",
            })
        );
    }
}
