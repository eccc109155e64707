//! The billing operations exposed to the model as callable tools.
//!
//! Every tool locks the shared store for the duration of one operation, so
//! concurrent conversations never interleave inside a mutation.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use telcobot_core::BillingMockStore;
use tokio::sync::Mutex;
use tracing::info;

use crate::tools::{parse_arguments, Tool, ToolRegistry};

pub type SharedBillingStore = Arc<Mutex<BillingMockStore>>;

pub fn shared_store(store: BillingMockStore) -> SharedBillingStore {
    Arc::new(Mutex::new(store))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BillingOperation {
    GetOutstandingInvoices,
    GetUserInformation,
    AddCard,
    GetAvailableCards,
    MakePayment,
    ValidatePhoneNumber,
    GetAvailablePackages,
    ActivatePackage,
    GetBillingInformation,
}

impl BillingOperation {
    pub const ALL: [BillingOperation; 9] = [
        Self::GetOutstandingInvoices,
        Self::GetUserInformation,
        Self::AddCard,
        Self::GetAvailableCards,
        Self::MakePayment,
        Self::ValidatePhoneNumber,
        Self::GetAvailablePackages,
        Self::ActivatePackage,
        Self::GetBillingInformation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetOutstandingInvoices => "get_outstanding_invoices",
            Self::GetUserInformation => "get_user_information",
            Self::AddCard => "add_card",
            Self::GetAvailableCards => "get_available_cards",
            Self::MakePayment => "make_payment",
            Self::ValidatePhoneNumber => "validate_phone_number",
            Self::GetAvailablePackages => "get_available_packages",
            Self::ActivatePackage => "activate_package",
            Self::GetBillingInformation => "get_information_from_billing_system",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::GetOutstandingInvoices => {
                "Get the outstanding invoices (id, issue date, due date, amount, status, \
                 description) for the customer's phone number."
            }
            Self::GetUserInformation => {
                "Get the customer's profile, subscription plan, enabled services and billing \
                 details from the customer database."
            }
            Self::AddCard => {
                "Add a payment card for the customer. The expiration date uses the MM/YYYY format."
            }
            Self::GetAvailableCards => {
                "List the saved cards (card number, expiration date, payment method id) that can \
                 be used to pay an invoice."
            }
            Self::MakePayment => {
                "Pay an outstanding invoice. Optionally pass the payment method id of a saved card."
            }
            Self::ValidatePhoneNumber => "Check whether a phone number belongs to a known client.",
            Self::GetAvailablePackages => {
                "List the telco packages the customer can subscribe to, marking the current one."
            }
            Self::ActivatePackage => {
                "Activate a package for the customer by name (e.g. \"Premium Plus\", \
                 \"Standard\", \"Basic\")."
            }
            Self::GetBillingInformation => {
                "Get credit information from the billing system: available credit, voice, data \
                 and SMS balances, and active bundles."
            }
        }
    }

    pub fn parameters(&self) -> Value {
        let user_id = json!({
            "type": "string",
            "description": "The customer's phone number, e.g. +14155550123",
        });

        match self {
            Self::GetOutstandingInvoices
            | Self::GetUserInformation
            | Self::GetAvailableCards
            | Self::GetAvailablePackages
            | Self::GetBillingInformation => object_schema(json!({ "user_id": user_id }), &["user_id"]),
            Self::AddCard => object_schema(
                json!({
                    "user_id": user_id,
                    "card_number": { "type": "string", "description": "The full card number" },
                    "expiration_date": { "type": "string", "description": "Expiration date as MM/YYYY" },
                }),
                &["user_id", "card_number", "expiration_date"],
            ),
            Self::MakePayment => object_schema(
                json!({
                    "user_id": user_id,
                    "invoice_id": { "type": "string", "description": "The invoice to pay, e.g. INV-2024-0342" },
                    "payment_method_id": { "type": "string", "description": "Saved card to charge" },
                }),
                &["user_id", "invoice_id"],
            ),
            Self::ValidatePhoneNumber => object_schema(
                json!({
                    "phone_number": { "type": "string", "description": "The phone number to validate" },
                }),
                &["phone_number"],
            ),
            Self::ActivatePackage => object_schema(
                json!({
                    "user_id": user_id,
                    "package_name": { "type": "string", "description": "Name of the package to activate" },
                }),
                &["user_id", "package_name"],
            ),
        }
    }
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

#[derive(Deserialize)]
struct UserArgs {
    user_id: String,
}

#[derive(Deserialize)]
struct AddCardArgs {
    user_id: String,
    card_number: String,
    expiration_date: String,
}

#[derive(Deserialize)]
struct MakePaymentArgs {
    user_id: String,
    invoice_id: String,
    #[serde(default)]
    payment_method_id: Option<String>,
}

#[derive(Deserialize)]
struct PhoneArgs {
    phone_number: String,
}

#[derive(Deserialize)]
struct ActivatePackageArgs {
    user_id: String,
    package_name: String,
}

pub struct BillingTool {
    operation: BillingOperation,
    store: SharedBillingStore,
}

impl BillingTool {
    pub fn new(operation: BillingOperation, store: SharedBillingStore) -> Self {
        Self { operation, store }
    }

    async fn run(&self, input: Value) -> Result<Value> {
        let name = self.operation.name();

        let envelope = match self.operation {
            BillingOperation::GetOutstandingInvoices => {
                let args: UserArgs = parse_arguments(name, input)?;
                self.store.lock().await.get_outstanding_invoices(&args.user_id).to_value()
            }
            BillingOperation::GetUserInformation => {
                let args: UserArgs = parse_arguments(name, input)?;
                self.store.lock().await.get_user_information(&args.user_id).to_value()
            }
            BillingOperation::AddCard => {
                let args: AddCardArgs = parse_arguments(name, input)?;
                self.store
                    .lock()
                    .await
                    .add_card(&args.user_id, &args.card_number, &args.expiration_date)
                    .to_value()
            }
            BillingOperation::GetAvailableCards => {
                let args: UserArgs = parse_arguments(name, input)?;
                self.store.lock().await.get_available_cards(&args.user_id).to_value()
            }
            BillingOperation::MakePayment => {
                let args: MakePaymentArgs = parse_arguments(name, input)?;
                self.store
                    .lock()
                    .await
                    .make_payment(&args.user_id, &args.invoice_id, args.payment_method_id.as_deref())
                    .to_value()
            }
            BillingOperation::ValidatePhoneNumber => {
                let args: PhoneArgs = parse_arguments(name, input)?;
                self.store.lock().await.validate_phone_number(&args.phone_number).to_value()
            }
            BillingOperation::GetAvailablePackages => {
                let args: UserArgs = parse_arguments(name, input)?;
                self.store.lock().await.get_available_packages(&args.user_id).to_value()
            }
            BillingOperation::ActivatePackage => {
                let args: ActivatePackageArgs = parse_arguments(name, input)?;
                self.store.lock().await.activate_package(&args.user_id, &args.package_name).to_value()
            }
            BillingOperation::GetBillingInformation => {
                let args: UserArgs = parse_arguments(name, input)?;
                self.store.lock().await.get_information_from_billing_system(&args.user_id).to_value()
            }
        };

        info!(
            event_name = "agent.tool.completed",
            tool = name,
            status = envelope["status"].as_str().unwrap_or("unknown"),
            "billing tool completed"
        );
        Ok(envelope)
    }
}

#[async_trait]
impl Tool for BillingTool {
    fn name(&self) -> &'static str {
        self.operation.name()
    }

    fn description(&self) -> &'static str {
        self.operation.description()
    }

    fn parameters(&self) -> Value {
        self.operation.parameters()
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        self.run(input).await
    }
}

/// A registry holding every billing tool, all bound to `store`.
pub fn billing_registry(store: SharedBillingStore) -> ToolRegistry {
    let mut registry = ToolRegistry::default();
    for operation in BillingOperation::ALL {
        registry.register(BillingTool::new(operation, store.clone()));
    }
    registry
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use telcobot_core::BillingMockStore;

    use super::{billing_registry, shared_store, BillingOperation};
    use crate::tools::ToolError;

    const USER: &str = "+14155550123";

    #[test]
    fn registry_exposes_every_operation_by_original_name() {
        let registry = billing_registry(shared_store(BillingMockStore::seeded()));

        assert_eq!(registry.len(), BillingOperation::ALL.len());
        assert_eq!(
            registry.names(),
            vec![
                "get_outstanding_invoices",
                "get_user_information",
                "add_card",
                "get_available_cards",
                "make_payment",
                "validate_phone_number",
                "get_available_packages",
                "activate_package",
                "get_information_from_billing_system",
            ]
        );
    }

    #[test]
    fn schemas_mark_required_arguments() {
        let schema = BillingOperation::MakePayment.parameters();
        assert_eq!(schema["required"], json!(["user_id", "invoice_id"]));
        assert_eq!(schema["properties"]["payment_method_id"]["type"], "string");
    }

    #[tokio::test]
    async fn tools_share_one_store() {
        let store = shared_store(BillingMockStore::seeded());
        let registry = billing_registry(store.clone());

        let paid = registry
            .dispatch("make_payment", json!({ "user_id": USER, "invoice_id": "INV-2024-0342" }))
            .await
            .expect("payment dispatch");
        assert_eq!(paid["status"], "success");
        assert_eq!(paid["data"]["invoice_status"], "paid");

        let listed = registry
            .dispatch("get_outstanding_invoices", json!({ "user_id": USER }))
            .await
            .expect("list dispatch");
        assert_eq!(listed["data"]["invoices"], json!([]));
        assert!(store.lock().await.outstanding_invoices().is_empty());
    }

    #[tokio::test]
    async fn domain_failures_stay_inside_the_envelope() {
        let registry = billing_registry(shared_store(BillingMockStore::seeded()));

        let result = registry
            .dispatch("validate_phone_number", json!({ "phone_number": "4155550123" }))
            .await
            .expect("dispatch succeeds even when validation fails");

        assert_eq!(result, json!({
            "status": "error",
            "data": { "is_valid": false, "message": "Client not found" },
        }));
    }

    #[tokio::test]
    async fn missing_arguments_are_rejected_before_touching_the_store() {
        let store = shared_store(BillingMockStore::seeded());
        let registry = billing_registry(store.clone());

        let error = registry
            .dispatch("add_card", json!({ "user_id": USER, "card_number": "4111" }))
            .await
            .expect_err("expiration date is required");

        assert!(matches!(error, ToolError::InvalidArguments { ref tool, .. } if tool == "add_card"));
        assert!(store.lock().await.payment_methods().is_empty());
    }
}
