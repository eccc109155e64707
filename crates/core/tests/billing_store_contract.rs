use serde_json::Value;
use telcobot_core::{BillingMockStore, Envelope, EnvelopeStatus, InvoiceStatus};

const USER: &str = "+14155550123";

#[test]
fn paying_outstanding_invoice_removes_it() {
    let mut store = BillingMockStore::seeded();

    let before = store.get_outstanding_invoices(USER);
    let ids_before = invoice_ids(&before.to_value());
    assert_eq!(ids_before, vec!["INV-2024-0342".to_string()]);

    let receipt = store.make_payment(USER, "INV-2024-0342", None);
    let receipt = receipt.success().expect("payment should succeed");
    assert_eq!(receipt.invoice_status, InvoiceStatus::Paid);
    assert_eq!(receipt.message, "Payment processed successfully");
    assert!(receipt.transaction_id.starts_with("TXN-"));

    let after = store.get_outstanding_invoices(USER);
    assert!(invoice_ids(&after.to_value()).is_empty());
}

#[test]
fn paid_invoice_cannot_be_paid_again() {
    let mut store = BillingMockStore::seeded();
    assert!(store.make_payment(USER, "INV-2024-0342", None).is_success());

    let second = store.make_payment(USER, "INV-2024-0342", None);
    assert_eq!(second.status(), EnvelopeStatus::Error);
}

#[test]
fn paying_unknown_invoice_is_an_error_and_changes_nothing() {
    let mut store = BillingMockStore::seeded();
    let count_before = store.outstanding_invoices().len();

    let result = store.make_payment(USER, "INV-1999-0001", Some("card_1111"));

    assert_eq!(result.status(), EnvelopeStatus::Error);
    assert_eq!(
        result.message(),
        Some("Invoice with ID INV-1999-0001 not found for user +14155550123.")
    );
    assert_eq!(store.outstanding_invoices().len(), count_before);
}

#[test]
fn phone_numbers_need_the_plus_one_prefix() {
    let store = BillingMockStore::seeded();

    let valid = store.validate_phone_number("+14155550123");
    assert!(matches!(valid, Envelope::Success(ref data) if data.is_valid));
    assert_eq!(valid.to_value()["data"]["message"], "Valid phone number");

    let invalid = store.validate_phone_number("4155550123");
    assert_eq!(invalid.status(), EnvelopeStatus::Error);
    let data = invalid.error().expect("error payload");
    assert!(!data.is_valid);
    assert_eq!(data.message, "Client not found");
}

#[test]
fn every_added_card_shares_the_same_payment_method_id() {
    let mut store = BillingMockStore::seeded();
    let cards = [("4111 1111 1111 1111", "12/2025"), ("5500 0000 0000 0004", "01/2027")];

    for (number, expiry) in cards {
        let added = store.add_card(USER, number, expiry);
        let added = added.success().expect("add card");
        assert_eq!(added.message, "Card added successfully");
        assert_eq!(added.added_card.card_number, number);
    }

    let listed = store.get_available_cards(USER).to_value();
    let methods = listed["data"]["payment_methods"].as_array().expect("array").clone();
    assert_eq!(methods.len(), cards.len());
    assert!(methods.iter().all(|method| method["payment_method_id"] == "card_1111"));
}

#[test]
fn activating_another_package_does_not_switch_the_current_one() {
    let store = BillingMockStore::seeded();

    let activation = store.activate_package(USER, "Standard");
    assert!(activation.is_success());
    assert_eq!(
        activation.success().map(|data| data.message.as_str()),
        Some("Package 'Standard' activated successfully")
    );

    let packages = store.get_available_packages(USER);
    let catalog = packages.success().expect("catalog");
    assert_eq!(catalog.current_package, "Premium Plus");
    let current: Vec<_> = catalog
        .available_packages
        .iter()
        .filter(|package| package.is_current)
        .map(|package| package.name.as_str())
        .collect();
    assert_eq!(current, vec!["Premium Plus"]);
}

#[test]
fn activating_the_current_package_reports_already_active() {
    let store = BillingMockStore::seeded();

    let result = store.activate_package(USER, "Premium Plus");

    assert_eq!(result.status(), EnvelopeStatus::Error);
    let message = result.message().expect("message");
    assert!(message.contains("already active"));
    assert_eq!(message, "Package 'Premium Plus' is already active for user +14155550123.");
}

#[test]
fn lookups_without_mutation_are_idempotent() {
    let mut store = BillingMockStore::seeded();
    store.add_card(USER, "4111 1111 1111 1111", "12/2025");

    assert_eq!(store.get_outstanding_invoices(USER), store.get_outstanding_invoices(USER));
    assert_eq!(store.get_available_cards(USER), store.get_available_cards(USER));
    assert_eq!(store.get_available_packages(USER), store.get_available_packages(USER));
}

#[test]
fn user_id_does_not_filter_shared_state() {
    let mut store = BillingMockStore::seeded();
    store.add_card("+15550000001", "4111", "12/2025");

    let other = store.get_available_cards("+15550000002");
    assert_eq!(other.success().map(|cards| cards.payment_methods.len()), Some(1));
    let invoices = store.get_outstanding_invoices("+15550000002").to_value();
    assert_eq!(invoice_ids(&invoices), vec!["INV-2024-0342".to_string()]);
}

#[test]
fn successful_envelopes_only_carry_status_and_data() {
    let mut store = BillingMockStore::seeded();
    let envelopes = vec![
        store.get_user_information(USER).to_value(),
        store.get_information_from_billing_system(USER).to_value(),
        store.get_outstanding_invoices(USER).to_value(),
        store.add_card(USER, "4111", "12/2025").to_value(),
        store.get_available_cards(USER).to_value(),
        store.validate_phone_number(USER).to_value(),
        store.get_available_packages(USER).to_value(),
        store.activate_package(USER, "Basic").to_value(),
        store.make_payment(USER, "INV-2024-0342", None).to_value(),
    ];

    for envelope in envelopes {
        let raw = serde_json::to_string(&envelope).expect("serialize");
        let decoded: Value = serde_json::from_str(&raw).expect("deserialize");
        let object = decoded.as_object().expect("envelope object");

        assert_eq!(object.len(), 2, "unexpected keys in {raw}");
        assert_eq!(object.get("status"), Some(&Value::from("success")));
        assert!(object.get("data").map(Value::is_object).unwrap_or(false));
    }
}

fn invoice_ids(envelope: &Value) -> Vec<String> {
    envelope["data"]["invoices"]
        .as_array()
        .map(|invoices| {
            invoices
                .iter()
                .filter_map(|invoice| invoice["invoice_id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
