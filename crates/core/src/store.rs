//! Volatile billing state behind the agent's tool calls.
//!
//! `BillingMockStore` owns the only two mutable collections in the system:
//! outstanding invoices and saved payment methods. Profiles, credit balances
//! and the package catalog are rebuilt from static data on every call.
//!
//! The user id is accepted by every operation but only used to tag new cards
//! and to echo back in payloads; all callers see the same invoices and cards.
//!
//! The store does no locking. Wrap it in a mutex before sharing it between
//! concurrent callers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::credit::CreditSummary;
use crate::domain::invoice::{Invoice, InvoiceStatus};
use crate::domain::package::{catalog, Package};
use crate::domain::payment::{CardSummary, PaymentMethod, PaymentMethodId};
use crate::domain::profile::UserProfile;
use crate::envelope::Envelope;
use crate::errors::DomainError;

pub const REQUIRED_PHONE_PREFIX: &str = "+1";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutstandingInvoices {
    pub user_id: String,
    pub invoices: Vec<Invoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableCards {
    pub payment_methods: Vec<CardSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAdded {
    pub message: String,
    pub added_card: CardSummary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub message: String,
    pub transaction_id: String,
    pub invoice_status: InvoiceStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneValidation {
    pub is_valid: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackageCatalog {
    pub user_id: String,
    pub current_package: String,
    pub available_packages: Vec<Package>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageActivation {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BillingMockStore {
    outstanding_invoices: Vec<Invoice>,
    payment_methods: Vec<PaymentMethod>,
}

impl Default for BillingMockStore {
    fn default() -> Self {
        Self::seeded()
    }
}

impl BillingMockStore {
    /// Builds a store over the given collections.
    ///
    /// Invoice ids must be unique; later duplicates of an id are dropped.
    pub fn new(outstanding_invoices: Vec<Invoice>, payment_methods: Vec<PaymentMethod>) -> Self {
        let mut unique: Vec<Invoice> = Vec::with_capacity(outstanding_invoices.len());
        for invoice in outstanding_invoices {
            if !unique.iter().any(|existing| existing.invoice_id == invoice.invoice_id) {
                unique.push(invoice);
            }
        }

        Self { outstanding_invoices: unique, payment_methods }
    }

    /// A fresh store holding the single overdue March 2024 invoice and no cards.
    pub fn seeded() -> Self {
        Self::new(vec![Invoice::march_2024_service_charge()], Vec::new())
    }

    pub fn outstanding_invoices(&self) -> &[Invoice] {
        &self.outstanding_invoices
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    pub fn get_user_information(&self, user_id: &str) -> Envelope<UserProfile> {
        Envelope::Success(UserProfile::synthetic(user_id))
    }

    pub fn get_information_from_billing_system(&self, user_id: &str) -> Envelope<CreditSummary> {
        Envelope::Success(CreditSummary::synthetic(user_id))
    }

    pub fn get_outstanding_invoices(&self, user_id: &str) -> Envelope<OutstandingInvoices> {
        Envelope::Success(OutstandingInvoices {
            user_id: user_id.to_string(),
            invoices: self.outstanding_invoices.clone(),
        })
    }

    pub fn get_available_cards(&self, _user_id: &str) -> Envelope<AvailableCards> {
        Envelope::Success(AvailableCards {
            payment_methods: self.payment_methods.iter().map(CardSummary::from).collect(),
        })
    }

    pub fn add_card(
        &mut self,
        user_id: &str,
        card_number: &str,
        expiration_date: &str,
    ) -> Envelope<CardAdded> {
        let method = PaymentMethod {
            user_id: user_id.to_string(),
            card_number: card_number.to_string(),
            expiration_date: expiration_date.to_string(),
            payment_method_id: PaymentMethodId::mock(),
        };
        let added_card = CardSummary::from(&method);
        self.payment_methods.push(method);

        Envelope::Success(CardAdded { message: "Card added successfully".to_string(), added_card })
    }

    /// Pays and removes the first outstanding invoice with `invoice_id`.
    ///
    /// `payment_method_id` is accepted but never checked against saved cards.
    pub fn make_payment(
        &mut self,
        user_id: &str,
        invoice_id: &str,
        _payment_method_id: Option<&str>,
    ) -> Envelope<PaymentReceipt> {
        self.settle_invoice(user_id, invoice_id).into()
    }

    pub fn validate_phone_number(
        &self,
        phone_number: &str,
    ) -> Envelope<PhoneValidation, PhoneValidation> {
        if phone_number.starts_with(REQUIRED_PHONE_PREFIX) {
            return Envelope::Success(PhoneValidation {
                is_valid: true,
                message: "Valid phone number".to_string(),
            });
        }

        let rejected = DomainError::PhoneNumberRejected { phone_number: phone_number.to_string() };
        Envelope::Error(PhoneValidation { is_valid: false, message: rejected.to_string() })
    }

    pub fn get_available_packages(&self, user_id: &str) -> Envelope<PackageCatalog> {
        Envelope::Success(self.package_catalog(user_id))
    }

    /// Checks the requested package against the catalog.
    ///
    /// Nothing is switched: the subscription keeps reporting the same current
    /// package afterwards.
    pub fn activate_package(
        &self,
        user_id: &str,
        package_name: &str,
    ) -> Envelope<PackageActivation> {
        self.check_activation(user_id, package_name).into()
    }

    fn settle_invoice(
        &mut self,
        user_id: &str,
        invoice_id: &str,
    ) -> Result<PaymentReceipt, DomainError> {
        let position = self
            .outstanding_invoices
            .iter()
            .position(|invoice| invoice.invoice_id.as_str() == invoice_id)
            .ok_or_else(|| DomainError::InvoiceNotFound {
                invoice_id: invoice_id.to_string(),
                user_id: user_id.to_string(),
            })?;

        let mut paid = self.outstanding_invoices.remove(position);
        paid.mark_paid();

        Ok(PaymentReceipt {
            message: "Payment processed successfully".to_string(),
            transaction_id: new_transaction_id(),
            invoice_status: paid.status,
        })
    }

    fn check_activation(
        &self,
        user_id: &str,
        package_name: &str,
    ) -> Result<PackageActivation, DomainError> {
        let catalog = self.package_catalog(user_id);
        let requested = catalog
            .available_packages
            .iter()
            .find(|package| package.matches_name(package_name))
            .ok_or_else(|| DomainError::PackageNotFound { package_name: package_name.to_string() })?;

        if requested.name == catalog.current_package {
            return Err(DomainError::PackageAlreadyActive {
                package_name: package_name.to_string(),
                user_id: user_id.to_string(),
            });
        }

        Ok(PackageActivation { message: format!("Package '{package_name}' activated successfully") })
    }

    fn package_catalog(&self, user_id: &str) -> PackageCatalog {
        let profile = UserProfile::synthetic(user_id);
        let current_package = profile.current_plan().to_string();

        PackageCatalog {
            user_id: user_id.to_string(),
            available_packages: catalog(&current_package),
            current_package,
        }
    }
}

/// `TXN-` plus the first eight hex digits of a random UUID, uppercased.
pub fn new_transaction_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("TXN-{}", hex[..8].to_ascii_uppercase())
}
