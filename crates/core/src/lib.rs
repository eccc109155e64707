pub mod config;
pub mod domain;
pub mod envelope;
pub mod errors;
pub mod store;

pub use domain::credit::CreditSummary;
pub use domain::invoice::{Invoice, InvoiceId, InvoiceStatus};
pub use domain::package::{Package, PackageId, Quota};
pub use domain::payment::{CardSummary, PaymentMethod, PaymentMethodId, MOCK_PAYMENT_METHOD_ID};
pub use domain::profile::UserProfile;
pub use envelope::{Envelope, EnvelopeStatus, ErrorData};
pub use errors::{ApplicationError, DomainError, DomainErrorKind, InterfaceError};
pub use store::{
    AvailableCards, BillingMockStore, CardAdded, OutstandingInvoices, PackageActivation,
    PackageCatalog, PaymentReceipt, PhoneValidation,
};
