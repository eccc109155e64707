use serde::{Deserialize, Serialize};

/// Identifier handed out for every card added to the mock store.
///
/// Every card shares it; callers relying on uniqueness must not use this store.
pub const MOCK_PAYMENT_METHOD_ID: &str = "card_1111";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethodId(pub String);

impl PaymentMethodId {
    pub fn mock() -> Self {
        Self(MOCK_PAYMENT_METHOD_ID.to_string())
    }
}

/// A saved card as stored, including the owning user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub user_id: String,
    pub card_number: String,
    pub expiration_date: String,
    pub payment_method_id: PaymentMethodId,
}

/// The projection of a [`PaymentMethod`] that is handed back to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub card_number: String,
    pub expiration_date: String,
    pub payment_method_id: PaymentMethodId,
}

impl From<&PaymentMethod> for CardSummary {
    fn from(method: &PaymentMethod) -> Self {
        Self {
            card_number: method.card_number.clone(),
            expiration_date: method.expiration_date.clone(),
            payment_method_id: method.payment_method_id.clone(),
        }
    }
}
