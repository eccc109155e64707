use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::utc_timestamp;

/// Plan every synthetic customer is subscribed to.
pub const DEFAULT_PLAN_NAME: &str = "Premium Plus";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_profile: CustomerProfile,
    pub subscription: Subscription,
    pub services: ServiceFlags,
    pub billing: BillingDetails,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub full_name: String,
    pub email: String,
    pub user_id: String,
    pub account_status: String,
    pub registration_date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan_name: String,
    pub plan_type: String,
    pub start_date: DateTime<Utc>,
    pub renewal_date: DateTime<Utc>,
    pub auto_renewal: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFlags {
    pub voice: bool,
    pub data: bool,
    pub sms: bool,
    pub roaming: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDetails {
    pub billing_address: BillingAddress,
    pub payment_method: String,
    pub billing_cycle: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl UserProfile {
    /// The same customer is returned for every user id; only `user_id` is echoed.
    pub fn synthetic(user_id: &str) -> Self {
        let registered = utc_timestamp(2023, 1, 15, 0, 0, 0);

        Self {
            user_profile: CustomerProfile {
                customer_id: "CUST123456".to_string(),
                full_name: "John Doe".to_string(),
                email: "john.doe@example.com".to_string(),
                user_id: user_id.to_string(),
                account_status: "active".to_string(),
                registration_date: registered,
            },
            subscription: Subscription {
                plan_name: DEFAULT_PLAN_NAME.to_string(),
                plan_type: "postpaid".to_string(),
                start_date: registered,
                renewal_date: utc_timestamp(2024, 1, 15, 0, 0, 0),
                auto_renewal: true,
            },
            services: ServiceFlags { voice: true, data: true, sms: true, roaming: true },
            billing: BillingDetails {
                billing_address: BillingAddress {
                    street: "123 Main St".to_string(),
                    city: "New York".to_string(),
                    state: "NY".to_string(),
                    zip: "10001".to_string(),
                    country: "USA".to_string(),
                },
                payment_method: "credit_card".to_string(),
                billing_cycle: "monthly".to_string(),
            },
        }
    }

    pub fn current_plan(&self) -> &str {
        &self.subscription.plan_name
    }
}
