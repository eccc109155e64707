use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(pub String);

/// An allowance that is either a plain count (`1000`) or a label (`"Unlimited"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quota {
    Count(u32),
    Label(String),
}

impl Quota {
    pub fn unlimited() -> Self {
        Self::Label("Unlimited".to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAllowance {
    pub amount: String,
    pub high_speed_cap: String,
    pub throttle_speed: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceAllowance {
    pub minutes: Quota,
    pub international: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsAllowance {
    pub messages: Quota,
    pub international: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub package_id: PackageId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub billing_cycle: String,
    pub data: DataAllowance,
    pub voice: VoiceAllowance,
    pub sms: SmsAllowance,
    pub features: Vec<String>,
    pub is_current: bool,
}

impl Package {
    pub fn matches_name(&self, requested: &str) -> bool {
        self.name.to_lowercase() == requested.to_lowercase()
    }
}

/// The fixed three-package catalog, with `is_current` set for `current_plan`.
pub fn catalog(current_plan: &str) -> Vec<Package> {
    let mut packages = vec![premium_plus(), standard(), basic()];
    for package in &mut packages {
        package.is_current = package.name == current_plan;
    }
    packages
}

fn premium_plus() -> Package {
    Package {
        package_id: PackageId("PKG-001".to_string()),
        name: "Premium Plus".to_string(),
        price: Decimal::new(8999, 2),
        currency: "USD".to_string(),
        billing_cycle: "monthly".to_string(),
        data: DataAllowance {
            amount: "Unlimited".to_string(),
            high_speed_cap: "50GB".to_string(),
            throttle_speed: "3Mbps".to_string(),
        },
        voice: VoiceAllowance { minutes: Quota::unlimited(), international: true },
        sms: SmsAllowance { messages: Quota::unlimited(), international: true },
        features: features(&[
            "5G Access",
            "Mobile Hotspot (30GB)",
            "HD Streaming",
            "International Roaming",
        ]),
        is_current: false,
    }
}

fn standard() -> Package {
    Package {
        package_id: PackageId("PKG-002".to_string()),
        name: "Standard".to_string(),
        price: Decimal::new(5999, 2),
        currency: "USD".to_string(),
        billing_cycle: "monthly".to_string(),
        data: DataAllowance {
            amount: "25GB".to_string(),
            high_speed_cap: "25GB".to_string(),
            throttle_speed: "2Mbps".to_string(),
        },
        voice: VoiceAllowance { minutes: Quota::unlimited(), international: false },
        sms: SmsAllowance { messages: Quota::unlimited(), international: false },
        features: features(&["5G Access", "Mobile Hotspot (10GB)", "SD Streaming"]),
        is_current: false,
    }
}

fn basic() -> Package {
    Package {
        package_id: PackageId("PKG-003".to_string()),
        name: "Basic".to_string(),
        price: Decimal::new(3999, 2),
        currency: "USD".to_string(),
        billing_cycle: "monthly".to_string(),
        data: DataAllowance {
            amount: "10GB".to_string(),
            high_speed_cap: "10GB".to_string(),
            throttle_speed: "1Mbps".to_string(),
        },
        voice: VoiceAllowance { minutes: Quota::Count(1000), international: false },
        sms: SmsAllowance { messages: Quota::Count(1000), international: false },
        features: features(&["4G Access", "Mobile Hotspot (5GB)"]),
        is_current: false,
    }
}

fn features(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
