//! Slowly-changing lookup entities joined onto primary records by id

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Customer (`/clientes`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Customer {
    /// Customer id
    pub id: i64,
    /// Customer type label
    pub type_customer: Option<String>,
    /// Tax identifier
    pub rut: Option<String>,
    /// Legal name
    pub name: Option<String>,
    /// Trade name
    pub name_fantasy: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// Declared business activity
    pub business_activity: Option<String>,
    /// City foreign key
    pub city_id: Option<i64>,
    /// Commune foreign key
    pub commune_id: Option<i64>,
    /// Whether the customer is active
    pub active: Option<bool>,
    /// Internal code
    pub code: Option<String>,
    /// Billing e-mail addresses
    #[serde(deserialize_with = "super::null_as_default")]
    pub email: Vec<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Mobile number
    pub mobile: Option<String>,
    /// Credit line amount
    pub credit_amount: Option<Decimal>,
    /// Formatted full address
    pub full_address: Option<String>,
}

/// City (`/ciudades`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct City {
    /// City id
    pub id: i64,
    /// Display name
    #[serde(deserialize_with = "super::null_as_default")]
    pub name: String,
}

/// Commune (`/comunas`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Commune {
    /// Commune id
    pub id: i64,
    /// Display name
    #[serde(deserialize_with = "super::null_as_default")]
    pub name: String,
    /// Owning city
    pub city_id: Option<i64>,
}

/// Seller (`/vendedores`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Seller {
    /// Seller id
    pub id: i64,
    /// Given name
    #[serde(deserialize_with = "super::null_as_default")]
    pub first_name: String,
    /// Family name
    #[serde(deserialize_with = "super::null_as_default")]
    pub last_name: String,
    /// Role, `"unknown"` for sellers recovered from print documents
    pub role: Option<String>,
    /// Profile foreign key
    pub profile_id: Option<i64>,
}

impl Seller {
    /// Role assigned to sellers synthesized from a print document
    pub const UNKNOWN_ROLE: &'static str = "unknown";

    /// Minimal seller built from a display name found in a print document
    pub fn synthesized(id: i64, first_name: String, last_name: String) -> Self {
        Self {
            id,
            first_name,
            last_name,
            role: Some(Self::UNKNOWN_ROLE.to_string()),
            profile_id: None,
        }
    }

    /// "First Last", trimmed
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Payment type (`/forma_pagos`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaymentType {
    /// Payment type id
    pub id: i64,
    /// Display name
    #[serde(deserialize_with = "super::null_as_default")]
    pub name: String,
    /// Tax authority payment code
    pub fma_pago_sii: Option<i64>,
    /// Payment kind discriminator
    pub kind_payment: Option<i64>,
    /// Whether the payment type is enabled
    pub enabled: Option<bool>,
}

/// Platform user (`/usuarios`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct User {
    /// User id
    pub id: i64,
    /// Branch foreign key
    pub branch_id: Option<i64>,
    /// Given name
    #[serde(deserialize_with = "super::null_as_default")]
    pub first_name: String,
    /// Family name
    #[serde(deserialize_with = "super::null_as_default")]
    pub last_name: String,
    /// Role
    pub role: Option<String>,
    /// Login e-mail
    pub email: Option<String>,
    /// Linked seller
    pub seller_id: Option<i64>,
    /// Default payment type
    pub type_payment_id: Option<i64>,
}

impl User {
    /// "First Last", trimmed
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Reference document code (`/references`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Reference {
    /// Reference code id
    pub id: i64,
    /// Short code
    pub code: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Whether the code refers to an electronic document
    pub is_dte: Option<bool>,
}
