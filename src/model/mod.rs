//! Upstream API data model
//!
//! All records deserialize leniently: unknown fields are ignored, missing or
//! `null` fields fall back to their defaults. Amounts are [`rust_decimal::Decimal`]
//! and accept both JSON numbers (DTEs) and numeric strings (estimates).

use serde::{Deserialize, Deserializer, Serialize};

pub mod dte;
pub mod estimate;
pub mod line_items;
pub mod print;
pub mod reference;

pub use dte::{Dte, DteDetail};
pub use estimate::Estimate;
pub use line_items::{DteChild, DteReference, Email, FileLink, Product, SiiTrack};
pub use print::PrintDocument;
pub use reference::{City, Commune, Customer, PaymentType, Reference, Seller, User};

/// Treat an explicit JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Nullable join keys of a primary record into the reference cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForeignKeys {
    /// `customer_id`
    pub customer_id: Option<i64>,
    /// `city_id`
    pub city_id: Option<i64>,
    /// `commune_id`
    pub commune_id: Option<i64>,
    /// `seller_id`
    pub seller_id: Option<i64>,
    /// `type_payment_id`
    pub type_payment_id: Option<i64>,
    /// `user_id`
    pub user_id: Option<i64>,
}

/// Pagination metadata attached to every list response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageMeta {
    /// API status code
    pub code: Option<i64>,
    /// API status message
    pub message: Option<String>,
    /// Page this response belongs to
    pub current_page: Option<u32>,
    /// Next page, if any
    pub next_page: Option<u32>,
    /// Previous page, if any
    pub prev_page: Option<u32>,
    /// Total number of pages
    pub total_pages: Option<u32>,
    /// Total number of records across all pages
    pub total_count: Option<u64>,
}

impl PageMeta {
    /// Page count, treating a missing value as a single page
    pub fn page_count(&self) -> u32 {
        self.total_pages.unwrap_or(1).max(1)
    }
}

/// `{ "data": T }` wrapper of single-entity responses
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Payload
    pub data: T,
}

/// One decoded page of a collection endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    /// Records found under the collection key
    pub records: Vec<T>,
    /// Pagination metadata
    pub meta: PageMeta,
}
