//! Estimates (quotes) from `/cotizaciones`

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line_items::{Email, FileLink, Product};
use super::ForeignKeys;

/// Estimate record; the list and detail endpoints share this shape, the list
/// variant simply leaves `products` and `emails` empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Estimate {
    /// Estimate id
    pub id: i64,
    /// Company
    pub company_id: Option<i64>,
    /// Business unit
    pub business_id: Option<i64>,
    /// Customer foreign key
    pub customer_id: Option<i64>,
    /// City foreign key
    pub city_id: Option<i64>,
    /// Commune foreign key
    pub commune_id: Option<i64>,
    /// Author foreign key
    pub user_id: Option<i64>,
    /// Payment type foreign key
    pub type_payment_id: Option<i64>,
    /// Seller foreign key
    pub seller_id: Option<i64>,
    /// Branch
    pub branch_id: Option<i64>,
    /// Issue date
    pub start_date: Option<String>,
    /// Expiry date
    pub end_date: Option<String>,
    /// Folio number
    pub folio: Option<i64>,
    /// Billing address
    pub address: Option<String>,
    /// VAT rate
    pub iva: Option<Decimal>,
    /// Global discount
    pub global_discount: Option<Decimal>,
    /// Workflow status
    pub status: Option<String>,
    /// Free-text comment
    pub comment: Option<String>,
    /// Contact name
    pub contact: Option<String>,
    /// Rendered PDF
    pub pdf_file: Option<FileLink>,
    /// Total amount (sent as a string upstream)
    pub amount_total: Option<Decimal>,
    /// VAT amount
    pub amount_iva: Option<Decimal>,
    /// Net amount
    pub amount_neto: Option<Decimal>,
    /// Exempt amount
    pub amount_exempt: Option<Decimal>,
    /// Additional taxes
    pub amount_tax: Option<Decimal>,
    /// Payment terms comment
    pub payment_comment: Option<String>,
    /// Validity in days
    pub valid_for: Option<i64>,
    /// Delivery time text
    pub delivery_time: Option<String>,
    /// Currency code
    pub currency: Option<String>,
    /// Label
    pub label_value: Option<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
    /// Product lines (detail only)
    #[serde(deserialize_with = "super::null_as_default")]
    pub products: Vec<Product>,
    /// E-mails sent (detail only)
    #[serde(deserialize_with = "super::null_as_default")]
    pub emails: Vec<Email>,
}

impl Estimate {
    /// Join keys into the reference cache
    pub fn foreign_keys(&self) -> ForeignKeys {
        ForeignKeys {
            customer_id: self.customer_id,
            city_id: self.city_id,
            commune_id: self.commune_id,
            seller_id: self.seller_id,
            type_payment_id: self.type_payment_id,
            user_id: self.user_id,
        }
    }
}
