//! Nested collections carried by DTE and estimate detail payloads

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Link to a stored file (PDF, XML)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileLink {
    /// Download URL
    pub url: Option<String>,
}

/// Product line of a document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Product {
    /// Catalog product id
    pub product_id: Option<i64>,
    /// Product name
    pub name: Option<String>,
    /// Product code
    pub code: Option<String>,
    /// Line description
    pub description: Option<String>,
    /// Quantity
    pub quantity: Option<Decimal>,
    /// Unit price
    pub price: Option<Decimal>,
    /// Discount percentage
    pub discount: Option<Decimal>,
    /// Surcharge percentage
    pub surcharge: Option<Decimal>,
    /// Unit of measure
    pub unit_item: Option<String>,
    /// Whether the line is taxed
    pub tax_affected: Option<bool>,
    /// Unit cost
    pub unit_cost: Option<Decimal>,
    /// Additional tax code
    pub additional_tax_code: Option<String>,
    /// Additional tax fee
    pub additional_tax_fee: Option<Decimal>,
    /// Net amount of the line
    pub real_amount_neto: Option<Decimal>,
    /// Lot / serial number
    pub lot_serial_number: Option<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
}

/// E-mail sent for a document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Email {
    /// E-mail id
    pub id: i64,
    /// Recipient address
    pub email: Option<String>,
    /// Subject line
    pub subject: Option<String>,
    /// Body
    pub message: Option<String>,
    /// Reminder foreign key
    pub reminder_id: Option<i64>,
    /// Creation timestamp
    pub created_at: Option<String>,
}

/// Tax authority status transition of a DTE
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiiTrack {
    /// Status code
    pub sii_status: Option<String>,
    /// Free-text note
    pub note: Option<String>,
    /// Web-service status
    pub ws_status: Option<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Reference from one DTE to another document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DteReference {
    /// Reference id
    pub id: i64,
    /// Referenced document type (reference-code id)
    pub tpo_doc_ref_id: Option<i64>,
    /// Reference reason code
    pub code_ref: Option<i64>,
    /// Referenced folio
    pub folio_ref: Option<String>,
    /// Referenced document date
    pub date_ref: Option<String>,
    /// Reason text
    pub razon_ref: Option<String>,
}

/// Child document issued from a DTE (credit notes etc.)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DteChild {
    /// Child DTE id
    pub id: i64,
    /// Child folio
    pub folio: Option<i64>,
    /// Child document type
    pub type_document: Option<i64>,
    /// Child document type name
    pub type_document_name: Option<String>,
}
