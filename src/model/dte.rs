//! DTE (electronic tax document) records

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line_items::{DteChild, DteReference, Email, FileLink, Product, SiiTrack};
use super::ForeignKeys;

/// DTE as returned by the paged `/dtes` list endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Dte {
    /// DTE id
    pub id: i64,
    /// Folio number
    pub folio: Option<i64>,
    /// Document type code (33 = electronic invoice)
    pub type_document: Option<i64>,
    /// Document type label
    pub type_document_name: Option<String>,
    /// VAT rate
    pub iva: Option<Decimal>,
    /// Tax authority status code
    pub sii_status: Option<String>,
    /// Tax authority status label
    pub sii_status_name: Option<String>,
    /// Issue date
    pub start_date: Option<String>,
    /// Due date
    pub end_date: Option<String>,
    /// Rendered PDF
    pub pdf_file: Option<FileLink>,
    /// Exchange XML
    pub xml_inter_file: Option<FileLink>,
    /// Customer foreign key
    pub customer_id: Option<i64>,
    /// Commune foreign key
    pub commune_id: Option<i64>,
    /// City foreign key
    pub city_id: Option<i64>,
    /// Billing address
    pub address: Option<String>,
    /// Contact name
    pub contact: Option<String>,
    /// Sales channel
    pub channel_id: Option<i64>,
    /// Payment type foreign key
    pub type_payment_id: Option<i64>,
    /// Seller foreign key
    pub seller_id: Option<i64>,
    /// Issuing user foreign key
    pub user_id: Option<i64>,
    /// Branch
    pub branch_id: Option<i64>,
    /// Workflow status
    pub status: Option<String>,
    /// Free-text comment
    pub comment: Option<String>,
    /// Tax authority track id
    pub track_id: Option<String>,
    /// Currency code
    pub currency: Option<String>,
    /// Global discount
    pub global_discount: Option<Decimal>,
    /// Net amount
    pub amount_neto: Option<Decimal>,
    /// VAT amount
    pub amount_iva: Option<Decimal>,
    /// Exempt amount
    pub amount_exempt: Option<Decimal>,
    /// Additional taxes
    pub amount_tax: Option<Decimal>,
    /// Total amount
    pub amount_total: Option<Decimal>,
    /// Creation timestamp
    pub created_at: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

impl Dte {
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

/// DTE with its relations, as returned by `/dtes/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DteDetail {
    /// Header fields, same shape as the list record
    #[serde(flatten)]
    pub header: Dte,
    /// E-mails sent for this DTE
    #[serde(deserialize_with = "super::null_as_default")]
    pub emails: Vec<Email>,
    /// Product lines
    #[serde(deserialize_with = "super::null_as_default")]
    pub products: Vec<Product>,
    /// Tax authority status history
    #[serde(deserialize_with = "super::null_as_default")]
    pub sii_tracks: Vec<SiiTrack>,
    /// References to other documents
    #[serde(deserialize_with = "super::null_as_default")]
    pub references: Vec<DteReference>,
    /// Documents issued from this one
    #[serde(deserialize_with = "super::null_as_default")]
    pub dte_children: Vec<DteChild>,
}
