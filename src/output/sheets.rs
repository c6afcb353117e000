//! Sheet layouts of the DTE and estimate workbooks

use std::collections::BTreeMap;

use super::xlsx::{Cell, Sheet, WorkbookLayout};
use crate::downloader::enrich::EnrichedRecord;
use crate::model::{
    City, Commune, Customer, Dte, Email, Estimate, PaymentType, Product, Seller, User,
};

const PRODUCT_HEADERS: &[&str] = &[
    "product_id",
    "name",
    "code",
    "description",
    "quantity",
    "price",
    "discount",
    "surcharge",
    "unit_item",
    "tax_affected",
    "unit_cost",
    "additional_tax_code",
    "additional_tax_fee",
    "real_amount_neto",
    "lot_serial_number",
    "created_at",
];

fn product_cells(product: &Product) -> Vec<Cell> {
    vec![
        Cell::int(product.product_id),
        Cell::text(product.name.as_deref()),
        Cell::text(product.code.as_deref()),
        Cell::text(product.description.as_deref()),
        Cell::decimal(product.quantity),
        Cell::decimal(product.price),
        Cell::decimal(product.discount),
        Cell::decimal(product.surcharge),
        Cell::text(product.unit_item.as_deref()),
        Cell::flag(product.tax_affected),
        Cell::decimal(product.unit_cost),
        Cell::text(product.additional_tax_code.as_deref()),
        Cell::decimal(product.additional_tax_fee),
        Cell::decimal(product.real_amount_neto),
        Cell::text(product.lot_serial_number.as_deref()),
        Cell::text(product.created_at.as_deref()),
    ]
}

const EMAIL_HEADERS: &[&str] = &["id", "email", "subject", "message", "reminder_id", "created_at"];

fn email_cells(email: &Email) -> Vec<Cell> {
    vec![
        Cell::from(email.id),
        Cell::text(email.email.as_deref()),
        Cell::text(email.subject.as_deref()),
        Cell::text(email.message.as_deref()),
        Cell::int(email.reminder_id),
        Cell::text(email.created_at.as_deref()),
    ]
}

/// Sheet whose rows are prefixed with the owning document's id and folio
fn child_sheet(name: &'static str, owner: &'static str, headers: &[&'static str]) -> Sheet {
    let mut all = vec![owner, "folio"];
    all.extend_from_slice(headers);
    Sheet::new(name, &all)
}

/// Shown for a reference code missing from the cache
const UNKNOWN_REFERENCE: &str = "Unknown";

fn owned_row(id: i64, folio: Option<i64>, cells: Vec<Cell>) -> Vec<Cell> {
    let mut row = vec![Cell::from(id), Cell::int(folio)];
    row.extend(cells);
    row
}

/// Distinct joined entities, ordered by id
#[derive(Default)]
struct Joined {
    customers: BTreeMap<i64, Customer>,
    cities: BTreeMap<i64, City>,
    communes: BTreeMap<i64, Commune>,
    sellers: BTreeMap<i64, Seller>,
    payment_types: BTreeMap<i64, PaymentType>,
    users: BTreeMap<i64, User>,
}

impl Joined {
    fn collect<R: crate::downloader::enrich::PrimaryRecord>(records: &[EnrichedRecord<R>]) -> Self {
        let mut joined = Self::default();
        for r in records {
            if let Some(c) = &r.customer {
                joined.customers.insert(c.id, c.clone());
            }
            if let Some(c) = &r.city {
                joined.cities.insert(c.id, c.clone());
            }
            if let Some(c) = &r.commune {
                joined.communes.insert(c.id, c.clone());
            }
            if let Some(s) = &r.seller {
                joined.sellers.insert(s.id, s.clone());
            }
            if let Some(p) = &r.payment_type {
                joined.payment_types.insert(p.id, p.clone());
            }
            if let Some(u) = &r.user {
                joined.users.insert(u.id, u.clone());
            }
        }
        joined
    }

    fn sheets(self) -> Vec<Sheet> {
        let mut customers = Sheet::new(
            "Customers",
            &["id", "rut", "name", "name_fantasy", "type_customer", "address", "business_activity", "city_id", "commune_id", "phone", "email", "active"],
        );
        for c in self.customers.values() {
            customers.push(vec![
                Cell::from(c.id),
                Cell::text(c.rut.as_deref()),
                Cell::text(c.name.as_deref()),
                Cell::text(c.name_fantasy.as_deref()),
                Cell::text(c.type_customer.as_deref()),
                Cell::text(c.address.as_deref()),
                Cell::text(c.business_activity.as_deref()),
                Cell::int(c.city_id),
                Cell::int(c.commune_id),
                Cell::text(c.phone.as_deref()),
                Cell::from(c.email.join(", ")),
                Cell::flag(c.active),
            ]);
        }

        let mut cities = Sheet::new("Cities", &["id", "name"]);
        for c in self.cities.values() {
            cities.push(vec![Cell::from(c.id), Cell::from(c.name.clone())]);
        }

        let mut communes = Sheet::new("Communes", &["id", "name", "city_id"]);
        for c in self.communes.values() {
            communes.push(vec![Cell::from(c.id), Cell::from(c.name.clone()), Cell::int(c.city_id)]);
        }

        let mut sellers = Sheet::new("Sellers", &["id", "first_name", "last_name", "role"]);
        for s in self.sellers.values() {
            sellers.push(vec![
                Cell::from(s.id),
                Cell::from(s.first_name.clone()),
                Cell::from(s.last_name.clone()),
                Cell::text(s.role.as_deref()),
            ]);
        }

        let mut payment_types = Sheet::new("Payment_Types", &["id", "name", "fma_pago_sii", "enabled"]);
        for p in self.payment_types.values() {
            payment_types.push(vec![
                Cell::from(p.id),
                Cell::from(p.name.clone()),
                Cell::int(p.fma_pago_sii),
                Cell::flag(p.enabled),
            ]);
        }

        let mut users = Sheet::new("Users", &["id", "first_name", "last_name", "email", "role"]);
        for u in self.users.values() {
            users.push(vec![
                Cell::from(u.id),
                Cell::from(u.first_name.clone()),
                Cell::from(u.last_name.clone()),
                Cell::text(u.email.as_deref()),
                Cell::text(u.role.as_deref()),
            ]);
        }

        vec![customers, cities, communes, sellers, payment_types, users]
    }
}

impl WorkbookLayout for Dte {
    fn sheets(records: &[EnrichedRecord<Self>]) -> Vec<Sheet> {
        let mut dtes = Sheet::new(
            "DTEs",
            &[
                "id", "folio", "type_document", "type_document_name", "sii_status", "sii_status_name",
                "start_date", "end_date", "customer_id", "customer_name", "customer_rut", "city_id",
                "city_name", "commune_id", "commune_name", "address", "contact", "type_payment_id",
                "payment_type_name", "seller_id", "seller_name", "user_id", "user_name", "status",
                "comment", "currency", "global_discount", "amount_neto", "amount_iva", "amount_exempt",
                "amount_tax", "amount_total", "track_id", "pdf_file", "xml_inter_file", "created_at",
                "updated_at", "detail_loaded",
            ],
        );
        let mut products = child_sheet("Products", "dte_id", PRODUCT_HEADERS);
        let mut emails = child_sheet("Emails", "dte_id", EMAIL_HEADERS);
        let mut sii_tracks = child_sheet("SII_Tracks", "dte_id", &["sii_status", "ws_status", "note", "created_at", "updated_at"]);
        let mut children = child_sheet("DTE_Children", "parent_dte_id", &["child_id", "child_folio", "type_document", "type_document_name"]);
        let mut references = child_sheet("References", "dte_id", &["reference_id", "tpo_doc_ref_id", "reference_name", "code_ref", "folio_ref", "date_ref", "razon_ref"]);

        for r in records {
            let d = r.detail.as_ref().map(|detail| &detail.header).unwrap_or(&r.record);
            dtes.push(vec![
                Cell::from(d.id),
                Cell::int(d.folio),
                Cell::int(d.type_document),
                Cell::text(d.type_document_name.as_deref()),
                Cell::text(d.sii_status.as_deref()),
                Cell::text(d.sii_status_name.as_deref()),
                Cell::text(d.start_date.as_deref()),
                Cell::text(d.end_date.as_deref()),
                Cell::int(d.customer_id),
                Cell::text(r.customer.as_ref().and_then(|c| c.name.as_deref())),
                Cell::text(r.customer.as_ref().and_then(|c| c.rut.as_deref())),
                Cell::int(d.city_id),
                Cell::text(r.city.as_ref().map(|c| c.name.as_str())),
                Cell::int(d.commune_id),
                Cell::text(r.commune.as_ref().map(|c| c.name.as_str())),
                Cell::text(d.address.as_deref()),
                Cell::text(d.contact.as_deref()),
                Cell::int(d.type_payment_id),
                Cell::text(r.payment_type.as_ref().map(|p| p.name.as_str())),
                Cell::int(d.seller_id),
                Cell::text(r.seller.as_ref().map(Seller::display_name).as_deref()),
                Cell::int(d.user_id),
                Cell::text(r.user.as_ref().map(User::display_name).as_deref()),
                Cell::text(d.status.as_deref()),
                Cell::text(d.comment.as_deref()),
                Cell::text(d.currency.as_deref()),
                Cell::decimal(d.global_discount),
                Cell::decimal(d.amount_neto),
                Cell::decimal(d.amount_iva),
                Cell::decimal(d.amount_exempt),
                Cell::decimal(d.amount_tax),
                Cell::decimal(d.amount_total),
                Cell::text(d.track_id.as_deref()),
                Cell::text(d.pdf_file.as_ref().and_then(|f| f.url.as_deref())),
                Cell::text(d.xml_inter_file.as_ref().and_then(|f| f.url.as_deref())),
                Cell::text(d.created_at.as_deref()),
                Cell::text(d.updated_at.as_deref()),
                Cell::Bool(r.detail.is_some()),
            ]);

            let Some(detail) = &r.detail else {
                continue;
            };
            let (id, folio) = (r.record.id, d.folio);
            for p in &detail.products {
                products.push(owned_row(id, folio, product_cells(p)));
            }
            for e in &detail.emails {
                emails.push(owned_row(id, folio, email_cells(e)));
            }
            for t in &detail.sii_tracks {
                sii_tracks.push(owned_row(
                    id,
                    folio,
                    vec![
                        Cell::text(t.sii_status.as_deref()),
                        Cell::text(t.ws_status.as_deref()),
                        Cell::text(t.note.as_deref()),
                        Cell::text(t.created_at.as_deref()),
                        Cell::text(t.updated_at.as_deref()),
                    ],
                ));
            }
            for c in &detail.dte_children {
                children.push(owned_row(
                    id,
                    folio,
                    vec![
                        Cell::from(c.id),
                        Cell::int(c.folio),
                        Cell::int(c.type_document),
                        Cell::text(c.type_document_name.as_deref()),
                    ],
                ));
            }
            for reference in &detail.references {
                references.push(owned_row(
                    id,
                    folio,
                    vec![
                        Cell::from(reference.id),
                        Cell::int(reference.tpo_doc_ref_id),
                        Cell::from(
                            r.reference_name(reference.tpo_doc_ref_id)
                                .unwrap_or(UNKNOWN_REFERENCE)
                                .to_string(),
                        ),
                        Cell::int(reference.code_ref),
                        Cell::text(reference.folio_ref.as_deref()),
                        Cell::text(reference.date_ref.as_deref()),
                        Cell::text(reference.razon_ref.as_deref()),
                    ],
                ));
            }
        }

        let mut sheets = vec![dtes, products, emails, sii_tracks, children, references];
        sheets.extend(Joined::collect(records).sheets());
        sheets
    }
}

impl WorkbookLayout for Estimate {
    fn sheets(records: &[EnrichedRecord<Self>]) -> Vec<Sheet> {
        let mut estimates = Sheet::new(
            "Estimates",
            &[
                "id", "folio", "start_date", "end_date", "status", "customer_id", "customer_name",
                "customer_rut", "city_id", "city_name", "commune_id", "commune_name", "address",
                "contact", "type_payment_id", "payment_type_name", "seller_id", "seller_name",
                "user_id", "user_name", "currency", "global_discount", "amount_neto", "amount_iva",
                "amount_exempt", "amount_tax", "amount_total", "valid_for", "delivery_time",
                "payment_comment", "comment", "pdf_file", "created_at", "updated_at", "detail_loaded",
            ],
        );
        let mut products = child_sheet("Products", "estimate_id", PRODUCT_HEADERS);
        let mut emails = child_sheet("Emails", "estimate_id", EMAIL_HEADERS);

        for r in records {
            let e = r.detail.as_ref().unwrap_or(&r.record);
            estimates.push(vec![
                Cell::from(e.id),
                Cell::int(e.folio),
                Cell::text(e.start_date.as_deref()),
                Cell::text(e.end_date.as_deref()),
                Cell::text(e.status.as_deref()),
                Cell::int(e.customer_id),
                Cell::text(r.customer.as_ref().and_then(|c| c.name.as_deref())),
                Cell::text(r.customer.as_ref().and_then(|c| c.rut.as_deref())),
                Cell::int(e.city_id),
                Cell::text(r.city.as_ref().map(|c| c.name.as_str())),
                Cell::int(e.commune_id),
                Cell::text(r.commune.as_ref().map(|c| c.name.as_str())),
                Cell::text(e.address.as_deref()),
                Cell::text(e.contact.as_deref()),
                Cell::int(e.type_payment_id),
                Cell::text(r.payment_type.as_ref().map(|p| p.name.as_str())),
                Cell::int(e.seller_id),
                Cell::text(r.seller.as_ref().map(Seller::display_name).as_deref()),
                Cell::int(e.user_id),
                Cell::text(r.user.as_ref().map(User::display_name).as_deref()),
                Cell::text(e.currency.as_deref()),
                Cell::decimal(e.global_discount),
                Cell::decimal(e.amount_neto),
                Cell::decimal(e.amount_iva),
                Cell::decimal(e.amount_exempt),
                Cell::decimal(e.amount_tax),
                Cell::decimal(e.amount_total),
                Cell::int(e.valid_for),
                Cell::text(e.delivery_time.as_deref()),
                Cell::text(e.payment_comment.as_deref()),
                Cell::text(e.comment.as_deref()),
                Cell::text(e.pdf_file.as_ref().and_then(|f| f.url.as_deref())),
                Cell::text(e.created_at.as_deref()),
                Cell::text(e.updated_at.as_deref()),
                Cell::Bool(r.detail.is_some()),
            ]);

            for p in &e.products {
                products.push(owned_row(e.id, e.folio, product_cells(p)));
            }
            for m in &e.emails {
                emails.push(owned_row(e.id, e.folio, email_cells(m)));
            }
        }

        vec![estimates, products, emails]
    }
}
