//! Per-range enrichment of primary records
//!
//! A run over one [`DateRange`]:
//!
//! 1. reset the run statistics
//! 2. pre-populate every reference kind the record type needs, concurrently
//! 3. page through the filtered list endpoint
//! 4. enrich records in fixed-size batches; batches run one after another,
//!    records inside a batch run concurrently as separate tasks
//!
//! Enriching one record fetches its detail payload (critical), then customer,
//! city and commune concurrently (non-critical), then resolves seller, payment
//! type, user and the codes of referenced documents from the cache alone. A record whose task panics is dropped
//! and counted as data loss.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::downloader::context::ExtractionContext;
use crate::downloader::job::DateRange;
use crate::fetcher::endpoints;
use crate::fetcher::pagination::{PageQuery, Paginator};
use crate::fetcher::print::extract_seller_name;
use crate::fetcher::reference_cache::ReferenceKind;
use crate::fetcher::retry::Criticality;
use crate::metrics;
use crate::model::{
    City, Commune, Customer, Dte, DteDetail, Estimate, ForeignKeys, PaymentType, PrintDocument,
    Reference, Seller, User,
};

/// A record type with a paged list endpoint and a per-id detail endpoint
pub trait PrimaryRecord: DeserializeOwned + Serialize + Clone + Debug + Send + Sync + 'static {
    /// Detail payload of `/<list>/{id}`
    type Detail: DeserializeOwned + Serialize + Clone + Debug + Send + Sync + 'static;

    /// Short name used in logs and metrics labels
    const LABEL: &'static str;
    /// Paged list endpoint
    const LIST_PATH: &'static str;
    /// Collection key of the list endpoint
    const LIST_KEY: &'static str;
    /// Reference kinds pre-populated before a run
    const REFERENCE_KINDS: &'static [ReferenceKind];
    /// Whether a seller missing from the cache is recovered from the print layout
    const SELLER_FROM_PRINT: bool = false;

    /// Record id
    fn id(&self) -> i64;

    /// Join keys
    fn foreign_keys(&self) -> ForeignKeys;

    /// Seller id carried by the detail payload
    fn detail_seller_id(_detail: &Self::Detail) -> Option<i64> {
        None
    }

    /// Reference-code ids of the documents the detail payload refers to
    fn detail_reference_codes(_detail: &Self::Detail) -> Vec<i64> {
        Vec::new()
    }
}

impl PrimaryRecord for Dte {
    type Detail = DteDetail;

    const LABEL: &'static str = "dte";
    const LIST_PATH: &'static str = endpoints::DTES;
    const LIST_KEY: &'static str = endpoints::DTES_KEY;
    const REFERENCE_KINDS: &'static [ReferenceKind] = &[
        ReferenceKind::Sellers,
        ReferenceKind::PaymentTypes,
        ReferenceKind::Users,
        ReferenceKind::References,
        ReferenceKind::Customers,
        ReferenceKind::Cities,
        ReferenceKind::Communes,
    ];
    const SELLER_FROM_PRINT: bool = true;

    fn id(&self) -> i64 {
        self.id
    }

    fn foreign_keys(&self) -> ForeignKeys {
        Dte::foreign_keys(self)
    }

    fn detail_seller_id(detail: &DteDetail) -> Option<i64> {
        detail.header.seller_id
    }

    fn detail_reference_codes(detail: &DteDetail) -> Vec<i64> {
        detail
            .references
            .iter()
            .filter_map(|r| r.tpo_doc_ref_id)
            .collect()
    }
}

impl PrimaryRecord for Estimate {
    type Detail = Estimate;

    const LABEL: &'static str = "estimate";
    const LIST_PATH: &'static str = endpoints::ESTIMATES;
    const LIST_KEY: &'static str = endpoints::ESTIMATES_KEY;
    const REFERENCE_KINDS: &'static [ReferenceKind] = &[
        ReferenceKind::Sellers,
        ReferenceKind::PaymentTypes,
        ReferenceKind::Users,
        ReferenceKind::Customers,
        ReferenceKind::Cities,
        ReferenceKind::Communes,
        // loaded and counted only; estimates are joined from their own detail
        ReferenceKind::Estimates,
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn foreign_keys(&self) -> ForeignKeys {
        Estimate::foreign_keys(self)
    }

    fn detail_seller_id(detail: &Estimate) -> Option<i64> {
        detail.seller_id
    }
}

/// A primary record with everything joined onto it
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "")]
pub struct EnrichedRecord<R: PrimaryRecord> {
    /// Record as listed
    pub record: R,
    /// Detail payload; absent when the detail fetch failed or returned 404
    pub detail: Option<R::Detail>,
    /// Joined customer
    pub customer: Option<Customer>,
    /// Joined city
    pub city: Option<City>,
    /// Joined commune
    pub commune: Option<Commune>,
    /// Joined seller (cache only)
    pub seller: Option<Seller>,
    /// Joined payment type (cache only)
    pub payment_type: Option<PaymentType>,
    /// Joined user (cache only)
    pub user: Option<User>,
    /// Codes of the documents the detail refers to, by id (cache only)
    pub reference_codes: Vec<Reference>,
}

impl<R: PrimaryRecord> EnrichedRecord<R> {
    /// Record with nothing joined yet
    pub fn bare(record: R) -> Self {
        Self {
            record,
            detail: None,
            customer: None,
            city: None,
            commune: None,
            seller: None,
            payment_type: None,
            user: None,
            reference_codes: Vec::new(),
        }
    }

    /// Record id
    pub fn id(&self) -> i64 {
        self.record.id()
    }

    /// Name of reference code `id`, if it was joined
    pub fn reference_name(&self, id: Option<i64>) -> Option<&str> {
        let id = id?;
        self.reference_codes
            .iter()
            .find(|code| code.id == id)
            .and_then(|code| code.name.as_deref())
    }
}

/// Enrichment of one record type over an [`ExtractionContext`]
pub struct EnrichmentPipeline<R> {
    ctx: Arc<ExtractionContext>,
    filters: Vec<(&'static str, String)>,
    _record: PhantomData<fn() -> R>,
}

impl<R: PrimaryRecord> EnrichmentPipeline<R> {
    /// Pipeline without extra list filters
    pub fn new(ctx: Arc<ExtractionContext>) -> Self {
        Self {
            ctx,
            filters: Vec::new(),
            _record: PhantomData,
        }
    }

    /// Add a list filter sent with every page (e.g. `type_document=33`)
    pub fn with_filter(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.filters.push((key, value.into()));
        self
    }

    /// Shared context
    pub fn context(&self) -> &Arc<ExtractionContext> {
        &self.ctx
    }

    /// Full run over one date range
    pub async fn run(&self, range: &DateRange) -> Vec<EnrichedRecord<R>> {
        self.ctx.stats().reset();
        info!(pipeline = R::LABEL, range = %range, "Starting enrichment run");

        self.ctx
            .cache
            .populate_all(R::REFERENCE_KINDS, &self.ctx.fetcher)
            .await;

        let mut filters = self.filters.clone();
        filters.push(("range_date", range.range_filter()));
        let query = PageQuery {
            path: R::LIST_PATH,
            key: R::LIST_KEY,
            filters,
        };
        let records: Vec<R> = Paginator::new(&self.ctx.fetcher, self.ctx.page_mode)
            .fetch_all_pages(&query)
            .await;
        info!(pipeline = R::LABEL, range = %range, records = records.len(), "Records to process");

        let enriched = self.enrich(records).await;

        self.ctx.stats().snapshot().log_summary(R::LABEL);
        info!(
            pipeline = R::LABEL,
            range = %range,
            enriched = enriched.len(),
            "Enrichment run complete"
        );
        enriched
    }

    /// Enrich records in sequential batches of concurrent tasks
    pub async fn enrich(&self, records: Vec<R>) -> Vec<EnrichedRecord<R>> {
        let batch_size = self.ctx.batch_size;
        let batch_count = records.len().div_ceil(batch_size);
        let mut output = Vec::with_capacity(records.len());

        for (batch_index, batch) in records.chunks(batch_size).enumerate() {
            debug!(
                pipeline = R::LABEL,
                batch = batch_index + 1,
                batch_count,
                size = batch.len(),
                "Processing batch"
            );

            let mut tasks = JoinSet::new();
            for (position, record) in batch.iter().cloned().enumerate() {
                let ctx = self.ctx.clone();
                tasks.spawn(async move { (position, enrich_record(&ctx, record).await) });
            }

            let mut finished = Vec::with_capacity(batch.len());
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(done) => finished.push(done),
                    Err(e) => {
                        self.ctx.stats().record_data_loss();
                        metrics::record_data_loss();
                        error!(pipeline = R::LABEL, error = %e, "Record enrichment task failed, record dropped");
                    }
                }
            }
            finished.sort_by_key(|(position, _)| *position);

            let lost = batch.len() - finished.len();
            debug!(
                pipeline = R::LABEL,
                batch = batch_index + 1,
                succeeded = finished.len(),
                lost,
                "Batch complete"
            );
            output.extend(finished.into_iter().map(|(_, record)| record));
        }

        output
    }
}

async fn enrich_record<R: PrimaryRecord>(ctx: &ExtractionContext, record: R) -> EnrichedRecord<R> {
    let id = record.id();
    let fetcher = &ctx.fetcher;
    let cache = &ctx.cache;

    let detail_path = endpoints::detail(R::LIST_PATH, id);
    let what = format!("{} detail {id}", R::LABEL);
    let detail: Option<R::Detail> = fetcher
        .get_entity(&detail_path, &what, Criticality::Critical)
        .await;

    let keys = record.foreign_keys();
    let seller_id = keys
        .seller_id
        .or_else(|| detail.as_ref().and_then(R::detail_seller_id));

    if R::SELLER_FROM_PRINT && detail.is_some() {
        recover_seller_from_print(ctx, id, seller_id).await;
    }

    let (customer, city, commune) = tokio::join!(
        cache.customer(keys.customer_id, fetcher),
        cache.city(keys.city_id, fetcher),
        cache.commune(keys.commune_id, fetcher),
    );

    let mut code_ids = detail
        .as_ref()
        .map(R::detail_reference_codes)
        .unwrap_or_default();
    code_ids.sort_unstable();
    code_ids.dedup();
    let reference_codes = code_ids
        .into_iter()
        .filter_map(|code| cache.reference(Some(code)))
        .collect();

    EnrichedRecord {
        seller: cache.seller(seller_id),
        payment_type: cache.payment_type(keys.type_payment_id),
        user: cache.user(keys.user_id),
        reference_codes,
        customer,
        city,
        commune,
        detail,
        record,
    }
}

/// Synthesize a seller from the print layout when `seller_id` is not cached
async fn recover_seller_from_print(ctx: &ExtractionContext, record_id: i64, seller_id: Option<i64>) {
    let Some(seller_id) = seller_id else {
        return;
    };
    if ctx.cache.sellers.contains(seller_id) {
        return;
    }

    let what = format!("print document {record_id}");
    let document: Option<PrintDocument> = ctx
        .fetcher
        .get_entity(&endpoints::dte_print(record_id), &what, Criticality::NonCritical)
        .await;

    match document.as_ref().and_then(extract_seller_name) {
        Some(name) => {
            debug!(record_id, seller_id, first_name = %name.first_name, "Seller recovered from print layout");
            ctx.cache
                .sellers
                .insert(Seller::synthesized(seller_id, name.first_name, name.last_name));
        }
        None => {
            warn!(record_id, seller_id, "No seller name found in print layout");
        }
    }
}
