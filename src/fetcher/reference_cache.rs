//! Run-wide cache of reference entities keyed by id
//!
//! One [`EntityStore`] per reference kind. Full-collection population is
//! single-flight: concurrent callers await the same in-flight fetch, a
//! successful population is never repeated, and a failed one leaves the store
//! unpopulated so a later call may try again. A store that already holds
//! entries counts as populated without a network call.

use futures::future::join_all;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::downloader::config::PAYMENT_TYPE_PAGES;
use crate::fetcher::endpoints;
use crate::fetcher::retry::{Criticality, RetryingFetcher};
use crate::model::{City, Commune, Customer, Estimate, PaymentType, Reference, Seller, User};

/// Entities addressable by a numeric id
pub trait Keyed {
    /// Cache key
    fn key(&self) -> i64;
}

macro_rules! keyed_by_id {
    ($($ty:ty),+ $(,)?) => {
        $(impl Keyed for $ty {
            fn key(&self) -> i64 {
                self.id
            }
        })+
    };
}

keyed_by_id!(City, Commune, Customer, Estimate, PaymentType, Reference, Seller, User);

/// Reference entity kinds with a full-collection endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// `/vendedores`
    Sellers,
    /// `/forma_pagos`, up to three pages
    PaymentTypes,
    /// `/usuarios`
    Users,
    /// `/clientes`
    Customers,
    /// `/ciudades`
    Cities,
    /// `/comunas`
    Communes,
    /// `/references`
    References,
    /// `/cotizaciones` (unfiltered)
    Estimates,
}

impl ReferenceKind {
    /// Collection endpoint and key
    pub fn endpoint(self) -> (&'static str, &'static str) {
        match self {
            Self::Sellers => (endpoints::SELLERS, endpoints::SELLERS_KEY),
            Self::PaymentTypes => (endpoints::PAYMENT_TYPES, endpoints::PAYMENT_TYPES_KEY),
            Self::Users => (endpoints::USERS, endpoints::USERS_KEY),
            Self::Customers => (endpoints::CUSTOMERS, endpoints::CUSTOMERS_KEY),
            Self::Cities => (endpoints::CITIES, endpoints::CITIES_KEY),
            Self::Communes => (endpoints::COMMUNES, endpoints::COMMUNES_KEY),
            Self::References => (endpoints::REFERENCES, endpoints::REFERENCES_KEY),
            Self::Estimates => (endpoints::ESTIMATES, endpoints::ESTIMATES_KEY),
        }
    }

    /// Pages requested for the full collection
    pub fn pages(self) -> u32 {
        match self {
            Self::PaymentTypes => PAYMENT_TYPE_PAGES,
            _ => 1,
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint().1)
    }
}

/// Id-keyed map with single-flight population
#[derive(Debug)]
pub struct EntityStore<T> {
    entries: RwLock<HashMap<i64, T>>,
    populated: OnceCell<()>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            populated: OnceCell::new(),
        }
    }
}

impl<T: Clone + Keyed> EntityStore<T> {
    /// Cached entity
    pub fn get(&self, id: i64) -> Option<T> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Whether `id` is cached
    pub fn contains(&self, id: i64) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Insert or replace an entity
    pub fn insert(&self, entity: T) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity.key(), entity);
    }

    /// Insert under an explicit id (the id a lookup was made with)
    pub fn insert_as(&self, id: i64, entity: T) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, entity);
    }

    /// Number of cached entities
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a full population has completed
    pub fn is_populated(&self) -> bool {
        self.populated.initialized()
    }

    /// Populate once from `load`; `None` from `load` means the fetch failed
    ///
    /// Returns the number of cached entities afterwards.
    pub async fn populate_with<F, Fut>(&self, load: F) -> usize
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Option<Vec<T>>>,
    {
        let outcome = self
            .populated
            .get_or_try_init(|| async move {
                if !self.is_empty() {
                    return Ok(());
                }
                match load().await {
                    Some(entities) => {
                        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
                        for entity in entities {
                            entries.insert(entity.key(), entity);
                        }
                        Ok(())
                    }
                    None => Err(()),
                }
            })
            .await;

        if outcome.is_err() {
            debug!("Population failed, store left unpopulated");
        }
        self.len()
    }
}

/// Every reference store of a run
#[derive(Debug, Default)]
pub struct ReferenceCache {
    /// Customers
    pub customers: EntityStore<Customer>,
    /// Cities
    pub cities: EntityStore<City>,
    /// Communes
    pub communes: EntityStore<Commune>,
    /// Sellers, including ones recovered from print documents
    pub sellers: EntityStore<Seller>,
    /// Payment types
    pub payment_types: EntityStore<PaymentType>,
    /// Users
    pub users: EntityStore<User>,
    /// Reference document codes
    pub references: EntityStore<Reference>,
    /// Estimates (unfiltered collection)
    pub estimates: EntityStore<Estimate>,
}

impl ReferenceCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the full collection of `kind` unless already cached
    ///
    /// Failures are logged and tolerated; the returned count may be zero.
    pub async fn fetch_all(&self, kind: ReferenceKind, fetcher: &RetryingFetcher) -> usize {
        match kind {
            ReferenceKind::Sellers => populate(&self.sellers, kind, fetcher).await,
            ReferenceKind::PaymentTypes => populate(&self.payment_types, kind, fetcher).await,
            ReferenceKind::Users => populate(&self.users, kind, fetcher).await,
            ReferenceKind::Customers => populate(&self.customers, kind, fetcher).await,
            ReferenceKind::Cities => populate(&self.cities, kind, fetcher).await,
            ReferenceKind::Communes => populate(&self.communes, kind, fetcher).await,
            ReferenceKind::References => populate(&self.references, kind, fetcher).await,
            ReferenceKind::Estimates => populate(&self.estimates, kind, fetcher).await,
        }
    }

    /// Populate several kinds concurrently, waiting for all of them
    pub async fn populate_all(&self, kinds: &[ReferenceKind], fetcher: &RetryingFetcher) {
        let started = Instant::now();
        let counts = join_all(kinds.iter().map(|&kind| async move {
            (kind, self.fetch_all(kind, fetcher).await)
        }))
        .await;

        for (kind, count) in counts {
            info!(kind = %kind, count, "Reference data loaded");
        }
        info!(
            duration_ms = started.elapsed().as_millis() as u64,
            "Reference data pre-fetched"
        );
    }

    /// Customer by id, fetched on cache miss
    pub async fn customer(&self, id: Option<i64>, fetcher: &RetryingFetcher) -> Option<Customer> {
        lookup(&self.customers, endpoints::CUSTOMERS, "customer", id?, fetcher).await
    }

    /// City by id, fetched on cache miss
    pub async fn city(&self, id: Option<i64>, fetcher: &RetryingFetcher) -> Option<City> {
        lookup(&self.cities, endpoints::CITIES, "city", id?, fetcher).await
    }

    /// Commune by id, fetched on cache miss
    pub async fn commune(&self, id: Option<i64>, fetcher: &RetryingFetcher) -> Option<Commune> {
        lookup(&self.communes, endpoints::COMMUNES, "commune", id?, fetcher).await
    }

    /// Cached seller
    pub fn seller(&self, id: Option<i64>) -> Option<Seller> {
        self.sellers.get(id?)
    }

    /// Cached payment type
    pub fn payment_type(&self, id: Option<i64>) -> Option<PaymentType> {
        self.payment_types.get(id?)
    }

    /// Cached user
    pub fn user(&self, id: Option<i64>) -> Option<User> {
        self.users.get(id?)
    }

    /// Cached reference document code
    pub fn reference(&self, id: Option<i64>) -> Option<Reference> {
        self.references.get(id?)
    }
}

async fn populate<T>(store: &EntityStore<T>, kind: ReferenceKind, fetcher: &RetryingFetcher) -> usize
where
    T: Clone + Keyed + DeserializeOwned,
{
    let count = store
        .populate_with(|| fetch_collection::<T>(kind, fetcher))
        .await;
    if !store.is_populated() {
        warn!(kind = %kind, cached = count, "Reference collection unavailable, continuing with cache as is");
    }
    count
}

async fn fetch_collection<T: DeserializeOwned>(
    kind: ReferenceKind,
    fetcher: &RetryingFetcher,
) -> Option<Vec<T>> {
    let (path, key) = kind.endpoint();
    debug!(kind = %kind, path, "Fetching full collection");

    let pages = kind.pages();
    if pages == 1 {
        let what = format!("{kind} collection");
        let page = fetcher
            .get_page::<T>(path, key, &[], &what, Criticality::NonCritical)
            .await?;
        return Some(page.records);
    }

    let mut entities = Vec::new();
    let mut last_page = pages;
    let mut page = 1;
    while page <= last_page {
        let what = format!("{kind} page {page}");
        let query = [("page", page.to_string())];
        let list = fetcher
            .get_page::<T>(path, key, &query, &what, Criticality::NonCritical)
            .await;
        match list {
            Some(list) => {
                last_page = last_page.min(list.meta.page_count());
                entities.extend(list.records);
            }
            // Nothing gathered yet means the collection is unavailable
            None if entities.is_empty() => return None,
            None => break,
        }
        page += 1;
    }
    Some(entities)
}

async fn lookup<T>(
    store: &EntityStore<T>,
    collection: &str,
    label: &str,
    id: i64,
    fetcher: &RetryingFetcher,
) -> Option<T>
where
    T: Clone + Keyed + DeserializeOwned,
{
    if let Some(entity) = store.get(id) {
        return Some(entity);
    }

    let path = endpoints::detail(collection, id);
    let what = format!("{label} {id}");
    let entity: T = fetcher
        .get_entity(&path, &what, Criticality::NonCritical)
        .await?;
    store.insert_as(id, entity.clone());
    Some(entity)
}
