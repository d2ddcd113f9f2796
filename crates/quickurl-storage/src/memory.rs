use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use parking_lot::{Mutex, RwLock};
use quickurl_core::{
    Clock, ListQuery, NewUrl, ReadStore, RecordId, Result, StoreError, SystemClock, Token,
    UrlRecord, UrlStore, Visibility,
};
use std::collections::BTreeSet;
use tracing::{debug, trace};

type IndexKey = (Timestamp, RecordId);

/// In-memory implementation of the store contract.
///
/// Records live in a [`DashMap`] keyed by token, so point lookups and click
/// increments only lock one shard and increments on different tokens rarely
/// contend. The creation-time and expiry-time indexes are ordered sets, which
/// keeps listing and sweeping proportional to the entries they visit.
///
/// Lock order: a shard guard is never held while an index lock is taken.
#[derive(Debug)]
pub struct InMemoryStore<C = SystemClock> {
    by_token: DashMap<Token, UrlRecord>,
    by_id: DashMap<RecordId, Token>,
    created_index: RwLock<BTreeSet<IndexKey>>,
    expiry_index: Mutex<BTreeSet<IndexKey>>,
    clock: C,
}

impl InMemoryStore {
    /// Creates a new in-memory store backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            by_token: DashMap::new(),
            by_id: DashMap::new(),
            created_index: RwLock::new(BTreeSet::new()),
            expiry_index: Mutex::new(BTreeSet::new()),
            clock,
        }
    }

    /// Number of physically stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }

    fn record_by_id(&self, id: &RecordId) -> Option<UrlRecord> {
        let token = self.by_id.get(id)?.value().clone();
        self.by_token
            .get(&token)
            .filter(|record| &record.id == id)
            .map(|record| record.value().clone())
    }

    /// Removes the record `id` from every map and index.
    ///
    /// Returns the removed record, or `None` if another caller got there first.
    fn remove_record(&self, id: &RecordId) -> Option<UrlRecord> {
        let (_, token) = self.by_id.remove(id)?;
        let (_, record) = self.by_token.remove_if(&token, |_, record| &record.id == id)?;

        self.created_index
            .write()
            .remove(&(record.created_at, record.id.clone()));
        self.expiry_index
            .lock()
            .remove(&(record.expires_at, record.id.clone()));

        Some(record)
    }
}

fn not_found(what: impl std::fmt::Display) -> StoreError {
    StoreError::NotFound(what.to_string())
}

#[async_trait]
impl<C: Clock> ReadStore for InMemoryStore<C> {
    async fn lookup_by_token(&self, token: &Token, visibility: Visibility) -> Result<UrlRecord> {
        let now = self.clock.now();

        let Some(record) = self.by_token.get(token) else {
            trace!(token = %token, "token not found");
            return Err(not_found(token));
        };

        if !record.is_visible(visibility, now) {
            trace!(token = %token, "record has expired");
            return Err(not_found(token));
        }

        Ok(record.value().clone())
    }

    async fn lookup_by_id(&self, id: &RecordId, visibility: Visibility) -> Result<UrlRecord> {
        let now = self.clock.now();

        self.record_by_id(id)
            .filter(|record| record.is_visible(visibility, now))
            .ok_or_else(|| not_found(id))
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<UrlRecord>> {
        let now = self.clock.now();
        let index = self.created_index.read();

        let records = index
            .iter()
            .rev()
            .filter_map(|(_, id)| self.record_by_id(id))
            .filter(|record| record.is_visible(query.visibility, now))
            .skip(query.offset)
            .take(query.page_size())
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl<C: Clock> UrlStore for InMemoryStore<C> {
    async fn create(&self, new: NewUrl) -> Result<UrlRecord> {
        let record = UrlRecord::from_new(new, RecordId::generate(), self.clock.now())?;

        // Check-and-insert under the shard lock of the token.
        match self.by_token.entry(record.token.clone()) {
            Entry::Occupied(_) => {
                debug!(token = %record.token, "token already taken");
                return Err(StoreError::DuplicateToken(record.token.to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
            }
        }

        self.by_id.insert(record.id.clone(), record.token.clone());
        self.created_index
            .write()
            .insert((record.created_at, record.id.clone()));
        self.expiry_index
            .lock()
            .insert((record.expires_at, record.id.clone()));

        debug!(id = %record.id, token = %record.token, expires_at = %record.expires_at, "record created");
        Ok(record)
    }

    async fn record_click(&self, token: &Token) -> Result<UrlRecord> {
        let now = self.clock.now();

        let mut record = self.by_token.get_mut(token).ok_or_else(|| not_found(token))?;
        if record.is_expired_at(now) {
            return Err(not_found(token));
        }

        record.click_count = record.click_count.saturating_add(1);
        Ok(record.clone())
    }

    async fn sweep(&self, now: Timestamp) -> Result<u64> {
        let due: Vec<IndexKey> = {
            let mut index = self.expiry_index.lock();
            let due: Vec<IndexKey> = index
                .iter()
                .take_while(|(expires_at, _)| *expires_at <= now)
                .cloned()
                .collect();
            for key in &due {
                index.remove(key);
            }
            due
        };

        let mut removed = 0;
        for (_, id) in due {
            if self.remove_record(&id).is_some() {
                removed += 1;
            }
        }

        debug!(removed, now = %now, "sweep finished");
        Ok(removed)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        match self.remove_record(id) {
            Some(record) => {
                debug!(id = %id, token = %record.token, "record deleted");
                Ok(())
            }
            None => Err(not_found(id)),
        }
    }
}
