//! In-process mock gateway for SDK testing.
//!
//! Implements both transport traits against shared in-memory state so the
//! full search and document stack can be exercised without a gateway node.
//!
//! # Features
//!
//! - **Entry storage**: seed transactions or append them through the write
//!   trait; each entry is assigned to its own mock block
//! - **Structural matching**: list queries apply id/owner/recipient/tag
//!   filters, sort order, and cursor pagination the way the gateway does
//! - **Failure injection**: make the next N requests fail, or reject writes
//! - **Request counting**: query, payload, and post counters for assertions

use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::RwLock;
use tessera_gateway_types::{
    BlockConnection, BlockEdge, BlockRecord, DataMeta, PageInfo, QueryData, SortOrder,
    TransactionConnection, TransactionEdge, TransactionRecord,
};
use uuid::Uuid;

use crate::error::{GatewaySnafu, Result};
use crate::gateway::{NewEntry, ReadGateway, WriteGateway};
use crate::query::{GqlQuery, QueryArgs, QueryKind};

/// Unix seconds of the mock chain's genesis block.
const GENESIS_TIMESTAMP: u64 = 1_600_000_000;

/// Seconds between consecutive mock blocks.
const BLOCK_INTERVAL: u64 = 120;

/// Page size the mock applies when a query names none, and the hard cap it
/// applies either way, matching the real gateway.
const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Default)]
struct MockState {
    /// Entries in append order, oldest first.
    entries: RwLock<Vec<TransactionRecord>>,

    /// Opaque payloads by entry id.
    payloads: RwLock<HashMap<String, String>>,

    /// Next block height to assign.
    next_height: AtomicU64,

    /// Number of requests to fail with status 503 before recovering.
    unavailable_count: AtomicUsize,

    /// When set, every post is rejected with status 500.
    fail_writes: AtomicBool,

    query_count: AtomicUsize,
    payload_count: AtomicUsize,
    post_count: AtomicUsize,
}

impl MockState {
    fn should_inject_unavailable(&self) -> bool {
        loop {
            let current = self.unavailable_count.load(Ordering::SeqCst);
            if current == 0 {
                return false;
            }
            if self
                .unavailable_count
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
    }

    fn check_injection(&self) -> Result<()> {
        if self.should_inject_unavailable() {
            return GatewaySnafu { status: 503_u16, message: "injected outage".to_owned() }.fail();
        }
        Ok(())
    }
}

/// Controllable in-memory implementation of both gateway traits.
///
/// Clones share state, so a test can hold one handle for seeding and
/// assertions while the client under test holds another.
///
/// # Example
///
/// ```
/// use tessera_gateway_sdk::mock::MockGateway;
/// use tessera_gateway_types::{Tag, TransactionRecord};
///
/// let mock = MockGateway::new();
/// let id = mock.push_transaction(TransactionRecord {
///     tags: Some(vec![Tag::new("App-Name", "demo")]),
///     ..TransactionRecord::default()
/// });
/// assert!(mock.transaction(&id).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<MockState>,
}

impl MockGateway {
    /// Creates an empty mock with the chain positioned at height 1.
    #[must_use]
    pub fn new() -> Self {
        let state = MockState { next_height: AtomicU64::new(1), ..MockState::default() };
        Self { state: Arc::new(state) }
    }

    /// Stores a transaction, assigning an id and a fresh mock block where
    /// the record leaves them unset. Returns the entry id.
    pub fn push_transaction(&self, mut record: TransactionRecord) -> String {
        let id = record
            .id
            .get_or_insert_with(|| Uuid::new_v4().simple().to_string())
            .clone();

        if record.block.is_none() {
            let height = self.state.next_height.fetch_add(1, Ordering::SeqCst);
            record.block = Some(block_at(height));
        } else if let Some(height) = record.block.as_ref().and_then(|b| b.height) {
            // Keep the implicit chain at least as tall as any seeded block.
            self.state.next_height.fetch_max(height + 1, Ordering::SeqCst);
        }

        self.state.entries.write().push(record);
        id
    }

    /// Stores the opaque payload served for an entry id.
    pub fn set_payload(&self, id: impl Into<String>, payload: impl Into<String>) {
        self.state.payloads.write().insert(id.into(), payload.into());
    }

    /// Returns a stored transaction by id.
    #[must_use]
    pub fn transaction(&self, id: &str) -> Option<TransactionRecord> {
        self.state.entries.read().iter().find(|r| r.id.as_deref() == Some(id)).cloned()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.state.entries.read().len()
    }

    /// Fails the next `count` requests (reads and writes) with status 503.
    pub fn inject_unavailable(&self, count: usize) {
        self.state.unavailable_count.store(count, Ordering::SeqCst);
    }

    /// Rejects every post with status 500 until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Total queries executed.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.state.query_count.load(Ordering::SeqCst)
    }

    /// Total payload fetches served.
    #[must_use]
    pub fn payload_count(&self) -> usize {
        self.state.payload_count.load(Ordering::SeqCst)
    }

    /// Total entries posted through the write trait.
    #[must_use]
    pub fn post_count(&self) -> usize {
        self.state.post_count.load(Ordering::SeqCst)
    }

    /// Clears entries, payloads, injections, and counters.
    pub fn reset(&self) {
        self.state.entries.write().clear();
        self.state.payloads.write().clear();
        self.state.next_height.store(1, Ordering::SeqCst);
        self.state.unavailable_count.store(0, Ordering::SeqCst);
        self.state.fail_writes.store(false, Ordering::SeqCst);
        self.state.query_count.store(0, Ordering::SeqCst);
        self.state.payload_count.store(0, Ordering::SeqCst);
        self.state.post_count.store(0, Ordering::SeqCst);
    }

    // ======================================================================
    // Query evaluation
    // ======================================================================

    fn single_transaction(&self, args: &QueryArgs) -> Option<TransactionRecord> {
        let id = args.id.as_deref()?;
        self.transaction(id)
    }

    fn transaction_page(&self, args: &QueryArgs) -> TransactionConnection {
        let entries = self.state.entries.read();
        let mut matching: Vec<(usize, TransactionRecord)> = entries
            .iter()
            .enumerate()
            .filter(|(_, record)| transaction_matches(record, args))
            .map(|(index, record)| (index, record.clone()))
            .collect();
        drop(entries);

        // Unmined entries sort as newest.
        let key = |record: &TransactionRecord| {
            record.block.as_ref().and_then(|b| b.height).unwrap_or(u64::MAX)
        };
        match args.sort.unwrap_or_default() {
            SortOrder::HeightDescending => {
                matching.sort_by(|a, b| key(&b.1).cmp(&key(&a.1)).then(b.0.cmp(&a.0)));
            },
            SortOrder::HeightAscending => {
                matching.sort_by(|a, b| key(&a.1).cmp(&key(&b.1)).then(a.0.cmp(&b.0)));
            },
        }

        let records: Vec<TransactionRecord> = matching.into_iter().map(|(_, r)| r).collect();
        let (page, has_next_page) =
            paginate(records, args, |record| record.id.clone().unwrap_or_default());

        TransactionConnection {
            page_info: PageInfo { has_next_page },
            edges: page
                .into_iter()
                .map(|node| TransactionEdge {
                    cursor: node.id.clone().unwrap_or_default(),
                    node,
                })
                .collect(),
        }
    }

    fn all_blocks(&self) -> Vec<BlockRecord> {
        let tip = self.state.next_height.load(Ordering::SeqCst);
        (1..tip).map(block_at).collect()
    }

    fn single_block(&self, args: &QueryArgs) -> Option<BlockRecord> {
        let id = args.id.as_deref()?;
        self.all_blocks().into_iter().find(|block| block.id.as_deref() == Some(id))
    }

    fn block_page(&self, args: &QueryArgs) -> BlockConnection {
        let mut blocks: Vec<BlockRecord> = self
            .all_blocks()
            .into_iter()
            .filter(|block| block_matches(block, args))
            .collect();

        if args.sort.unwrap_or_default() == SortOrder::HeightDescending {
            blocks.reverse();
        }

        let (page, has_next_page) =
            paginate(blocks, args, |block| block.id.clone().unwrap_or_default());

        BlockConnection {
            page_info: PageInfo { has_next_page },
            edges: page
                .into_iter()
                .map(|node| BlockEdge { cursor: node.id.clone().unwrap_or_default(), node })
                .collect(),
        }
    }
}

/// The deterministic mock block for a height.
fn block_at(height: u64) -> BlockRecord {
    BlockRecord {
        id: Some(format!("block-{height}")),
        timestamp: Some(GENESIS_TIMESTAMP + height * BLOCK_INTERVAL),
        height: Some(height),
        previous: (height > 1).then(|| format!("block-{}", height - 1)),
    }
}

fn transaction_matches(record: &TransactionRecord, args: &QueryArgs) -> bool {
    if !args.ids.is_empty() {
        let id_matches =
            record.id.as_deref().is_some_and(|id| args.ids.iter().any(|want| want == id));
        if !id_matches {
            return false;
        }
    }

    if !args.owners.is_empty() {
        let address = record.owner.as_ref().and_then(|o| o.address.as_deref());
        if !address.is_some_and(|a| args.owners.iter().any(|want| want == a)) {
            return false;
        }
    }

    if !args.recipients.is_empty() {
        let recipient = record.recipient.as_deref();
        if !recipient.is_some_and(|r| args.recipients.iter().any(|want| want == r)) {
            return false;
        }
    }

    // Filters are ANDed; the values of one filter are ORed.
    args.tags.iter().all(|filter| {
        record
            .tags
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|tag| tag.name == filter.name && filter.values.contains(&tag.value))
    })
}

fn block_matches(block: &BlockRecord, args: &QueryArgs) -> bool {
    if !args.ids.is_empty() {
        let id_matches =
            block.id.as_deref().is_some_and(|id| args.ids.iter().any(|want| want == id));
        if !id_matches {
            return false;
        }
    }
    block.height.is_some_and(|height| args.height.contains(height))
}

/// Applies cursor offset and page size; returns the page and whether more
/// items remain past it.
fn paginate<T>(
    items: Vec<T>,
    args: &QueryArgs,
    cursor_of: impl Fn(&T) -> String,
) -> (Vec<T>, bool) {
    let start = match args.after.as_deref().filter(|after| !after.is_empty()) {
        Some(after) => items
            .iter()
            .position(|item| cursor_of(item) == after)
            .map_or(0, |position| position + 1),
        None => 0,
    };

    let first = args.first.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE) as usize;
    let total = items.len();
    let page: Vec<T> = items.into_iter().skip(start).take(first).collect();
    let has_next_page = start + page.len() < total;
    (page, has_next_page)
}

#[async_trait]
impl ReadGateway for MockGateway {
    async fn query(&self, query: &GqlQuery) -> Result<QueryData> {
        self.state.check_injection()?;
        self.state.query_count.fetch_add(1, Ordering::SeqCst);

        let mut data = QueryData::default();
        match query.kind {
            QueryKind::SingleTransaction => {
                data.transaction = self.single_transaction(&query.args);
            },
            QueryKind::TransactionList => {
                data.transactions = Some(self.transaction_page(&query.args));
            },
            QueryKind::SingleBlock => {
                data.block = self.single_block(&query.args);
            },
            QueryKind::BlockList => {
                data.blocks = Some(self.block_page(&query.args));
            },
        }
        Ok(data)
    }

    async fn fetch_payload(&self, id: &str) -> Result<String> {
        self.state.check_injection()?;
        self.state.payload_count.fetch_add(1, Ordering::SeqCst);

        self.state.payloads.read().get(id).cloned().map_or_else(
            || GatewaySnafu { status: 404_u16, message: format!("no payload for {id}") }.fail(),
            Ok,
        )
    }
}

#[async_trait]
impl WriteGateway for MockGateway {
    async fn post_entry(&self, entry: &NewEntry) -> Result<String> {
        self.state.check_injection()?;
        self.state.post_count.fetch_add(1, Ordering::SeqCst);

        if self.state.fail_writes.load(Ordering::SeqCst) {
            return GatewaySnafu { status: 500_u16, message: "write rejected".to_owned() }.fail();
        }

        let record = TransactionRecord {
            tags: Some(entry.tags.clone()),
            data: Some(DataMeta {
                size: Some(entry.payload.len() as u64),
                content_type: None,
            }),
            ..TransactionRecord::default()
        };
        let id = self.push_transaction(record);
        self.set_payload(id.clone(), entry.payload.clone());
        Ok(id)
    }
}
