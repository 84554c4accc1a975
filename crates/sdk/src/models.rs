//! Read-only views over returned records.
//!
//! A view exposes whatever the gateway sent back. Accessing a field that is
//! absent, usually because it was not selected, returns `None` and logs a
//! hint; absence is never upgraded to an error.

use tessera_gateway_types::{Amount, BlockRecord, DataMeta, Owner, Parent, Tag, TransactionRecord};
use tracing::warn;

fn check<T>(field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        warn!("{field} wasn't defined, make sure you have selected to return it");
    }
    value
}

/// Read-only view of a returned transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionView {
    record: TransactionRecord,
}

impl TransactionView {
    /// Wraps a raw record.
    #[must_use]
    pub fn new(record: TransactionRecord) -> Self {
        Self { record }
    }

    /// Transaction id.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        check("id", self.record.id.as_deref())
    }

    /// Transaction anchor.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        check("anchor", self.record.anchor.as_deref())
    }

    /// Transaction signature.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        check("signature", self.record.signature.as_deref())
    }

    /// Recipient address, for transfers.
    #[must_use]
    pub fn recipient(&self) -> Option<&str> {
        check("recipient", self.record.recipient.as_deref())
    }

    /// Signing owner.
    #[must_use]
    pub fn owner(&self) -> Option<&Owner> {
        check("owner", self.record.owner.as_ref())
    }

    /// Fee paid.
    #[must_use]
    pub fn fee(&self) -> Option<&Amount> {
        check("fee", self.record.fee.as_ref())
    }

    /// Quantity transferred.
    #[must_use]
    pub fn quantity(&self) -> Option<&Amount> {
        check("quantity", self.record.quantity.as_ref())
    }

    /// Data size and content type.
    #[must_use]
    pub fn data(&self) -> Option<&DataMeta> {
        check("data", self.record.data.as_ref())
    }

    /// User tags carried by the transaction.
    #[must_use]
    pub fn tags(&self) -> Option<&[Tag]> {
        check("tags", self.record.tags.as_deref())
    }

    /// The containing block, once mined.
    #[must_use]
    pub fn block(&self) -> Option<&BlockRecord> {
        check("block", self.record.block.as_ref())
    }

    /// The bundling parent, treated as absent when it carries no id.
    #[must_use]
    pub fn parent(&self) -> Option<&Parent> {
        check("parent", self.record.parent.as_ref().filter(|parent| parent.id.is_some()))
    }

    /// Looks up a tag value by name. Does not log a selection hint.
    #[must_use]
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.record.tag_value(name)
    }

    /// The underlying wire record.
    #[must_use]
    pub fn record(&self) -> &TransactionRecord {
        &self.record
    }

    /// Unwraps the view into the wire record.
    #[must_use]
    pub fn into_record(self) -> TransactionRecord {
        self.record
    }
}

impl From<TransactionRecord> for TransactionView {
    fn from(record: TransactionRecord) -> Self {
        Self::new(record)
    }
}

/// Read-only view of a returned block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockView {
    record: BlockRecord,
}

impl BlockView {
    /// Wraps a raw record.
    #[must_use]
    pub fn new(record: BlockRecord) -> Self {
        Self { record }
    }

    /// Block id.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        check("id", self.record.id.as_deref())
    }

    /// Unix seconds at which the block was mined.
    #[must_use]
    pub fn timestamp(&self) -> Option<u64> {
        check("timestamp", self.record.timestamp)
    }

    /// Block height.
    #[must_use]
    pub fn height(&self) -> Option<u64> {
        check("height", self.record.height)
    }

    /// Id of the preceding block.
    #[must_use]
    pub fn previous(&self) -> Option<&str> {
        check("previous", self.record.previous.as_deref())
    }

    /// The underlying wire record.
    #[must_use]
    pub fn record(&self) -> &BlockRecord {
        &self.record
    }

    /// Unwraps the view into the wire record.
    #[must_use]
    pub fn into_record(self) -> BlockRecord {
        self.record
    }
}

impl From<BlockRecord> for BlockView {
    fn from(record: BlockRecord) -> Self {
        Self::new(record)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_present_fields_pass_through() {
        let record = TransactionRecord {
            id: Some("tx-1".into()),
            recipient: Some("addr-r".into()),
            tags: Some(vec![Tag::new("App-Name", "demo")]),
            ..TransactionRecord::default()
        };
        let view = TransactionView::new(record);

        assert_eq!(view.id(), Some("tx-1"));
        assert_eq!(view.recipient(), Some("addr-r"));
        assert_eq!(view.tags().map(<[Tag]>::len), Some(1));
        assert_eq!(view.tag_value("App-Name"), Some("demo"));
    }

    #[test]
    fn test_absent_fields_return_none() {
        let view = TransactionView::new(TransactionRecord::default());

        assert_eq!(view.id(), None);
        assert_eq!(view.owner(), None);
        assert_eq!(view.tags(), None);
        assert_eq!(view.block(), None);
    }

    #[test]
    fn test_parent_without_id_is_absent() {
        let record = TransactionRecord {
            parent: Some(Parent { id: None }),
            ..TransactionRecord::default()
        };
        let view = TransactionView::new(record);

        assert_eq!(view.parent(), None);
    }

    #[test]
    fn test_block_view_accessors() {
        let record = BlockRecord {
            id: Some("blk-1".into()),
            timestamp: Some(1_600_000_000),
            height: Some(42),
            previous: None,
        };
        let view = BlockView::new(record);

        assert_eq!(view.id(), Some("blk-1"));
        assert_eq!(view.timestamp(), Some(1_600_000_000));
        assert_eq!(view.height(), Some(42));
        assert_eq!(view.previous(), None);
    }
}
