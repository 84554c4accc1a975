//! The catalog of selectable transaction record fields.
//!
//! The gateway exposes a fixed set of selectable fields, some of which are
//! nested one level under a parent (`owner.address` under `owner`). A
//! [`FieldSelection`] is a set over that catalog that always satisfies the
//! grouping invariant: a selected parent carries at least one of its
//! children (all of them if none were named), and a selected child carries
//! its parent. Narrowing the selection is the main lever for shrinking
//! response payloads, since the gateway has no other projection mechanism.

use std::collections::BTreeSet;

use tracing::warn;

/// One selectable field of a transaction record.
///
/// Variants are declared in catalog order; ordered collections of fields
/// iterate in the same order the gateway schema lists them.
#[allow(missing_docs)] // Variant names mirror the gateway selection paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Id,
    Anchor,
    Signature,
    Recipient,
    Owner,
    OwnerAddress,
    OwnerKey,
    Fee,
    FeeWinston,
    FeeAr,
    Quantity,
    QuantityWinston,
    QuantityAr,
    Data,
    DataSize,
    DataType,
    Tags,
    TagsName,
    TagsValue,
    Block,
    BlockId,
    BlockTimestamp,
    BlockHeight,
    BlockPrevious,
    Parent,
    ParentId,
}

impl Field {
    /// Every catalog field, in catalog order.
    pub const ALL: [Self; 26] = [
        Self::Id,
        Self::Anchor,
        Self::Signature,
        Self::Recipient,
        Self::Owner,
        Self::OwnerAddress,
        Self::OwnerKey,
        Self::Fee,
        Self::FeeWinston,
        Self::FeeAr,
        Self::Quantity,
        Self::QuantityWinston,
        Self::QuantityAr,
        Self::Data,
        Self::DataSize,
        Self::DataType,
        Self::Tags,
        Self::TagsName,
        Self::TagsValue,
        Self::Block,
        Self::BlockId,
        Self::BlockTimestamp,
        Self::BlockHeight,
        Self::BlockPrevious,
        Self::Parent,
        Self::ParentId,
    ];

    /// Parses a dotted field token. Unknown tokens yield `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let field = match token {
            "id" => Self::Id,
            "anchor" => Self::Anchor,
            "signature" => Self::Signature,
            "recipient" => Self::Recipient,
            "owner" => Self::Owner,
            "owner.address" => Self::OwnerAddress,
            "owner.key" => Self::OwnerKey,
            "fee" => Self::Fee,
            "fee.winston" => Self::FeeWinston,
            "fee.ar" => Self::FeeAr,
            "quantity" => Self::Quantity,
            "quantity.winston" => Self::QuantityWinston,
            "quantity.ar" => Self::QuantityAr,
            "data" => Self::Data,
            "data.size" => Self::DataSize,
            "data.type" => Self::DataType,
            "tags" => Self::Tags,
            "tags.name" => Self::TagsName,
            "tags.value" => Self::TagsValue,
            "block" => Self::Block,
            "block.id" => Self::BlockId,
            "block.timestamp" => Self::BlockTimestamp,
            "block.height" => Self::BlockHeight,
            "block.previous" => Self::BlockPrevious,
            "parent" => Self::Parent,
            "parent.id" => Self::ParentId,
            _ => return None,
        };
        Some(field)
    }

    /// The dotted token for this field.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Anchor => "anchor",
            Self::Signature => "signature",
            Self::Recipient => "recipient",
            Self::Owner => "owner",
            Self::OwnerAddress => "owner.address",
            Self::OwnerKey => "owner.key",
            Self::Fee => "fee",
            Self::FeeWinston => "fee.winston",
            Self::FeeAr => "fee.ar",
            Self::Quantity => "quantity",
            Self::QuantityWinston => "quantity.winston",
            Self::QuantityAr => "quantity.ar",
            Self::Data => "data",
            Self::DataSize => "data.size",
            Self::DataType => "data.type",
            Self::Tags => "tags",
            Self::TagsName => "tags.name",
            Self::TagsValue => "tags.value",
            Self::Block => "block",
            Self::BlockId => "block.id",
            Self::BlockTimestamp => "block.timestamp",
            Self::BlockHeight => "block.height",
            Self::BlockPrevious => "block.previous",
            Self::Parent => "parent",
            Self::ParentId => "parent.id",
        }
    }

    /// The bare name rendered inside a query block: the last segment of
    /// the dotted token.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OwnerAddress => "address",
            Self::OwnerKey => "key",
            Self::FeeWinston | Self::QuantityWinston => "winston",
            Self::FeeAr | Self::QuantityAr => "ar",
            Self::DataSize => "size",
            Self::DataType => "type",
            Self::TagsName => "name",
            Self::TagsValue => "value",
            Self::BlockId | Self::ParentId => "id",
            Self::BlockTimestamp => "timestamp",
            Self::BlockHeight => "height",
            Self::BlockPrevious => "previous",
            other => other.token(),
        }
    }

    /// The parent group of a nested field, if any.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::OwnerAddress | Self::OwnerKey => Some(Self::Owner),
            Self::FeeWinston | Self::FeeAr => Some(Self::Fee),
            Self::QuantityWinston | Self::QuantityAr => Some(Self::Quantity),
            Self::DataSize | Self::DataType => Some(Self::Data),
            Self::TagsName | Self::TagsValue => Some(Self::Tags),
            Self::BlockId | Self::BlockTimestamp | Self::BlockHeight | Self::BlockPrevious => {
                Some(Self::Block)
            },
            Self::ParentId => Some(Self::Parent),
            _ => None,
        }
    }

    /// The children of a parent group. Empty for leaves.
    #[must_use]
    pub const fn children(self) -> &'static [Self] {
        match self {
            Self::Owner => &[Self::OwnerAddress, Self::OwnerKey],
            Self::Fee => &[Self::FeeWinston, Self::FeeAr],
            Self::Quantity => &[Self::QuantityWinston, Self::QuantityAr],
            Self::Data => &[Self::DataSize, Self::DataType],
            Self::Tags => &[Self::TagsName, Self::TagsValue],
            Self::Block => {
                &[Self::BlockId, Self::BlockTimestamp, Self::BlockHeight, Self::BlockPrevious]
            },
            Self::Parent => &[Self::ParentId],
            _ => &[],
        }
    }
}

/// A closed set of catalog fields.
///
/// All mutations preserve the grouping invariant, in both directions:
/// inserting a lone parent pulls in all of its children and inserting a
/// child pulls in its parent; removing a parent drops its children and
/// removing the last child of a group drops the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    fields: BTreeSet<Field>,
}

impl Default for FieldSelection {
    /// The full catalog.
    fn default() -> Self {
        Self::all()
    }
}

impl FieldSelection {
    /// Selection of every catalog field.
    #[must_use]
    pub fn all() -> Self {
        Self { fields: Field::ALL.into_iter().collect() }
    }

    /// Empty selection. Rendering treats this as "use the full catalog".
    #[must_use]
    pub fn empty() -> Self {
        Self { fields: BTreeSet::new() }
    }

    /// The closure of exactly the given fields.
    #[must_use]
    pub fn of<I: IntoIterator<Item = Field>>(fields: I) -> Self {
        let mut selection = Self::empty();
        for field in fields {
            selection.insert(field);
        }
        selection
    }

    /// The closure of the given dotted tokens; unknown tokens are dropped
    /// with a warning.
    #[must_use]
    pub fn of_tokens<'a, I: IntoIterator<Item = &'a str>>(tokens: I) -> Self {
        Self::of(tokens.into_iter().filter_map(|token| {
            let parsed = Field::parse(token);
            if parsed.is_none() {
                warn!(token, "unknown field token, ignoring");
            }
            parsed
        }))
    }

    /// True when `field` is part of the selection.
    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    /// True when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of selected fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates the selection in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.iter().copied()
    }

    /// Inserts a field and restores the invariant: a child brings its
    /// parent, a parent with no selected children brings them all.
    pub fn insert(&mut self, field: Field) {
        self.fields.insert(field);

        if let Some(parent) = field.parent() {
            self.fields.insert(parent);
        }

        let children = field.children();
        if !children.is_empty() && !children.iter().any(|child| self.fields.contains(child)) {
            self.fields.extend(children.iter().copied());
        }
    }

    /// Removes a field and restores the invariant: a parent takes its
    /// children with it, and a group whose last child is removed loses the
    /// parent too.
    pub fn remove(&mut self, field: Field) {
        self.fields.remove(&field);

        for child in field.children() {
            self.fields.remove(child);
        }

        if let Some(parent) = field.parent() {
            if !parent.children().iter().any(|child| self.fields.contains(child)) {
                self.fields.remove(&parent);
            }
        }
    }

    /// Removes every given field.
    pub fn remove_all<I: IntoIterator<Item = Field>>(&mut self, fields: I) {
        for field in fields {
            self.remove(field);
        }
    }

    /// Removes every given dotted token; unknown tokens are dropped with a
    /// warning.
    pub fn remove_tokens<'a, I: IntoIterator<Item = &'a str>>(&mut self, tokens: I) {
        for token in tokens {
            match Field::parse(token) {
                Some(field) => self.remove(field),
                None => warn!(token, "unknown field token, ignoring"),
            }
        }
    }
}
