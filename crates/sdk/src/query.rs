//! Structured query model and its deterministic text rendering.
//!
//! A [`GqlQuery`] is the assembled form of one search: the response shape,
//! the accumulated arguments, and the field selection. Rendering scopes the
//! arguments to the shape first (single-entity lookups are id-only, list
//! shapes drop whatever their root does not accept), then serializes in a
//! fixed order so the same query state always produces the same text.

use std::fmt::Write as _;

use snafu::ensure;
use tessera_gateway_types::{HeightRange, SortOrder, TagFilter};

use crate::catalog::{Field, FieldSelection};
use crate::error::{InvalidQuerySnafu, Result};

/// The four response shapes the read endpoint can produce.
#[allow(missing_docs)] // Variant names match the entity names on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    SingleTransaction,
    TransactionList,
    SingleBlock,
    BlockList,
}

impl QueryKind {
    /// The root field name of the query for this shape.
    #[must_use]
    pub const fn root(self) -> &'static str {
        match self {
            Self::SingleTransaction => "transaction",
            Self::TransactionList => "transactions",
            Self::SingleBlock => "block",
            Self::BlockList => "blocks",
        }
    }

    /// Whether this shape returns a paginated edge list.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::TransactionList | Self::BlockList)
    }
}

/// Accumulated search arguments, prior to shape scoping.
///
/// Which fields are serialized depends on the [`QueryKind`]; setters only
/// expose what their shape accepts, but scoping is re-applied at render
/// time so a hand-built value cannot smuggle arguments past the root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryArgs {
    /// Exact id, for the single-record shapes.
    pub id: Option<String>,
    /// Restricts a list to these ids.
    pub ids: Vec<String>,
    /// Restricts entries to these owner addresses.
    pub owners: Vec<String>,
    /// Restricts entries to these recipient addresses.
    pub recipients: Vec<String>,
    /// Tag predicates, combined with AND.
    pub tags: Vec<TagFilter>,
    /// Block height bounds, for the block list shape.
    pub height: HeightRange,
    /// Page size; omitted from the text when unset.
    pub first: Option<u64>,
    /// Result order; omitted from the text when unset.
    pub sort: Option<SortOrder>,
    /// Continuation cursor; lists always render it, empty when unset.
    pub after: Option<String>,
}

/// One fully specified query.
#[derive(Debug, Clone, PartialEq)]
pub struct GqlQuery {
    /// Shape to render under.
    pub kind: QueryKind,
    /// Parameter list.
    pub args: QueryArgs,
    /// Fields requested back.
    pub selection: FieldSelection,
}

impl GqlQuery {
    /// Assembles a query from its parts.
    #[must_use]
    pub fn new(kind: QueryKind, args: QueryArgs, selection: FieldSelection) -> Self {
        Self { kind, args, selection }
    }

    /// Checks the query can be rendered for its shape.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::InvalidQuery`](crate::error::SdkError::InvalidQuery)
    /// when a single-entity shape has no id to look up.
    pub fn validate(&self) -> Result<()> {
        if !self.kind.is_list() {
            let id = self.args.id.as_deref().unwrap_or_default();
            ensure!(
                !id.is_empty(),
                InvalidQuerySnafu { reason: format!("{} lookup requires an id", self.kind.root()) }
            );
        }
        Ok(())
    }

    /// Renders the query text.
    ///
    /// # Errors
    ///
    /// Same conditions as [`validate`](Self::validate).
    pub fn render(&self) -> Result<String> {
        let params = self.render_params()?;

        let mut out = String::new();
        out.push_str("query {\n");
        let _ = writeln!(out, "  {}({}) {{", self.kind.root(), params);

        match self.kind {
            QueryKind::SingleTransaction => {
                self.render_transaction_fields(&mut out, 2);
            },
            QueryKind::SingleBlock => {
                render_block_fields(&mut out, 2);
            },
            QueryKind::TransactionList => {
                render_envelope(&mut out, |out, depth| self.render_transaction_fields(out, depth));
            },
            QueryKind::BlockList => {
                render_envelope(&mut out, |out, depth| render_block_fields(out, depth));
            },
        }

        out.push_str("  }\n}");
        Ok(out)
    }

    /// Serializes the argument list, scoped to the query shape.
    ///
    /// Single-entity shapes collapse to the id alone. List shapes always
    /// carry `after` (the endpoint wants the key present even when empty)
    /// and drop whatever their root does not accept: transaction lists
    /// have no height range, block lists have no owner, recipient, or tag
    /// filters. Order is fixed, so rendering is deterministic.
    fn render_params(&self) -> Result<String> {
        self.validate()?;
        let args = &self.args;

        if !self.kind.is_list() {
            return Ok(format!("id: {}", str_literal(args.id.as_deref().unwrap_or_default())));
        }

        let mut params = Vec::new();

        if !args.ids.is_empty() {
            params.push(format!("ids: {}", str_list(&args.ids)));
        }
        if self.kind == QueryKind::TransactionList {
            if !args.owners.is_empty() {
                params.push(format!("owners: {}", str_list(&args.owners)));
            }
            if !args.recipients.is_empty() {
                params.push(format!("recipients: {}", str_list(&args.recipients)));
            }
            if !args.tags.is_empty() {
                params.push(format!("tags: {}", tag_list(&args.tags)));
            }
        }
        if self.kind == QueryKind::BlockList && !args.height.is_empty() {
            params.push(format!("height: {}", height_range(&args.height)));
        }
        if let Some(first) = args.first {
            params.push(format!("first: {first}"));
        }
        if let Some(sort) = args.sort {
            params.push(format!("sort: {}", sort.token()));
        }
        params.push(format!("after: {}", str_literal(args.after.as_deref().unwrap_or_default())));

        Ok(params.join(", "))
    }

    /// Renders the transaction fieldset from the selection, falling back
    /// to the full catalog when the selection is empty.
    fn render_transaction_fields(&self, out: &mut String, depth: usize) {
        let full;
        let selection = if self.selection.is_empty() {
            full = FieldSelection::all();
            &full
        } else {
            &self.selection
        };

        for scalar in [Field::Id, Field::Anchor, Field::Signature, Field::Recipient] {
            if selection.contains(scalar) {
                push_line(out, depth, scalar.name());
            }
        }

        let groups = [
            Field::Owner,
            Field::Fee,
            Field::Quantity,
            Field::Data,
            Field::Tags,
            Field::Block,
            Field::Parent,
        ];
        for group in groups {
            if !selection.contains(group) {
                continue;
            }
            push_line(out, depth, &format!("{} {{", group.name()));
            for child in group.children() {
                if selection.contains(*child) {
                    push_line(out, depth + 1, child.name());
                }
            }
            push_line(out, depth, "}");
        }
    }
}

/// The block fieldset is fixed; blocks have no selectable projection.
fn render_block_fields(out: &mut String, depth: usize) {
    for name in ["id", "timestamp", "height", "previous"] {
        push_line(out, depth, name);
    }
}

/// Wraps entity fields in the page-metadata envelope used by list shapes.
fn render_envelope(out: &mut String, node_fields: impl Fn(&mut String, usize)) {
    push_line(out, 2, "pageInfo {");
    push_line(out, 3, "hasNextPage");
    push_line(out, 2, "}");
    push_line(out, 2, "edges {");
    push_line(out, 3, "cursor");
    push_line(out, 3, "node {");
    node_fields(out, 4);
    push_line(out, 3, "}");
    push_line(out, 2, "}");
}

fn push_line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(text);
    out.push('\n');
}

/// Quotes a string value, escaping backslashes and quotes.
fn str_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

fn str_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| str_literal(v)).collect();
    format!("[{}]", quoted.join(", "))
}

fn tag_list(tags: &[TagFilter]) -> String {
    let rendered: Vec<String> = tags
        .iter()
        .map(|tag| {
            let values: Vec<String> = tag.values.iter().map(|v| str_literal(v)).collect();
            format!("{{ name: {}, values: [{}] }}", str_literal(&tag.name), values.join(", "))
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

fn height_range(range: &HeightRange) -> String {
    let mut parts = Vec::new();
    if let Some(min) = range.min {
        parts.push(format!("min: {min}"));
    }
    if let Some(max) = range.max {
        parts.push(format!("max: {max}"));
    }
    format!("{{ {} }}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use proptest::prelude::*;

    use super::*;
    use crate::error::SdkError;

    fn list_query(args: QueryArgs) -> GqlQuery {
        GqlQuery::new(QueryKind::TransactionList, args, FieldSelection::default())
    }

    #[test]
    fn test_single_transaction_is_id_only() {
        // Accumulated list filters are discarded for single lookups.
        let args = QueryArgs {
            id: Some("tx-1".into()),
            owners: vec!["addr".into()],
            first: Some(10),
            ..QueryArgs::default()
        };

        let query = GqlQuery::new(QueryKind::SingleTransaction, args, FieldSelection::default());
        let text = query.render().unwrap();

        assert!(text.contains("transaction(id: \"tx-1\")"));
        assert!(!text.contains("owners"));
        assert!(!text.contains("first"));
        assert!(!text.contains("pageInfo"));
        assert!(text.contains("signature"));
    }

    #[test]
    fn test_single_transaction_without_id_fails() {
        let query =
            GqlQuery::new(QueryKind::SingleTransaction, QueryArgs::default(), FieldSelection::default());

        let err = query.render().unwrap_err();
        assert!(matches!(err, SdkError::InvalidQuery { .. }));
    }

    #[test]
    fn test_single_block_has_fixed_fields() {
        let args = QueryArgs { id: Some("blk-9".into()), ..QueryArgs::default() };

        let query = GqlQuery::new(QueryKind::SingleBlock, args, FieldSelection::default());
        let text = query.render().unwrap();

        assert!(text.contains("block(id: \"blk-9\")"));
        for field in ["id", "timestamp", "height", "previous"] {
            assert!(text.contains(field), "missing {field}");
        }
        assert!(!text.contains("edges"));
    }

    #[test]
    fn test_list_always_carries_after() {
        let text = list_query(QueryArgs::default()).render().unwrap();

        assert!(text.contains("transactions(after: \"\")"));
        assert!(text.contains("pageInfo {"));
        assert!(text.contains("hasNextPage"));
        assert!(text.contains("cursor"));
    }

    #[test]
    fn test_list_params_render_in_fixed_order() {
        let args = QueryArgs {
            sort: Some(SortOrder::HeightAscending),
            first: Some(25),
            tags: vec![TagFilter::new("App-Name", ["tessera"])],
            ids: vec!["a".into(), "b".into()],
            ..QueryArgs::default()
        };

        let text = list_query(args).render().unwrap();

        let expected = concat!(
            "transactions(",
            "ids: [\"a\", \"b\"], ",
            "tags: [{ name: \"App-Name\", values: [\"tessera\"] }], ",
            "first: 25, sort: HEIGHT_ASC, after: \"\")"
        );
        assert!(text.contains(expected), "got: {text}");
    }

    #[test]
    fn test_sort_token_is_unquoted() {
        let args =
            QueryArgs { sort: Some(SortOrder::HeightDescending), ..QueryArgs::default() };

        let text = list_query(args).render().unwrap();

        assert!(text.contains("sort: HEIGHT_DESC"));
        assert!(!text.contains("\"HEIGHT_DESC\""));
    }

    #[test]
    fn test_block_list_scopes_out_transaction_filters() {
        let args = QueryArgs {
            owners: vec!["addr".into()],
            tags: vec![TagFilter::new("App-Name", ["x"])],
            height: HeightRange { min: Some(10), max: Some(20) },
            ..QueryArgs::default()
        };

        let query = GqlQuery::new(QueryKind::BlockList, args, FieldSelection::default());
        let text = query.render().unwrap();

        assert!(text.contains("height: { min: 10, max: 20 }"));
        assert!(!text.contains("owners"));
        assert!(!text.contains("tags"));
        assert!(text.contains("blocks("));
    }

    #[test]
    fn test_transaction_list_drops_height_range() {
        let args = QueryArgs {
            height: HeightRange { min: Some(10), max: None },
            ..QueryArgs::default()
        };

        let text = list_query(args).render().unwrap();
        assert!(!text.contains("height:"));
    }

    #[test]
    fn test_narrowed_selection_renders_closure_only() {
        let selection = FieldSelection::of([Field::Owner]);
        let query = GqlQuery::new(QueryKind::TransactionList, QueryArgs::default(), selection);
        let text = query.render().unwrap();

        assert!(text.contains("owner {"));
        assert!(text.contains("address"));
        assert!(text.contains("key"));
        assert!(!text.contains("signature"));
        assert!(!text.contains("fee"));
    }

    #[test]
    fn test_partial_group_renders_present_children() {
        let selection = FieldSelection::of([Field::BlockHeight]);
        let query = GqlQuery::new(QueryKind::TransactionList, QueryArgs::default(), selection);
        let text = query.render().unwrap();

        assert!(text.contains("block {"));
        assert!(text.contains("height"));
        assert!(!text.contains("timestamp"));
        assert!(!text.contains("previous"));
    }

    #[test]
    fn test_empty_selection_falls_back_to_full_fieldset() {
        let query =
            GqlQuery::new(QueryKind::TransactionList, QueryArgs::default(), FieldSelection::empty());
        let text = query.render().unwrap();

        for token in ["id", "anchor", "signature", "recipient", "owner {", "parent {"] {
            assert!(text.contains(token), "missing {token}");
        }
    }

    #[test]
    fn test_string_values_are_escaped() {
        let args = QueryArgs {
            tags: vec![TagFilter::new("note", [r#"say "hi" \ bye"#])],
            ..QueryArgs::default()
        };

        let text = list_query(args).render().unwrap();
        assert!(text.contains(r#"values: ["say \"hi\" \\ bye"]"#));
    }

    fn arb_args() -> impl Strategy<Value = QueryArgs> {
        let ids = prop::collection::vec("[a-z0-9]{1,8}", 0..3);
        let owners = prop::collection::vec("[a-z0-9]{1,8}", 0..3);
        let tags = prop::collection::vec(
            ("[A-Za-z-]{1,10}", prop::collection::vec("[a-z0-9 ]{0,8}", 1..3)),
            0..3,
        );
        (ids, owners, tags, prop::option::of(1u64..200), any::<bool>()).prop_map(
            |(ids, owners, tags, first, descending)| QueryArgs {
                ids,
                owners,
                tags: tags.into_iter().map(|(name, values)| TagFilter { name, values }).collect(),
                first,
                sort: Some(if descending {
                    SortOrder::HeightDescending
                } else {
                    SortOrder::HeightAscending
                }),
                ..QueryArgs::default()
            },
        )
    }

    proptest! {
        /// Identical query state always renders to identical text.
        #[test]
        fn prop_render_is_deterministic(args in arb_args()) {
            let query = list_query(args);
            prop_assert_eq!(query.render().unwrap(), query.render().unwrap());
        }
    }
}
