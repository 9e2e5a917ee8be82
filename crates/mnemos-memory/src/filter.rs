//! Scope filters over tag fields
//!
//! A [`TagFilter`] is a conjunction of predicates; each predicate matches when
//! a tag field equals one of its allowed values. The same filter renders to
//! RediSearch query syntax and evaluates against in-process documents, so both
//! index backends agree on what is in scope.

use crate::record::{fields, MemoryKind};
use std::collections::HashMap;

/// Tag fields a scope filter can constrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagField {
    /// Memory owner
    UserId,
    /// Memory kind
    MemoryType,
    /// Conversation thread
    ThreadId,
    /// Record id
    MemoryId,
}

impl TagField {
    /// Document field name
    pub fn as_str(&self) -> &'static str {
        match self {
            TagField::UserId => fields::USER_ID,
            TagField::MemoryType => fields::MEMORY_TYPE,
            TagField::ThreadId => fields::THREAD_ID,
            TagField::MemoryId => fields::MEMORY_ID,
        }
    }
}

/// One `field in {values}` predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPredicate {
    /// Constrained field
    pub field: TagField,

    /// Allowed values (OR)
    pub values: Vec<String>,
}

impl TagPredicate {
    fn render(&self) -> String {
        let values: Vec<String> = self.values.iter().map(|v| escape_tag_value(v)).collect();
        format!("@{}:{{{}}}", self.field.as_str(), values.join(" | "))
    }
}

/// Conjunction of tag predicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    predicates: Vec<TagPredicate>,
}

impl TagFilter {
    /// An empty filter (matches everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`
    pub fn eq(self, field: TagField, value: impl Into<String>) -> Self {
        self.any_of(field, [value.into()])
    }

    /// Require `field` to equal one of `values`
    ///
    /// An empty value list adds no constraint.
    pub fn any_of<I, S>(mut self, field: TagField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.predicates.push(TagPredicate { field, values });
        }
        self
    }

    /// Conjoin with another filter
    pub fn and(mut self, other: TagFilter) -> Self {
        self.predicates.extend(other.predicates);
        self
    }

    /// Scope filter used by dedup and retrieval
    ///
    /// Always constrains the owner; constrains kind and thread when given.
    /// A blank thread id does not constrain.
    pub fn scope(owner_id: &str, kinds: &KindFilter, thread_id: Option<&str>) -> Self {
        let mut filter = TagFilter::new().eq(TagField::UserId, owner_id);
        filter = filter.any_of(TagField::MemoryType, kinds.tags());
        if let Some(thread_id) = thread_id.filter(|t| !t.trim().is_empty()) {
            filter = filter.eq(TagField::ThreadId, thread_id);
        }
        filter
    }

    /// Predicates in insertion order
    pub fn predicates(&self) -> &[TagPredicate] {
        &self.predicates
    }

    /// Whether the filter has no predicates
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Render as a RediSearch filter expression
    pub fn to_query_string(&self) -> String {
        if self.predicates.is_empty() {
            return "*".to_string();
        }
        let clauses: Vec<String> = self.predicates.iter().map(TagPredicate::render).collect();
        format!("({})", clauses.join(" "))
    }

    /// Evaluate against a stored JSON document
    ///
    /// A predicate on a field the document lacks does not match.
    pub fn matches(&self, document: &serde_json::Value) -> bool {
        self.matches_with(|field| document.get(field).and_then(serde_json::Value::as_str))
    }

    /// Evaluate against the string fields returned with a hit
    ///
    /// Values compare exactly, with no case folding or splitting.
    pub fn matches_fields(&self, fields: &HashMap<String, String>) -> bool {
        self.matches_with(|field| fields.get(field).map(String::as_str))
    }

    fn matches_with<'a>(&self, lookup: impl Fn(&str) -> Option<&'a str>) -> bool {
        self.predicates.iter().all(|predicate| {
            lookup(predicate.field.as_str())
                .map(|actual| predicate.values.iter().any(|v| v == actual))
                .unwrap_or(false)
        })
    }
}

/// Which memory kinds a query is restricted to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KindFilter {
    /// No restriction
    #[default]
    Any,
    /// A single kind
    One(MemoryKind),
    /// Any of several kinds (empty means no restriction)
    AnyOf(Vec<MemoryKind>),
}

impl KindFilter {
    /// Tags the filter allows; empty when unrestricted
    pub fn tags(&self) -> Vec<&'static str> {
        match self {
            KindFilter::Any => Vec::new(),
            KindFilter::One(kind) => vec![kind.as_tag()],
            KindFilter::AnyOf(kinds) => {
                let mut tags: Vec<&'static str> = kinds.iter().map(MemoryKind::as_tag).collect();
                tags.sort_unstable();
                tags.dedup();
                tags
            }
        }
    }

    /// Whether `kind` passes the filter
    pub fn allows(&self, kind: MemoryKind) -> bool {
        match self {
            KindFilter::Any => true,
            KindFilter::One(k) => *k == kind,
            KindFilter::AnyOf(kinds) => kinds.is_empty() || kinds.contains(&kind),
        }
    }
}

impl From<MemoryKind> for KindFilter {
    fn from(kind: MemoryKind) -> Self {
        KindFilter::One(kind)
    }
}

impl From<Option<MemoryKind>> for KindFilter {
    fn from(kind: Option<MemoryKind>) -> Self {
        kind.map(KindFilter::One).unwrap_or_default()
    }
}

impl From<Vec<MemoryKind>> for KindFilter {
    fn from(kinds: Vec<MemoryKind>) -> Self {
        KindFilter::AnyOf(kinds)
    }
}

/// Escape a value for use inside a RediSearch tag clause
pub fn escape_tag_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_punctuation() || ch.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
