//! Array canonicalization shared by both write paths.
//!
//! The same functions run on typed model fields (full-document writes) and
//! on `serde_json::Value` array elements inside the store's patch evaluator
//! (partial updates), so the two paths cannot diverge. Add semantics are
//! always set-union: an unconditional append is coerced to add-if-absent.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::kind::EntityKind;
use crate::models::notification::ReadReceipt;

/// Removes duplicates, preserving first-seen order.
pub fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Set-union merge: appends each addition only if absent. Existing order is
/// untouched; new elements keep their relative order.
pub fn union<T: PartialEq>(mut existing: Vec<T>, additions: Vec<T>) -> Vec<T> {
    for item in additions {
        if !existing.contains(&item) {
            existing.push(item);
        }
    }
    existing
}

/// Collapses compound elements by identity, keeping the "newest" of each
/// pair of duplicates. First-seen order of identities is preserved.
pub fn collapse_latest<T>(
    items: Vec<T>,
    same: impl Fn(&T, &T) -> bool,
    newer: impl Fn(&T, &T) -> bool,
) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        match out.iter_mut().find(|e| same(e, &item)) {
            Some(slot) => {
                if newer(&item, slot) {
                    *slot = item;
                }
            }
            None => out.push(item),
        }
    }
    out
}

/// Read-receipt collapse: one entry per user, most recent `read_at` wins.
pub fn collapse_receipts(receipts: Vec<ReadReceipt>) -> Vec<ReadReceipt> {
    collapse_latest(
        receipts,
        |a, b| a.user == b.user,
        |a, b| a.read_at > b.read_at,
    )
}

fn parse_recency(v: &Value) -> Option<DateTime<Utc>> {
    v.as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Value-level keyed collapse used by the store's `MergeKeyed` patch op.
///
/// Elements are objects; `key` identifies them, `recency` orders duplicates.
/// An element whose recency does not parse loses to one whose does.
pub fn merge_keyed(
    existing: Vec<Value>,
    additions: Vec<Value>,
    key: &str,
    recency: &str,
) -> Vec<Value> {
    let mut all = existing;
    all.extend(additions);
    collapse_latest(
        all,
        |a, b| a.get(key) == b.get(key),
        |a, b| match (
            a.get(recency).and_then(parse_recency),
            b.get(recency).and_then(parse_recency),
        ) {
            (Some(na), Some(nb)) => na > nb,
            (Some(_), None) => true,
            _ => false,
        },
    )
}

/// Plain (whole-value identity) array fields per kind, used to canonicalize
/// full documents before insert.
pub fn plain_array_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Task => &[
            "assignees",
            "watchers",
            "activities",
            "materials",
            "comments",
            "attachments",
        ],
        EntityKind::TaskActivity => &["attachments", "materials", "comments"],
        EntityKind::TaskComment => &["mentions", "attachments"],
        EntityKind::Notification => &["recipients"],
        _ => &[],
    }
}

/// Keyed array fields per kind: (field, identity key, recency key).
pub fn keyed_array_fields(kind: EntityKind) -> &'static [(&'static str, &'static str, &'static str)] {
    match kind {
        EntityKind::Notification => &[("reads", "user", "read_at")],
        _ => &[],
    }
}

/// Canonicalizes every declared array field of a full document in place.
/// Fields absent from the document (variant-dependent arrays) are skipped.
pub fn canonicalize_doc(kind: EntityKind, doc: &mut Value) {
    for &field in plain_array_fields(kind) {
        if let Some(Value::Array(items)) = doc.get_mut(field) {
            let taken = std::mem::take(items);
            *items = dedup(taken);
        }
    }
    for &(field, key, recency) in keyed_array_fields(kind) {
        if let Some(Value::Array(items)) = doc.get_mut(field) {
            let taken = std::mem::take(items);
            *items = merge_keyed(taken, Vec::new(), key, recency);
        }
    }
}
