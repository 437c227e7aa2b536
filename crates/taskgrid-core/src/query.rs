//! Typed filters and patches for batch store operations, plus their
//! evaluation against stored documents.
//!
//! Evaluation lives here, next to [`crate::normalize`], so every store
//! implementation applies exactly the write-path semantics the engine
//! validated against; the partial-update path cannot drift from the
//! full-document path.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::kind::EntityRef;
use crate::normalize;

fn json(v: impl Serialize) -> Value {
    // Infallible for every type used in filters/patches (ids, enums,
    // timestamps, refs); anything else is a programming error surfaced as
    // a never-matching Null.
    serde_json::to_value(v).unwrap_or(Value::Null)
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(&'static str, Value),
    NotEq(&'static str, Value),
    In(&'static str, Vec<Value>),
    ArrayContains(&'static str, Value),
    ArrayContainsAny(&'static str, Vec<Value>),
}

/// Conjunctive filter over one collection. Soft-deleted rows are excluded
/// unless [`Filter::any`] is used.
#[derive(Debug, Clone)]
pub struct Filter {
    conditions: Vec<Condition>,
    include_deleted: bool,
}

impl Filter {
    /// Matches non-deleted rows only.
    pub fn active() -> Self {
        Self {
            conditions: Vec::new(),
            include_deleted: false,
        }
    }

    /// Matches rows regardless of the deleted flag.
    pub fn any() -> Self {
        Self {
            conditions: Vec::new(),
            include_deleted: true,
        }
    }

    pub fn id(self, id: Uuid) -> Self {
        self.eq("id", id)
    }

    pub fn ids(self, ids: &[Uuid]) -> Self {
        self.is_in("id", ids.iter().map(json).collect())
    }

    pub fn not_id(mut self, id: Uuid) -> Self {
        self.conditions.push(Condition::NotEq("id", json(id)));
        self
    }

    pub fn eq(mut self, field: &'static str, value: impl Serialize) -> Self {
        self.conditions.push(Condition::Eq(field, json(value)));
        self
    }

    pub fn is_in(mut self, field: &'static str, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In(field, values));
        self
    }

    pub fn ref_eq(self, field: &'static str, r: EntityRef) -> Self {
        self.eq(field, r)
    }

    pub fn ref_in(self, field: &'static str, refs: &[EntityRef]) -> Self {
        self.is_in(field, refs.iter().map(|r| r.to_value()).collect())
    }

    pub fn contains(mut self, field: &'static str, value: impl Serialize) -> Self {
        self.conditions
            .push(Condition::ArrayContains(field, json(value)));
        self
    }

    pub fn contains_any(mut self, field: &'static str, values: Vec<Value>) -> Self {
        self.conditions
            .push(Condition::ArrayContainsAny(field, values));
        self
    }

    pub fn contains_any_ids(self, field: &'static str, ids: &[Uuid]) -> Self {
        self.contains_any(field, ids.iter().map(json).collect())
    }

    /// Evaluates the filter against a stored document.
    pub fn matches(&self, doc: &Value) -> bool {
        if !self.include_deleted && crate::doc::is_deleted(doc) {
            return false;
        }
        self.conditions.iter().all(|c| match c {
            Condition::Eq(field, value) => field_of(doc, field) == value,
            Condition::NotEq(field, value) => field_of(doc, field) != value,
            Condition::In(field, values) => values.contains(field_of(doc, field)),
            Condition::ArrayContains(field, value) => {
                array_of(doc, field).is_some_and(|a| a.contains(value))
            }
            Condition::ArrayContainsAny(field, values) => array_of(doc, field)
                .is_some_and(|a| a.iter().any(|item| values.contains(item))),
        })
    }
}

fn field_of<'a>(doc: &'a Value, field: &str) -> &'a Value {
    doc.get(field).unwrap_or(&Value::Null)
}

fn array_of<'a>(doc: &'a Value, field: &str) -> Option<&'a Vec<Value>> {
    doc.get(field).and_then(Value::as_array)
}

#[derive(Debug, Clone)]
enum PatchOp {
    Set(&'static str, Value),
    Clear(&'static str),
    AddToSet(&'static str, Vec<Value>),
    MergeKeyed {
        field: &'static str,
        key: &'static str,
        recency: &'static str,
        values: Vec<Value>,
    },
    PullAll(&'static str, Vec<Value>),
}

/// Ordered list of mutations applied to every document a filter matches.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn set(mut self, field: &'static str, value: impl Serialize) -> Self {
        self.ops.push(PatchOp::Set(field, json(value)));
        self
    }

    /// Sets the field to null (used to clear scalar back-references).
    pub fn clear(mut self, field: &'static str) -> Self {
        self.ops.push(PatchOp::Clear(field));
        self
    }

    /// Add-if-absent union; an append is always coerced to this.
    pub fn add_to_set(mut self, field: &'static str, values: Vec<Value>) -> Self {
        self.ops.push(PatchOp::AddToSet(field, values));
        self
    }

    pub fn add_ids_to_set(self, field: &'static str, ids: &[Uuid]) -> Self {
        self.add_to_set(field, ids.iter().map(json).collect())
    }

    /// Keyed merge for compound elements (e.g. read receipts): collapse by
    /// `key`, keep the most recent `recency`.
    pub fn merge_keyed(
        mut self,
        field: &'static str,
        key: &'static str,
        recency: &'static str,
        values: Vec<Value>,
    ) -> Self {
        self.ops.push(PatchOp::MergeKeyed {
            field,
            key,
            recency,
            values,
        });
        self
    }

    pub fn pull_all(mut self, field: &'static str, values: Vec<Value>) -> Self {
        self.ops.push(PatchOp::PullAll(field, values));
        self
    }

    pub fn pull_ids(self, field: &'static str, ids: &[Uuid]) -> Self {
        self.pull_all(field, ids.iter().map(json).collect())
    }

    /// Applies every op to the document in place. Returns whether anything
    /// actually changed.
    pub fn apply(&self, doc: &mut Value) -> bool {
        let mut changed = false;
        for op in &self.ops {
            match op {
                PatchOp::Set(field, value) => {
                    if field_of(doc, field) != value {
                        insert_field(doc, field, value.clone());
                        changed = true;
                    }
                }
                PatchOp::Clear(field) => {
                    if field_of(doc, field) != &Value::Null {
                        insert_field(doc, field, Value::Null);
                        changed = true;
                    }
                }
                PatchOp::AddToSet(field, values) => {
                    let existing = take_array(doc, field);
                    let before = existing.len();
                    let merged = normalize::union(existing, values.clone());
                    changed |= merged.len() != before;
                    insert_field(doc, field, Value::Array(merged));
                }
                PatchOp::MergeKeyed {
                    field,
                    key,
                    recency,
                    values,
                } => {
                    let existing = take_array(doc, field);
                    let merged =
                        normalize::merge_keyed(existing.clone(), values.clone(), key, recency);
                    changed |= merged != existing;
                    insert_field(doc, field, Value::Array(merged));
                }
                PatchOp::PullAll(field, values) => {
                    let mut existing = take_array(doc, field);
                    let before = existing.len();
                    existing.retain(|item| !values.contains(item));
                    changed |= existing.len() != before;
                    insert_field(doc, field, Value::Array(existing));
                }
            }
        }
        changed
    }
}

fn insert_field(doc: &mut Value, field: &str, value: Value) {
    if let Some(map) = doc.as_object_mut() {
        map.insert(field.to_string(), value);
    }
}

fn take_array(doc: &mut Value, field: &str) -> Vec<Value> {
    match doc.get_mut(field) {
        Some(Value::Array(items)) => std::mem::take(items),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json as j;

    #[test]
    fn filter_excludes_deleted_by_default() {
        let doc = j!({ "id": "a", "deleted": true });
        assert!(!Filter::active().matches(&doc));
        assert!(Filter::any().matches(&doc));
    }

    #[test]
    fn filter_conditions_are_conjunctive() {
        let doc = j!({ "id": "a", "organization": "o1", "deleted": false });
        assert!(
            Filter::active()
                .eq("organization", "o1")
                .eq("id", "a")
                .matches(&doc)
        );
        assert!(
            !Filter::active()
                .eq("organization", "o1")
                .eq("id", "b")
                .matches(&doc)
        );
    }

    #[test]
    fn array_contains_any_intersects() {
        let doc = j!({ "recipients": ["u1", "u2"], "deleted": false });
        let hit = Filter::active().contains_any("recipients", vec![j!("u2"), j!("u9")]);
        let miss = Filter::active().contains_any("recipients", vec![j!("u9")]);
        assert!(hit.matches(&doc));
        assert!(!miss.matches(&doc));
    }

    #[test]
    fn add_to_set_ignores_present_values() {
        let mut doc = j!({ "recipients": ["u1"] });
        let patch = Patch::new().add_to_set("recipients", vec![j!("u1")]);
        assert!(!patch.apply(&mut doc));

        let patch = Patch::new().add_to_set("recipients", vec![j!("u2"), j!("u1")]);
        assert!(patch.apply(&mut doc));
        assert_eq!(doc["recipients"], j!(["u1", "u2"]));
    }

    #[test]
    fn pull_all_removes_every_occurrence() {
        let mut doc = j!({ "attachments": ["a", "b", "c"] });
        let patch = Patch::new().pull_all("attachments", vec![j!("a"), j!("c")]);
        assert!(patch.apply(&mut doc));
        assert_eq!(doc["attachments"], j!(["b"]));
    }

    #[test]
    fn set_reports_no_change_for_equal_value() {
        let mut doc = j!({ "deleted": false });
        assert!(!Patch::new().set("deleted", false).apply(&mut doc));
        assert!(Patch::new().set("deleted", true).apply(&mut doc));
    }
}
