//! Typed accessors over stored JSON documents.
//!
//! The store keeps entities as `serde_json::Value` objects produced by the
//! serde derives on the model structs; these helpers read individual fields
//! back without a full deserialization.

use serde_json::Value;
use uuid::Uuid;

use crate::kind::{EntityKind, EntityRef};

pub fn get_str<'a>(doc: &'a Value, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(Value::as_str)
}

pub fn get_bool(doc: &Value, field: &str) -> Option<bool> {
    doc.get(field).and_then(Value::as_bool)
}

pub fn get_uuid(doc: &Value, field: &str) -> Option<Uuid> {
    get_str(doc, field).and_then(|s| Uuid::parse_str(s).ok())
}

pub fn get_ref(doc: &Value, field: &str) -> Option<EntityRef> {
    doc.get(field)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

/// Reads an array of id strings; missing or non-array fields yield empty.
pub fn get_uuid_array(doc: &Value, field: &str) -> Vec<Uuid> {
    doc.get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                .collect()
        })
        .unwrap_or_default()
}

pub fn id_of(doc: &Value) -> Option<Uuid> {
    get_uuid(doc, "id")
}

pub fn is_deleted(doc: &Value) -> bool {
    get_bool(doc, "deleted").unwrap_or(false)
}

/// Tenant keys of a stored document.
///
/// An Organization is its own organization key and a Department is its own
/// department key, so tenant comparisons against them need no special-casing
/// at the call site.
pub fn tenant_keys(kind: EntityKind, doc: &Value) -> (Option<Uuid>, Option<Uuid>) {
    let org = match kind {
        EntityKind::Organization => id_of(doc),
        _ => get_uuid(doc, "organization"),
    };
    let dept = match kind {
        EntityKind::Organization => None,
        EntityKind::Department => id_of(doc),
        _ => get_uuid(doc, "department"),
    };
    (org, dept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tenant_keys_special_cases() {
        let org_id = Uuid::new_v4();
        let dept_id = Uuid::new_v4();

        let org_doc = json!({ "id": org_id.to_string(), "name": "Org" });
        assert_eq!(
            tenant_keys(EntityKind::Organization, &org_doc),
            (Some(org_id), None)
        );

        let dept_doc = json!({
            "id": dept_id.to_string(),
            "organization": org_id.to_string(),
        });
        assert_eq!(
            tenant_keys(EntityKind::Department, &dept_doc),
            (Some(org_id), Some(dept_id))
        );
    }

    #[test]
    fn uuid_array_skips_malformed_entries() {
        let id = Uuid::new_v4();
        let doc = json!({ "mentions": [id.to_string(), "not-a-uuid", 7] });
        assert_eq!(get_uuid_array(&doc, "mentions"), vec![id]);
        assert!(get_uuid_array(&doc, "absent").is_empty());
    }
}
