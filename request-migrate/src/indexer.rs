//! Offer grouping by parent request.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::errors::MigrationError;
use crate::loader::Record;

/// Canonical string form of an identifier, used both as document key and
/// for matching offers to requests.
///
/// Numbers use their decimal form (`1` → `"1"`), strings are kept as-is and
/// null has no canonical form.
pub fn canonical_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Read `field` from `record` and return its canonical id.
///
/// A missing field is a [`MigrationError::MissingField`]; a null or empty
/// value is a [`MigrationError::InvalidKey`].
pub fn record_key(
    record: &Record,
    kind: &'static str,
    field: &'static str,
) -> Result<String, MigrationError> {
    let value = record.get(field).ok_or_else(|| MigrationError::MissingField {
        kind,
        record: describe(record),
        field,
    })?;

    canonical_id(value)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| MigrationError::InvalidKey {
            kind,
            field,
            value: value.to_string(),
        })
}

/// Short identification of a record for error messages.
pub(crate) fn describe(record: &Record) -> String {
    record
        .get("id")
        .and_then(canonical_id)
        .map(|id| format!("id={}", id))
        .unwrap_or_else(|| "<no id>".to_string())
}

/// Offers grouped under the canonical id of their parent request.
///
/// Groups keep source order and are not deduplicated.
#[derive(Debug, Default)]
pub struct OfferIndex {
    groups: HashMap<String, Vec<Record>>,
    /// Offers whose `request_id` is null
    unkeyed: usize,
    total: usize,
}

impl OfferIndex {
    /// Group `offers` by `request_id`.
    pub fn build(offers: Vec<Record>) -> Result<Self, MigrationError> {
        let mut index = Self::default();

        for offer in offers {
            let parent = offer
                .get("request_id")
                .ok_or_else(|| MigrationError::MissingField {
                    kind: "tutor offer",
                    record: describe(&offer),
                    field: "request_id",
                })?;

            index.total += 1;
            match canonical_id(parent) {
                Some(request_id) => index.groups.entry(request_id).or_default().push(offer),
                None => index.unkeyed += 1,
            }
        }

        Ok(index)
    }

    /// Offers of `request_id`, in source order; empty when it has none.
    pub fn offers_for(&self, request_id: &str) -> &[Record] {
        self.groups
            .get(request_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of distinct parent ids.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of indexed offers.
    pub fn total_offers(&self) -> usize {
        self.total
    }

    /// Offers that no request in `request_ids` will pick up.
    pub fn orphaned_count(&self, request_ids: &HashSet<&str>) -> usize {
        let unmatched: usize = self
            .groups
            .iter()
            .filter(|(request_id, _)| !request_ids.contains(request_id.as_str()))
            .map(|(_, offers)| offers.len())
            .sum();
        unmatched + self.unkeyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offer(id: i64, request_id: Value) -> Record {
        json!({ "id": id, "request_id": request_id, "tutor_id": 5 })
            .as_object()
            .unwrap()
            .clone()
    }

    fn ids(records: &[Record]) -> Vec<i64> {
        records.iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn test_canonical_id() {
        assert_eq!(canonical_id(&json!(1)), Some("1".to_string()));
        assert_eq!(canonical_id(&json!("1")), Some("1".to_string()));
        assert_eq!(canonical_id(&json!(1.5)), Some("1.5".to_string()));
        assert_eq!(canonical_id(&json!(null)), None);
    }

    #[test]
    fn test_groups_preserve_source_order() {
        let index = OfferIndex::build(vec![
            offer(10, json!(1)),
            offer(11, json!(2)),
            offer(12, json!(1)),
            offer(13, json!(1)),
        ])
        .unwrap();

        assert_eq!(ids(index.offers_for("1")), vec![10, 12, 13]);
        assert_eq!(ids(index.offers_for("2")), vec![11]);
        assert_eq!(index.group_count(), 2);
        assert_eq!(index.total_offers(), 4);
    }

    #[test]
    fn test_numeric_and_string_parent_ids_share_a_group() {
        let index = OfferIndex::build(vec![offer(10, json!(7)), offer(11, json!("7"))]).unwrap();
        assert_eq!(ids(index.offers_for("7")), vec![10, 11]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let index = OfferIndex::build(vec![offer(10, json!(1)), offer(10, json!(1))]).unwrap();
        assert_eq!(ids(index.offers_for("1")), vec![10, 10]);
    }

    #[test]
    fn test_request_without_offers_gets_empty_group() {
        let index = OfferIndex::build(vec![offer(10, json!(1))]).unwrap();
        assert!(index.offers_for("99").is_empty());
    }

    #[test]
    fn test_orphaned_offers() {
        let index = OfferIndex::build(vec![
            offer(10, json!(1)),
            offer(11, json!(2)),
            offer(12, json!(2)),
            offer(13, json!(null)),
        ])
        .unwrap();

        let requests: HashSet<&str> = ["1"].into_iter().collect();
        assert_eq!(index.orphaned_count(&requests), 3);
    }

    #[test]
    fn test_missing_request_id_is_fatal() {
        let mut broken = offer(10, json!(1));
        broken.remove("request_id");

        let result = OfferIndex::build(vec![broken]);
        assert!(matches!(
            result,
            Err(MigrationError::MissingField { field: "request_id", .. })
        ));
    }

    #[test]
    fn test_record_key() {
        let record = offer(10, json!(1));
        assert_eq!(record_key(&record, "tutor offer", "id").unwrap(), "10");

        let null_id = json!({ "id": null }).as_object().unwrap().clone();
        assert!(matches!(
            record_key(&null_id, "request", "id"),
            Err(MigrationError::InvalidKey { field: "id", .. })
        ));

        let empty = Record::new();
        assert!(matches!(
            record_key(&empty, "request", "id"),
            Err(MigrationError::MissingField { field: "id", .. })
        ));
    }
}
