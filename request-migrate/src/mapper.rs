//! Projection of source records onto target documents.

use docstore::{Document, Value};
use serde_json::Value as Json;

use crate::config::DeadlineFormat;
use crate::dates::{parse_date, parse_zoned_date};
use crate::errors::MigrationError;
use crate::indexer::{canonical_id, describe};
use crate::loader::Record;

/// How a source field becomes a target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Copied unchanged, nested values included
    Copy,
    /// `YYYY-MM-DD HH:MM:SS` → timestamp or null
    Date,
    /// Zone-suffixed date, see [`DeadlineFormat`]
    ZonedDate,
    /// Canonical string id, null stays null
    Id,
    /// Canonical string id when truthy, otherwise null
    OptionalId,
}

const REQUEST_FIELDS: &[(&str, Rule)] = &[
    ("created_at", Rule::Date),
    ("updated_at", Rule::Date),
    ("deleted_at", Rule::Date),
    ("locked", Rule::Copy),
    ("cancelled", Rule::Copy),
    ("cancel_reason", Rule::Copy),
    ("version", Rule::Copy),
    ("label", Rule::Copy),
    ("description", Rule::Copy),
    ("description_type", Rule::Copy),
    ("field_id", Rule::Copy),
    ("subject_id", Rule::Copy),
    ("duration", Rule::Copy),
    ("assistance_type", Rule::Copy),
    ("exam_type", Rule::Copy),
    ("deadline", Rule::ZonedDate),
    ("date", Rule::ZonedDate),
    ("time", Rule::Copy),
    ("timezone", Rule::Copy),
    ("grade", Rule::Copy),
    ("notes", Rule::Copy),
    ("language", Rule::Copy),
    ("completed", Rule::Copy),
    ("paid", Rule::Copy),
    ("is_paid", Rule::Copy),
    ("student_id", Rule::Id),
    ("accepted", Rule::Copy),
    ("receipt_submitted", Rule::Copy),
    ("omt_info", Rule::Copy),
    ("tutor_accepted", Rule::Copy),
    ("tutor_id", Rule::OptionalId),
    ("answer_text", Rule::Copy),
    ("answer_files", Rule::Copy),
    ("student_price", Rule::Copy),
    ("tutor_price", Rule::Copy),
    ("min_price", Rule::Copy),
    ("discount", Rule::Copy),
    ("feedback", Rule::Copy),
    ("rating", Rule::Copy),
    ("comments", Rule::Copy),
    ("file_links", Rule::Copy),
    ("file_names", Rule::Copy),
    ("syllabus_link", Rule::Copy),
    ("field", Rule::Copy),
    ("subject", Rule::Copy),
    ("student_nickname", Rule::Copy),
    ("tutor_nickname", Rule::Copy),
    ("country", Rule::Copy),
    ("state", Rule::Copy),
    ("cms_attributes", Rule::Copy),
    ("saved_by", Rule::Copy),
    ("zoom_information", Rule::Copy),
    ("request_status", Rule::Copy),
    ("meeting_id", Rule::Copy),
    ("meeting_password", Rule::Copy),
    ("student_meeting_url", Rule::Copy),
    ("tutor_meeting_url", Rule::Copy),
    ("meeting_record_url", Rule::Copy),
    ("zoom_user_id", Rule::Copy),
    ("sub_subject", Rule::Copy),
    ("promo_id", Rule::Copy),
    ("issue_reported", Rule::Copy),
];

const OFFER_FIELDS: &[(&str, Rule)] = &[
    ("request_id", Rule::Id),
    ("tutor_id", Rule::Id),
    ("status", Rule::Copy),
    ("price", Rule::Copy),
    ("created_at", Rule::Date),
    ("updated_at", Rule::Date),
    ("cancel_reason", Rule::Copy),
];

/// Names of the fields written to every request document.
pub fn request_field_names() -> impl Iterator<Item = &'static str> {
    REQUEST_FIELDS.iter().map(|(name, _)| *name)
}

/// Shape a request record into its `requests/{id}` document.
pub fn map_request(
    record: &Record,
    deadline_format: DeadlineFormat,
) -> Result<Document, MigrationError> {
    project(record, "request", REQUEST_FIELDS, deadline_format)
}

/// Shape an offer record into its `requests/{request_id}/tutor_offers/{id}` document.
pub fn map_offer(record: &Record) -> Result<Document, MigrationError> {
    // Offers have no zoned dates, the format is never consulted
    project(record, "tutor offer", OFFER_FIELDS, DeadlineFormat::default())
}

fn project(
    record: &Record,
    kind: &'static str,
    fields: &[(&'static str, Rule)],
    deadline_format: DeadlineFormat,
) -> Result<Document, MigrationError> {
    fields
        .iter()
        .map(|&(name, rule)| {
            let source = record.get(name).ok_or_else(|| MigrationError::MissingField {
                kind,
                record: describe(record),
                field: name,
            })?;
            Ok((name.to_string(), apply(rule, source, deadline_format)))
        })
        .collect()
}

fn apply(rule: Rule, source: &Json, deadline_format: DeadlineFormat) -> Value {
    match rule {
        Rule::Copy => Value::from(source),
        Rule::Date => parse_date(source.as_str()).into(),
        Rule::ZonedDate => parse_zoned_date(source.as_str(), deadline_format).into(),
        Rule::Id => canonical_id(source).into(),
        Rule::OptionalId if is_truthy(source) => canonical_id(source).into(),
        Rule::OptionalId => Value::Null,
    }
}

/// Null, false, zero, `""` and empty containers count as "no value".
fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Json::String(s) => !s.is_empty(),
        Json::Array(items) => !items.is_empty(),
        Json::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    /// A request with every schema field set to null, then `overrides` applied.
    fn request(overrides: Json) -> Record {
        let mut record: Record = request_field_names()
            .map(|name| (name.to_string(), Json::Null))
            .collect();
        record.insert("id".to_string(), json!(1));
        record.insert("student_id".to_string(), json!(3));
        for (key, value) in overrides.as_object().unwrap() {
            record.insert(key.clone(), value.clone());
        }
        record
    }

    fn offer() -> Record {
        json!({
            "id": 10,
            "request_id": 1,
            "tutor_id": 5,
            "status": "pending",
            "price": 20,
            "created_at": "2024-01-02 00:00:00",
            "updated_at": "2024-01-02 00:00:00",
            "cancel_reason": null
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_request_has_every_schema_field() {
        let doc = map_request(&request(json!({})), DeadlineFormat::Legacy).unwrap();
        assert_eq!(doc.len(), 62);
        assert!(request_field_names().all(|name| doc.contains_key(name)));
        assert!(!doc.contains_key("id"));
    }

    #[test]
    fn test_request_field_rules() {
        let record = request(json!({
            "created_at": "2024-01-01 00:00:00",
            "updated_at": "not a date",
            "deadline": "2024-02-01T00:00:00.000Z",
            "student_id": 42,
            "tutor_id": 7,
            "locked": false,
            "student_price": 25.5,
            "file_links": ["a.pdf", "b.pdf"],
            "zoom_information": { "meeting": 99 }
        }));

        let doc = map_request(&record, DeadlineFormat::Legacy).unwrap();

        assert_eq!(
            doc["created_at"],
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(doc["updated_at"], Value::Null);
        assert_eq!(doc["deadline"], Value::Null);
        assert_eq!(doc["student_id"], Value::from("42"));
        assert_eq!(doc["tutor_id"], Value::from("7"));
        assert_eq!(doc["locked"], Value::Boolean(false));
        assert_eq!(doc["student_price"], Value::Double(25.5));
        assert_eq!(
            doc["file_links"],
            Value::Array(vec![Value::from("a.pdf"), Value::from("b.pdf")])
        );
        assert!(matches!(doc["zoom_information"], Value::Map(_)));
    }

    #[test]
    fn test_iso_deadline_format() {
        let record = request(json!({
            "deadline": "2024-02-01T00:00:00.000Z",
            "date": "2024-02-03T09:30:00.000Z"
        }));

        let doc = map_request(&record, DeadlineFormat::Iso).unwrap();
        assert_eq!(
            doc["deadline"],
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            doc["date"],
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 2, 3, 9, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_tutor_id_absent_when_falsy() {
        for tutor_id in [json!(null), json!(0), json!("")] {
            let doc =
                map_request(&request(json!({ "tutor_id": tutor_id })), DeadlineFormat::Legacy)
                    .unwrap();
            assert_eq!(doc["tutor_id"], Value::Null, "tutor_id: {tutor_id}");
        }

        let doc =
            map_request(&request(json!({ "tutor_id": "12" })), DeadlineFormat::Legacy).unwrap();
        assert_eq!(doc["tutor_id"], Value::from("12"));
    }

    #[test]
    fn test_missing_request_field_is_fatal() {
        let mut record = request(json!({}));
        record.remove("promo_id");

        let result = map_request(&record, DeadlineFormat::Legacy);
        match result {
            Err(MigrationError::MissingField { field, record, .. }) => {
                assert_eq!(field, "promo_id");
                assert_eq!(record, "id=1");
            }
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_offer_mapping() {
        let doc = map_offer(&offer()).unwrap();

        assert_eq!(doc.len(), 7);
        assert_eq!(doc["request_id"], Value::from("1"));
        assert_eq!(doc["tutor_id"], Value::from("5"));
        assert_eq!(doc["status"], Value::from("pending"));
        assert_eq!(doc["price"], Value::Integer(20));
        assert_eq!(
            doc["created_at"],
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(doc["cancel_reason"], Value::Null);
        assert!(!doc.contains_key("id"));
    }

    #[test]
    fn test_null_ids_stay_null() {
        let doc =
            map_request(&request(json!({ "student_id": null })), DeadlineFormat::Legacy).unwrap();
        assert_eq!(doc["student_id"], Value::Null);

        let mut record = offer();
        record.insert("tutor_id".to_string(), Json::Null);
        let doc = map_offer(&record).unwrap();
        assert_eq!(doc["tutor_id"], Value::Null);
        assert_eq!(doc["request_id"], Value::from("1"));
    }

    #[test]
    fn test_missing_offer_field_is_fatal() {
        let mut record = offer();
        record.remove("status");

        assert!(matches!(
            map_offer(&record),
            Err(MigrationError::MissingField { field: "status", .. })
        ));
    }
}
