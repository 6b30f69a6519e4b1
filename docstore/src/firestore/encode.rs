//! Encoding of documents into the Firestore REST JSON representation.

use chrono::SecondsFormat;
use serde_json::{json, Map, Value as Json};

use crate::{Document, DocumentRef, Value, WriteBatch};

/// Encode a single value as a Firestore `Value` object.
pub(crate) fn encode_value(value: &Value) -> Json {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Boolean(b) => json!({ "booleanValue": b }),
        // int64 travels as a decimal string
        Value::Integer(i) => json!({ "integerValue": i.to_string() }),
        Value::Double(d) => match serde_json::Number::from_f64(*d) {
            Some(n) => json!({ "doubleValue": n }),
            None => json!({ "doubleValue": non_finite_literal(*d) }),
        },
        Value::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::AutoSi, true) })
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Encode a document body as a Firestore `fields` object.
pub(crate) fn encode_fields(fields: &Document) -> Json {
    let encoded: Map<String, Json> = fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect();
    Json::Object(encoded)
}

/// Fully qualified resource name of a document under `database_path`.
pub(crate) fn document_name(database_path: &str, document: &DocumentRef) -> String {
    format!("{}/documents/{}", database_path, document.path())
}

/// Build the body of a `documents:commit` request.
///
/// `database_path` is `projects/{project}/databases/{database}`.
pub(crate) fn commit_body(database_path: &str, batch: &WriteBatch) -> Json {
    let writes: Vec<Json> = batch
        .writes()
        .iter()
        .map(|write| {
            json!({
                "update": {
                    "name": document_name(database_path, &write.document),
                    "fields": encode_fields(&write.fields),
                }
            })
        })
        .collect();

    json!({ "writes": writes })
}

fn non_finite_literal(d: f64) -> &'static str {
    if d.is_nan() {
        "NaN"
    } else if d.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}
