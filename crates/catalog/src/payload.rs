use dental_core::{CatalogError, ServiceRecord};
use serde_json::Value;
use tracing::warn;

/// Decodes a backend `/api/services` body. Accepts a bare list or a
/// `{"data": [...]}` envelope. Items that do not decode are skipped.
pub fn parse_services_payload(payload: Value) -> Result<Vec<ServiceRecord>, CatalogError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(CatalogError::Malformed(format!(
                    "`data` should be a list, got {}",
                    kind(&other)
                )))
            }
            None => {
                return Err(CatalogError::Malformed(
                    "object payload has no `data` list".to_string(),
                ))
            }
        },
        other => {
            return Err(CatalogError::Malformed(format!(
                "expected a list of services, got {}",
                kind(&other)
            )))
        }
    };

    if items.is_empty() {
        return Err(CatalogError::Empty);
    }

    let total = items.len();
    let records = items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match serde_json::from_value::<ServiceRecord>(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(position, error = %err, "skipping undecodable service item");
                None
            }
        })
        .collect::<Vec<_>>();

    if records.is_empty() {
        warn!(total, "no service item in payload could be decoded");
        return Err(CatalogError::Empty);
    }

    Ok(records)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
