//! Tekmetric webhook payload models
//!
//! Tekmetric posts repair-order events as loosely shaped JSON. Only a handful
//! of fields matter here: the custom label (or flat status) that carries the
//! "Needs Parts" state, and whatever field holds the repair-order number.

use std::collections::VecDeque;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::MatchFields;

/// Normalized status values treated as "needs parts"
pub const NEEDS_PARTS_ALIASES: [&str; 2] = ["needs parts", "need parts"];

/// Placeholder used when no repair-order identifier can be found
pub const UNKNOWN_ORDER: &str = "UNKNOWN";

/// Keys tried in order on every object before the substring fallback
pub const ORDER_ID_KEYS: [&str; 11] = [
    "number",
    "roNumber",
    "repairOrderNumber",
    "orderNumber",
    "ro_number",
    "repair_order_number",
    "order_number",
    "repairOrderId",
    "repair_order_id",
    "roId",
    "id",
];

/// Fragments matched against lowercased, separator-free key names
const ORDER_ID_KEY_FRAGMENTS: [&str; 3] = ["ronumber", "repairordernumber", "ordernumber"];

/// A repair order that just moved into "Needs Parts"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeedsPartsEvent {
    /// Best-effort repair-order identifier, `UNKNOWN` when absent
    pub ro: String,
}

impl NeedsPartsEvent {
    /// SMS body sent for this event
    pub fn message(&self) -> String {
        format!("RO {} is NEEDS PARTS", self.ro)
    }
}

/// Select the object the matcher inspects.
///
/// A nested `data` member wins when present; otherwise the payload itself is
/// the data. Returns `None` when the chosen value is not a JSON object.
pub fn event_data(payload: &Value) -> Option<&Map<String, Value>> {
    data_value(payload).as_object()
}

fn data_value(payload: &Value) -> &Value {
    payload.get("data").unwrap_or(payload)
}

/// Trim, lowercase, turn `_`/`-` into spaces and collapse runs of whitespace
pub fn normalize_status(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True only for string values that normalize to a "needs parts" alias
pub fn is_needs_parts(value: &Value) -> bool {
    match value.as_str() {
        Some(raw) => NEEDS_PARTS_ALIASES.contains(&normalize_status(raw).as_str()),
        None => false,
    }
}

/// Status candidates in the order they are consulted
pub fn status_values<'a>(data: &'a Map<String, Value>, fields: MatchFields) -> Vec<&'a Value> {
    let mut values = Vec::with_capacity(2);

    if let Some(name) = data
        .get("repairOrderCustomLabel")
        .and_then(|label| label.get("name"))
    {
        values.push(name);
    }

    if fields == MatchFields::LabelOrStatus {
        if let Some(status) = data.get("status") {
            values.push(status);
        }
    }

    values
}

pub fn matches_needs_parts(data: &Map<String, Value>, fields: MatchFields) -> bool {
    status_values(data, fields).into_iter().any(is_needs_parts)
}

/// Breadth-first search for the first usable repair-order identifier.
///
/// Every object is fully inspected (priority keys, then the substring
/// fallback) before anything nested inside it, so shallower matches always
/// win over deeper ones. Only strings and integers are accepted.
pub fn find_order_identifier(root: &Value) -> Option<String> {
    search(VecDeque::from([root]))
}

fn search(mut queue: VecDeque<&Value>) -> Option<String> {
    while let Some(node) = queue.pop_front() {
        match node {
            Value::Object(map) => {
                if let Some(found) = identifier_in_object(map) {
                    return Some(found);
                }
                queue.extend(map.values().filter(|v| is_container(v)));
            }
            Value::Array(items) => {
                queue.extend(items.iter().filter(|v| is_container(v)));
            }
            _ => {}
        }
    }

    None
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Identifier for the event, falling back to [`UNKNOWN_ORDER`]
pub fn order_identifier(root: &Value) -> String {
    find_order_identifier(root).unwrap_or_else(|| UNKNOWN_ORDER.to_string())
}

fn identifier_in_object(map: &Map<String, Value>) -> Option<String> {
    for key in ORDER_ID_KEYS {
        if let Some(found) = map.get(key).and_then(identifier_value) {
            return Some(found);
        }
    }

    map.iter()
        .filter(|(key, _)| key_looks_like_order_number(key))
        .find_map(|(_, value)| identifier_value(value))
}

fn key_looks_like_order_number(key: &str) -> bool {
    let compact: String = key
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_lowercase();
    ORDER_ID_KEY_FRAGMENTS
        .iter()
        .any(|fragment| compact.contains(fragment))
}

fn identifier_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// Decide whether a webhook payload is actionable.
///
/// Returns `None` for anything that is not a "needs parts" transition,
/// including payloads whose data is not an object.
pub fn classify(payload: &Value, fields: MatchFields) -> Option<NeedsPartsEvent> {
    let data = data_value(payload);

    if !matches_needs_parts(data.as_object()?, fields) {
        return None;
    }

    Some(NeedsPartsEvent {
        ro: order_identifier(data),
    })
}
