//! Request options tree and recursive merge
//!
//! Options are an untyped tree of [`Value`]s whose top level is always a
//! mapping. The keys understood by the transport are listed as constants in
//! this module; anything else is carried along untouched.

use serde_json::{Map, Value};

/// Request header mapping
pub const HEADERS: &str = "headers";
/// URL query pairs
pub const QUERY: &str = "query";
/// JSON request body
pub const JSON: &str = "json";
/// Raw string request body
pub const BODY: &str = "body";
/// Form-encoded request body
pub const FORM_PARAMS: &str = "form_params";
/// Per-request timeout in seconds
pub const TIMEOUT: &str = "timeout";

/// Top-level options mapping for a single request
pub type RequestOptions = Map<String, Value>;

/// Merge each override into `base`, left to right.
///
/// A key whose override value is a mapping, and which already exists in the
/// base, is merged one level deeper. Every other override value replaces the
/// base value outright. Overrides that are not mappings are skipped.
pub fn recursive_merge<'a, I>(mut base: RequestOptions, overrides: I) -> RequestOptions
where
    I: IntoIterator<Item = &'a Value>,
{
    for insert in overrides {
        if let Value::Object(insert) = insert {
            merge_into(&mut base, insert);
        }
    }
    base
}

fn merge_into(base: &mut RequestOptions, insert: &RequestOptions) {
    for (key, value) in insert {
        if let Value::Object(nested) = value {
            if let Some(Value::Object(existing)) = base.get_mut(key) {
                merge_into(existing, nested);
                continue;
            }
        }
        base.insert(key.clone(), value.clone());
    }
}

/// Default options sent with every request: bearer auth plus JSON content
/// negotiation.
pub fn default_options(token: &str) -> RequestOptions {
    let mut headers = Map::new();
    headers.insert(
        "Authorization".to_string(),
        Value::String(format!("Bearer {token}")),
    );
    headers.insert(
        "Accept".to_string(),
        Value::String("application/json".to_string()),
    );
    headers.insert(
        "Content-Type".to_string(),
        Value::String("application/json".to_string()),
    );

    let mut options = Map::new();
    options.insert(HEADERS.to_string(), Value::Object(headers));
    options
}

/// Render a scalar option value the way it appears on the wire.
///
/// Returns `None` for `null`, arrays and mappings.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
