use serde_json::{Map, Value};

use crate::region::Granularity;

/// Property keys that have historically carried the postal code, in lookup order.
pub const CODE_KEYS: [&str; 10] = [
    "code", "plz", "PLZ", "Plz", "postcode", "postal_code", "plz5", "plz3", "plz2", "plz1",
];

/// Canonicalize a raw code for `granularity`.
/// Purely numeric codes shorter than the tier's digit count are left-padded with zeros
/// (`"1067"` becomes `"01067"` at 5 digits). Anything else is only trimmed.
pub fn normalize_code(raw: &str, granularity: Granularity) -> Option<String> {
    let code = raw.trim();
    if code.is_empty() { return None }

    let digits = granularity.digits();
    if code.len() < digits && code.bytes().all(|b| b.is_ascii_digit()) {
        Some(format!("{code:0>digits$}"))
    } else {
        Some(code.to_string())
    }
}

/// Pull the code out of a feature's properties, trying each of [`CODE_KEYS`].
/// Numeric JSON values are accepted as well as strings.
pub fn code_from_properties(properties: &Map<String, Value>, granularity: Granularity) -> Option<String> {
    CODE_KEYS.iter()
        .filter_map(|&key| properties.get(key))
        .find_map(|value| match value {
            Value::String(s) => normalize_code(s, granularity),
            Value::Number(n) => normalize_code(&n.to_string(), granularity),
            _ => None,
        })
}
