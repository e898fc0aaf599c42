//! Key case conversion at the API boundary: clients send and receive camelCase, catalog fields are snake_case.
//! Only top-level keys are converted; nested `opaque` payloads keep their keys.

use serde_json::{Map, Value};

/// e.g. "serial_number" -> "serialNumber"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// e.g. "serialNumber" -> "serial_number"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Request side: rename object keys to snake_case.
pub fn keys_to_snake_case(obj: Map<String, Value>) -> Map<String, Value> {
    obj.into_iter().map(|(k, v)| (to_snake_case(&k), v)).collect()
}

/// Response side: rename the keys of an object, or of each object in an array, to camelCase.
pub fn value_keys_to_camel_case(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let taken = std::mem::take(map);
            *map = taken.into_iter().map(|(k, v)| (to_camel_case(&k), v)).collect();
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Value::Object(_) = item {
                    value_keys_to_camel_case(item);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_both_ways() {
        assert_eq!(to_camel_case("serial_number"), "serialNumber");
        assert_eq!(to_snake_case("serialNumber"), "serial_number");
        assert_eq!(to_snake_case("name"), "name");
    }

    #[test]
    fn leaves_nested_keys_alone() {
        let mut v = json!({ "created_at": "x", "location": { "grid_ref": "7:30" } });
        value_keys_to_camel_case(&mut v);
        assert_eq!(v, json!({ "createdAt": "x", "location": { "grid_ref": "7:30" } }));
    }
}
