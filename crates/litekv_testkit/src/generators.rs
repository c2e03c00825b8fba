//! Property-based test generators using proptest.

use litekv_codec::{is_falsy, Value};
use proptest::prelude::*;
use serde_json::json;

/// Strategy for base keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9]{0,15}").expect("Invalid regex")
}

/// Strategy for explicit ids.
pub fn id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]{1,8}").expect("Invalid regex")
}

/// Strategy for scalar JSON values, falsy ones included.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        // quarters print exactly, so they survive a JSON round trip
        (-1_000_000i32..1_000_000).prop_map(|n| json!(f64::from(n) / 4.0)),
        ".{0,24}".prop_map(Value::String),
    ]
}

/// Strategy for arbitrary JSON values up to a small depth.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Strategy for values that survive the sparse-field rule.
pub fn truthy_value_strategy() -> impl Strategy<Value = Value> {
    value_strategy().prop_filter("value must be truthy", |v| !is_falsy(v))
}

/// Strategy for values the sparse-field rule drops.
pub fn falsy_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(json!(false)),
        Just(json!(0)),
        Just(json!(0.0)),
        Just(json!("")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn truthy_values_are_truthy(v in truthy_value_strategy()) {
            prop_assert!(!is_falsy(&v));
        }

        #[test]
        fn falsy_values_are_falsy(v in falsy_value_strategy()) {
            prop_assert!(is_falsy(&v));
        }

        #[test]
        fn keys_are_non_empty(k in key_strategy(), id in id_strategy()) {
            prop_assert!(!k.is_empty());
            prop_assert!(!id.is_empty());
        }
    }
}
