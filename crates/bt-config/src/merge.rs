use serde_json::Value;
use sha2::{Digest, Sha256};

/// Deep-merge: objects merge recursively; arrays and scalars are replaced wholesale
/// by the later overlay. `dst` is mutated in place; `src` is consumed.
pub fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

/// Canonicalize JSON by recursively sorting object keys and emitting compact JSON.
/// Used both for hashing (provenance) and for equality checks independent of
/// source-file key ordering.
pub fn canonicalize_json(v: &Value) -> String {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).expect("canonical json serialization must not fail")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_associative_for_disjoint_keys() {
        let base: Value = serde_json::json!({"a": 1});
        let layer_a: Value = serde_json::json!({"b": 2});
        let layer_b: Value = serde_json::json!({"c": 3});

        let mut left = base.clone();
        deep_merge(&mut left, layer_a.clone());
        deep_merge(&mut left, layer_b.clone());

        let mut merged_ab = layer_a;
        deep_merge(&mut merged_ab, layer_b);
        let mut right = base;
        deep_merge(&mut right, merged_ab);

        assert_eq!(canonicalize_json(&left), canonicalize_json(&right));
    }

    #[test]
    fn nested_objects_merge_recursively_scalars_overwrite() {
        let mut dst = serde_json::json!({"risk": {"r_per_trade": 0.01, "max_positions": 5}});
        let src = serde_json::json!({"risk": {"r_per_trade": 0.02}});
        deep_merge(&mut dst, src);
        assert_eq!(dst["risk"]["r_per_trade"], 0.02);
        assert_eq!(dst["risk"]["max_positions"], 5);
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let mut dst = serde_json::json!({"data": {"symbols_subset": ["AAA", "BBB"]}});
        let src = serde_json::json!({"data": {"symbols_subset": ["CCC"]}});
        deep_merge(&mut dst, src);
        assert_eq!(dst["data"]["symbols_subset"], serde_json::json!(["CCC"]));
    }

    #[test]
    fn canonicalization_is_order_independent() {
        let a = serde_json::json!({"b": 1, "a": 2});
        let b = serde_json::json!({"a": 2, "b": 1});
        assert_eq!(canonicalize_json(&a), canonicalize_json(&b));
    }

    #[test]
    fn hash_is_stable_for_identical_canonical_bytes() {
        let a = canonicalize_json(&serde_json::json!({"x": 1}));
        let b = canonicalize_json(&serde_json::json!({"x": 1}));
        assert_eq!(sha256_hex(a.as_bytes()), sha256_hex(b.as_bytes()));
    }
}
