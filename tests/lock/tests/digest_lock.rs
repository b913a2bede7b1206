//! Model digest locks.
//!
//! The digest is `sha256(DOMAIN || canonical_bytes)` with a fixed,
//! null-terminated domain prefix, and the canonical bytes are compact JSON
//! with sorted keys. Both are recomputed here independently of the kernel.

use lock_tests::fixtures::{lights_out, logistics, two_var_model};
use planstate_kernel::digest::hash::{ContentHash, DOMAIN_PROBLEM_MODEL};
use planstate_kernel::model::problem::ProblemModel;
use sha2::{Digest, Sha256};

fn models() -> Vec<ProblemModel> {
    vec![two_var_model(), logistics(2, 3), lights_out(3)]
}

fn assert_keys_sorted(value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            let keys: Vec<&String> = map.keys().collect();
            let mut sorted = keys.clone();
            sorted.sort();
            assert_eq!(keys, sorted);
            map.values().for_each(assert_keys_sorted);
        }
        serde_json::Value::Array(items) => items.iter().for_each(assert_keys_sorted),
        _ => {}
    }
}

#[test]
fn domain_prefix_is_locked() {
    assert_eq!(DOMAIN_PROBLEM_MODEL, b"PLANSTATE::PROBLEM_MODEL::V1\0");
}

#[test]
fn digest_is_domain_separated_sha256_of_canonical_bytes() {
    for model in models() {
        let bytes = model.canonical_bytes().unwrap();
        let mut hasher = Sha256::new();
        hasher.update(b"PLANSTATE::PROBLEM_MODEL::V1\0");
        hasher.update(&bytes);
        let expected = format!("sha256:{}", hex::encode(hasher.finalize()));

        let digest = model.digest().unwrap();
        assert_eq!(digest.as_str(), expected);
        assert_eq!(digest.hex_digest().len(), 64);
        assert_eq!(ContentHash::parse(&expected), Some(digest));

        // Without the domain prefix the hash differs.
        let bare = hex::encode(Sha256::digest(&bytes));
        assert_ne!(format!("sha256:{bare}"), expected);
    }
}

#[test]
fn canonical_bytes_are_compact_sorted_json() {
    for model in models() {
        let bytes = model.canonical_bytes().unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(!text.contains(": ") && !text.contains(", ") && !text.contains('\n'));
        assert!(text.starts_with(r#"{"factoring":"#));

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_keys_sorted(&value);
        assert_eq!(
            value["operators"].as_array().unwrap().len(),
            model.num_operators()
        );
        assert_eq!(
            value["variables"].as_array().unwrap().len(),
            model.num_variables()
        );
    }
}

#[test]
fn factoring_is_part_of_the_content() {
    let factored = logistics(2, 3);
    let value: serde_json::Value =
        serde_json::from_slice(&factored.canonical_bytes().unwrap()).unwrap();
    assert_eq!(value["factoring"]["center"], serde_json::json!([0]));
    assert_eq!(value["factoring"]["leaves"], serde_json::json!([[1], [2]]));

    let plain = two_var_model();
    let value: serde_json::Value =
        serde_json::from_slice(&plain.canonical_bytes().unwrap()).unwrap();
    assert!(value["factoring"].is_null());
}

#[test]
fn distinct_models_have_distinct_digests() {
    let digests: Vec<ContentHash> = models().iter().map(|m| m.digest().unwrap()).collect();
    for (i, a) in digests.iter().enumerate() {
        for b in &digests[i + 1..] {
            assert_ne!(a, b);
        }
    }
}
