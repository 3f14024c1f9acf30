//! Key resolver: plain targets, structured tuples and deterministic
//! serialization.

use serde_json::{Map, Value, json};

use cachet_client::{Kind, QueryKey};

#[test]
fn plain_target_is_both_cache_key_and_target() {
    let resolved = QueryKey::from("/users/1").resolve().expect("resolves");
    assert_eq!(resolved.cache_key, "/users/1");
    assert_eq!(resolved.target, "/users/1");
}

#[test]
fn tuple_head_becomes_target_and_whole_tuple_becomes_cache_key() {
    let key = QueryKey::Tuple(vec![json!("/users"), json!(42), json!({"page": 2})]);
    let resolved = key.resolve().expect("resolves");
    assert_eq!(resolved.target, "/users");
    assert_eq!(resolved.cache_key, r#"["/users",42,{"page":2}]"#);
}

#[test]
fn structurally_equal_tuples_share_a_cache_key() {
    // Same map built in two insertion orders.
    let mut forward = Map::new();
    forward.insert("a".into(), json!(1));
    forward.insert("b".into(), json!(2));

    let mut backward = Map::new();
    backward.insert("b".into(), json!(2));
    backward.insert("a".into(), json!(1));

    let first = QueryKey::Tuple(vec![json!("/search"), Value::Object(forward)])
        .resolve()
        .expect("resolves");
    let second = QueryKey::Tuple(vec![json!("/search"), Value::Object(backward)])
        .resolve()
        .expect("resolves");

    assert_eq!(first.cache_key, second.cache_key);
}

#[test]
fn distinct_discriminators_produce_distinct_cache_keys() {
    let page_one = QueryKey::Tuple(vec![json!("/users"), json!(1)])
        .resolve()
        .expect("resolves");
    let page_two = QueryKey::Tuple(vec![json!("/users"), json!(2)])
        .resolve()
        .expect("resolves");

    assert_eq!(page_one.target, page_two.target);
    assert_ne!(page_one.cache_key, page_two.cache_key);
}

#[test]
fn empty_tuple_is_a_builder_error() {
    let err = QueryKey::Tuple(vec![]).resolve().expect_err("rejected");
    assert_eq!(err.kind(), Kind::Builder);
}

#[test]
fn non_string_head_is_a_builder_error() {
    let err = QueryKey::Tuple(vec![json!(42), json!("/users")])
        .resolve()
        .expect_err("rejected");
    assert_eq!(err.kind(), Kind::Builder);
}
