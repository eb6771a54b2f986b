use serde_json::json;

use tributary_core::types::ExtractionSpec;
use tributary_exec::{extract_bindings, ExtractError};

fn spec(child: &str, address: serde_json::Value, key: &str, param: &str) -> ExtractionSpec {
    serde_json::from_value(json!({
        "targetChildId": child,
        "sourceAddress": address,
        "recordKey": key,
        "parameterName": param,
    }))
    .unwrap()
}

#[test]
fn three_records_yield_three_positional_bindings() {
    let payload = json!({"users": [{"id": 1}, {"id": 2}, {"id": 3}]});
    let specs = vec![spec("/users/{userID}", json!(["users"]), "id", "userID")];

    let bindings = extract_bindings(&payload, &specs).unwrap();
    let sets = &bindings["/users/{userID}"];
    assert_eq!(sets.len(), 3);
    assert_eq!(sets[0]["userID"], json!(1));
    assert_eq!(sets[1]["userID"], json!(2));
    assert_eq!(sets[2]["userID"], json!(3));
}

#[test]
fn same_source_address_pairs_positionally() {
    let payload = json!({"users": [
        {"id": 1, "region": "eu"},
        {"id": 2, "region": "us"}
    ]});
    let specs = vec![
        spec("/child", json!(["users"]), "id", "userID"),
        spec("/child", json!(["users"]), "region", "region"),
    ];

    let sets = extract_bindings(&payload, &specs).unwrap()["/child"].clone();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0]["userID"], json!(1));
    assert_eq!(sets[0]["region"], json!("eu"));
    assert_eq!(sets[1]["userID"], json!(2));
    assert_eq!(sets[1]["region"], json!("us"));
}

#[test]
fn different_source_addresses_combine_cartesian() {
    let payload = json!({
        "users": [{"id": 1}, {"id": 2}],
        "stores": [{"code": "a"}, {"code": "b"}, {"code": "c"}]
    });
    let specs = vec![
        spec("/child", json!(["users"]), "id", "userID"),
        spec("/child", json!(["stores"]), "code", "storeCode"),
    ];

    let sets = extract_bindings(&payload, &specs).unwrap()["/child"].clone();
    assert_eq!(sets.len(), 6);
    // Every (user, store) combination appears exactly once.
    for user in [1, 2] {
        for store in ["a", "b", "c"] {
            assert_eq!(
                sets.iter()
                    .filter(|s| s["userID"] == json!(user) && s["storeCode"] == json!(store))
                    .count(),
                1
            );
        }
    }
}

#[test]
fn specs_for_different_children_stay_separate() {
    let payload = json!({"users": [{"id": 1}], "orders": [{"ref": "x"}]});
    let specs = vec![
        spec("/users/{userID}", json!(["users"]), "id", "userID"),
        spec("/orders/{ref}", json!(["orders"]), "ref", "ref"),
    ];

    let bindings = extract_bindings(&payload, &specs).unwrap();
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings["/users/{userID}"].len(), 1);
    assert_eq!(bindings["/orders/{ref}"].len(), 1);
}

#[test]
fn empty_record_list_yields_no_bindings() {
    let payload = json!({"users": []});
    let specs = vec![spec("/child", json!(["users"]), "id", "userID")];
    let bindings = extract_bindings(&payload, &specs).unwrap();
    assert!(bindings["/child"].is_empty());
}

#[test]
fn non_list_source_is_a_type_error() {
    let payload = json!({"users": {"id": 1}});
    let specs = vec![spec("/child", json!(["users"]), "id", "userID")];
    let err = extract_bindings(&payload, &specs).unwrap_err();
    assert!(matches!(err, ExtractError::NotAList { .. }));
}

#[test]
fn missing_source_address_is_a_type_error() {
    let payload = json!({"other": []});
    let specs = vec![spec("/child", json!(["users"]), "id", "userID")];
    let err = extract_bindings(&payload, &specs).unwrap_err();
    assert!(matches!(err, ExtractError::NotAList { .. }));
}

#[test]
fn record_without_key_is_a_type_error() {
    let payload = json!({"users": [{"id": 1}, {"name": "no id"}]});
    let specs = vec![spec("/child", json!(["users"]), "id", "userID")];
    let err = extract_bindings(&payload, &specs).unwrap_err();
    match err {
        ExtractError::MissingRecordKey { index, key, .. } => {
            assert_eq!(index, 1);
            assert_eq!(key, "id");
        }
        other => panic!("expected MissingRecordKey, got {other:?}"),
    }
}

#[test]
fn non_scalar_parameter_value_is_a_type_error() {
    let payload = json!({"users": [{"id": {"nested": true}}]});
    let specs = vec![spec("/child", json!(["users"]), "id", "userID")];
    let err = extract_bindings(&payload, &specs).unwrap_err();
    assert!(matches!(err, ExtractError::NonScalar { .. }));
}
