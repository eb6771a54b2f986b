use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

use tributary_core::{
    coerce, coerce_record, response_schema, CoerceError, SqlType, SqlValue, TableSchema,
};

fn schema(value: serde_json::Value) -> TableSchema {
    serde_json::from_value(value).unwrap()
}

fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

#[test]
fn bounded_string_gets_varchar_n() {
    let schema = schema(json!({"name": {"type": "string", "maxLength": 255}}));
    let item = coerce(&schema, "name", &json!("Ada")).unwrap();
    assert_eq!(item.sql_type, SqlType::Varchar(Some(255)));
    assert_eq!(item.sql_type.to_string(), "VARCHAR(255)");
    assert_eq!(item.value, SqlValue::Text("Ada".to_string()));
    // Rendered literal is quoted Unicode.
    assert_eq!(item.value.to_string(), "N'Ada'");
}

#[test]
fn quoted_literal_doubles_embedded_quotes() {
    let schema = schema(json!({"name": {"type": "string"}}));
    let item = coerce(&schema, "name", &json!("O'Brien")).unwrap();
    assert_eq!(item.value.to_string(), "N'O''Brien'");
    assert_eq!(item.sql_type.to_string(), "VARCHAR(MAX)");
}

#[test]
fn max_length_wins_over_date_pattern() {
    // Rule order: a bounded string with a date pattern is a bounded string.
    let schema = schema(json!({
        "updated": {"type": "string", "maxLength": 10, "pattern": "%Y-%m-%d", "format": "date"}
    }));
    let item = coerce(&schema, "updated", &json!("2024-05-01")).unwrap();
    assert_eq!(item.sql_type, SqlType::Varchar(Some(10)));
    assert_eq!(item.value, SqlValue::Text("2024-05-01".to_string()));
}

#[test]
fn date_pattern_parses_to_datetime() {
    let schema = schema(json!({
        "updated": {"type": "string", "pattern": "%Y-%m-%d", "format": "date"}
    }));
    let item = coerce(&schema, "updated", &json!("2024-05-01")).unwrap();
    assert_eq!(item.sql_type, SqlType::DateTime);
    assert_eq!(item.value, SqlValue::DateTime(midnight(2024, 5, 1)));
}

#[test]
fn date_pattern_with_time_component() {
    let schema = schema(json!({
        "seen": {"type": "string", "pattern": "%d/%m/%Y %H:%M", "format": "date"}
    }));
    let item = coerce(&schema, "seen", &json!("01/05/2024 13:45")).unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(13, 45, 0).unwrap();
    assert_eq!(item.value, SqlValue::DateTime(expected));
}

#[test]
fn unparsable_date_is_an_error() {
    let schema = schema(json!({
        "updated": {"type": "string", "pattern": "%Y-%m-%d", "format": "date"}
    }));
    let err = coerce(&schema, "updated", &json!("May 1st")).unwrap_err();
    assert!(matches!(err, CoerceError::DateParse { .. }));
}

#[test]
fn date_time_format_accepts_rfc3339() {
    let schema = schema(json!({"created": {"type": "string", "format": "date-time"}}));
    let item = coerce(&schema, "created", &json!("2024-05-01T13:45:30Z")).unwrap();
    assert_eq!(item.sql_type, SqlType::DateTime);
    let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(13, 45, 30).unwrap();
    assert_eq!(item.value, SqlValue::DateTime(expected));
}

#[test]
fn date_time_format_tolerates_missing_offset() {
    let schema = schema(json!({"created": {"type": "string", "format": "date-time"}}));
    let item = coerce(&schema, "created", &json!("2024-05-01T13:45:30")).unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(13, 45, 30).unwrap();
    assert_eq!(item.value, SqlValue::DateTime(expected));
}

#[test]
fn boolean_maps_to_bit() {
    let schema = schema(json!({"active": {"type": "boolean"}}));
    let item = coerce(&schema, "active", &json!(true)).unwrap();
    assert_eq!(item.sql_type, SqlType::Bit);
    assert_eq!(item.value, SqlValue::Bit(true));
    assert_eq!(item.value.to_string(), "1");

    let item = coerce(&schema, "active", &json!(false)).unwrap();
    assert_eq!(item.value.to_string(), "0");
}

#[test]
fn int32_accepts_numeric_and_string_input() {
    let schema = schema(json!({"count": {"type": "number", "format": "int32"}}));

    let from_number = coerce(&schema, "count", &json!(42)).unwrap();
    assert_eq!(from_number.sql_type, SqlType::Int);
    assert_eq!(from_number.sql_type.to_string(), "INT");
    assert_eq!(from_number.value, SqlValue::Int(42));

    let from_string = coerce(&schema, "count", &json!("42")).unwrap();
    assert_eq!(from_string.sql_type, SqlType::Int);
    assert_eq!(from_string.value, SqlValue::Int(42));
}

#[test]
fn int64_maps_to_bigint() {
    let schema = schema(json!({"total": {"type": "number", "format": "int64"}}));
    let item = coerce(&schema, "total", &json!(9_000_000_000_i64)).unwrap();
    assert_eq!(item.sql_type, SqlType::BigInt);
    assert_eq!(item.value, SqlValue::Int(9_000_000_000));
}

#[test]
fn plain_number_maps_to_float() {
    let schema = schema(json!({"price": {"type": "number"}}));
    let item = coerce(&schema, "price", &json!(19.95)).unwrap();
    assert_eq!(item.sql_type, SqlType::Float);
    assert_eq!(item.value, SqlValue::Float(19.95));
}

#[test]
fn unknown_number_format_passes_through() {
    let schema = schema(json!({"balance": {"type": "number", "format": "money"}}));
    let item = coerce(&schema, "balance", &json!("12.50")).unwrap();
    assert_eq!(item.sql_type, SqlType::Other("money".to_string()));
    assert_eq!(item.sql_type.to_string(), "money");
    assert_eq!(item.value, SqlValue::Raw(json!("12.50")));
}

#[test]
fn scalar_array_stringifies_to_varchar_max() {
    let string_schema = schema(json!({"tags": {"type": "array", "items": {"type": "string"}}}));
    let item = coerce(&string_schema, "tags", &json!(["a", "b"])).unwrap();
    assert_eq!(item.sql_type, SqlType::Varchar(None));
    assert_eq!(item.value, SqlValue::Text(r#"["a","b"]"#.to_string()));

    let number_schema = schema(json!({"ids": {"type": "array", "items": {"type": "number"}}}));
    let item = coerce(&number_schema, "ids", &json!([1, 2, 3])).unwrap();
    assert_eq!(item.value, SqlValue::Text("[1,2,3]".to_string()));
}

#[test]
fn null_keeps_the_schema_derived_type() {
    let schema = schema(json!({
        "count": {"type": "number", "format": "int32"},
        "name": {"type": "string", "maxLength": 40},
        "seen": {"type": "string", "pattern": "%Y-%m-%d", "format": "date"}
    }));

    let item = coerce(&schema, "count", &serde_json::Value::Null).unwrap();
    assert_eq!(item.value, SqlValue::Null);
    assert_eq!(item.sql_type, SqlType::Int);
    assert_eq!(item.value.to_string(), "NULL");

    let item = coerce(&schema, "name", &serde_json::Value::Null).unwrap();
    assert_eq!(item.value, SqlValue::Null);
    assert_eq!(item.sql_type, SqlType::Varchar(Some(40)));

    let item = coerce(&schema, "seen", &serde_json::Value::Null).unwrap();
    assert_eq!(item.value, SqlValue::Null);
    assert_eq!(item.sql_type, SqlType::DateTime);
}

#[test]
fn unknown_property_is_rejected() {
    let schema = schema(json!({"name": {"type": "string"}}));
    let err = coerce(&schema, "missing", &json!("x")).unwrap_err();
    assert!(matches!(err, CoerceError::PropertyNotInSchema { .. }));
}

#[test]
fn object_type_is_unhandled() {
    let schema = schema(json!({"meta": {"type": "object"}}));
    let err = coerce(&schema, "meta", &json!({"a": 1})).unwrap_err();
    match err {
        CoerceError::UnhandledSchemaType { property, kind, .. } => {
            assert_eq!(property, "meta");
            assert_eq!(kind.as_deref(), Some("object"));
        }
        other => panic!("expected UnhandledSchemaType, got {other:?}"),
    }
}

#[test]
fn array_of_objects_is_unhandled() {
    let schema = schema(json!({"rows": {"type": "array", "items": {"type": "object"}}}));
    let err = coerce(&schema, "rows", &json!([{}])).unwrap_err();
    assert!(matches!(err, CoerceError::UnhandledSchemaType { .. }));
}

#[test]
fn integral_float_coerces_but_huge_magnitudes_are_rejected() {
    let int32_schema = schema(json!({"count": {"type": "number", "format": "int32"}}));
    let item = coerce(&int32_schema, "count", &json!(3.0)).unwrap();
    assert_eq!(item.value, SqlValue::Int(3));

    // Beyond 2^53 an f64 no longer holds exact integers.
    let err = coerce(&int32_schema, "count", &json!(1e300)).unwrap_err();
    assert!(matches!(err, CoerceError::ValueMismatch { .. }));

    let int64_schema = schema(json!({"total": {"type": "number", "format": "int64"}}));
    let err = coerce(&int64_schema, "total", &json!(1e300)).unwrap_err();
    assert!(matches!(err, CoerceError::ValueMismatch { .. }));
}

#[test]
fn non_integral_value_for_int32_is_a_mismatch() {
    let schema = schema(json!({"count": {"type": "number", "format": "int32"}}));
    let err = coerce(&schema, "count", &json!("not-a-number")).unwrap_err();
    assert!(matches!(err, CoerceError::ValueMismatch { .. }));
}

#[test]
fn coerce_record_types_every_field() {
    let schema = schema(json!({
        "id": {"type": "number", "format": "int64"},
        "name": {"type": "string", "maxLength": 100},
        "active": {"type": "boolean"}
    }));
    let payload = json!({"id": 12, "name": "Ada", "active": true});
    let row = coerce_record(&schema, &payload).unwrap();
    assert_eq!(row["id"].sql_type, SqlType::BigInt);
    assert_eq!(row["name"].sql_type, SqlType::Varchar(Some(100)));
    assert_eq!(row["active"].value, SqlValue::Bit(true));
}

#[test]
fn coerce_record_rejects_non_object_payloads() {
    let schema = schema(json!({"id": {"type": "string"}}));
    let err = coerce_record(&schema, &json!([1, 2])).unwrap_err();
    assert!(matches!(err, CoerceError::NotARecord { .. }));
}

#[test]
fn response_schema_walks_an_openapi_document() {
    let openapi = json!({
        "paths": {
            "/users": {
                "get": {
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "properties": {
                                            "id": {"type": "number", "format": "int32"},
                                            "name": {"type": "string", "maxLength": 80}
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    });
    let schema = response_schema(&openapi, "/users").unwrap();
    assert_eq!(schema["id"].format.as_deref(), Some("int32"));
    assert_eq!(schema["name"].max_length, Some(80));
}

#[test]
fn response_schema_reports_missing_paths() {
    let openapi = json!({"paths": {}});
    assert!(response_schema(&openapi, "/users").is_err());
}
