use serde_json::Value;

/// Terminal output of one resolved fetch node, handed to the downstream
/// converter. The payload is raw JSON; coercion against a [`TableSchema`]
/// is the converter's call (see [`crate::coerce`]).
///
/// [`TableSchema`]: crate::coerce::TableSchema
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EmittedRecord {
    #[serde(rename = "targetTable")]
    pub target_table: String,

    pub payload: Value,

    #[serde(rename = "subRecords", skip_serializing_if = "Vec::is_empty")]
    pub sub_records: Vec<SubRecord>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SubRecord {
    #[serde(rename = "targetTable")]
    pub target_table: String,

    pub payload: Value,
}
