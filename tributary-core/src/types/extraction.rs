use crate::address::Address;

/// Bridges a parent response to one parameter of one dependent call.
///
/// `source_address` must resolve to a list of homogeneous records inside the
/// parent payload; `record_key` is read from every record and the values are
/// bound to `parameter_name` on the child identified by `target_child_id`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExtractionSpec {
    #[serde(rename = "targetChildId")]
    pub target_child_id: String,

    #[serde(rename = "sourceAddress")]
    pub source_address: Address,

    #[serde(rename = "recordKey")]
    pub record_key: String,

    #[serde(rename = "parameterName")]
    pub parameter_name: String,
}

/// Promotes a nested structure of a node's payload to its own record and
/// target table. `id_property` addresses the parent payload; its value is
/// copied into the sub-payload so the downstream converter can join back.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SubtableSpec {
    pub address: Address,

    #[serde(rename = "targetTable")]
    pub target_table: String,

    #[serde(rename = "idProperty")]
    pub id_property: Address,
}
