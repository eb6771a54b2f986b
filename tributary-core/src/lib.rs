#![forbid(unsafe_code)]

pub mod address;
pub mod coerce;
pub mod error;
pub mod parser;
pub mod types;
pub mod validate;

pub use crate::address::{resolve_address, Address, AddressError, AddressKey};
pub use crate::coerce::{
    coerce, coerce_record, response_schema, CoerceError, SchemaError, SchemaItems, SchemaProperty,
    SqlItem, SqlType, SqlValue, TableSchema,
};
pub use crate::error::{ParseError, PlanError, ValidationError, Violation};
pub use crate::parser::{parse_plan_str, ParsedPlan, PlanFormat};
pub use crate::types::IntegrationPlan;
pub use crate::validate::validate_plan;
