mod extraction;
mod node;
mod plan;
mod record;

pub use extraction::{ExtractionSpec, SubtableSpec};
pub use node::{path_placeholders, FetchNode, HttpMethod, RequestTemplate};
pub use plan::IntegrationPlan;
pub use record::{EmittedRecord, SubRecord};
