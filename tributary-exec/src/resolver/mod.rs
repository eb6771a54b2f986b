mod engine;
mod error;
mod expand;
mod extract;
mod request;
mod subtable;
mod types;

pub use engine::Resolver;
pub use error::{ExtractError, ResolveError};
pub use expand::{instantiate, FetchTask, ParamSet};
pub use extract::extract_bindings;
pub use request::{build_url, merge_headers};
pub use subtable::subtable_records;
pub use types::ResolverConfig;
