//! `async-graphql` extensions installed on the gateway schema

mod depth_limit;
mod error_tracking;

pub use depth_limit::{measure_depths, DepthLimit, DepthWarning, FieldMatcher, OperationDepths};
pub use error_tracking::{will_send_response, ErrorTracking};
