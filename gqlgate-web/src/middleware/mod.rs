pub mod cors;
pub mod request_id;

pub use cors::{cors_layer_with_config, CorsConfig};
pub use request_id::{request_id_middleware, request_id_of, RequestId, REQUEST_ID_HEADER};
