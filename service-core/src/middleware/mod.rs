pub mod cross_origin;
pub mod request_id;

pub use cross_origin::{cross_origin_middleware, preflight_response};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
