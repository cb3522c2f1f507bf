mod common;
mod resource;

pub use common::common_routes_with_ready;
pub use resource::{api_router, resource_routes};
