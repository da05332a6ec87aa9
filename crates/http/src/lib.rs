pub mod error;
pub mod request;
pub mod routing;

// Re-export key types for convenience
pub use error::HttpError;
pub use request::{bind_arguments, RequestParts};
pub use routing::{HttpMethod, ParamBinding, RouteRegistry, RouteSpec};
