//! HTTP protocol layer module
//!
//! Protocol helpers shared by the router, the middleware and the file
//! server, decoupled from any particular route.

pub mod conditional;
pub mod mime;
pub mod path;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, RangeParseResult};
pub use response::{
    build_304_response, build_400_response, build_404_response, build_416_response,
    build_error_response, build_preflight_response, build_redirect_response, empty, full, Body,
};
