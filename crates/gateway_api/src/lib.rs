pub mod domain;
pub mod gateway_api;
pub mod http;

pub use domain::*;
pub use gateway_api::*;
pub use http::*;
