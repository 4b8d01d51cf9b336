pub mod domain;
pub mod feed_worker;
pub mod http;

pub use domain::*;
pub use feed_worker::*;
pub use http::*;
