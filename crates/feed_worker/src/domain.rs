mod forwarder;
mod notification_converter;
mod process;

pub use forwarder::*;
pub use notification_converter::*;
pub use process::*;
