mod notification;
mod person;
mod provisioning;
mod result;

pub use notification::*;
pub use person::*;
pub use provisioning::*;
pub use result::*;
