mod error;
mod person_handler;
mod provisioning_handler;
mod server;

pub use error::*;
pub use server::*;
