mod backend;
mod change_feed;
mod client;
mod config;
mod memory;

pub use backend::*;
pub use change_feed::*;
pub use client::*;
pub use config::*;
pub use memory::*;
