//! Command implementations for the pagemate CLI

mod ask;
mod config;
mod inspect;

pub use ask::*;
pub use config::*;
pub use inspect::*;
