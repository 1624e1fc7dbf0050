pub mod chat;
pub mod cli;
pub mod companion;
pub mod config;
pub mod correlate;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod page;
pub mod products;
pub mod prompt;
pub mod response;
pub mod session;

pub use error::{PagemateError, Result};
