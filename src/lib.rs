pub mod access;
pub mod cli;
pub mod config;
pub mod cutoff;
pub mod error;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{Result, SelectError};
