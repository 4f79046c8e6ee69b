// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod config;
pub mod encoder;
pub mod error;
pub mod generator;
pub mod loader;
pub mod pipeline;
pub mod progress;
pub mod schema;
pub mod verify;
pub mod writer;

pub use error::{EncodeError, SeedError};
