//! Message bus backends.
//!
//! Delivery is at-most-once: nothing is acknowledged, buffered or retried.
mod error;
mod redis;

pub use error::{Error, Result};
pub use redis::RedisBus;
