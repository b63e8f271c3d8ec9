//! Concurrent dispatch of key-check requests.

pub mod pool;
