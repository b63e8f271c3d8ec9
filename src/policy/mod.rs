//! Pass/fail policy for key-check responses.

pub mod classify;
