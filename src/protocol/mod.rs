//! Wire models for the generative-language API.

pub mod models;
