//! HTTP Routes

pub mod weather;
