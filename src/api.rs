//! Panel-facing API implementations

pub mod json;
