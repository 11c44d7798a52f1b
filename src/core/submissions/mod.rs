// Core submissions module - the moderation lifecycle.

pub mod submission_models;
pub mod submission_service;

#[cfg(test)]
pub mod test_support;

pub use submission_models::*;
pub use submission_service::*;
