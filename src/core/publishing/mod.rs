// Core publishing module - the scheduled release of approved submissions.

pub mod publish_scheduler;
pub mod publishing_models;

pub use publish_scheduler::*;
pub use publishing_models::*;
