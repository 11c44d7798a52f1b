// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "submissions/sqlite_store.rs"]
pub mod submissions;
