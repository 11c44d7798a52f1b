// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "submissions/mod.rs"]
pub mod submissions;

#[path = "publishing/mod.rs"]
pub mod publishing;
