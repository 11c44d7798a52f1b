// Discord moderation - the moderator allow-list and the review commands.

pub mod access;
pub mod commands;

pub use access::ModeratorAllowList;
