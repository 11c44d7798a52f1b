// Who may run moderation commands.

use std::collections::BTreeSet;

/// Discord user ids allowed to moderate. An empty list lets everyone in.
#[derive(Debug, Clone, Default)]
pub struct ModeratorAllowList {
    ids: BTreeSet<u64>,
}

impl ModeratorAllowList {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn permits(&self, user_id: u64) -> bool {
        self.ids.is_empty() || self.ids.contains(&user_id)
    }

    /// Comma-separated ids for the startup log, or `<none>`.
    pub fn describe(&self) -> String {
        if self.ids.is_empty() {
            return "<none>".to_string();
        }
        self.ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}
