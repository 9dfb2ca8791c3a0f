/// Lifecycle state of a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityState {
    /// Matched (or created) in the current frame
    #[default]
    Live,
    /// Unmatched this frame but still in the active set
    Missing,
    /// Moved to short-term memory, eligible for recovery
    Memory,
}

impl EntityState {
    /// Label used in the status export.
    pub fn status_label(self) -> &'static str {
        match self {
            EntityState::Live => "LIVE",
            EntityState::Missing | EntityState::Memory => "MEMORY",
        }
    }
}
