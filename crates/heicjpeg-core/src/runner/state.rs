/// Runner state machine.
///
/// ```text
/// Idle ─┬─ Scanning ─ Locating ─ Processing ─┬─ Completed
///       │                                    ├─ Cancelled
///       └─ Processing (single) ──────────────┴─ Failed
/// ```
///
/// Per-item failures never leave `Processing`. A single-file request with
/// the wrong extension ends in `Rejected` before anything is touched.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Scanning,
    Locating,
    Processing,
    Completed,
    Cancelled,
    Rejected,
    Failed,
}

impl RunState {
    /// A run is in flight; new start requests are refused.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Scanning | Self::Locating | Self::Processing)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Rejected | Self::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_and_terminal_are_disjoint() {
        let all = [
            RunState::Idle,
            RunState::Scanning,
            RunState::Locating,
            RunState::Processing,
            RunState::Completed,
            RunState::Cancelled,
            RunState::Rejected,
            RunState::Failed,
        ];
        for s in all {
            assert!(!(s.is_active() && s.is_terminal()), "{s:?}");
        }
        assert!(!RunState::Idle.is_active());
        assert!(!RunState::Idle.is_terminal());
    }
}
