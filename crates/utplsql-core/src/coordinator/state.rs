use std::fmt;

use serde::Serialize;

/// Lifecycle of one run.
///
/// `Idle → Connected → Mapped → Reporting → Running → Draining → Closed`,
/// with `Failed` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Connected,
    Mapped,
    Reporting,
    Running,
    Draining,
    Closed,
    Failed,
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Connected => "connected",
            RunState::Mapped => "mapped",
            RunState::Reporting => "reporting",
            RunState::Running => "running",
            RunState::Draining => "draining",
            RunState::Closed => "closed",
            RunState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Closed | RunState::Failed)
    }

    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Idle, Connected)
            | (Connected, Mapped)
            | (Mapped, Reporting)
            | (Reporting, Running)
            | (Running, Draining)
            | (Draining, Closed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_linear() {
        let path = [
            RunState::Idle,
            RunState::Connected,
            RunState::Mapped,
            RunState::Reporting,
            RunState::Running,
            RunState::Draining,
            RunState::Closed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(!RunState::Connected.can_transition_to(RunState::Running));
        assert!(!RunState::Running.can_transition_to(RunState::Closed));
    }

    #[test]
    fn test_failed_is_reachable_until_terminal() {
        assert!(RunState::Idle.can_transition_to(RunState::Failed));
        assert!(RunState::Draining.can_transition_to(RunState::Failed));
        assert!(!RunState::Closed.can_transition_to(RunState::Failed));
        assert!(!RunState::Failed.can_transition_to(RunState::Failed));
    }
}
