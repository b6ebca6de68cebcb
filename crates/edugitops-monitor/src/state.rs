//! Progress of a monitoring sync run.

use std::fmt;

/// The four phases, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// Delete HTTP rules, TCP rules and the monitored host.
    Wipe,
    /// Create the monitored host again.
    RecreateHost,
    /// Create one rule per student app.
    CreateRules,
    /// Activate pending changes.
    Activate,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wipe => f.write_str("wipe"),
            Self::RecreateHost => f.write_str("host recreation"),
            Self::CreateRules => f.write_str("rule creation"),
            Self::Activate => f.write_str("activation"),
        }
    }
}

/// `Idle → Wiping → HostRecreated → RuleBatch(n) → Activated → Done`, or
/// `Failed` from any non-terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Nothing has run yet.
    Idle,
    /// Phase 1 in progress.
    Wiping,
    /// Phase 2 finished.
    HostRecreated,
    /// `n` rules created so far.
    RuleBatch(usize),
    /// Phase 4 finished.
    Activated,
    /// Run complete.
    Done,
    /// A command failed; nothing after it ran.
    Failed {
        /// Phase of the failing command.
        step: Step,
        /// Program path.
        command: String,
        /// Exit status.
        exit_code: i32,
    },
}

impl RunState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Done | Self::Failed { .. }, _) => false,
            (_, Self::Failed { .. })
            | (Self::Idle, Self::Wiping)
            | (Self::Wiping, Self::HostRecreated)
            | (Self::HostRecreated | Self::RuleBatch(_), Self::Activated)
            | (Self::Activated, Self::Done)
            | (Self::HostRecreated, Self::RuleBatch(1)) => true,
            (Self::RuleBatch(n), Self::RuleBatch(m)) => *m == n + 1,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Wiping => f.write_str("wiping"),
            Self::HostRecreated => f.write_str("host recreated"),
            Self::RuleBatch(n) => write!(f, "rule batch ({n})"),
            Self::Activated => f.write_str("activated"),
            Self::Done => f.write_str("done"),
            Self::Failed {
                step, exit_code, ..
            } => write!(f, "failed during {step} (exit {exit_code})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let path = [
            RunState::Idle,
            RunState::Wiping,
            RunState::HostRecreated,
            RunState::RuleBatch(1),
            RunState::RuleBatch(2),
            RunState::Activated,
            RunState::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn empty_batch_may_skip_to_activation() {
        assert!(RunState::HostRecreated.can_advance_to(&RunState::Activated));
    }

    #[test]
    fn illegal_transitions() {
        assert!(!RunState::Idle.can_advance_to(&RunState::HostRecreated));
        assert!(!RunState::RuleBatch(1).can_advance_to(&RunState::RuleBatch(3)));
        assert!(!RunState::Done.can_advance_to(&RunState::Wiping));
        let failed = RunState::Failed {
            step: Step::Wipe,
            command: "x".into(),
            exit_code: 1,
        };
        assert!(failed.is_terminal());
        assert!(!failed.can_advance_to(&RunState::Done));
    }

    #[test]
    fn failure_is_reachable_from_running_states() {
        let failed = RunState::Failed {
            step: Step::CreateRules,
            command: "x".into(),
            exit_code: 2,
        };
        assert!(RunState::RuleBatch(4).can_advance_to(&failed));
        assert_eq!(failed.to_string(), "failed during rule creation (exit 2)");
    }
}
