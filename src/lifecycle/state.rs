use std::fmt;

/// Lifecycle state of the host process.
///
/// Moves forward only. `LibraryAttachFailed`, `SubsystemFailed` and
/// `Destroyed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// Orchestrator exists; startup not yet requested.
    Created,
    /// The subsystem library could not be attached.
    LibraryAttachFailed,
    /// Subsystem start requested, outcome pending.
    SubsystemStarting,
    /// Subsystem reported a successful start.
    SubsystemReady,
    /// Subsystem reported a failed start.
    SubsystemFailed,
    /// Teardown finished.
    Destroyed,
}

impl ProcessState {
    /// True for states with no outgoing transition.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProcessState::LibraryAttachFailed | ProcessState::SubsystemFailed | ProcessState::Destroyed
        )
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::*;

        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (Created, LibraryAttachFailed) => true,
            (Created | SubsystemStarting, SubsystemFailed) => true,
            (_, LibraryAttachFailed | SubsystemFailed) => false,
            (from, to) => to.rank() > from.rank(),
        }
    }

    fn rank(self) -> u8 {
        match self {
            ProcessState::Created => 0,
            ProcessState::SubsystemStarting => 1,
            ProcessState::SubsystemReady => 2,
            ProcessState::Destroyed => 3,
            ProcessState::LibraryAttachFailed | ProcessState::SubsystemFailed => u8::MAX,
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::Created => "created",
            ProcessState::LibraryAttachFailed => "library_attach_failed",
            ProcessState::SubsystemStarting => "subsystem_starting",
            ProcessState::SubsystemReady => "subsystem_ready",
            ProcessState::SubsystemFailed => "subsystem_failed",
            ProcessState::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::ProcessState::*;

    #[test]
    fn test_forward_only() {
        assert!(Created.can_transition_to(SubsystemStarting));
        assert!(SubsystemStarting.can_transition_to(SubsystemReady));
        assert!(SubsystemReady.can_transition_to(Destroyed));

        assert!(!SubsystemReady.can_transition_to(SubsystemStarting));
        assert!(!SubsystemReady.can_transition_to(SubsystemFailed));
        assert!(!SubsystemReady.can_transition_to(Created));
    }

    #[test]
    fn test_failures_are_sinks() {
        assert!(Created.can_transition_to(LibraryAttachFailed));
        assert!(SubsystemStarting.can_transition_to(SubsystemFailed));
        assert!(!SubsystemStarting.can_transition_to(LibraryAttachFailed));

        for next in [Created, SubsystemStarting, SubsystemReady, Destroyed] {
            assert!(!LibraryAttachFailed.can_transition_to(next));
            assert!(!SubsystemFailed.can_transition_to(next));
        }
    }
}
