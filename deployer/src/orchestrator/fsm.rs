//! Finite state machines for the orchestrator runs
//!
//! Both machines are strictly linear: each state has at most one
//! successor, advancing past the terminal state is an error, and any
//! step failure abandons the machine where it stands (fail-fast, no
//! rollback).

/// Bootstrap run states, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Detecting OS identity and privileges
    Probing,

    /// Installing prerequisite packages
    InstallingPrereqs,

    /// Installing the container runtime
    InstallingRuntime,

    /// Verifying the runtime responds
    VerifyingRuntime,

    /// Establishing or updating the working copy
    SyncingSource,

    /// Ensuring the deploy key pair
    ProvisioningCredentials,

    /// Building and starting the container set
    BuildingAndStarting,

    /// Printing the post-condition summary
    Reporting,
}

impl BootstrapState {
    /// The unique successor state, if any
    pub fn next(self) -> Option<Self> {
        use BootstrapState::*;
        match self {
            Probing => Some(InstallingPrereqs),
            InstallingPrereqs => Some(InstallingRuntime),
            InstallingRuntime => Some(VerifyingRuntime),
            VerifyingRuntime => Some(SyncingSource),
            SyncingSource => Some(ProvisioningCredentials),
            ProvisioningCredentials => Some(BuildingAndStarting),
            BuildingAndStarting => Some(Reporting),
            Reporting => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        use BootstrapState::*;
        match self {
            Probing => "probing",
            InstallingPrereqs => "installing prerequisites",
            InstallingRuntime => "installing runtime",
            VerifyingRuntime => "verifying runtime",
            SyncingSource => "syncing source",
            ProvisioningCredentials => "provisioning credentials",
            BuildingAndStarting => "building and starting",
            Reporting => "reporting",
        }
    }
}

/// Bootstrap FSM
#[derive(Debug, Clone)]
pub struct BootstrapFsm {
    state: BootstrapState,
}

impl BootstrapFsm {
    /// Create a new FSM in the probing state
    pub fn new() -> Self {
        Self {
            state: BootstrapState::Probing,
        }
    }

    /// Get current state
    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Advance to the successor state
    pub fn advance(&mut self) -> Result<BootstrapState, String> {
        match self.state.next() {
            Some(next) => {
                self.state = next;
                Ok(next)
            }
            None => Err(format!(
                "no transition out of terminal state '{}'",
                self.state.as_str()
            )),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.next().is_none()
    }
}

impl Default for BootstrapFsm {
    fn default() -> Self {
        Self::new()
    }
}

/// Update run states, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    /// Fast-forwarding the working copy
    SyncingSource,

    /// Rebuilding and restarting the container set
    BuildingAndStarting,

    /// Removing dangling artifacts
    Pruning,

    /// Run complete
    Done,
}

impl UpdateState {
    /// The unique successor state, if any
    pub fn next(self) -> Option<Self> {
        use UpdateState::*;
        match self {
            SyncingSource => Some(BuildingAndStarting),
            BuildingAndStarting => Some(Pruning),
            Pruning => Some(Done),
            Done => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        use UpdateState::*;
        match self {
            SyncingSource => "syncing source",
            BuildingAndStarting => "building and starting",
            Pruning => "pruning",
            Done => "done",
        }
    }
}

/// Update FSM
#[derive(Debug, Clone)]
pub struct UpdateFsm {
    state: UpdateState,
}

impl UpdateFsm {
    /// Create a new FSM in the syncing state
    pub fn new() -> Self {
        Self {
            state: UpdateState::SyncingSource,
        }
    }

    /// Get current state
    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Advance to the successor state
    pub fn advance(&mut self) -> Result<UpdateState, String> {
        match self.state.next() {
            Some(next) => {
                self.state = next;
                Ok(next)
            }
            None => Err(format!(
                "no transition out of terminal state '{}'",
                self.state.as_str()
            )),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.next().is_none()
    }
}

impl Default for UpdateFsm {
    fn default() -> Self {
        Self::new()
    }
}
