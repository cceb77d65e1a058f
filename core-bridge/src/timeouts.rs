//! Per-operation time budgets.

use bridge_traits::CapabilityKind;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Upper bound accepted for the command class.
pub const MAX_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Budget classes. Each [`CapabilityKind`] belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    Metadata,
    Content,
    Search,
    Command,
}

impl OperationClass {
    pub fn of(kind: CapabilityKind) -> Self {
        use CapabilityKind::*;
        match kind {
            ListDirectory | GitHubAuthStatus | GitHubAuthDisconnect | GitHubMe
            | GitHubPrStatus => OperationClass::Metadata,
            CreateDirectory | ReadFile | ReadFileBinary | WriteFile | DeletePath | RenamePath
            | GitHubAuthStart | GitHubAuthComplete | GitHubPrCreate | GitHubPrMerge
            | GitHubPrReady => OperationClass::Content,
            SearchFiles => OperationClass::Search,
            ExecCommands => OperationClass::Command,
        }
    }
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationClass::Metadata => f.write_str("metadata"),
            OperationClass::Content => f.write_str("content"),
            OperationClass::Search => f.write_str("search"),
            OperationClass::Command => f.write_str("command"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeoutPolicyError {
    #[error("{0} timeout must be greater than zero")]
    ZeroBudget(OperationClass),

    #[error("command timeout of {0:?} exceeds the maximum of 300s")]
    CommandBudgetTooLong(Duration),
}

/// Timeout budgets, one per [`OperationClass`].
///
/// Defaults: metadata 10 s, content 15 s, search 15 s, command 120 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub metadata: Duration,
    pub content: Duration,
    pub search: Duration,
    pub command: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            metadata: Duration::from_secs(10),
            content: Duration::from_secs(15),
            search: Duration::from_secs(15),
            command: Duration::from_secs(120),
        }
    }
}

impl TimeoutPolicy {
    pub fn for_class(&self, class: OperationClass) -> Duration {
        match class {
            OperationClass::Metadata => self.metadata,
            OperationClass::Content => self.content,
            OperationClass::Search => self.search,
            OperationClass::Command => self.command,
        }
    }

    pub fn for_kind(&self, kind: CapabilityKind) -> Duration {
        self.for_class(OperationClass::of(kind))
    }

    pub fn with_class(mut self, class: OperationClass, budget: Duration) -> Self {
        match class {
            OperationClass::Metadata => self.metadata = budget,
            OperationClass::Content => self.content = budget,
            OperationClass::Search => self.search = budget,
            OperationClass::Command => self.command = budget,
        }
        self
    }

    pub fn validate(&self) -> Result<(), TimeoutPolicyError> {
        for class in [
            OperationClass::Metadata,
            OperationClass::Content,
            OperationClass::Search,
            OperationClass::Command,
        ] {
            if self.for_class(class).is_zero() {
                return Err(TimeoutPolicyError::ZeroBudget(class));
            }
        }

        if self.command > MAX_COMMAND_TIMEOUT {
            return Err(TimeoutPolicyError::CommandBudgetTooLong(self.command));
        }

        Ok(())
    }
}
