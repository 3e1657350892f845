//! Access policy
//!
//! Decides which commands a server instance accepts based on its role.

use crate::config::Role;
use crate::protocol::Command;

/// Role-based command gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    role: Role,
}

impl AccessPolicy {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    /// Whether this instance may execute `command`
    ///
    /// Primaries accept everything. Replicas only serve reads: GET, PING
    /// and LIST_SNAPSHOTS.
    pub fn permits(&self, command: &Command) -> bool {
        match self.role {
            Role::Primary => true,
            Role::Replica => !command.command_type().is_write(),
        }
    }

    /// Role this policy enforces
    pub fn role(&self) -> Role {
        self.role
    }
}
