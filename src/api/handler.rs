//! Request handler
//!
//! Turns one decoded command into one response.

use std::path::Path;
use std::sync::Arc;

use crate::engine::Engine;
use crate::error::EmberError;
use crate::protocol::{Command, Response};
use crate::snapshot;
use crate::store::SetOutcome;

use super::AccessPolicy;

/// Executes commands against the engine on behalf of a connection
///
/// Cheap to clone; every connection worker holds one.
#[derive(Clone)]
pub struct RequestHandler {
    /// Shared storage engine
    engine: Arc<Engine>,

    /// Role gate
    policy: AccessPolicy,

    /// Max combined key + value size for SET/UPDATE
    max_item_size: usize,
}

impl RequestHandler {
    /// Build a handler using the engine's configured role and size limit
    pub fn new(engine: Arc<Engine>) -> Self {
        let policy = AccessPolicy::new(engine.config().role);
        let max_item_size = engine.config().max_item_size;
        Self {
            engine,
            policy,
            max_item_size,
        }
    }

    /// Check, validate and execute a command
    pub fn handle(&self, command: Command) -> Response {
        let kind = command.command_type();

        if !self.policy.permits(&command) {
            tracing::debug!("Rejected {} on {} instance", kind.name(), self.policy.role());
            return Response::forbidden(&format!(
                "{} is not allowed on a {} instance",
                kind.name(),
                self.policy.role()
            ));
        }

        if let Err(reason) = self.validate(&command) {
            return Response::bad_request(&reason);
        }

        match self.execute(command) {
            Ok(response) => response,
            Err(EmberError::KeyNotFound) | Err(EmberError::SnapshotNotFound(_)) => {
                Response::not_found()
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", kind.name(), e);
                Response::error(&e.to_string())
            }
        }
    }

    /// Reject requests the engine assumes were already checked
    fn validate(&self, command: &Command) -> std::result::Result<(), String> {
        match command {
            Command::Set { key, value } | Command::Update { key, value } => {
                if key.is_empty() {
                    return Err("Key cannot be empty".to_string());
                }
                let size = key.len() + value.len();
                if size > self.max_item_size {
                    return Err(format!(
                        "Item size {} exceeds maximum of {} bytes",
                        size, self.max_item_size
                    ));
                }
                Ok(())
            }
            Command::Restore { name } => {
                let has_separator = name.contains(|c: char| c == '/' || c == '\\');
                if has_separator || !snapshot::is_snapshot_file_name(name) {
                    return Err(format!("Invalid snapshot name: {:?}", name));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn execute(&self, command: Command) -> crate::Result<Response> {
        match command {
            Command::Get { key } => Ok(match self.engine.get(&key) {
                Some(value) => Response::ok(Some(value.into_bytes())),
                None => Response::not_found(),
            }),
            Command::Set { key, value } => Ok(match self.engine.set(&key, &value)? {
                SetOutcome::Created => Response::created(),
                SetOutcome::Updated => Response::ok(None),
            }),
            Command::Update { key, value } => {
                self.engine.update(&key, &value)?;
                Ok(Response::ok(None))
            }
            Command::Delete { key } => {
                self.engine.delete(&key)?;
                Ok(Response::ok(None))
            }
            Command::Ping => Ok(Response::ok(Some(b"PONG".to_vec()))),
            Command::Snapshot => {
                let path = self.engine.take_snapshot()?;
                Ok(Response::ok(Some(display_name(&path).into_bytes())))
            }
            Command::Restore { name } => {
                self.engine.restore_from_snapshot(&name)?;
                Ok(Response::ok(None))
            }
            Command::ListSnapshots => {
                let names: Vec<String> = self
                    .engine
                    .list_snapshots()?
                    .iter()
                    .map(|path| display_name(path))
                    .collect();
                Ok(Response::ok(Some(names.join("\n").into_bytes())))
            }
        }
    }

    /// Get the access policy
    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    /// Get the shared engine
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
