//! Command definitions
//!
//! Represents commands from clients.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Get = 0x01,
    Set = 0x02,
    Delete = 0x03,
    Ping = 0x04,
    Update = 0x05,
    Snapshot = 0x06,
    Restore = 0x07,
    ListSnapshots = 0x08,
}

impl CommandType {
    /// Human-readable command name for log lines and error payloads
    pub fn name(self) -> &'static str {
        match self {
            CommandType::Get => "GET",
            CommandType::Set => "SET",
            CommandType::Delete => "DEL",
            CommandType::Ping => "PING",
            CommandType::Update => "UPDATE",
            CommandType::Snapshot => "SNAPSHOT",
            CommandType::Restore => "RESTORE",
            CommandType::ListSnapshots => "LIST_SNAPSHOTS",
        }
    }

    /// Whether the command changes stored state or on-disk snapshots
    pub fn is_write(self) -> bool {
        matches!(
            self,
            CommandType::Set
                | CommandType::Delete
                | CommandType::Update
                | CommandType::Snapshot
                | CommandType::Restore
        )
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key
    Get { key: String },

    /// Insert or overwrite a key-value pair
    Set { key: String, value: String },

    /// Delete a key
    Delete { key: String },

    /// Ping (health check)
    Ping,

    /// Overwrite an existing key
    Update { key: String, value: String },

    /// Capture a snapshot of the whole store
    Snapshot,

    /// Restore the store from a named snapshot
    Restore { name: String },

    /// List snapshot files
    ListSnapshots,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Set { .. } => CommandType::Set,
            Command::Delete { .. } => CommandType::Delete,
            Command::Ping => CommandType::Ping,
            Command::Update { .. } => CommandType::Update,
            Command::Snapshot => CommandType::Snapshot,
            Command::Restore { .. } => CommandType::Restore,
            Command::ListSnapshots => CommandType::ListSnapshots,
        }
    }
}
