//! EmberKV CLI Client
//!
//! Command-line interface for interacting with EmberKV.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use emberkv::protocol::{read_response, write_command, Command, Response, Status};

/// EmberKV CLI
#[derive(Parser, Debug)]
#[command(name = "emberkv-cli")]
#[command(about = "CLI for EmberKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Overwrite the value of an existing key
    Update {
        /// The key to update
        key: String,

        /// The new value
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Take a snapshot of the whole store
    Snapshot,

    /// Restore the store from a snapshot
    Restore {
        /// Snapshot file name (see `snapshots`)
        name: String,
    },

    /// List snapshot files, oldest first
    Snapshots,

    /// Ping the server
    Ping,
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Get { key } => Command::Get { key },
            Commands::Set { key, value } => Command::Set { key, value },
            Commands::Update { key, value } => Command::Update { key, value },
            Commands::Del { key } => Command::Delete { key },
            Commands::Snapshot => Command::Snapshot,
            Commands::Restore { name } => Command::Restore { name },
            Commands::Snapshots => Command::ListSnapshots,
            Commands::Ping => Command::Ping,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args.server, args.command.into()) {
        Ok(response) => print_response(&response),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Send one command and wait for its response
fn run(server: &str, command: Command) -> emberkv::Result<Response> {
    let stream = TcpStream::connect(server)?;
    let mut writer = BufWriter::new(stream.try_clone()?);
    let mut reader = BufReader::new(stream);

    write_command(&mut writer, &command)?;
    read_response(&mut reader)
}

fn print_response(response: &Response) -> ExitCode {
    let text = response.payload_text();
    match response.status {
        Status::Ok => {
            if !text.is_empty() {
                println!("{}", text);
            } else {
                println!("OK");
            }
            ExitCode::SUCCESS
        }
        Status::Created => {
            println!("CREATED");
            ExitCode::SUCCESS
        }
        Status::NotFound => {
            eprintln!("(not found)");
            ExitCode::FAILURE
        }
        Status::Forbidden | Status::BadRequest | Status::Error => {
            eprintln!("{:?}: {}", response.status, text);
            ExitCode::FAILURE
        }
    }
}
