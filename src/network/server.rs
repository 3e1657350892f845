//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use crate::api::RequestHandler;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{EmberError, Result};

use super::Connection;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Pending connections allowed per worker before `accept` applies backpressure
const QUEUE_DEPTH_PER_WORKER: usize = 4;

/// TCP server for EmberKV
///
/// One acceptor (the thread calling `run`) plus `worker_threads` workers.
/// Each worker serves one connection at a time until it closes.
pub struct Server {
    /// Server configuration
    config: Config,

    /// Shared request handler (policy + engine)
    handler: RequestHandler,

    /// Bound listener, set by `bind` (or lazily by `run`)
    listener: Option<TcpListener>,

    /// Set to stop the accept loop
    shutdown: Arc<AtomicBool>,
}

/// Cloneable handle that stops a running server
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting and drain its workers
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Server {
    /// Create a new server with the given config and engine
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config,
            handler: RequestHandler::new(engine),
            listener: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bind the listen address, returning the actual local address
    ///
    /// Useful with port 0 to learn the assigned port before `run`.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            EmberError::Network(format!("bind {} failed: {}", self.config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Address the server is bound to, if bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let listener = match self.listener.as_ref() {
            Some(listener) => listener,
            None => return Err(EmberError::Network("listener not bound".to_string())),
        };

        tracing::info!(
            "Listening on {} as {} with {} workers",
            listener.local_addr()?,
            self.config.role,
            self.config.worker_threads
        );

        let (tx, rx) = channel::bounded::<TcpStream>(
            self.config.worker_threads * QUEUE_DEPTH_PER_WORKER,
        );
        let workers = self.spawn_workers(rx)?;

        while !self.shutdown.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, addr)) => {
                    // Accepted sockets may inherit non-blocking mode
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", addr, e);
                        continue;
                    }
                    if tx.send(stream).is_err() {
                        tracing::error!("All workers exited; stopping accept loop");
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        tracing::info!("Shutting down, waiting for workers");
        drop(tx);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn spawn_workers(&self, rx: Receiver<TcpStream>) -> Result<Vec<JoinHandle<()>>> {
        let mut workers = Vec::with_capacity(self.config.worker_threads);

        for id in 0..self.config.worker_threads {
            let rx = rx.clone();
            let handler = self.handler.clone();
            let read_ms = self.config.read_timeout_ms;
            let write_ms = self.config.write_timeout_ms;

            let worker = thread::Builder::new()
                .name(format!("emberkv-worker-{}", id))
                .spawn(move || {
                    for stream in rx.iter() {
                        serve(stream, handler.clone(), read_ms, write_ms);
                    }
                })?;
            workers.push(worker);
        }

        Ok(workers)
    }
}

/// Run one connection to completion on the current worker
fn serve(stream: TcpStream, handler: RequestHandler, read_ms: u64, write_ms: u64) {
    let mut connection = match Connection::new(stream, handler) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Failed to set up connection: {}", e);
            return;
        }
    };

    if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
        tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
        return;
    }

    if let Err(e) = connection.handle() {
        tracing::debug!("Connection {} ended with error: {}", connection.peer_addr(), e);
    }
}
