//! API Module
//!
//! The request-facing layer between the wire protocol and the engine.
//!
//! ## Responsibilities
//! - Gate commands on the server's role (primary/replica)
//! - Validate requests the engine assumes are well formed
//!   (non-empty keys, maximum item size, bare snapshot names)
//! - Map engine results and errors onto protocol responses

mod policy;
mod handler;

pub use policy::AccessPolicy;
pub use handler::RequestHandler;
