//! Task routing for Switchyard.
//!
//! A [`RoutingEnvelope`] names a task and, optionally, the role of the agent
//! that should serve it. The [`RoutingFabric`] resolves an agent from the
//! [`AgentDirectory`], looks the task up in its [`DispatchTable`] and runs the
//! handler: the orchestration pipeline, a vector store operation, or a call
//! forwarded to a remote agent.

pub mod directory;
pub mod fabric;
pub mod forward;
pub mod table;
pub mod types;

pub use directory::{AgentDescriptor, AgentDirectory, AgentRole, Transport};
pub use fabric::RoutingFabric;
pub use forward::{Forwarder, HttpForwarder};
pub use table::{DispatchTable, ForwardCall, Handler, RouteSpec, StoreOp};
pub use types::{RoutingEnvelope, RoutingResult};
