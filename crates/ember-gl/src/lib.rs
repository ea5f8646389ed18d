//! `ember-gl` tracks the lifecycle of a client-side GL context whose backing
//! implementation may live in another process.
//!
//! The crate provides:
//! - The context-loss state machine and its restore path (see [`ContextLossController`]).
//! - Detachment of dependent objects when a context is lost (see [`DependentObjectRegistry`]).
//! - A single-slot GL error mailbox (see [`ErrorLatch`]).
//! - In-process and actor-backed compositable handle updates (see [`ResourceHandleBridge`]
//!   and [`actor::ActorChannel`]).
//! - Deferred host notification through a [`TaskQueue`].

mod context;
mod controller;
mod diagnostics;
mod error;
mod latch;
mod notify;
mod registry;
mod task_queue;

pub mod actor;
pub mod bridge;
pub mod config;
pub mod stats;

pub use bridge::{
    BridgeStrategy, CompositableHandle, CompositorActor, ResourceHandleBridge, TransactionId,
};
pub use config::{ConfigError, ContextConfig};
pub use context::{ExtensionObject, GlContext, GlContextBuilder};
pub use controller::{AlwaysAvailable, BackingProbe, ContextLossController, LossReason, LossStatus};
pub use diagnostics::{DiagnosticSink, TracingDiagnostics, WARNINGS_EXHAUSTED};
pub use error::{BuildError, GlError};
pub use latch::ErrorLatch;
pub use notify::{
    EventNotifier, EventTarget, HostEvent, PresentationSurface, CONTEXT_LOST_EVENT,
    CONTEXT_RESTORED_EVENT,
};
pub use registry::{ContextId, DependentObject, DependentObjectRegistry, Extension, ObjectKind};
pub use stats::{ContextStats, ContextStatsSnapshot};
pub use task_queue::TaskQueue;
