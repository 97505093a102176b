//! # flexlay
//!
//! Flexbox layout bridge for retained view hierarchies.
//!
//! flexlay lets a host UI framework's views be positioned by flexbox rules
//! instead of the platform's native layout algorithms. It maintains a
//! mirror tree of flex computation nodes alongside the host's mutable view
//! hierarchy and keeps the two in lockstep under structural churn.
//!
//! ## Architecture
//!
//! ```text
//! host mutations ──► FlexLayout ──► FlexNode tree ──► Taffy computation
//! host measure   ◄── two-pass protocol ◄── computed geometry
//! host layout    ◄── rounded bounds  ◄── geometry application
//! ```
//!
//! One [`FlexLayout`] bridge sits on each composite host view. Opaque leaf
//! children are mirrored by pooled [`FlexNode`]s with a measurement
//! adapter that answers the engine's intrinsic-size questions through the
//! host's [`HostView::measure`] call; children that are themselves bridges
//! contribute their own node directly and defer computation to the
//! topmost (`Root`) bridge.
//!
//! All state is single-threaded: the host's UI-affinity thread drives
//! every call synchronously, and node/record pooling works through plain
//! shared handles with no locking.
//!
//! ## Modules
//!
//! - [`types`] - Constraint vocabulary, geometry, style enums
//! - [`engine`] - Computation nodes and the Taffy-backed layout pass
//! - [`bridge`] - The synchronization bridge and its child registry
//! - [`pool`] - Node/record free-lists shared per hierarchy
//! - [`host`] - The host platform's view contract

pub mod bridge;
pub mod engine;
pub mod host;
pub mod pool;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use bridge::{FlexLayout, HostChild, LayoutParams, Role};
pub use engine::{FlexNode, LayoutContext, MeasureFunction};
pub use host::HostView;
pub use pool::NodePool;
