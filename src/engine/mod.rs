//! Flex computation engine.
//!
//! The engine side of the bridge: a tree of [`FlexNode`]s with style,
//! dirty tracking and intrinsic measurement callbacks, plus the
//! computation pass that feeds the tree through Taffy and writes geometry
//! back.
//!
//! Everything above this module (the bridge, the pool) talks to the node
//! contract only; Taffy never leaks out of the computation pass.

mod compute;
mod node;
pub(crate) mod style;

pub use compute::LayoutContext;
pub use node::{FlexNode, MeasureFunction};
