//! Child descriptor records.
//!
//! One [`ChildSlot`] per attached host child, stored in host order by the
//! owning bridge. The slot correlates the host view, the mirrored
//! computation node, and the child's layout parameters; whether the child
//! is an opaque leaf or a nested bridge is a tagged variant dispatched by
//! pattern match.

use std::cell::Cell;
use std::rc::Rc;

use super::flex_layout::FlexLayout;
use super::params::LayoutParams;
use crate::engine::FlexNode;
use crate::host::HostView;

/// What occupies a child slot.
pub(crate) enum ChildKind {
    /// Placeholder state while the record is parked in the pool. Never
    /// present in a live registry.
    Vacant,
    /// An opaque host view mirrored by a pooled node with a measurement
    /// adapter installed.
    Leaf {
        view: Rc<dyn HostView>,
        node: FlexNode,
    },
    /// A nested bridge contributing its own node directly.
    Bridge(FlexLayout),
}

/// One slot of a bridge's child registry.
pub(crate) struct ChildSlot {
    /// Ordinal bookkeeping: the slot's current position, re-stamped when
    /// later siblings shift.
    pub(crate) ordinal: Cell<usize>,
    pub(crate) params: LayoutParams,
    pub(crate) kind: ChildKind,
}

impl ChildSlot {
    /// The computation node mirroring this child.
    pub(crate) fn node(&self) -> FlexNode {
        match &self.kind {
            ChildKind::Leaf { node, .. } => node.clone(),
            ChildKind::Bridge(bridge) => bridge.node(),
            ChildKind::Vacant => unreachable!("vacant slot in a live child registry"),
        }
    }
}
