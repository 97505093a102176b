//! Node and descriptor pooling.
//!
//! Structural churn (list inserts/removes, recycling rows in a scrolling
//! container) attaches and detaches children constantly; allocating a
//! fresh computation node and registry record per attach would cost far
//! more than the flex math itself. The pool keeps free-lists of both and
//! hands instances back out, reset to defaults.
//!
//! The pool is an explicit arena: whoever creates the topmost bridge of a
//! hierarchy owns one `Rc<NodePool>` and passes it to every bridge in that
//! hierarchy. Independent hierarchies get independent pools.
//!
//! Pool exhaustion is not an error: an empty free-list simply allocates.

use std::cell::{Cell, RefCell};

use crate::bridge::LayoutParams;
use crate::bridge::child::{ChildKind, ChildSlot};
use crate::engine::FlexNode;

/// Free-lists of computation nodes and child-slot records.
pub struct NodePool {
    nodes: RefCell<Vec<FlexNode>>,
    slots: RefCell<Vec<Box<ChildSlot>>>,
}

impl NodePool {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
            slots: RefCell::new(Vec::new()),
        }
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Take a node from the free-list, or allocate one.
    ///
    /// A reused node comes back with every style field at its default;
    /// nothing of the previous occupant survives.
    pub fn acquire_node(&self) -> FlexNode {
        match self.nodes.borrow_mut().pop() {
            Some(node) => {
                node.reset();
                node
            }
            None => FlexNode::new(),
        }
    }

    /// Return a detached node to the free-list.
    pub fn release_node(&self, node: FlexNode) {
        debug_assert!(node.parent().is_none(), "released node still attached");
        debug_assert!(
            !node.has_measure_function(),
            "released node still has a measurement function"
        );
        self.nodes.borrow_mut().push(node);
    }

    /// Number of nodes currently parked in the free-list.
    pub fn pooled_nodes(&self) -> usize {
        self.nodes.borrow().len()
    }

    // =========================================================================
    // Child slots
    // =========================================================================

    pub(crate) fn acquire_slot(
        &self,
        ordinal: usize,
        params: LayoutParams,
        kind: ChildKind,
    ) -> Box<ChildSlot> {
        match self.slots.borrow_mut().pop() {
            Some(mut slot) => {
                slot.ordinal.set(ordinal);
                slot.params = params;
                slot.kind = kind;
                slot
            }
            None => Box::new(ChildSlot {
                ordinal: Cell::new(ordinal),
                params,
                kind,
            }),
        }
    }

    pub(crate) fn release_slot(&self, mut slot: Box<ChildSlot>) {
        // Drop the view/node references before parking the record.
        slot.kind = ChildKind::Vacant;
        self.slots.borrow_mut().push(slot);
    }

    /// Number of slot records currently parked in the free-list.
    pub fn pooled_slots(&self) -> usize {
        self.slots.borrow().len()
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
