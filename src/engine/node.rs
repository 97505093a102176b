//! FlexNode, a node in the flex computation tree.
//!
//! One FlexNode mirrors one host view. Nodes are cheap `Rc` handles so the
//! bridge, the pool and the child registry can all hold the same node.
//! A node owns its style, an ordered child list, an optional measurement
//! function for intrinsic sizing, and the geometry of the last completed
//! computation pass.
//!
//! Style setters detect real changes and mark the node (and its ancestors)
//! dirty, so redundant writes never invalidate cached layout.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use super::style::{Style, values_equal};
use crate::types::{
    Align, Direction, Edge, FlexDirection, FlexWrap, JustifyContent, LayoutRect, MeasureMode,
    MeasureSpec, MeasuredSize, PositionType, UNDEFINED,
};

bitflags! {
    /// Per-node bookkeeping flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct NodeFlags: u8 {
        /// Cached geometry can no longer be trusted.
        const DIRTY = 1 << 0;
        /// Geometry was produced by a pass and not yet marked seen.
        const NEW_LAYOUT = 1 << 1;
        /// The node's host view received a measure call this pass.
        const MEASURED = 1 << 2;
    }
}

/// Measurement function invoked by the engine for a leaf lacking a
/// definite dimension: proposed width (may be [`UNDEFINED`]), width mode,
/// measured size out.
pub type MeasureFunction = Rc<dyn Fn(&FlexNode, f32, MeasureMode) -> MeasuredSize>;

pub(crate) struct NodeInner {
    style: Style,
    parent: RefCell<Weak<NodeInner>>,
    children: RefCell<Vec<FlexNode>>,
    measure: RefCell<Option<MeasureFunction>>,
    layout: Cell<LayoutRect>,
    flags: Cell<NodeFlags>,
}

/// Shared handle to a computation node.
#[derive(Clone)]
pub struct FlexNode {
    inner: Rc<NodeInner>,
}

impl FlexNode {
    /// Create a detached node with default style.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(NodeInner {
                style: Style::new(),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                measure: RefCell::new(None),
                layout: Cell::new(LayoutRect::default()),
                flags: Cell::new(NodeFlags::empty()),
            }),
        }
    }

    /// Identity comparison: do two handles point at the same node?
    pub fn same_node(&self, other: &FlexNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn style(&self) -> &Style {
        &self.inner.style
    }

    // =========================================================================
    // Flags
    // =========================================================================

    #[inline]
    fn flag(&self, flag: NodeFlags) -> bool {
        self.inner.flags.get().contains(flag)
    }

    #[inline]
    fn set_flag(&self, flag: NodeFlags, on: bool) {
        let mut flags = self.inner.flags.get();
        flags.set(flag, on);
        self.inner.flags.set(flags);
    }

    /// Mark this node and its ancestors as needing recomputation.
    ///
    /// Stops climbing at the first already-dirty ancestor: its own dirty
    /// call has marked the rest of the chain.
    pub fn dirty(&self) {
        let mut node = self.clone();
        loop {
            if node.flag(NodeFlags::DIRTY) {
                break;
            }
            node.set_flag(NodeFlags::DIRTY, true);
            match node.parent() {
                Some(parent) => node = parent,
                None => break,
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.flag(NodeFlags::DIRTY)
    }

    pub(crate) fn clear_dirty(&self) {
        self.set_flag(NodeFlags::DIRTY, false);
    }

    /// Flag this node's host view as measured for the current pass.
    pub fn mark_measured(&self) {
        self.set_flag(NodeFlags::MEASURED, true);
    }

    /// Reset the measured flag ahead of a computation pass.
    pub fn clear_measured(&self) {
        self.set_flag(NodeFlags::MEASURED, false);
    }

    pub fn is_measured(&self) -> bool {
        self.flag(NodeFlags::MEASURED)
    }

    /// Whether the last pass produced geometry nobody has consumed yet.
    pub fn has_new_layout(&self) -> bool {
        self.flag(NodeFlags::NEW_LAYOUT)
    }

    /// Consume the new-layout flag.
    ///
    /// Panics when there is no new layout to see: callers must guard with
    /// [`FlexNode::has_new_layout`].
    pub fn mark_layout_seen(&self) {
        if !self.flag(NodeFlags::NEW_LAYOUT) {
            panic!("mark_layout_seen called on a node without new layout");
        }
        self.set_flag(NodeFlags::NEW_LAYOUT, false);
    }

    pub(crate) fn set_has_new_layout(&self) {
        self.set_flag(NodeFlags::NEW_LAYOUT, true);
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    /// Insert `child` into this node's child list at `index`.
    ///
    /// Panics if the child is already attached somewhere; the same node
    /// cannot be mirrored into two parents.
    pub fn add_child_at(&self, child: &FlexNode, index: usize) {
        if child.parent().is_some() {
            panic!("add_child_at: node already has a parent");
        }
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        self.inner.children.borrow_mut().insert(index, child.clone());
        self.dirty();
    }

    /// Remove and return the child at `index`.
    pub fn remove_child_at(&self, index: usize) -> FlexNode {
        let child = self.inner.children.borrow_mut().remove(index);
        *child.inner.parent.borrow_mut() = Weak::new();
        self.dirty();
        child
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    pub fn child_at(&self, index: usize) -> FlexNode {
        self.inner.children.borrow()[index].clone()
    }

    pub fn parent(&self) -> Option<FlexNode> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| FlexNode { inner })
    }

    // =========================================================================
    // Measurement function
    // =========================================================================

    /// Install or clear the intrinsic measurement function.
    pub fn set_measure_function(&self, measure: Option<MeasureFunction>) {
        *self.inner.measure.borrow_mut() = measure;
        self.dirty();
    }

    pub fn has_measure_function(&self) -> bool {
        self.inner.measure.borrow().is_some()
    }

    pub(crate) fn measure_function(&self) -> Option<MeasureFunction> {
        self.inner.measure.borrow().clone()
    }

    // =========================================================================
    // Computed geometry
    // =========================================================================

    pub fn layout(&self) -> LayoutRect {
        self.inner.layout.get()
    }

    pub fn layout_x(&self) -> f32 {
        self.inner.layout.get().x
    }

    pub fn layout_y(&self) -> f32 {
        self.inner.layout.get().y
    }

    pub fn layout_width(&self) -> f32 {
        self.inner.layout.get().width
    }

    pub fn layout_height(&self) -> f32 {
        self.inner.layout.get().height
    }

    pub(crate) fn set_layout(&self, layout: LayoutRect) {
        self.inner.layout.set(layout);
    }

    // =========================================================================
    // Style setters (dirty-on-change)
    // =========================================================================

    fn set_value(&self, cell: &Cell<f32>, value: f32) {
        if !values_equal(cell.get(), value) {
            cell.set(value);
            self.dirty();
        }
    }

    pub fn set_direction(&self, direction: Direction) {
        if self.inner.style.direction.get() != direction {
            self.inner.style.direction.set(direction);
            self.dirty();
        }
    }

    pub fn set_flex_direction(&self, flex_direction: FlexDirection) {
        if self.inner.style.flex_direction.get() != flex_direction {
            self.inner.style.flex_direction.set(flex_direction);
            self.dirty();
        }
    }

    pub fn set_justify_content(&self, justify_content: JustifyContent) {
        if self.inner.style.justify_content.get() != justify_content {
            self.inner.style.justify_content.set(justify_content);
            self.dirty();
        }
    }

    pub fn set_align_content(&self, align_content: Align) {
        if self.inner.style.align_content.get() != align_content {
            self.inner.style.align_content.set(align_content);
            self.dirty();
        }
    }

    pub fn set_align_items(&self, align_items: Align) {
        if self.inner.style.align_items.get() != align_items {
            self.inner.style.align_items.set(align_items);
            self.dirty();
        }
    }

    pub fn set_align_self(&self, align_self: Align) {
        if self.inner.style.align_self.get() != align_self {
            self.inner.style.align_self.set(align_self);
            self.dirty();
        }
    }

    pub fn set_position_type(&self, position_type: PositionType) {
        if self.inner.style.position_type.get() != position_type {
            self.inner.style.position_type.set(position_type);
            self.dirty();
        }
    }

    pub fn set_flex_wrap(&self, flex_wrap: FlexWrap) {
        if self.inner.style.flex_wrap.get() != flex_wrap {
            self.inner.style.flex_wrap.set(flex_wrap);
            self.dirty();
        }
    }

    pub fn set_flex(&self, flex: f32) {
        self.set_value(&self.inner.style.flex, flex);
    }

    pub fn set_style_width(&self, width: f32) {
        self.set_value(&self.inner.style.width, width);
    }

    pub fn set_style_height(&self, height: f32) {
        self.set_value(&self.inner.style.height, height);
    }

    pub fn set_min_width(&self, min_width: f32) {
        self.set_value(&self.inner.style.min_width, min_width);
    }

    pub fn set_min_height(&self, min_height: f32) {
        self.set_value(&self.inner.style.min_height, min_height);
    }

    pub fn set_max_width(&self, max_width: f32) {
        self.set_value(&self.inner.style.max_width, max_width);
    }

    pub fn set_max_height(&self, max_height: f32) {
        self.set_value(&self.inner.style.max_height, max_height);
    }

    pub fn set_position_left(&self, left: f32) {
        self.set_value(&self.inner.style.position_left, left);
    }

    pub fn set_position_top(&self, top: f32) {
        self.set_value(&self.inner.style.position_top, top);
    }

    pub fn set_position_right(&self, right: f32) {
        self.set_value(&self.inner.style.position_right, right);
    }

    pub fn set_position_bottom(&self, bottom: f32) {
        self.set_value(&self.inner.style.position_bottom, bottom);
    }

    pub fn set_margin(&self, edge: Edge, value: f32) {
        if self.inner.style.margin.set(edge, value) {
            self.dirty();
        }
    }

    pub fn set_padding(&self, edge: Edge, value: f32) {
        if self.inner.style.padding.set(edge, value) {
            self.dirty();
        }
    }

    pub fn set_border(&self, edge: Edge, value: f32) {
        if self.inner.style.border.set(edge, value) {
            self.dirty();
        }
    }

    // =========================================================================
    // Constraint translation
    // =========================================================================

    /// Translate host sizing constraints into this node's style.
    ///
    /// Exact pins the dimension and releases the max bound; AtMost does
    /// the opposite; Unspecified releases both. Axes are independent.
    pub fn apply_measure_spec(&self, width: MeasureSpec, height: MeasureSpec) {
        match width {
            MeasureSpec::Exact(w) => {
                self.set_style_width(w);
                self.set_max_width(UNDEFINED);
            }
            MeasureSpec::AtMost(w) => {
                self.set_style_width(UNDEFINED);
                self.set_max_width(w);
            }
            MeasureSpec::Unspecified => {
                self.set_style_width(UNDEFINED);
                self.set_max_width(UNDEFINED);
            }
        }

        match height {
            MeasureSpec::Exact(h) => {
                self.set_style_height(h);
                self.set_max_height(UNDEFINED);
            }
            MeasureSpec::AtMost(h) => {
                self.set_style_height(UNDEFINED);
                self.set_max_height(h);
            }
            MeasureSpec::Unspecified => {
                self.set_style_height(UNDEFINED);
                self.set_max_height(UNDEFINED);
            }
        }
    }

    // =========================================================================
    // Reuse
    // =========================================================================

    /// Restore the node to its just-created state for pool reuse.
    ///
    /// The caller is responsible for detaching the node and clearing its
    /// measurement function first.
    pub fn reset(&self) {
        debug_assert!(self.parent().is_none(), "reset on an attached node");
        debug_assert_eq!(self.child_count(), 0, "reset on a node with children");
        self.inner.style.reset();
        self.inner.layout.set(LayoutRect::default());
        self.inner.flags.set(NodeFlags::empty());
    }
}

impl Default for FlexNode {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
