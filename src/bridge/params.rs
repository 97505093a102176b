//! Per-child layout parameters.
//!
//! The host describes each child's layout wishes (explicit size, bounds,
//! offsets, margins, flex factor, self-alignment) through a
//! [`LayoutParams`] value attached to the child's slot. Ahead of every
//! computation pass the bridge pushes the current params into the child's
//! mirrored node; node-side change detection keeps redundant pushes from
//! dirtying anything.
//!
//! Numeric fields default to [`UNDEFINED`], which reads as
//! "unconstrained": a normal value, not an error.
//!
//! [`UNDEFINED`]: crate::types::UNDEFINED

use crate::engine::FlexNode;
use crate::types::{Align, Edge, PositionType, UNDEFINED};

/// Layout parameters for one child of a bridge.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    /// Explicit width, undefined for content/flex sizing.
    pub width: f32,
    /// Explicit height, undefined for content/flex sizing.
    pub height: f32,

    pub min_width: f32,
    pub min_height: f32,
    pub max_width: f32,
    pub max_height: f32,

    /// Position offsets, honored for absolutely positioned children.
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,

    /// Margin fallback for edges without their own value.
    pub margin: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,

    /// Cross-axis self alignment, `Auto` inherits the container.
    pub align_self: Align,
    pub position: PositionType,
    /// Flex factor; positive means "grow into remaining space".
    pub flex: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            width: UNDEFINED,
            height: UNDEFINED,
            min_width: UNDEFINED,
            min_height: UNDEFINED,
            max_width: UNDEFINED,
            max_height: UNDEFINED,
            left: UNDEFINED,
            top: UNDEFINED,
            right: UNDEFINED,
            bottom: UNDEFINED,
            margin: UNDEFINED,
            margin_left: UNDEFINED,
            margin_right: UNDEFINED,
            margin_top: UNDEFINED,
            margin_bottom: UNDEFINED,
            align_self: Align::Auto,
            position: PositionType::Relative,
            flex: 0.0,
        }
    }
}

impl LayoutParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push these parameters into the child's mirrored node.
    pub(crate) fn fill_node(&self, node: &FlexNode) {
        node.set_style_width(self.width);
        node.set_style_height(self.height);

        node.set_min_width(self.min_width);
        node.set_min_height(self.min_height);
        node.set_max_width(self.max_width);
        node.set_max_height(self.max_height);

        node.set_position_left(self.left);
        node.set_position_right(self.right);
        node.set_position_top(self.top);
        node.set_position_bottom(self.bottom);

        node.set_margin(Edge::All, self.margin);
        node.set_margin(Edge::Left, self.margin_left);
        node.set_margin(Edge::Right, self.margin_right);
        node.set_margin(Edge::Top, self.margin_top);
        node.set_margin(Edge::Bottom, self.margin_bottom);

        node.set_align_self(self.align_self);
        node.set_flex(self.flex);
        node.set_position_type(self.position);
    }
}

// =============================================================================
// Tests
// =============================================================================
