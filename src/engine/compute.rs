//! Computation pass: integration with the Taffy layout engine.
//!
//! Converts node styles to Taffy styles, snapshots the node tree into a
//! `TaffyTree`, runs flexbox computation with intrinsic measurement
//! callbacks, and writes results back to each node's geometry.
//!
//! The snapshot tree lives in [`LayoutContext`] and is cleared and rebuilt
//! per pass, so no partial computation state survives between passes while
//! the backing allocations are reused.

use taffy::{
    AlignContent as TaffyAlignContent, AlignItems as TaffyAlignItems, AlignSelf as TaffyAlignSelf,
    AvailableSpace, Dimension as TaffyDimension, Display, FlexDirection as TaffyFlexDirection,
    FlexWrap as TaffyFlexWrap, JustifyContent as TaffyJustifyContent, LengthPercentage,
    LengthPercentageAuto, NodeId, Position as TaffyPosition, Rect, Size, Style as TaffyStyle,
    TaffyTree,
};

use super::node::FlexNode;
use super::style::Style;
use crate::types::{
    Align, Edge, FlexDirection, FlexWrap, JustifyContent, LayoutRect, MeasureMode, PositionType,
    UNDEFINED, is_defined, is_undefined,
};

// =============================================================================
// LAYOUT CONTEXT
// =============================================================================

/// Reusable scratch state for computation passes.
///
/// One context per layout root; passing the same context to every pass
/// reuses the snapshot tree's allocations across passes.
pub struct LayoutContext {
    taffy: TaffyTree<FlexNode>,
    nodes: Vec<(FlexNode, NodeId)>,
}

impl LayoutContext {
    pub fn new() -> Self {
        let mut taffy = TaffyTree::new();
        // Geometry leaves the engine unrounded; consumers round edges to
        // host coordinates themselves.
        taffy.disable_rounding();
        Self {
            taffy,
            nodes: Vec::new(),
        }
    }
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// DIMENSION CONVERSION
// =============================================================================

fn to_taffy_dimension(value: f32) -> TaffyDimension {
    if is_undefined(value) {
        TaffyDimension::Auto
    } else {
        TaffyDimension::Length(value)
    }
}

/// Minimum dimensions: an unset minimum is zero. The engine applies no
/// content-based automatic minimum.
fn to_taffy_min_dimension(value: f32) -> TaffyDimension {
    if is_undefined(value) {
        TaffyDimension::Length(0.0)
    } else {
        TaffyDimension::Length(value)
    }
}

fn to_taffy_max_dimension(value: f32) -> TaffyDimension {
    if is_undefined(value) {
        TaffyDimension::Auto
    } else {
        TaffyDimension::Length(value)
    }
}

/// Position offsets: unset edges stay automatic.
fn to_taffy_inset(value: f32) -> LengthPercentageAuto {
    if is_undefined(value) {
        LengthPercentageAuto::Auto
    } else {
        LengthPercentageAuto::Length(value)
    }
}

// =============================================================================
// ENUM CONVERSIONS
// =============================================================================

fn to_taffy_flex_direction(direction: FlexDirection) -> TaffyFlexDirection {
    match direction {
        FlexDirection::Column => TaffyFlexDirection::Column,
        FlexDirection::ColumnReverse => TaffyFlexDirection::ColumnReverse,
        FlexDirection::Row => TaffyFlexDirection::Row,
        FlexDirection::RowReverse => TaffyFlexDirection::RowReverse,
    }
}

fn to_taffy_flex_wrap(wrap: FlexWrap) -> TaffyFlexWrap {
    match wrap {
        FlexWrap::NoWrap => TaffyFlexWrap::NoWrap,
        FlexWrap::Wrap => TaffyFlexWrap::Wrap,
    }
}

fn to_taffy_justify_content(justify: JustifyContent) -> Option<TaffyJustifyContent> {
    Some(match justify {
        JustifyContent::FlexStart => TaffyJustifyContent::FlexStart,
        JustifyContent::Center => TaffyJustifyContent::Center,
        JustifyContent::FlexEnd => TaffyJustifyContent::FlexEnd,
        JustifyContent::SpaceBetween => TaffyJustifyContent::SpaceBetween,
        JustifyContent::SpaceAround => TaffyJustifyContent::SpaceAround,
        JustifyContent::SpaceEvenly => TaffyJustifyContent::SpaceEvenly,
    })
}

fn to_taffy_align_items(align: Align) -> Option<TaffyAlignItems> {
    match align {
        Align::Auto => None,
        Align::FlexStart => Some(TaffyAlignItems::FlexStart),
        Align::Center => Some(TaffyAlignItems::Center),
        Align::FlexEnd => Some(TaffyAlignItems::FlexEnd),
        Align::Stretch => Some(TaffyAlignItems::Stretch),
    }
}

fn to_taffy_align_self(align: Align) -> Option<TaffyAlignSelf> {
    to_taffy_align_items(align)
}

fn to_taffy_align_content(align: Align) -> Option<TaffyAlignContent> {
    match align {
        Align::Auto => None,
        Align::FlexStart => Some(TaffyAlignContent::FlexStart),
        Align::Center => Some(TaffyAlignContent::Center),
        Align::FlexEnd => Some(TaffyAlignContent::FlexEnd),
        Align::Stretch => Some(TaffyAlignContent::Stretch),
    }
}

fn to_taffy_position(position: PositionType) -> TaffyPosition {
    match position {
        PositionType::Relative => TaffyPosition::Relative,
        PositionType::Absolute => TaffyPosition::Absolute,
    }
}

// =============================================================================
// STYLE BUILDING
// =============================================================================

/// Build a Taffy style from a node's style.
fn build_style(style: &Style) -> TaffyStyle {
    // A positive flex factor means "grow from zero basis"; everything else
    // keeps its styled size (no shrinking below it).
    let flex = style.flex.get();
    let (flex_grow, flex_basis) = if flex > 0.0 {
        (flex, TaffyDimension::Length(0.0))
    } else {
        (0.0, TaffyDimension::Auto)
    };

    TaffyStyle {
        display: Display::Flex,
        position: to_taffy_position(style.position_type.get()),
        inset: Rect {
            left: to_taffy_inset(style.position_left.get()),
            right: to_taffy_inset(style.position_right.get()),
            top: to_taffy_inset(style.position_top.get()),
            bottom: to_taffy_inset(style.position_bottom.get()),
        },

        flex_direction: to_taffy_flex_direction(style.flex_direction.get()),
        flex_wrap: to_taffy_flex_wrap(style.flex_wrap.get()),
        justify_content: to_taffy_justify_content(style.justify_content.get()),
        align_items: to_taffy_align_items(style.align_items.get()),
        align_content: to_taffy_align_content(style.align_content.get()),
        align_self: to_taffy_align_self(style.align_self.get()),

        flex_grow,
        flex_shrink: 0.0,
        flex_basis,

        size: Size {
            width: to_taffy_dimension(style.width.get()),
            height: to_taffy_dimension(style.height.get()),
        },
        min_size: Size {
            width: to_taffy_min_dimension(style.min_width.get()),
            height: to_taffy_min_dimension(style.min_height.get()),
        },
        max_size: Size {
            width: to_taffy_max_dimension(style.max_width.get()),
            height: to_taffy_max_dimension(style.max_height.get()),
        },

        margin: Rect {
            left: LengthPercentageAuto::Length(style.margin.get(Edge::Left)),
            right: LengthPercentageAuto::Length(style.margin.get(Edge::Right)),
            top: LengthPercentageAuto::Length(style.margin.get(Edge::Top)),
            bottom: LengthPercentageAuto::Length(style.margin.get(Edge::Bottom)),
        },
        padding: Rect {
            left: LengthPercentage::Length(style.padding.get(Edge::Left)),
            right: LengthPercentage::Length(style.padding.get(Edge::Right)),
            top: LengthPercentage::Length(style.padding.get(Edge::Top)),
            bottom: LengthPercentage::Length(style.padding.get(Edge::Bottom)),
        },
        border: Rect {
            left: LengthPercentage::Length(style.border.get(Edge::Left)),
            right: LengthPercentage::Length(style.border.get(Edge::Right)),
            top: LengthPercentage::Length(style.border.get(Edge::Top)),
            bottom: LengthPercentage::Length(style.border.get(Edge::Bottom)),
        },

        ..Default::default()
    }
}

// =============================================================================
// INTRINSIC MEASUREMENT
// =============================================================================

/// Resolve a leaf's intrinsic size through its measurement function.
///
/// Width-in/height-out: a known width is final, a definite available width
/// is an upper bound, anything else leaves the width unconstrained.
fn measure_leaf(
    node: &FlexNode,
    known_dimensions: Size<Option<f32>>,
    available_space: Size<AvailableSpace>,
) -> Size<f32> {
    let Some(measure) = node.measure_function() else {
        return Size::ZERO;
    };

    let (width, mode) = match (known_dimensions.width, available_space.width) {
        (Some(w), _) => (w, MeasureMode::Exactly),
        (None, AvailableSpace::Definite(w)) => (w, MeasureMode::AtMost),
        (None, _) => (UNDEFINED, MeasureMode::Undefined),
    };

    let size = (*measure)(node, width, mode);

    Size {
        width: known_dimensions.width.unwrap_or(size.width),
        height: known_dimensions.height.unwrap_or(size.height),
    }
}

// =============================================================================
// TREE SNAPSHOT + PASS
// =============================================================================

fn build_subtree(
    taffy: &mut TaffyTree<FlexNode>,
    nodes: &mut Vec<(FlexNode, NodeId)>,
    node: &FlexNode,
) -> NodeId {
    let style = build_style(node.style());

    let count = node.child_count();
    let id = if count == 0 {
        if node.has_measure_function() {
            taffy.new_leaf_with_context(style, node.clone()).unwrap()
        } else {
            taffy.new_leaf(style).unwrap()
        }
    } else {
        let mut children = Vec::with_capacity(count);
        for index in 0..count {
            children.push(build_subtree(taffy, nodes, &node.child_at(index)));
        }
        taffy.new_with_children(style, &children).unwrap()
    };

    nodes.push((node.clone(), id));
    id
}

/// Available space for the pass, derived from the root's own constraints:
/// a definite dimension wins, a max bound is the next best answer, and an
/// unconstrained axis sizes to content.
fn available_space(style: &Style) -> Size<AvailableSpace> {
    fn axis(size: f32, max: f32) -> AvailableSpace {
        if is_defined(size) {
            AvailableSpace::Definite(size)
        } else if is_defined(max) {
            AvailableSpace::Definite(max)
        } else {
            AvailableSpace::MaxContent
        }
    }

    Size {
        width: axis(style.width.get(), style.max_width.get()),
        height: axis(style.height.get(), style.max_height.get()),
    }
}

impl FlexNode {
    /// Run a full computation pass rooted at this node.
    ///
    /// Every node in the subtree gets fresh geometry; a node whose geometry
    /// actually changed raises its new-layout flag, and every node's dirty
    /// flag is cleared.
    pub fn calculate_layout(&self, ctx: &mut LayoutContext) {
        ctx.taffy.clear();
        ctx.nodes.clear();

        let root_id = build_subtree(&mut ctx.taffy, &mut ctx.nodes, self);
        let available = available_space(self.style());

        ctx.taffy
            .compute_layout_with_measure(
                root_id,
                available,
                |known_dimensions, available_space, _node_id, node_context, _style| {
                    match node_context {
                        Some(node) => measure_leaf(node, known_dimensions, available_space),
                        None => Size::ZERO,
                    }
                },
            )
            .unwrap();

        for (node, id) in &ctx.nodes {
            let layout = ctx.taffy.layout(*id).unwrap();
            let rect = LayoutRect {
                x: layout.location.x,
                y: layout.location.y,
                width: layout.size.width,
                height: layout.size.height,
            };
            if rect != node.layout() {
                node.set_layout(rect);
                node.set_has_new_layout();
            }
            node.clear_dirty();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
