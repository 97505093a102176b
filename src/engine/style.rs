//! Node style storage.
//!
//! Every style property a node carries lives here, stored in `Cell`s so a
//! shared node handle can mutate style without exterior `&mut` plumbing.
//! Defaults follow the CSS flexbox initial values the computation engine
//! assumes; [`Style::reset`] restores all of them, which is what makes
//! pooled node reuse safe.

use std::cell::Cell;

use crate::types::{
    Align, Direction, Edge, FlexDirection, FlexWrap, JustifyContent, PositionType, UNDEFINED,
};

/// Compare two style values, treating undefined (NaN) as equal to itself.
#[inline]
pub(crate) fn values_equal(a: f32, b: f32) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

// =============================================================================
// Spacing
// =============================================================================

/// Per-edge spacing (margin, padding or border) with an `All` fallback.
///
/// Resolution order: the edge's own value, then the `All` value, then zero.
#[derive(Debug)]
pub struct Spacing {
    values: [Cell<f32>; 5],
}

impl Spacing {
    pub fn new() -> Self {
        let spacing = Self {
            values: Default::default(),
        };
        spacing.reset();
        spacing
    }

    /// Set the value for one edge (or the `All` fallback).
    ///
    /// Returns true when the stored value changed.
    pub fn set(&self, edge: Edge, value: f32) -> bool {
        let cell = &self.values[edge as usize];
        if values_equal(cell.get(), value) {
            return false;
        }
        cell.set(value);
        true
    }

    /// Raw stored value for one edge, undefined when never set.
    pub fn raw(&self, edge: Edge) -> f32 {
        self.values[edge as usize].get()
    }

    /// Resolved value for a physical edge: edge, then `All`, then zero.
    pub fn get(&self, edge: Edge) -> f32 {
        let own = self.values[edge as usize].get();
        if !own.is_nan() {
            return own;
        }
        let all = self.values[Edge::All as usize].get();
        if !all.is_nan() { all } else { 0.0 }
    }

    /// Clear every edge back to undefined.
    pub fn reset(&self) {
        for cell in &self.values {
            cell.set(UNDEFINED);
        }
    }
}

// =============================================================================
// Style
// =============================================================================

/// The full style of a computation node.
///
/// Interior-mutable so style setters work through shared node handles.
/// Change detection (and the dirty marking it drives) is the node's job,
/// not this struct's.
#[derive(Debug)]
pub struct Style {
    pub direction: Cell<Direction>,
    pub flex_direction: Cell<FlexDirection>,
    pub justify_content: Cell<JustifyContent>,
    pub align_content: Cell<Align>,
    pub align_items: Cell<Align>,
    pub align_self: Cell<Align>,
    pub position_type: Cell<PositionType>,
    pub flex_wrap: Cell<FlexWrap>,
    pub flex: Cell<f32>,

    pub margin: Spacing,
    pub padding: Spacing,
    pub border: Spacing,

    pub position_left: Cell<f32>,
    pub position_top: Cell<f32>,
    pub position_right: Cell<f32>,
    pub position_bottom: Cell<f32>,

    pub width: Cell<f32>,
    pub height: Cell<f32>,
    pub min_width: Cell<f32>,
    pub min_height: Cell<f32>,
    pub max_width: Cell<f32>,
    pub max_height: Cell<f32>,
}

impl Style {
    pub fn new() -> Self {
        Self {
            direction: Cell::new(Direction::Inherit),
            flex_direction: Cell::new(FlexDirection::Column),
            justify_content: Cell::new(JustifyContent::FlexStart),
            align_content: Cell::new(Align::FlexStart),
            align_items: Cell::new(Align::Stretch),
            align_self: Cell::new(Align::Auto),
            position_type: Cell::new(PositionType::Relative),
            flex_wrap: Cell::new(FlexWrap::NoWrap),
            flex: Cell::new(0.0),

            margin: Spacing::new(),
            padding: Spacing::new(),
            border: Spacing::new(),

            position_left: Cell::new(UNDEFINED),
            position_top: Cell::new(UNDEFINED),
            position_right: Cell::new(UNDEFINED),
            position_bottom: Cell::new(UNDEFINED),

            width: Cell::new(UNDEFINED),
            height: Cell::new(UNDEFINED),
            min_width: Cell::new(UNDEFINED),
            min_height: Cell::new(UNDEFINED),
            max_width: Cell::new(UNDEFINED),
            max_height: Cell::new(UNDEFINED),
        }
    }

    /// Restore every field to its default value.
    ///
    /// A node coming back out of the pool must not leak its previous
    /// occupant's style, so this has to cover every field above.
    pub fn reset(&self) {
        self.direction.set(Direction::Inherit);
        self.flex_direction.set(FlexDirection::Column);
        self.justify_content.set(JustifyContent::FlexStart);
        self.align_content.set(Align::FlexStart);
        self.align_items.set(Align::Stretch);
        self.align_self.set(Align::Auto);
        self.position_type.set(PositionType::Relative);
        self.flex_wrap.set(FlexWrap::NoWrap);
        self.flex.set(0.0);

        self.margin.reset();
        self.padding.reset();
        self.border.reset();

        self.position_left.set(UNDEFINED);
        self.position_top.set(UNDEFINED);
        self.position_right.set(UNDEFINED);
        self.position_bottom.set(UNDEFINED);

        self.width.set(UNDEFINED);
        self.height.set(UNDEFINED);
        self.min_width.set(UNDEFINED);
        self.min_height.set(UNDEFINED);
        self.max_width.set(UNDEFINED);
        self.max_height.set(UNDEFINED);
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
