//! Measurement adapter for leaf children.
//!
//! The engine asks a leaf for its intrinsic size only when flex resolution
//! left a dimension open. This adapter translates the engine's
//! width-in/height-out question into the host's measure call on the bound
//! view, reports the view's answer back, and flags the node measured so
//! the post-computation sweep never measures the same leaf twice in one
//! pass.

use std::rc::Rc;

use crate::engine::FlexNode;
use crate::host::HostView;
use crate::types::{MeasureMode, MeasureSpec, is_undefined};

/// Bind a leaf node's measurement function to its host view.
pub(crate) fn install_measure_adapter(node: &FlexNode, view: Rc<dyn HostView>) {
    node.set_measure_function(Some(Rc::new(move |node: &FlexNode, width, mode| {
        let size = view.measure(width_constraint(width, mode), MeasureSpec::Unspecified);
        node.mark_measured();
        size
    })));
}

/// Width constraint for the host: exact or bounded proposals pass through,
/// an undefined proposal means the host may pick any width. The height
/// axis is always unconstrained; intrinsic leaves answer width-in/
/// height-out.
fn width_constraint(width: f32, mode: MeasureMode) -> MeasureSpec {
    if is_undefined(width) {
        return MeasureSpec::Unspecified;
    }
    match mode {
        MeasureMode::Exactly => MeasureSpec::Exact(width),
        MeasureMode::AtMost => MeasureSpec::AtMost(width),
        MeasureMode::Undefined => MeasureSpec::Unspecified,
    }
}

// =============================================================================
// Tests
// =============================================================================
