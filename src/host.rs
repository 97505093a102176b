//! Host platform contract.
//!
//! The bridge never owns the sizing or drawing behavior of leaf children;
//! it drives them through this trait, which mirrors the host platform's
//! measure/layout call protocol: a view measured with per-axis constraints
//! reports a size, and a view laid out receives absolute integer bounds.
//!
//! All calls happen synchronously on the host's UI-affinity thread.

use crate::types::{Bounds, MeasureSpec, MeasuredSize};

/// A host view the bridge can measure and position.
pub trait HostView {
    /// Resolve the view's size under the given per-axis constraints.
    ///
    /// The view must honor [`MeasureSpec::Exact`] exactly and stay within
    /// an [`MeasureSpec::AtMost`] bound; [`MeasureSpec::Unspecified`]
    /// leaves the axis to the view's intrinsic size.
    fn measure(&self, width: MeasureSpec, height: MeasureSpec) -> MeasuredSize;

    /// Position the view at absolute bounds within its parent.
    fn layout(&self, bounds: Bounds);
}
