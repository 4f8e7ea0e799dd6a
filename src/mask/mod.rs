//! Binary mask preparation.
//!
//! - **Threshold**: intensity buffer to {0, 255} mask
//! - **Components**: 8-connected labeling and small-component removal
//!
//! Masks are `ndarray::Array2<u8>` with shape (height, width). Foreground is
//! 255, background is 0; any other value is rejected by the cleaner.

pub mod components;
pub mod threshold;

pub use components::{clean_mask, label_components, ComponentLabels, ConnectedComponent};
pub use threshold::threshold_mask;

/// Foreground value of a binary mask.
pub const FOREGROUND: u8 = 255;
/// Background value of a binary mask.
pub const BACKGROUND: u8 = 0;
