//! # dp-targets
//!
//! Converts raw time-to-disruption values (log10 seconds) into training
//! labels. Each [`Target`] pairs a remapping with the loss and output
//! activation the model is trained with, plus a grid of decision thresholds
//! for ROC sweeps.
//!
//! Every target obeys one rule: a larger label means a disruption is more
//! likely.

mod grid;
mod losses;
mod targets;

pub use grid::{linspace, logspace};
pub use losses::{binary_crossentropy_np, hinge_np, mse_np, squared_hinge_np};
pub use targets::{Activation, Loss, Target, TTD_INV_EPS};
