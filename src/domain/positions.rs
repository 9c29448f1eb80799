//! Weight → position lag.

use crate::domain::frame::Frame;

/// Positions held on date t are the weights decided on date t-1. The
/// first date has no position.
pub fn weights_to_positions(weights: &Frame) -> Frame {
    weights.shift(1)
}
