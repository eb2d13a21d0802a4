//! Port traits (interfaces)
//!
//! These traits define the boundary between the engines and the external
//! producer/consumer that drives them. The flowgraph scheduler lives on
//! the other side of this seam; the engines implement exactly this
//! surface and nothing more.

use serde::{Deserialize, Serialize};

/// Shape of a block's input or output side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamSignature {
    /// Number of parallel logical streams
    pub streams: usize,
    /// Output samples produced per input sample, per stream
    pub relative_rate: f64,
}

/// A streaming transform: one input sample in, zero or more outputs out.
///
/// Implementations are single-threaded per instance and never block,
/// suspend, or perform I/O. Output sample `n` depends only on input
/// samples `0..=n` and prior internal state.
pub trait Block {
    type Input;
    type Output;

    fn input_signature(&self) -> StreamSignature;
    fn output_signature(&self) -> StreamSignature;

    /// Feed one sample; returns an output when this sample completes one.
    fn push(&mut self, sample: Self::Input) -> Option<Self::Output>;
}
