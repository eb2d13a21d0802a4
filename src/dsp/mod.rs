//! Digital Signal Processing
//!
//! Pure functions for signal processing. No I/O dependencies.

pub mod bank;
pub mod channelizer;
pub mod decimator;
pub mod design;
pub mod resampler;

// Re-export commonly used items
pub use bank::PolyphaseBank;
pub use channelizer::Channelizer;
pub use decimator::Decimator;
pub use resampler::ArbitraryResampler;
