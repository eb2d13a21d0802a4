//! Polyphase filterbank multirate engine
//!
//! Three engines built on one mathematical foundation — partitioning a
//! prototype low-pass filter into sub-filter branches and routing samples
//! through them with a commutator:
//!
//! - [`Channelizer`] — one wideband complex stream in, M equally spaced
//!   narrowband channels out
//! - [`Decimator`] — extracts a single channel without materializing the
//!   other M-1
//! - [`ArbitraryResampler`] — fractional rate conversion through a finer
//!   decomposition plus inter-branch interpolation
//!
//! ## Architecture (Hexagonal / Ports & Adapters)
//!
//! - `domain/` - Pure domain types, errors, configuration. No I/O.
//! - `dsp/` - Signal processing (pure functions, no I/O)
//! - `ports/` - Trait definitions (interfaces) for the external
//!   producer/consumer that feeds the engines
//!
//! Engines own their state exclusively and are single-threaded per
//! instance; callers needing parallel streams use independent instances.

// Core domain (pure, no I/O)
pub mod domain;
pub mod dsp;
pub mod ports;

pub use domain::{
    ChannelMap, ChannelizerConfig, DecimatorConfig, FilterbankError, FilterbankResult,
    ResamplerConfig, Sample, Tap,
};
pub use dsp::{ArbitraryResampler, Channelizer, Decimator, PolyphaseBank};
pub use ports::{Block, StreamSignature};
