//! Engine configuration
//!
//! Construction parameters for the three polyphase engines. These are the
//! stable entry-point surface of the crate: every parameter is validated
//! when the engine is built, never at push time.

use serde::{Deserialize, Serialize};

use crate::domain::Tap;

fn default_oversample_rate() -> f64 {
    1.0
}

fn default_flt_size() -> usize {
    32
}

fn default_attenuation_db() -> f64 {
    100.0
}

/// Channelizer construction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelizerConfig {
    /// Number of output channels (M)
    pub num_channels: usize,
    /// Prototype low-pass taps; designed internally when `None`
    pub taps: Option<Vec<Tap>>,
    /// Output oversampling ratio, >= 1. Must resolve to an integral
    /// commutator advance of `M / oversample_rate` samples per output.
    #[serde(default = "default_oversample_rate")]
    pub oversample_rate: f64,
    /// Stopband attenuation for the internally designed prototype (dB)
    #[serde(default = "default_attenuation_db")]
    pub attenuation_db: f64,
}

impl ChannelizerConfig {
    pub fn new(num_channels: usize) -> Self {
        Self {
            num_channels,
            taps: None,
            oversample_rate: default_oversample_rate(),
            attenuation_db: default_attenuation_db(),
        }
    }
}

/// Single-channel decimator construction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecimatorConfig {
    /// Number of frequency slots (M); also the decimation factor
    pub num_channels: usize,
    /// Which channel to extract, 0-indexed in the channelizer's
    /// centered output order
    pub channel: usize,
    /// Prototype low-pass taps; designed internally when `None`
    pub taps: Option<Vec<Tap>>,
    /// Stopband attenuation for the internally designed prototype (dB)
    #[serde(default = "default_attenuation_db")]
    pub attenuation_db: f64,
}

impl DecimatorConfig {
    pub fn new(num_channels: usize, channel: usize) -> Self {
        Self {
            num_channels,
            channel,
            taps: None,
            attenuation_db: default_attenuation_db(),
        }
    }
}

/// Arbitrary resampler construction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResamplerConfig {
    /// Output rate / input rate; any positive value
    pub rate: f64,
    /// Number of polyphase branches in the fractional decomposition
    #[serde(default = "default_flt_size")]
    pub flt_size: usize,
    /// Stopband attenuation for the internally designed prototype (dB)
    #[serde(default = "default_attenuation_db")]
    pub attenuation_db: f64,
    /// Prototype low-pass taps; designed internally when `None`.
    /// Externally supplied taps must already carry the `flt_size`
    /// interpolation gain.
    pub taps: Option<Vec<Tap>>,
}

impl ResamplerConfig {
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            flt_size: default_flt_size(),
            attenuation_db: default_attenuation_db(),
            taps: None,
        }
    }
}
