//! Core domain types

use num_complex::Complex;

use crate::domain::{FilterbankError, FilterbankResult};

/// Complex baseband sample
pub type Sample = Complex<f64>;

/// FIR filter coefficient
pub type Tap = f64;

/// Mapping from inverse-DFT bin order to output channel order.
///
/// The commutator's natural output order is rotated relative to baseband
/// channel numbering, so the channelizer reorders its bins through this
/// map before emitting them. Must be a bijective permutation of `0..M`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap(Vec<usize>);

impl ChannelMap {
    /// Identity map: output channel `i` is inverse-DFT bin `i`
    /// (channel 0 at DC, positive slots first, negative slots wrapped).
    pub fn identity(num_channels: usize) -> Self {
        Self((0..num_channels).collect())
    }

    /// Centered map: output channel `i` is bin `(i + ceil(M/2)) mod M`,
    /// so channel 0 is the lowest frequency slot and channel `M/2` is DC.
    pub fn centered(num_channels: usize) -> Self {
        let m = num_channels;
        let shift = m.div_ceil(2);
        Self((0..m).map(|i| (i + shift) % m).collect())
    }

    /// Build a map from an explicit permutation of `0..M`.
    pub fn from_permutation(map: Vec<usize>) -> FilterbankResult<Self> {
        let m = map.len();
        let mut seen = vec![false; m];
        for &bin in &map {
            if bin >= m || seen[bin] {
                return Err(FilterbankError::Config(format!(
                    "channel map {:?} is not a permutation of 0..{}",
                    map, m
                )));
            }
            seen[bin] = true;
        }
        Ok(Self(map))
    }

    /// Bin index feeding output channel `channel`.
    pub fn bin(&self, channel: usize) -> usize {
        self.0[channel]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
