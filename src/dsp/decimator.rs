//! Single-channel polyphase decimator
//!
//! Extracts one frequency slot from an M-way-rate stream without
//! materializing the other M-1 channels. The bank layout and commutator
//! are identical to the critically-sampled channelizer; only the final
//! combine differs — a single inverse-DFT bin computed with a precomputed
//! rotation vector instead of the full FFT. The extracted channel matches
//! the channelizer's output for the same index sample-for-sample.

use std::f64::consts::PI;

use log::debug;
use num_complex::Complex;

use crate::domain::{DecimatorConfig, FilterbankError, FilterbankResult, Sample, Tap};
use crate::dsp::bank::PolyphaseBank;
use crate::dsp::design;
use crate::ports::{Block, StreamSignature};

/// One-channel extraction filterbank
pub struct Decimator {
    bank: PolyphaseBank,
    num_channels: usize,
    channel: usize,
    /// Per-branch complex modulation for the selected channel, twiddle
    /// included so the output equals channelizer stream `channel`
    rotation: Vec<Sample>,
    /// Cached branch outputs for the current commutator cycle
    branch_out: Vec<Sample>,
    /// Descending commutator position; an output completes at branch 0
    commutator: usize,
}

impl Decimator {
    pub fn new(config: DecimatorConfig) -> FilterbankResult<Self> {
        let m = config.num_channels;
        if m < 1 {
            return Err(FilterbankError::Config(format!(
                "num_channels must be positive, got {}",
                m
            )));
        }
        if config.channel >= m {
            return Err(FilterbankError::Config(format!(
                "channel {} out of range [0, {})",
                config.channel, m
            )));
        }

        let taps = match config.taps {
            Some(taps) => taps,
            None => design::design_low_pass_relaxed(1.0, m as f64, 0.4, 0.2, config.attenuation_db)?,
        };
        if taps.len() < m {
            return Err(FilterbankError::Config(format!(
                "prototype has {} taps but needs at least one per channel ({})",
                taps.len(),
                m
            )));
        }
        let bank = PolyphaseBank::new(&taps, m)?;

        // Centered channel order: output channel maps to inverse-DFT bin
        // (channel + ceil(M/2)) mod M, matching the channelizer.
        let bin = (config.channel + m.div_ceil(2)) % m;
        let rotation = (0..m)
            .map(|a| {
                let theta = 2.0 * PI * bin as f64 * (a as f64 - (m - 1) as f64) / m as f64;
                Complex::from_polar(1.0, theta)
            })
            .collect();

        debug!(
            "decimator: channel {} of {} (bin {}), {} taps/branch",
            config.channel,
            m,
            bin,
            bank.taps_per_branch()
        );

        Ok(Self {
            bank,
            num_channels: m,
            channel: config.channel,
            rotation,
            branch_out: vec![Complex::new(0.0, 0.0); m],
            commutator: m - 1,
        })
    }

    /// Feed one input sample; returns the extracted channel sample once
    /// per M inputs.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        let b = self.commutator;
        self.branch_out[b] = self.bank.filter_one(b, sample);

        if b > 0 {
            self.commutator = b - 1;
            return None;
        }
        self.commutator = self.num_channels - 1;

        let mut acc = Complex::new(0.0, 0.0);
        for (v, r) in self.branch_out.iter().zip(self.rotation.iter()) {
            acc += *v * *r;
        }
        Some(acc)
    }

    /// Feed a block of samples, collecting every completed output.
    pub fn process(&mut self, input: &[Sample]) -> Vec<Sample> {
        let mut out = Vec::with_capacity(input.len() / self.num_channels + 1);
        for &sample in input {
            if let Some(y) = self.push(sample) {
                out.push(y);
            }
        }
        out
    }

    /// Atomically replace the prototype taps, keeping delay-line history.
    pub fn set_taps(&mut self, taps: &[Tap]) -> FilterbankResult<()> {
        if taps.len() < self.num_channels {
            return Err(FilterbankError::Config(format!(
                "prototype has {} taps but needs at least one per channel ({})",
                taps.len(),
                self.num_channels
            )));
        }
        self.bank.set_taps(taps)
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn taps(&self) -> &[Tap] {
        self.bank.prototype()
    }
}

impl Block for Decimator {
    type Input = Sample;
    type Output = Sample;

    fn input_signature(&self) -> StreamSignature {
        StreamSignature {
            streams: 1,
            relative_rate: 1.0,
        }
    }

    fn output_signature(&self) -> StreamSignature {
        StreamSignature {
            streams: 1,
            relative_rate: 1.0 / self.num_channels as f64,
        }
    }

    fn push(&mut self, sample: Sample) -> Option<Sample> {
        Decimator::push(self, sample)
    }
}
