//! Polyphase filterbank channelizer
//!
//! Splits one wideband complex stream at rate `M·fs` into `M` equally
//! spaced channels at `fs` (or `fs·oversample_rate`). Samples are
//! deinterleaved into per-residue delay lines by a stride-M commutator;
//! at each output step every tap arm is evaluated against the delay line
//! holding its alignment, the length-M branch vector goes through an
//! unscaled inverse FFT, a commutator-position twiddle corrects the
//! per-channel phase, and the channel map reorders the bins so channel 0
//! is the lowest frequency slot.

use std::f64::consts::PI;
use std::sync::Arc;

use log::debug;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::domain::{
    ChannelMap, ChannelizerConfig, FilterbankError, FilterbankResult, Sample, Tap,
};
use crate::dsp::bank::PolyphaseBank;
use crate::dsp::design;
use crate::ports::{Block, StreamSignature};

/// Tolerance on how far `M / oversample_rate` may sit from an integer
const STEP_EPSILON: f64 = 1e-6;

/// M-channel analysis filterbank
pub struct Channelizer {
    bank: PolyphaseBank,
    num_channels: usize,
    oversample_rate: f64,
    /// Commutator advance per output vector, in input samples
    step: usize,
    channel_map: ChannelMap,
    fft: Arc<dyn Fft<f64>>,
    /// Branch outputs / FFT workspace, reused across outputs
    fft_buf: Vec<Sample>,
    /// Delay line receiving the next input sample (input-sample residue)
    next_line: usize,
    /// Input samples received since the last output vector
    pending: usize,
    /// Whether the first full window of M samples has arrived
    primed: bool,
    /// Input-sample residue of the newest sample at the output instant
    rot: usize,
}

impl Channelizer {
    pub fn new(config: ChannelizerConfig) -> FilterbankResult<Self> {
        let m = config.num_channels;
        if m < 1 {
            return Err(FilterbankError::Config(format!(
                "num_channels must be positive, got {}",
                m
            )));
        }
        if !config.oversample_rate.is_finite() || config.oversample_rate < 1.0 {
            return Err(FilterbankError::Config(format!(
                "oversample_rate must be >= 1, got {}",
                config.oversample_rate
            )));
        }

        let exact_step = m as f64 / config.oversample_rate;
        let step = exact_step.round();
        if (exact_step - step).abs() > STEP_EPSILON || step < 1.0 {
            return Err(FilterbankError::Config(format!(
                "requested oversample rate {} implies non-integer commutator step of {:.3}",
                config.oversample_rate, exact_step
            )));
        }
        let step = step as usize;

        let taps = match config.taps {
            Some(taps) => taps,
            None => design::design_low_pass_relaxed(1.0, m as f64, 0.4, 0.2, config.attenuation_db)?,
        };
        Self::check_taps(&taps, m)?;
        let bank = PolyphaseBank::new(&taps, m)?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_inverse(m);

        debug!(
            "channelizer: {} channels, oversample {} (step {}), {} taps/branch",
            m,
            config.oversample_rate,
            step,
            bank.taps_per_branch()
        );

        Ok(Self {
            bank,
            num_channels: m,
            oversample_rate: config.oversample_rate,
            step,
            channel_map: ChannelMap::centered(m),
            fft,
            fft_buf: vec![Complex::new(0.0, 0.0); m],
            next_line: 0,
            pending: 0,
            primed: false,
            rot: m - 1,
        })
    }

    fn check_taps(taps: &[Tap], m: usize) -> FilterbankResult<()> {
        if taps.len() < m {
            return Err(FilterbankError::Config(format!(
                "prototype has {} taps but needs at least one per channel ({})",
                taps.len(),
                m
            )));
        }
        Ok(())
    }

    /// Feed one input sample; returns a vector of M channel samples each
    /// time the commutator completes an output step.
    pub fn push(&mut self, sample: Sample) -> Option<Vec<Sample>> {
        let m = self.num_channels;
        self.bank.push(self.next_line, sample);
        self.next_line = (self.next_line + 1) % m;
        self.pending += 1;

        let needed = if self.primed { self.step } else { m };
        if self.pending < needed {
            return None;
        }
        self.pending = 0;
        self.primed = true;

        // Arm a aligns with the delay line holding residue (rot - a) mod M
        let rot = self.rot;
        for a in 0..m {
            self.fft_buf[a] = self.bank.dot(a, (rot + m - a) % m);
        }
        self.fft.process(&mut self.fft_buf);

        // Phase correction for the commutator position at this instant
        for (c, bin) in self.fft_buf.iter_mut().enumerate() {
            let theta = -2.0 * PI * (c * rot) as f64 / m as f64;
            *bin *= Complex::from_polar(1.0, theta);
        }
        self.rot = (rot + self.step) % m;

        Some(
            (0..m)
                .map(|i| self.fft_buf[self.channel_map.bin(i)])
                .collect(),
        )
    }

    /// Feed a block of samples, collecting every completed output vector.
    pub fn process(&mut self, input: &[Sample]) -> Vec<Vec<Sample>> {
        let mut frames = Vec::with_capacity(input.len() / self.step + 1);
        for &sample in input {
            if let Some(frame) = self.push(sample) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Atomically replace the prototype taps. Delay-line history is kept,
    /// so output continuity across the retap is preserved.
    pub fn set_taps(&mut self, taps: &[Tap]) -> FilterbankResult<()> {
        Self::check_taps(taps, self.num_channels)?;
        self.bank.set_taps(taps)
    }

    /// Replace the bin-to-channel permutation.
    pub fn set_channel_map(&mut self, map: ChannelMap) -> FilterbankResult<()> {
        if map.len() != self.num_channels {
            return Err(FilterbankError::Config(format!(
                "channel map has {} entries for {} channels",
                map.len(),
                self.num_channels
            )));
        }
        self.channel_map = map;
        Ok(())
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn oversample_rate(&self) -> f64 {
        self.oversample_rate
    }

    pub fn taps(&self) -> &[Tap] {
        self.bank.prototype()
    }

    /// Number of leading output samples per channel inside the filter's
    /// settling region: `(ceil(len(taps)/M) - 1) / 2`. Verification
    /// discards these before comparing against expected data.
    pub fn group_delay(&self) -> usize {
        (self.bank.taps_per_branch() - 1) / 2
    }
}

impl Block for Channelizer {
    type Input = Sample;
    type Output = Vec<Sample>;

    fn input_signature(&self) -> StreamSignature {
        StreamSignature {
            streams: 1,
            relative_rate: 1.0,
        }
    }

    fn output_signature(&self) -> StreamSignature {
        StreamSignature {
            streams: self.num_channels,
            relative_rate: self.oversample_rate / self.num_channels as f64,
        }
    }

    fn push(&mut self, sample: Sample) -> Option<Vec<Sample>> {
        Channelizer::push(self, sample)
    }
}
