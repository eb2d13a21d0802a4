//! Arbitrary-rate polyphase resampler
//!
//! Converts a complex stream by any positive rate using a fine
//! (`flt_size`-way) polyphase decomposition plus linear interpolation
//! between adjacent branch outputs. A phase accumulator in branch-index
//! units tracks the fractional output position: `floor(acc)` selects the
//! branch, `frac(acc)` weights the interpolation, and each wrap past
//! `flt_size` consumes exactly one input sample into every branch's
//! delay line.

use log::debug;

use crate::domain::{FilterbankError, FilterbankResult, ResamplerConfig, Sample, Tap};
use crate::dsp::bank::PolyphaseBank;
use crate::dsp::design;
use crate::ports::{Block, StreamSignature};

/// Fraction of the channel half-band kept as passband when designing the
/// prototype internally
const PASSBAND_FRACTION: f64 = 0.8;

/// Fractional-rate polyphase resampler
pub struct ArbitraryResampler {
    bank: PolyphaseBank,
    flt_size: usize,
    rate: f64,
    /// Accumulator advance per output sample: `flt_size / rate`
    step: f64,
    /// Phase accumulator in branch-index units, `[0, flt_size)` between
    /// input samples
    acc: f64,
}

impl ArbitraryResampler {
    pub fn new(config: ResamplerConfig) -> FilterbankResult<Self> {
        let flt_size = config.flt_size;
        if flt_size < 1 {
            return Err(FilterbankError::Config(format!(
                "flt_size must be positive, got {}",
                flt_size
            )));
        }
        Self::check_rate(config.rate)?;

        let taps = match config.taps {
            Some(taps) => taps,
            None => Self::design_taps(flt_size, config.rate, config.attenuation_db)?,
        };
        if taps.len() < flt_size {
            return Err(FilterbankError::Config(format!(
                "prototype has {} taps but needs at least one per branch ({})",
                taps.len(),
                flt_size
            )));
        }
        let bank = PolyphaseBank::new(&taps, flt_size)?;

        debug!(
            "resampler: rate {} over {} branches, {} taps/branch",
            config.rate,
            flt_size,
            bank.taps_per_branch()
        );

        Ok(Self {
            bank,
            flt_size,
            rate: config.rate,
            step: flt_size as f64 / config.rate,
            acc: 0.0,
        })
    }

    fn check_rate(rate: f64) -> FilterbankResult<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(FilterbankError::Config(format!(
                "resample rate must be positive and finite, got {}",
                rate
            )));
        }
        Ok(())
    }

    /// Prototype covering the full input bandwidth, with the `flt_size`
    /// interpolation gain baked in. Designed through the bounded
    /// ripple-relaxation loop.
    fn design_taps(flt_size: usize, rate: f64, attenuation_db: f64) -> FilterbankResult<Vec<Tap>> {
        let halfband = 0.5 * rate.min(1.0);
        let cutoff = PASSBAND_FRACTION * halfband;
        let transition = (PASSBAND_FRACTION / 2.0) * halfband;
        design::design_low_pass_relaxed(
            flt_size as f64,
            flt_size as f64,
            cutoff,
            transition,
            attenuation_db,
        )
    }

    /// Feed one input sample; returns the output samples it completes
    /// (none while decimating, several when `rate > 1`).
    pub fn push(&mut self, sample: Sample) -> Option<Vec<Sample>> {
        self.bank.push_all(sample);

        let flt = self.flt_size as f64;
        let mut out = Vec::new();
        while self.acc < flt {
            let b = self.acc as usize;
            let frac = self.acc - b as f64;
            let y0 = self.bank.dot(b, b);
            let y1 = self.bank.dot((b + 1) % self.flt_size, (b + 1) % self.flt_size);
            out.push(y0 + (y1 - y0) * frac);
            self.acc += self.step;
        }
        // This input sample has been consumed into every delay line
        self.acc -= flt;

        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }

    /// Feed a block of samples, collecting all completed outputs.
    pub fn process(&mut self, input: &[Sample]) -> Vec<Sample> {
        let mut out = Vec::with_capacity((input.len() as f64 * self.rate) as usize + 1);
        for &sample in input {
            if let Some(mut chunk) = self.push(sample) {
                out.append(&mut chunk);
            }
        }
        out
    }

    /// Change the resample rate. Only the accumulator step changes; the
    /// filter decomposition and all branch state are untouched, so this
    /// is cheap and safe mid-stream.
    pub fn set_rate(&mut self, rate: f64) -> FilterbankResult<()> {
        Self::check_rate(rate)?;
        self.rate = rate;
        self.step = self.flt_size as f64 / rate;
        Ok(())
    }

    /// Atomically replace the prototype taps, keeping delay-line history.
    /// The new taps must carry the `flt_size` interpolation gain.
    pub fn set_taps(&mut self, taps: &[Tap]) -> FilterbankResult<()> {
        if taps.len() < self.flt_size {
            return Err(FilterbankError::Config(format!(
                "prototype has {} taps but needs at least one per branch ({})",
                taps.len(),
                self.flt_size
            )));
        }
        self.bank.set_taps(taps)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn flt_size(&self) -> usize {
        self.flt_size
    }

    pub fn taps(&self) -> &[Tap] {
        self.bank.prototype()
    }
}

impl Block for ArbitraryResampler {
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
            streams: 1,
            relative_rate: self.rate,
        }
    }

    fn push(&mut self, sample: Sample) -> Option<Vec<Sample>> {
        ArbitraryResampler::push(self, sample)
    }
}
