//! Polyphase filter bank
//!
//! Partitions one flat tap vector into M branch sub-filters and owns the
//! per-branch streaming FIR state. Branch `k` holds the tap subsequence
//! `taps[k], taps[k+M], taps[k+2M], ...`; the flat vector is zero-padded
//! so it divides evenly across branches. Delay lines persist strictly
//! between calls — this is a streaming filter, not a block-independent one.

use num_complex::Complex;

use crate::domain::{FilterbankError, FilterbankResult, Sample, Tap};

/// One sub-filter: its tap slice and its exclusive delay line.
/// The newest sample sits at index 0 of the delay line.
#[derive(Debug, Clone)]
struct Branch {
    taps: Vec<Tap>,
    delay: Vec<Sample>,
}

/// Bank of M polyphase branches sharing one prototype filter
#[derive(Debug, Clone)]
pub struct PolyphaseBank {
    branches: Vec<Branch>,
    prototype: Vec<Tap>,
}

impl PolyphaseBank {
    /// Decompose `taps` across `num_branches` sub-filters.
    pub fn new(taps: &[Tap], num_branches: usize) -> FilterbankResult<Self> {
        if num_branches < 1 {
            return Err(FilterbankError::Config(
                "number of branches must be at least 1".into(),
            ));
        }
        if taps.is_empty() {
            return Err(FilterbankError::Config("tap vector is empty".into()));
        }

        let taps_per_branch = taps.len().div_ceil(num_branches);
        let branches = (0..num_branches)
            .map(|k| Branch {
                taps: Self::branch_taps(taps, num_branches, taps_per_branch, k),
                delay: vec![Complex::new(0.0, 0.0); taps_per_branch],
            })
            .collect();

        Ok(Self {
            branches,
            prototype: taps.to_vec(),
        })
    }

    fn branch_taps(taps: &[Tap], num_branches: usize, taps_per_branch: usize, k: usize) -> Vec<Tap> {
        (0..taps_per_branch)
            .map(|j| taps.get(k + j * num_branches).copied().unwrap_or(0.0))
            .collect()
    }

    /// Replace all branch sub-filters wholesale. Delay-line history is
    /// preserved across the retap: when the branch length changes, the
    /// newest samples are kept and older history is truncated or
    /// zero-extended.
    pub fn set_taps(&mut self, taps: &[Tap]) -> FilterbankResult<()> {
        if taps.is_empty() {
            return Err(FilterbankError::Config("tap vector is empty".into()));
        }
        let m = self.branches.len();
        let taps_per_branch = taps.len().div_ceil(m);
        for (k, branch) in self.branches.iter_mut().enumerate() {
            branch.taps = Self::branch_taps(taps, m, taps_per_branch, k);
            branch.delay.resize(taps_per_branch, Complex::new(0.0, 0.0));
        }
        self.prototype = taps.to_vec();
        Ok(())
    }

    /// Shift one sample into a branch's delay line.
    pub fn push(&mut self, branch: usize, sample: Sample) {
        let delay = &mut self.branches[branch].delay;
        delay.rotate_right(1);
        delay[0] = sample;
    }

    /// Shift the same sample into every branch's delay line, keeping all
    /// branches synchronized to one input-sample horizon (resampler use).
    pub fn push_all(&mut self, sample: Sample) {
        for branch in &mut self.branches {
            branch.delay.rotate_right(1);
            branch.delay[0] = sample;
        }
    }

    /// Dot product of one branch's taps against another branch's delay
    /// line. The channelizer's commutator pairs tap arms with delay lines
    /// in a rotation that depends on the oversample step, so the pairing
    /// is a parameter rather than fixed.
    pub fn dot(&self, tap_branch: usize, line_branch: usize) -> Sample {
        let taps = &self.branches[tap_branch].taps;
        let delay = &self.branches[line_branch].delay;
        let mut acc = Complex::new(0.0, 0.0);
        for (t, s) in taps.iter().zip(delay.iter()) {
            acc += *s * *t;
        }
        acc
    }

    /// Shift one sample into a branch and return the filtered output.
    /// This is the inner loop of every engine in the crate.
    pub fn filter_one(&mut self, branch: usize, sample: Sample) -> Sample {
        self.push(branch, sample);
        self.dot(branch, branch)
    }

    pub fn num_branches(&self) -> usize {
        self.branches.len()
    }

    pub fn taps_per_branch(&self) -> usize {
        self.branches[0].taps.len()
    }

    /// The installed prototype, as passed in (without padding)
    pub fn prototype(&self) -> &[Tap] {
        &self.prototype
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cx(re: f64) -> Sample {
        Complex::new(re, 0.0)
    }

    #[test]
    fn decomposition_strides_and_pads() {
        // 7 taps over 3 branches pads to 9: branch k gets taps[k], taps[k+3], taps[k+6]
        let taps: Vec<f64> = (1..=7).map(|v| v as f64).collect();
        let bank = PolyphaseBank::new(&taps, 3).unwrap();
        assert_eq!(bank.taps_per_branch(), 3);
        assert_eq!(bank.branches[0].taps, vec![1.0, 4.0, 7.0]);
        assert_eq!(bank.branches[1].taps, vec![2.0, 5.0, 0.0]);
        assert_eq!(bank.branches[2].taps, vec![3.0, 6.0, 0.0]);
    }

    #[test]
    fn rejects_zero_branches_and_empty_taps() {
        assert!(PolyphaseBank::new(&[1.0], 0).is_err());
        assert!(PolyphaseBank::new(&[], 4).is_err());
    }

    #[test]
    fn filter_one_impulse_replays_branch_taps() {
        let taps: Vec<f64> = vec![0.5, -0.25, 1.5, 2.0, 0.75, -1.0];
        let mut bank = PolyphaseBank::new(&taps, 2).unwrap();

        // Impulse into branch 1, then zeros: outputs walk branch 1's taps
        let expected = [-0.25, 2.0, -1.0, 0.0];
        let mut input = cx(1.0);
        for &want in &expected {
            let out = bank.filter_one(1, input);
            assert!((out.re - want).abs() < 1e-12, "got {}, want {}", out.re, want);
            input = cx(0.0);
        }
    }

    #[test]
    fn branches_keep_independent_state() {
        let mut bank = PolyphaseBank::new(&[1.0, 1.0, 1.0, 1.0], 2).unwrap();
        bank.filter_one(0, cx(1.0));
        // Branch 1 never saw the sample
        assert_eq!(bank.dot(1, 1), cx(0.0));
        assert!((bank.dot(0, 0).re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn push_all_synchronizes_branches() {
        let mut bank = PolyphaseBank::new(&[1.0; 8], 4).unwrap();
        bank.push_all(cx(2.0));
        for k in 0..4 {
            assert!((bank.dot(k, k).re - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn retap_preserves_delay_line_history() {
        let old_taps = vec![1.0, 0.0, 0.0, 0.0];
        let new_taps = vec![0.25, 0.5, 0.75, 1.0];
        let mut bank = PolyphaseBank::new(&old_taps, 1).unwrap();

        let history = [3.0, -1.0, 2.0, 5.0];
        for &s in &history {
            bank.filter_one(0, cx(s));
        }

        bank.set_taps(&new_taps).unwrap();

        // Next output convolves the new taps with the old history plus
        // the new sample: 0.25*7 + 0.5*5 + 0.75*2 + 1.0*(-1)
        let out = bank.filter_one(0, cx(7.0));
        let want = 0.25 * 7.0 + 0.5 * 5.0 + 0.75 * 2.0 + 1.0 * (-1.0);
        assert!((out.re - want).abs() < 1e-12, "got {}, want {}", out.re, want);
    }

    #[test]
    fn retap_resizes_lines_keeping_newest_samples() {
        let mut bank = PolyphaseBank::new(&[1.0; 6], 2).unwrap();
        for n in 1..=6 {
            bank.push(0, cx(n as f64));
        }
        // Grow from 3 to 5 taps per branch; the 3 newest samples survive
        bank.set_taps(&[1.0; 10]).unwrap();
        assert_eq!(bank.taps_per_branch(), 5);
        let out = bank.dot(0, 0);
        assert!((out.re - (6.0 + 5.0 + 4.0)).abs() < 1e-12, "got {}", out.re);
    }
}
