//! Low-pass prototype filter design
//!
//! Windowed-sinc design for the prototype filters consumed by the three
//! polyphase engines. The filter length comes from the Bellanger estimate
//! over the passband/stopband deviations; the coefficients are a sinc
//! kernel under the selected window, normalized for the requested DC gain.
//!
//! The engines never inspect the windowing method — they treat the
//! returned tap vector as opaque.

use std::f64::consts::PI;

use log::debug;

use crate::domain::{FilterbankError, FilterbankResult, Tap};

/// Hard ceiling on prototype length. A length estimate beyond this is
/// treated as a failure to converge rather than an allocation hazard.
pub const MAX_PROTOTYPE_TAPS: usize = 32_768;

const RIPPLE_START_DB: f64 = 0.1;
const RIPPLE_STEP_DB: f64 = 0.01;
const RIPPLE_CEILING_DB: f64 = 1.0;

/// Window applied to the sinc kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FirWindow {
    /// Kaiser window with beta derived from the requested attenuation
    Kaiser,
    Hamming,
    Blackman,
}

/// Modified zeroth-order Bessel function of the first kind
pub fn bessel_i0(x: f64) -> f64 {
    let base = x * x / 4.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..64 {
        term *= base / ((k * k) as f64);
        let prev = sum;
        sum += term;
        if sum == prev || !sum.is_finite() {
            break;
        }
    }
    sum
}

/// Kaiser beta for a stopband attenuation in dB
fn kaiser_beta(attenuation_db: f64) -> f64 {
    if attenuation_db > 50.0 {
        0.1102 * (attenuation_db - 8.7)
    } else if attenuation_db >= 21.0 {
        0.5842 * (attenuation_db - 21.0).powf(0.4) + 0.07886 * (attenuation_db - 21.0)
    } else {
        0.0
    }
}

fn window_values(window: FirWindow, num_taps: usize, attenuation_db: f64) -> Vec<f64> {
    let m = (num_taps - 1) as f64;
    match window {
        FirWindow::Kaiser => {
            let beta = kaiser_beta(attenuation_db);
            let denom = bessel_i0(beta);
            (0..num_taps)
                .map(|i| {
                    let r = 2.0 * i as f64 / m - 1.0;
                    bessel_i0(beta * (1.0 - r * r).max(0.0).sqrt()) / denom
                })
                .collect()
        }
        FirWindow::Hamming => (0..num_taps)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / m).cos())
            .collect(),
        FirWindow::Blackman => (0..num_taps)
            .map(|i| {
                let x = 2.0 * PI * i as f64 / m;
                0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
            })
            .collect(),
    }
}

/// Bellanger length estimate from the passband/stopband deviations.
/// Relaxing the passband ripple shortens the filter, which is what the
/// bounded retry loop in [`design_low_pass_relaxed`] leans on.
fn estimate_num_taps(
    sample_rate: f64,
    transition_width: f64,
    ripple_db: f64,
    attenuation_db: f64,
) -> usize {
    let delta_p = (10f64.powf(ripple_db / 20.0) - 1.0) / (10f64.powf(ripple_db / 20.0) + 1.0);
    let delta_s = 10f64.powf(-attenuation_db / 20.0);
    let df = transition_width / sample_rate;
    let n = (-20.0 * (delta_p * delta_s).sqrt().log10() - 13.0) / (14.6 * df);
    let n = n.ceil().max(3.0) as usize;
    // Symmetric type-I filter
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

/// Design a low-pass FIR prototype.
///
/// `gain` is the DC gain, `cutoff` and `transition_width` are in the same
/// units as `sample_rate`. Fails with `Config` for out-of-range band
/// edges and with `Convergence` when the requested transition band and
/// attenuation would need more than [`MAX_PROTOTYPE_TAPS`] taps.
pub fn design_low_pass(
    gain: f64,
    sample_rate: f64,
    cutoff: f64,
    transition_width: f64,
    attenuation_db: f64,
    window: FirWindow,
) -> FilterbankResult<Vec<Tap>> {
    design_with_ripple(
        gain,
        sample_rate,
        cutoff,
        transition_width,
        attenuation_db,
        RIPPLE_START_DB,
        window,
    )
}

fn design_with_ripple(
    gain: f64,
    sample_rate: f64,
    cutoff: f64,
    transition_width: f64,
    attenuation_db: f64,
    ripple_db: f64,
    window: FirWindow,
) -> FilterbankResult<Vec<Tap>> {
    if sample_rate <= 0.0 || cutoff <= 0.0 || cutoff >= sample_rate / 2.0 {
        return Err(FilterbankError::Config(format!(
            "cutoff {} out of range (0, {}) for sample rate {}",
            cutoff,
            sample_rate / 2.0,
            sample_rate
        )));
    }
    if transition_width <= 0.0 {
        return Err(FilterbankError::Config(format!(
            "transition width must be positive, got {}",
            transition_width
        )));
    }

    let num_taps = estimate_num_taps(sample_rate, transition_width, ripple_db, attenuation_db);
    if num_taps > MAX_PROTOTYPE_TAPS {
        return Err(FilterbankError::Convergence(format!(
            "{} dB attenuation over a {} Hz transition band needs {} taps (limit {})",
            attenuation_db, transition_width, num_taps, MAX_PROTOTYPE_TAPS
        )));
    }

    let mid = (num_taps - 1) as f64 / 2.0;
    let fc = cutoff / sample_rate;
    let win = window_values(window, num_taps, attenuation_db);
    let mut taps: Vec<Tap> = (0..num_taps)
        .map(|i| {
            let n = i as f64 - mid;
            let sinc = if n == 0.0 {
                2.0 * fc
            } else {
                (2.0 * PI * fc * n).sin() / (PI * n)
            };
            sinc * win[i]
        })
        .collect();

    // Normalize for the requested DC gain
    let sum: f64 = taps.iter().sum();
    for t in &mut taps {
        *t *= gain / sum;
    }

    debug!(
        "designed {}-tap low-pass: fs={} cutoff={} tw={} atten={} dB",
        num_taps, sample_rate, cutoff, transition_width, attenuation_db
    );
    Ok(taps)
}

/// Design a low-pass prototype, relaxing the passband ripple in 0.01 dB
/// steps when the design does not converge. The relaxation stops at a
/// hard 1.0 dB ceiling and surfaces `Convergence` beyond it; a worse
/// filter is never substituted silently.
pub fn design_low_pass_relaxed(
    gain: f64,
    sample_rate: f64,
    cutoff: f64,
    transition_width: f64,
    attenuation_db: f64,
) -> FilterbankResult<Vec<Tap>> {
    let mut ripple_db = RIPPLE_START_DB;
    loop {
        match design_with_ripple(
            gain,
            sample_rate,
            cutoff,
            transition_width,
            attenuation_db,
            ripple_db,
            FirWindow::Kaiser,
        ) {
            Ok(taps) => return Ok(taps),
            Err(FilterbankError::Convergence(_)) if ripple_db + RIPPLE_STEP_DB < RIPPLE_CEILING_DB => {
                ripple_db += RIPPLE_STEP_DB;
            }
            Err(FilterbankError::Convergence(msg)) => {
                return Err(FilterbankError::Convergence(format!(
                    "no design met {} dB attenuation with passband ripple up to {} dB: {}",
                    attenuation_db, RIPPLE_CEILING_DB, msg
                )));
            }
            Err(e) => return Err(e),
        }
    }
}
