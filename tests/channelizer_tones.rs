//! Integration tests: channelizer end-to-end tone separation
//!
//! A wideband stream carrying one complex tone per channel slot is pushed
//! through the channelizer; every channel must reproduce its own tone at
//! baseband after the filter's settling region. The decimator must agree
//! with the channelizer sample-for-sample on the channel it extracts.

use std::f64::consts::PI;

use num_complex::Complex;

use filterbank::dsp::design::{design_low_pass, FirWindow};
use filterbank::{Channelizer, ChannelizerConfig, Decimator, DecimatorConfig, Sample};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sum of unit tones at the given absolute frequencies
fn multi_tone(freqs: &[f64], sample_rate: f64, len: usize) -> Vec<Sample> {
    (0..len)
        .map(|n| {
            freqs
                .iter()
                .map(|f| Complex::from_polar(1.0, 2.0 * PI * f * n as f64 / sample_rate))
                .sum()
        })
        .collect()
}

/// Five channels, five tones: each channel slot carries one tone offset
/// from its center, and each output stream must reproduce that offset
/// tone at baseband. Outputs are normalized by their own first compared
/// sample, so only frequency and relative phase rotation are checked —
/// to three decimal places over the last 50 steady-state samples.
#[test]
fn each_channel_recovers_its_own_tone() {
    init_logging();

    let m = 5usize;
    let fs = 5_000.0;
    let ifs = m as f64 * fs;
    let freqs = [-230.0, 121.0, 110.0, -513.0, 203.0];

    let taps = design_low_pass(1.0, ifs, fs / 2.0, fs / 10.0, 80.0, FirWindow::Kaiser).unwrap();

    // Tone i sits at freqs[i] above the center of channel slot i
    let carriers: Vec<f64> = freqs
        .iter()
        .enumerate()
        .map(|(i, f)| f + (i as f64 - (m / 2) as f64) * fs)
        .collect();
    let input = multi_tone(&carriers, ifs, 4096 * m);

    let mut config = ChannelizerConfig::new(m);
    config.taps = Some(taps.clone());
    let mut chan = Channelizer::new(config).unwrap();
    let frames = chan.process(&input);

    // Discard the settling region: (ceil(len(taps)/M) - 1) / 2 outputs
    let delay = chan.group_delay();
    assert_eq!(delay, (taps.len().div_ceil(m) - 1) / 2);
    assert!(frames.len() > delay + 50);

    for (i, &f) in freqs.iter().enumerate() {
        let data: Vec<Sample> = frames.iter().map(|frame| frame[i]).collect();
        let tail = &data[data.len() - 50..];

        let reference = tail[0];
        assert!(
            reference.norm() > 0.5,
            "channel {} level collapsed to {}",
            i,
            reference.norm()
        );

        for (n, &y) in tail.iter().enumerate() {
            let actual = y / reference;
            let expected = Complex::from_polar(1.0, 2.0 * PI * f * n as f64 / fs);
            assert!(
                (actual.re - expected.re).abs() < 1e-3 && (actual.im - expected.im).abs() < 1e-3,
                "channel {} sample {}: got {:?}, expected {:?}",
                i,
                n,
                actual,
                expected
            );
        }
    }
}

/// The decimator reuses the channelizer's bank and commutator, so its
/// single extracted channel must equal the corresponding channelizer
/// stream sample-for-sample.
#[test]
fn decimator_matches_channelizer_stream() {
    init_logging();

    let m = 4usize;
    let ifs = 4_000.0;
    let taps = design_low_pass(1.0, ifs, 450.0, 120.0, 70.0, FirWindow::Kaiser).unwrap();
    let input = multi_tone(&[-1200.0, 70.0, 1050.0], ifs, 2000 * m);

    let mut config = ChannelizerConfig::new(m);
    config.taps = Some(taps.clone());
    let mut chan = Channelizer::new(config).unwrap();
    let frames = chan.process(&input);

    for k in 0..m {
        let mut dec_config = DecimatorConfig::new(m, k);
        dec_config.taps = Some(taps.clone());
        let mut dec = Decimator::new(dec_config).unwrap();
        let extracted = dec.process(&input);

        assert_eq!(extracted.len(), frames.len());
        for (n, (&y, frame)) in extracted.iter().zip(frames.iter()).enumerate() {
            let diff = (y - frame[k]).norm();
            assert!(
                diff < 1e-9,
                "channel {} sample {}: decimator {:?} vs channelizer {:?}",
                k,
                n,
                y,
                frame[k]
            );
        }
    }
}

/// Oversampled outputs run at twice the channel rate, and the rotating
/// commutator twiddle must keep each channel's tone at its true baseband
/// frequency rather than an alias.
#[test]
fn oversampled_channel_keeps_baseband_frequency() {
    init_logging();

    let m = 4usize;
    let fs = 1_000.0;
    let ifs = m as f64 * fs;
    let f = 50.0;

    let taps = design_low_pass(1.0, ifs, fs / 2.0, fs / 10.0, 80.0, FirWindow::Kaiser).unwrap();

    // Tone in channel slot 3 (centered order): carrier fs + f
    let input = multi_tone(&[fs + f], ifs, 4096 * m);

    let mut config = ChannelizerConfig::new(m);
    config.taps = Some(taps);
    config.oversample_rate = 2.0;
    let mut chan = Channelizer::new(config).unwrap();
    let frames = chan.process(&input);

    let out_rate = fs * 2.0;
    let data: Vec<Sample> = frames.iter().map(|frame| frame[3]).collect();
    let tail = &data[data.len() - 50..];
    let reference = tail[0];
    assert!(reference.norm() > 0.5, "level was {}", reference.norm());

    for (n, &y) in tail.iter().enumerate() {
        let actual = y / reference;
        let expected = Complex::from_polar(1.0, 2.0 * PI * f * n as f64 / out_rate);
        assert!(
            (actual - expected).norm() < 2e-3,
            "sample {}: got {:?}, expected {:?}",
            n,
            actual,
            expected
        );
    }
}

/// Oversample rates must resolve to an integral commutator advance:
/// 36/(36/25) = 25 is fine, 36/10.1334 is not.
#[test]
fn oversample_rate_validation() {
    init_logging();

    let mut config = ChannelizerConfig::new(36);
    config.oversample_rate = 36.0 / 25.0;
    assert!(Channelizer::new(config).is_ok());

    let mut config = ChannelizerConfig::new(36);
    config.oversample_rate = 10.1334;
    let err = Channelizer::new(config).err().unwrap();
    assert!(
        err.to_string().contains("non-integer commutator step"),
        "error was: {}",
        err
    );
}
