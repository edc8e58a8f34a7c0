//! Exponential-decay retention curves, per platform and per country.

use crate::{filter::Platform, rng::WorldRng};
use serde::Serialize;

/// Day offsets sampled on every curve. Day 0 is always 100 %.
pub const RETENTION_DAYS: [u32; 10] = [0, 1, 2, 3, 5, 7, 10, 14, 21, 30];

const NOISE_SD: f64 = 2.5;
const RATE_FLOOR: f64 = 1.0;
const RATE_CEIL: f64 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetentionPoint {
    pub day: u32,
    /// Percent of the cohort still active.
    pub rate: f64,
}

pub type RetentionCurve = Vec<RetentionPoint>;

/// Curves for the three platform selections.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCurves {
    pub all: RetentionCurve,
    pub ios: RetentionCurve,
    pub android: RetentionCurve,
}

impl PlatformCurves {
    pub fn get(&self, platform: Platform) -> &RetentionCurve {
        match platform {
            Platform::All => &self.all,
            Platform::Ios => &self.ios,
            Platform::Android => &self.android,
        }
    }
}

/// One curve: `d1 · exp(−decay · (day − 1))` plus noise for day ≥ 1,
/// clamped, rounded to 0.1 and capped by the previous point so the
/// curve never rises. Draws one normal per non-zero day.
pub fn retention_curve(d1: f64, decay: f64, rng: &mut WorldRng) -> RetentionCurve {
    let mut prev = 100.0;
    RETENTION_DAYS
        .iter()
        .map(|&day| {
            if day == 0 {
                return RetentionPoint { day, rate: 100.0 };
            }
            let base = d1 * (-decay * (day - 1) as f64).exp();
            let noisy = (base + rng.normal(0.0, NOISE_SD)).clamp(RATE_FLOOR, RATE_CEIL);
            let rate = ((noisy * 10.0).round() / 10.0).min(prev);
            prev = rate;
            RetentionPoint { day, rate }
        })
        .collect()
}

/// Global curves: ALL, then iOS (retains better), then Android.
pub fn global_curves(rng: &mut WorldRng) -> PlatformCurves {
    let all = retention_curve(42.0, 0.075, rng);
    let ios = retention_curve(46.0, 0.065, rng);
    let android = retention_curve(38.0, 0.085, rng);
    PlatformCurves { all, ios, android }
}

/// Per-country curves around a country-specific D1 and decay.
pub fn country_curves(rng: &mut WorldRng) -> PlatformCurves {
    let d1 = rng.clamped_normal(42.0, 8.0, 25.0, 60.0);
    let decay = rng.clamped_normal(0.075, 0.02, 0.03, 0.13);
    let all = retention_curve(d1, decay, rng);
    let ios_d1 = d1 + rng.normal(4.0, 2.0);
    let ios = retention_curve(ios_d1, decay * 0.85, rng);
    let android_d1 = d1 - rng.normal(3.0, 2.0);
    let android = retention_curve(android_d1, decay * 1.15, rng);
    PlatformCurves { all, ios, android }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_starts_at_100_and_never_rises() {
        let mut rng = WorldRng::new(5);
        for _ in 0..50 {
            let curve = retention_curve(55.0, 0.02, &mut rng);
            assert_eq!(curve[0].rate, 100.0);
            assert!(curve.windows(2).all(|w| w[1].rate <= w[0].rate));
        }
    }
}
