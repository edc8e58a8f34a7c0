//! Canonical daily global series.
//!
//! users(i) = max(floor, round(growth × seasonal × weekend × spike × dip × noise))
//!
//! Dip centres are drawn once before the per-day loop. Per day the draw
//! order is: weekend bonus (weekends only), spike roll (+ magnitude on a
//! hit), noise, cats/user, shots/cat, iOS share, stray share, dauMau noise.

use crate::{
    config::GlobalCurveConfig,
    distribute::split_pair,
    metric::{DailyMetric, Series},
    rng::WorldRng,
    types::DayIndex,
};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::f64::consts::PI;

/// A smoothed local reduction around `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dip {
    pub center: f64,
    pub half_width: f64,
    /// Multiplier at the bottom of the dip, e.g. 0.7.
    pub depth: f64,
}

impl Dip {
    /// Amount subtracted from the day's multiplier. Bell-shaped, zero
    /// beyond two half-widths.
    pub fn reduction(&self, day: f64) -> f64 {
        let dist = (day - self.center).abs();
        if dist > self.half_width * 2.0 {
            return 0.0;
        }
        let t = dist / self.half_width;
        (1.0 - self.depth) * (-t * t).exp()
    }
}

/// The consecutive calendar days of a horizon ending at `end_date`.
pub fn horizon_dates(end_date: NaiveDate, horizon_days: usize) -> Vec<NaiveDate> {
    let start = end_date - Duration::days(horizon_days.saturating_sub(1) as i64);
    (0..horizon_days)
        .map(|i| start + Duration::days(i as i64))
        .collect()
}

pub struct GlobalSeriesGenerator<'a> {
    config: &'a GlobalCurveConfig,
    horizon_days: usize,
    end_date: NaiveDate,
}

impl<'a> GlobalSeriesGenerator<'a> {
    pub fn new(config: &'a GlobalCurveConfig, horizon_days: usize, end_date: NaiveDate) -> Self {
        Self { config, horizon_days, end_date }
    }

    /// Super-linear growth in `progress` ∈ [0, 1).
    pub fn growth_base(&self, progress: f64) -> f64 {
        self.config.growth_base
            + self.config.growth_amplitude * progress.max(0.0).powf(self.config.growth_exponent)
    }

    /// Seasonal multiplier for a zero-based month.
    pub fn seasonal(&self, month0: u32) -> f64 {
        let m = month0 as f64;
        1.0 + self.config.seasonal_annual * ((m - 3.0) * PI / 6.0).sin()
            + self.config.seasonal_semiannual * ((m - 11.0) * PI / 3.0).sin()
    }

    pub fn dip_factor(&self, dips: &[Dip], day: DayIndex) -> f64 {
        let reduced = dips
            .iter()
            .fold(1.0, |acc, dip| acc - dip.reduction(day as f64));
        reduced.max(self.config.dip_floor)
    }

    fn draw_dips(&self, rng: &mut WorldRng) -> Vec<Dip> {
        let cfg = self.config;
        let count = cfg.dip_count.draw_int(rng).max(0) as usize;
        let margin = cfg.dip_edge_margin as i64;
        let last = self.horizon_days as i64 - 1;
        let (lo, hi) = if last - margin > margin {
            (margin, last - margin)
        } else {
            (0, last)
        };

        (0..count)
            .map(|_| Dip {
                center: rng.int_range(lo, hi) as f64,
                half_width: cfg.dip_half_width.draw_int(rng) as f64,
                depth: cfg.dip_depth.draw(rng),
            })
            .collect()
    }

    pub fn generate(&self, rng: &mut WorldRng) -> Series {
        let cfg = self.config;
        let dips = self.draw_dips(rng);
        log::debug!("global: {} dips at {:?}", dips.len(), dips.iter().map(|d| d.center).collect::<Vec<_>>());

        let dates = horizon_dates(self.end_date, self.horizon_days);
        let mut days = Vec::with_capacity(self.horizon_days);

        for (i, date) in dates.into_iter().enumerate() {
            let progress = i as f64 / self.horizon_days as f64;

            let weekend = match date.weekday() {
                Weekday::Sat | Weekday::Sun => cfg.weekend_bonus.draw(rng),
                _ => 1.0,
            };
            let spike = if rng.chance(cfg.spike_probability) {
                cfg.spike_multiplier.draw(rng)
            } else {
                1.0
            };
            let noise = cfg.noise.draw(rng);

            let raw = self.growth_base(progress)
                * self.seasonal(date.month0())
                * weekend
                * spike
                * self.dip_factor(&dips, i)
                * noise;
            let users = (raw.round().max(0.0) as u64).max(cfg.user_floor);

            let cats = (users as f64 * cfg.cats_per_user.draw(rng)).round() as u64;
            let shots = (cats as f64 * cfg.shots_per_cat.draw(rng)).round() as u64;
            let (ios, android) = split_pair(users, cfg.ios_share.draw(rng));
            let (stray, home) = split_pair(cats, cfg.stray_share.draw(rng));

            let dau_mau = (cfg.dau_mau_floor
                + progress * cfg.dau_mau_slope
                + rng.normal(0.0, cfg.dau_mau_noise_sd))
            .clamp(cfg.dau_mau_band.min, cfg.dau_mau_band.max);

            days.push(DailyMetric {
                date,
                new_users: users,
                new_users_ios: ios,
                new_users_android: android,
                new_cats: cats,
                new_cats_stray: stray,
                new_cats_home: home,
                shots,
                dau_mau,
            });
        }

        days
    }
}
