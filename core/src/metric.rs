//! Daily metric records and series helpers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day of engagement metrics.
///
/// In generated records `new_users_ios + new_users_android == new_users`
/// and `new_cats_stray + new_cats_home == new_cats`. Filter-time scaling
/// re-rounds each field and may relax the second partition by a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetric {
    pub date: NaiveDate,
    pub new_users: u64,
    pub new_users_ios: u64,
    pub new_users_android: u64,
    pub new_cats: u64,
    pub new_cats_stray: u64,
    pub new_cats_home: u64,
    pub shots: u64,
    pub dau_mau: f64,
}

impl DailyMetric {
    /// All-zero record for `date`.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            new_users: 0,
            new_users_ios: 0,
            new_users_android: 0,
            new_cats: 0,
            new_cats_stray: 0,
            new_cats_home: 0,
            shots: 0,
            dau_mau: 0.0,
        }
    }

    /// Add the additive fields of `other`. `dau_mau` is left alone.
    pub fn add_counts(&mut self, other: &DailyMetric) {
        self.new_users += other.new_users;
        self.new_users_ios += other.new_users_ios;
        self.new_users_android += other.new_users_android;
        self.new_cats += other.new_cats;
        self.new_cats_stray += other.new_cats_stray;
        self.new_cats_home += other.new_cats_home;
        self.shots += other.shots;
    }

    pub fn is_partitioned(&self) -> bool {
        self.new_users_ios + self.new_users_android == self.new_users
            && self.new_cats_stray + self.new_cats_home == self.new_cats
    }
}

/// Ordered, date-aligned sequence of daily records, oldest first.
pub type Series = Vec<DailyMetric>;

/// The trailing `days` records of `series` (all of it if shorter).
pub fn trailing(series: &[DailyMetric], days: usize) -> &[DailyMetric] {
    &series[series.len().saturating_sub(days)..]
}

/// Elementwise sum of date-aligned series. `dau_mau` is averaged over
/// the members that have a record for that day.
pub fn sum_series(members: &[&[DailyMetric]]) -> Series {
    let len = members.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let mut present = 0usize;
        let mut dau_mau_total = 0.0;
        let mut day: Option<DailyMetric> = None;
        for member in members {
            let Some(d) = member.get(i) else { continue };
            let acc = day.get_or_insert_with(|| DailyMetric::empty(d.date));
            acc.add_counts(d);
            dau_mau_total += d.dau_mau;
            present += 1;
        }
        if let Some(mut acc) = day {
            acc.dau_mau = if present > 0 { dau_mau_total / present as f64 } else { 0.0 };
            out.push(acc);
        }
    }
    out
}

pub fn total_users(series: &[DailyMetric]) -> u64 {
    series.iter().map(|d| d.new_users).sum()
}

pub fn total_cats(series: &[DailyMetric]) -> u64 {
    series.iter().map(|d| d.new_cats).sum()
}

pub fn total_shots(series: &[DailyMetric]) -> u64 {
    series.iter().map(|d| d.shots).sum()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Percent change from `prev` to `curr`; `None` when `prev` is not
/// positive.
pub fn pct_change(curr: f64, prev: f64) -> Option<f64> {
    if prev > 0.0 {
        Some((curr - prev) / prev * 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, users: u64, dau_mau: f64) -> DailyMetric {
        DailyMetric {
            new_users: users,
            new_users_ios: users / 2,
            new_users_android: users - users / 2,
            dau_mau,
            ..DailyMetric::empty(NaiveDate::from_ymd_opt(2026, 1, d).unwrap())
        }
    }

    #[test]
    fn sum_series_adds_counts_and_averages_dau_mau() {
        let a = vec![day(1, 10, 0.2), day(2, 20, 0.3)];
        let b = vec![day(1, 5, 0.4), day(2, 7, 0.1)];
        let out = sum_series(&[a.as_slice(), b.as_slice()]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].new_users, 15);
        assert_eq!(out[1].new_users, 27);
        assert!((out[0].dau_mau - 0.3).abs() < 1e-12);
        assert!(out.iter().all(DailyMetric::is_partitioned));
    }

    #[test]
    fn pct_change_needs_positive_base() {
        assert_eq!(pct_change(5.0, 0.0), None);
        assert_eq!(pct_change(150.0, 100.0), Some(50.0));
    }
}
