//! Insight engine: anomaly and trend detection over the trailing window.
//!
//! This engine:
//!   1. Scans each country for its best user spike and worst dip
//!   2. Checks global DAU/MAU drift against the first quarter of the window
//!   3. Flags the window's peak day when it stands above the average
//!   4. Flags an unusual stray/home mix
//!   5. Flags sustained photo-volume growth
//!   6. Optionally adds volume and engagement leaders
//!
//! Runs on the unfiltered world only. Selection keeps the highest
//! priorities with a per-kind cap so no single kind crowds out the rest.

use crate::{
    config::InsightConfig,
    geo::GeoProfile,
    metric::{mean, trailing, DailyMetric},
    world::GeneratedWorld,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Positive,
    Negative,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub priority: f64,
    pub text: String,
}

/// A country's strongest spike or dip inside the window.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryAnomaly {
    pub code: &'static str,
    pub name: &'static str,
    /// Percent change, after-average vs before-average.
    pub change: f64,
    pub before_avg: f64,
    pub after_avg: f64,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// |change| × log2(avg volume + 1).
    pub magnitude: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CountryAnomalies {
    /// Sorted by magnitude, largest first. At most one per country.
    pub spikes: Vec<CountryAnomaly>,
    /// Sorted by magnitude, largest first. At most one per country.
    pub dips: Vec<CountryAnomaly>,
}

// ── Engine ───────────────────────────────────────────────────────────────────

pub struct InsightEngine<'a> {
    config: &'a InsightConfig,
}

impl<'a> InsightEngine<'a> {
    pub fn new(config: &'a InsightConfig) -> Self {
        Self { config }
    }

    /// Insights for the trailing window of `world`. Ignores every filter.
    pub fn detect(&self, world: &GeneratedWorld) -> Vec<Insight> {
        let countries: Vec<(&GeoProfile, &[DailyMetric])> = world
            .catalog
            .iter()
            .zip(&world.countries)
            .map(|(p, s)| (p, s.as_slice()))
            .collect();
        self.detect_from(&world.global, &countries)
    }

    /// Insights from explicit series. `global` and each country series
    /// are trimmed to the trailing window here.
    pub fn detect_from(
        &self,
        global: &[DailyMetric],
        countries: &[(&GeoProfile, &[DailyMetric])],
    ) -> Vec<Insight> {
        let window = trailing(global, self.config.window_days);
        if window.len() < 2 {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        let anomalies = self.scan_countries(countries);
        self.country_candidates(&anomalies, &mut candidates);
        self.dau_mau_candidate(window, &mut candidates);
        self.record_day_candidate(window, &mut candidates);
        self.stray_mix_candidate(window, &mut candidates);
        self.photo_growth_candidate(window, &mut candidates);
        if self.config.leaders_enabled {
            self.leader_candidates(countries, &mut candidates);
        }

        let picked = self.select(candidates);
        log::debug!(
            "insights: picked {} ({:?})",
            picked.len(),
            picked.iter().map(|i| i.kind).collect::<Vec<_>>()
        );
        picked
    }

    /// Best spike and worst dip per country over the trailing window.
    pub fn scan_countries(&self, countries: &[(&GeoProfile, &[DailyMetric])]) -> CountryAnomalies {
        let cfg = self.config;
        let mut out = CountryAnomalies::default();

        for (profile, series) in countries {
            if series.len() < cfg.min_country_history {
                continue;
            }
            let window = trailing(series, cfg.window_days);
            let n = window.len();
            if n < cfg.min_window_days {
                continue;
            }
            let users: Vec<f64> = window.iter().map(|d| d.new_users as f64).collect();
            let avg_volume = mean(&users);
            if avg_volume < cfg.min_avg_volume {
                continue;
            }
            let w = cfg.max_half_width.min(n / 4);
            if w == 0 {
                continue;
            }

            let mut best_spike: Option<CountryAnomaly> = None;
            let mut worst_dip: Option<CountryAnomaly> = None;
            for i in w..=n - w {
                let before = mean(&users[i - w..i]);
                let after = mean(&users[i..i + w]);
                if before < cfg.min_before_avg {
                    continue;
                }
                let change = (after - before) / before * 100.0;
                let anomaly = || CountryAnomaly {
                    code: profile.code,
                    name: profile.name,
                    change,
                    before_avg: before,
                    after_avg: after,
                    from: window[i].date,
                    to: window[(i + w - 1).min(n - 1)].date,
                    magnitude: change.abs() * (avg_volume + 1.0).log2(),
                };
                if change > cfg.spike_threshold_pct
                    && best_spike.as_ref().map_or(true, |s| change > s.change)
                {
                    best_spike = Some(anomaly());
                }
                if change < cfg.dip_threshold_pct
                    && worst_dip.as_ref().map_or(true, |d| change < d.change)
                {
                    worst_dip = Some(anomaly());
                }
            }

            out.spikes.extend(best_spike);
            out.dips.extend(worst_dip);
        }

        out.spikes.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
        out.dips.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
        out
    }

    /// Top spike, top dip from another country, and a second spike from
    /// a third country.
    fn country_candidates(&self, anomalies: &CountryAnomalies, out: &mut Vec<Insight>) {
        let cfg = self.config;
        let mut used: HashSet<&str> = HashSet::new();

        if let Some(s) = anomalies.spikes.first() {
            used.insert(s.code);
            let multiplier = s.after_avg.round() / s.before_avg.round();
            out.push(Insight {
                kind: InsightKind::Positive,
                priority: cfg.spike_priority + s.magnitude * cfg.magnitude_weight,
                text: format!(
                    "{}: {multiplier:.1}x user spike {} ({} → {}/day)",
                    s.name,
                    date_range(s.from, s.to),
                    format_count(s.before_avg),
                    format_count(s.after_avg),
                ),
            });
        }

        if let Some(d) = anomalies.dips.iter().find(|d| !used.contains(d.code)) {
            used.insert(d.code);
            out.push(Insight {
                kind: InsightKind::Negative,
                priority: cfg.dip_priority + d.magnitude * cfg.magnitude_weight,
                text: format!(
                    "{}: {:.0}% users {} ({} → {}/day)",
                    d.name,
                    d.change,
                    date_range(d.from, d.to),
                    format_count(d.before_avg),
                    format_count(d.after_avg),
                ),
            });
        }

        if let Some(s) = anomalies.spikes.iter().find(|s| !used.contains(s.code)) {
            out.push(Insight {
                kind: InsightKind::Positive,
                priority: cfg.second_spike_priority + s.magnitude * cfg.magnitude_weight,
                text: format!(
                    "{}: +{:.0}% users {} ({} → {}/day)",
                    s.name,
                    s.change,
                    date_range(s.from, s.to),
                    format_count(s.before_avg),
                    format_count(s.after_avg),
                ),
            });
        }
    }

    fn dau_mau_candidate(&self, window: &[DailyMetric], out: &mut Vec<Insight>) {
        let cfg = self.config;
        let n = window.len();
        if n < cfg.dau_mau_min_days {
            return;
        }
        let values: Vec<f64> = window.iter().map(|d| d.dau_mau).collect();
        let q = (n / 4).max(1);
        let early = mean(&values[..q]);
        let latest = values[n - 1];
        if early <= cfg.dau_mau_min_early {
            return;
        }
        let change = (latest - early) / early * 100.0;
        if change.abs() <= cfg.dau_mau_threshold_pct {
            return;
        }
        let (kind, dir, sign) = if change > 0.0 {
            (InsightKind::Positive, "up", "+")
        } else {
            (InsightKind::Warning, "down", "")
        };
        out.push(Insight {
            kind,
            priority: change.abs() * cfg.dau_mau_weight,
            text: format!("DAU/MAU {dir} globally: {early:.2} → {latest:.2} ({sign}{change:.0}%)"),
        });
    }

    fn record_day_candidate(&self, window: &[DailyMetric], out: &mut Vec<Insight>) {
        let cfg = self.config;
        if window.len() < cfg.record_min_days {
            return;
        }
        let users: Vec<f64> = window.iter().map(|d| d.new_users as f64).collect();
        let avg = mean(&users);
        // First occurrence of the maximum.
        let Some(peak) = window.iter().rev().max_by_key(|d| d.new_users) else {
            return;
        };
        // A flat window has no peak.
        if avg <= 0.0
            || peak.new_users < cfg.record_min_users
            || (peak.new_users as f64) <= cfg.record_ratio * avg
        {
            return;
        }
        out.push(Insight {
            kind: InsightKind::Info,
            priority: cfg.record_priority,
            text: format!(
                "Peak day {}: {} users, {} cats, {} shots",
                short_date(peak.date),
                format_count(peak.new_users as f64),
                format_count(peak.new_cats as f64),
                format_count(peak.shots as f64),
            ),
        });
    }

    fn stray_mix_candidate(&self, window: &[DailyMetric], out: &mut Vec<Insight>) {
        let cfg = self.config;
        let cats: u64 = window.iter().map(|d| d.new_cats).sum();
        if cats == 0 {
            return;
        }
        let stray: u64 = window.iter().map(|d| d.new_cats_stray).sum();
        let pct = stray as f64 / cats as f64 * 100.0;
        let text = if pct > cfg.stray_high_pct {
            format!("{pct:.0}% strays globally — high street cat population")
        } else if pct < cfg.stray_low_pct {
            format!("Only {pct:.0}% strays globally — mostly home cats")
        } else {
            return;
        };
        out.push(Insight { kind: InsightKind::Info, priority: cfg.stray_priority, text });
    }

    fn photo_growth_candidate(&self, window: &[DailyMetric], out: &mut Vec<Insight>) {
        let cfg = self.config;
        let n = window.len();
        if n < cfg.photo_min_days {
            return;
        }
        let shots: Vec<f64> = window.iter().map(|d| d.shots as f64).collect();
        let q = (n / 4).max(1);
        let early = mean(&shots[..q]);
        let late = mean(&shots[n - q..]);
        if early <= 0.0 {
            return;
        }
        let change = (late - early) / early * 100.0;
        if change <= cfg.photo_growth_pct {
            return;
        }
        out.push(Insight {
            kind: InsightKind::Positive,
            priority: change * cfg.photo_weight,
            text: format!(
                "Photos globally: {}/day → {}/day (+{change:.0}%)",
                format_count(early),
                format_count(late),
            ),
        });
    }

    fn leader_candidates(&self, countries: &[(&GeoProfile, &[DailyMetric])], out: &mut Vec<Insight>) {
        let cfg = self.config;
        let totals: Vec<(&GeoProfile, u64, u64, u64)> = countries
            .iter()
            .map(|(p, s)| {
                let w = trailing(s, cfg.window_days);
                let users = w.iter().map(|d| d.new_users).sum();
                let cats = w.iter().map(|d| d.new_cats).sum();
                let shots = w.iter().map(|d| d.shots).sum();
                (*p, users, cats, shots)
            })
            .collect();

        if let Some((p, users, _, _)) = totals.iter().filter(|t| t.1 > 0).max_by_key(|t| t.1) {
            out.push(Insight {
                kind: InsightKind::Info,
                priority: (*users as f64).log2() * cfg.volume_leader_weight,
                text: format!(
                    "{} leads with {} new users in {} days",
                    p.name,
                    format_count(*users as f64),
                    cfg.window_days
                ),
            });
        }

        let engagement = totals
            .iter()
            .filter(|t| t.2 >= cfg.engagement_min_cats && t.2 > 0)
            .map(|(p, _, cats, shots)| (*p, *shots as f64 / *cats as f64, *cats))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((p, spc, cats)) = engagement {
            out.push(Insight {
                kind: InsightKind::Info,
                priority: spc * (cats as f64).log2() * cfg.engagement_leader_weight,
                text: format!("{}: {spc:.1} shots per cat, highest engagement", p.name),
            });
        }
    }

    /// Highest priority first, at most `max_picks`, at most
    /// `max_per_kind` of any one kind.
    pub fn select(&self, mut candidates: Vec<Insight>) -> Vec<Insight> {
        candidates.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        let mut picked: Vec<Insight> = Vec::with_capacity(self.config.max_picks);
        for candidate in candidates {
            if picked.len() >= self.config.max_picks {
                break;
            }
            let same_kind = picked.iter().filter(|p| p.kind == candidate.kind).count();
            if same_kind >= self.config.max_per_kind {
                continue;
            }
            picked.push(candidate);
        }
        picked
    }
}

// ── Formatting ───────────────────────────────────────────────────────────────

fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

fn date_range(from: NaiveDate, to: NaiveDate) -> String {
    format!("{} – {}", short_date(from), short_date(to))
}

/// `412`, `1.2K`, `3.4M`.
pub fn format_count(value: f64) -> String {
    let v = value.round();
    if v >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if v >= 1_000.0 {
        format!("{:.1}K", v / 1_000.0)
    } else {
        format!("{v:.0}")
    }
}
