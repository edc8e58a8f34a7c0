//! Filter resolution and aggregation.
//!
//! Resolution order: geography → period → platform → content type.
//! Every function here is a pure read over a `GeneratedWorld`.

use crate::{
    config::EngagementConfig,
    demographics::{AgeSexBucket, Pyramid},
    distribute::distribute,
    filter::{CatType, Filter, Period, Platform},
    geo::Continent,
    metric::{mean, pct_change, total_cats, total_shots, total_users, trailing, DailyMetric, Series},
    retention::RetentionCurve,
    world::GeneratedWorld,
};
use chrono::Datelike;
use serde::Serialize;
use std::borrow::Cow;

/// Monthly buckets kept for the `Y` period.
pub const YEAR_MONTHS: usize = 12;

const HOURS: usize = 24;
const HOUR_PEAK: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kpi<T> {
    pub value: T,
    /// Percent change against the previous period; `None` when there is
    /// no comparable previous window or its value is zero.
    pub change: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub users: Kpi<u64>,
    pub cats: Kpi<u64>,
    pub shots: Kpi<u64>,
    pub dau_mau: Kpi<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBucket {
    pub label: String,
    pub new_users: u64,
    pub new_users_ios: u64,
    pub new_users_android: u64,
    pub new_cats: u64,
    pub new_cats_stray: u64,
    pub new_cats_home: u64,
    pub shots: u64,
    pub dau_mau: f64,
}

impl ChartBucket {
    fn from_day(label: String, d: &DailyMetric) -> Self {
        Self {
            label,
            new_users: d.new_users,
            new_users_ios: d.new_users_ios,
            new_users_android: d.new_users_android,
            new_cats: d.new_cats,
            new_cats_stray: d.new_cats_stray,
            new_cats_home: d.new_cats_home,
            shots: d.shots,
            dau_mau: d.dau_mau,
        }
    }
}

/// Heatmap feed: one row per catalog country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryTotals {
    pub code: &'static str,
    pub name: &'static str,
    pub continent: Continent,
    pub users: u64,
    pub cats: u64,
    pub shots: u64,
}

/// Everything a dashboard needs for one filter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub filter: Filter,
    pub series: Series,
    pub kpis: KpiSummary,
    pub chart: Vec<ChartBucket>,
    pub age_sex: Pyramid,
    pub retention: RetentionCurve,
    pub countries: Vec<CountryTotals>,
}

pub struct Aggregator<'w> {
    world: &'w GeneratedWorld,
}

impl<'w> Aggregator<'w> {
    pub fn new(world: &'w GeneratedWorld) -> Self {
        Self { world }
    }

    fn engagement(&self) -> &EngagementConfig {
        &self.world.config.engagement
    }

    /// Country series if a country is selected, else the continent sum,
    /// else the canonical global series.
    pub fn resolve_geography(&self, filter: &Filter) -> Cow<'w, [DailyMetric]> {
        if let Some(series) = filter.country.and_then(|code| self.world.country_series(code)) {
            return Cow::Borrowed(series);
        }
        if let Some(continent) = filter.continent {
            return Cow::Owned(self.world.continent_series(continent));
        }
        Cow::Borrowed(self.world.global.as_slice())
    }

    fn transform(&self, window: &[DailyMetric], filter: &Filter) -> Series {
        window
            .iter()
            .map(|d| {
                let d = apply_platform(d, filter.platform, self.engagement());
                apply_cat_type(&d, filter.cat_type, self.engagement())
            })
            .collect()
    }

    /// The filtered series for the current period.
    pub fn filter_series(&self, filter: &Filter) -> Series {
        let source = self.resolve_geography(filter);
        let days = filter.period.days(source.len());
        self.transform(trailing(&source, days), filter)
    }

    /// The same-length window immediately before the current one, with
    /// the same platform and content-type transforms. `None` when the
    /// source is shorter than two periods.
    pub fn previous_period(&self, filter: &Filter) -> Option<Series> {
        let source = self.resolve_geography(filter);
        let days = filter.period.days(source.len());
        if days == 0 || source.len() < days * 2 {
            return None;
        }
        let end = source.len() - days;
        Some(self.transform(&source[end - days..end], filter))
    }

    /// Age/sex pyramid for the filter. The base pyramid only supplies
    /// relative weights; the filtered user total is what gets split.
    pub fn age_sex(&self, filter: &Filter, filtered: &[DailyMetric]) -> Pyramid {
        let base: Cow<'_, Pyramid> = match (filter.country.and_then(|c| self.world.country_index(c)), filter.continent) {
            (Some(i), _) => Cow::Borrowed(&self.world.country_pyramids[i]),
            (None, Some(continent)) => Cow::Owned(self.world.continent_pyramid(continent)),
            (None, None) => Cow::Borrowed(&self.world.global_pyramid),
        };
        redistribute_pyramid(&base, total_users(filtered))
    }

    pub fn retention(&self, filter: &Filter) -> &'w RetentionCurve {
        match filter.country.and_then(|c| self.world.country_index(c)) {
            Some(i) => self.world.country_retention[i].get(filter.platform),
            None => self.world.global_retention.get(filter.platform),
        }
    }

    /// Per-country totals over the filter's period, with platform and
    /// content-type transforms applied. Geography does not remove rows.
    pub fn country_totals(&self, filter: &Filter) -> Vec<CountryTotals> {
        self.world
            .catalog
            .iter()
            .zip(&self.world.countries)
            .map(|(profile, series)| {
                let days = filter.period.days(series.len());
                let window = self.transform(trailing(series, days), filter);
                CountryTotals {
                    code: profile.code,
                    name: profile.name,
                    continent: profile.continent,
                    users: total_users(&window),
                    cats: total_cats(&window),
                    shots: total_shots(&window),
                }
            })
            .collect()
    }

    pub fn dashboard(&self, filter: &Filter) -> DashboardView {
        let series = self.filter_series(filter);
        let previous = self.previous_period(filter);
        let kpis = compute_kpis(&series, previous.as_deref());
        let chart = chart_buckets(&series, filter.period);
        let age_sex = self.age_sex(filter, &series);
        let retention = self.retention(filter).clone();
        let countries = self.country_totals(filter);
        log::debug!(
            "dashboard: period={} days={} users={} prev={}",
            filter.period.token(),
            series.len(),
            kpis.users.value,
            previous.as_ref().map_or(0, |p| p.len()),
        );
        DashboardView { filter: *filter, series, kpis, chart, age_sex, retention, countries }
    }
}

fn scale(value: u64, ratio: f64) -> u64 {
    (value as f64 * ratio).round().max(0.0) as u64
}

/// Keep only the selected platform's share of the day.
pub fn apply_platform(d: &DailyMetric, platform: Platform, engagement: &EngagementConfig) -> DailyMetric {
    let (selected, boost) = match platform {
        Platform::All => return d.clone(),
        Platform::Ios => (d.new_users_ios, engagement.ios),
        Platform::Android => (d.new_users_android, engagement.android),
    };
    let denom = d.new_users_ios + d.new_users_android;
    let ratio = if denom > 0 { selected as f64 / denom as f64 } else { 0.0 };

    DailyMetric {
        date: d.date,
        new_users: scale(d.new_users, ratio),
        new_users_ios: if platform == Platform::Ios { selected } else { 0 },
        new_users_android: if platform == Platform::Android { selected } else { 0 },
        new_cats: scale(d.new_cats, ratio),
        new_cats_stray: scale(d.new_cats_stray, ratio),
        new_cats_home: scale(d.new_cats_home, ratio),
        shots: scale(d.shots, ratio * boost),
        dau_mau: d.dau_mau,
    }
}

/// Keep only the selected content type's share of cats and shots.
pub fn apply_cat_type(d: &DailyMetric, cat_type: CatType, engagement: &EngagementConfig) -> DailyMetric {
    let (selected, boost) = match cat_type {
        CatType::All => return d.clone(),
        CatType::Stray => (d.new_cats_stray, engagement.stray),
        CatType::Home => (d.new_cats_home, engagement.home),
    };
    let denom = d.new_cats_stray + d.new_cats_home;
    let ratio = if denom > 0 { selected as f64 / denom as f64 } else { 0.0 };

    // The selected type is the whole cat count of the view.
    DailyMetric {
        new_cats: selected,
        new_cats_stray: if cat_type == CatType::Stray { selected } else { 0 },
        new_cats_home: if cat_type == CatType::Home { selected } else { 0 },
        shots: scale(d.shots, ratio * boost),
        ..d.clone()
    }
}

pub fn compute_kpis(current: &[DailyMetric], previous: Option<&[DailyMetric]>) -> KpiSummary {
    let users = total_users(current);
    let cats = total_cats(current);
    let shots = total_shots(current);
    let dau_mau = avg_dau_mau(current);

    let change = |curr: f64, prev: Option<f64>| prev.and_then(|p| pct_change(curr, p));
    let prev_users = previous.map(|p| total_users(p) as f64);
    let prev_cats = previous.map(|p| total_cats(p) as f64);
    let prev_shots = previous.map(|p| total_shots(p) as f64);
    let prev_dau_mau = previous.filter(|p| !p.is_empty()).map(avg_dau_mau);

    KpiSummary {
        users: Kpi { value: users, change: change(users as f64, prev_users) },
        cats: Kpi { value: cats, change: change(cats as f64, prev_cats) },
        shots: Kpi { value: shots, change: change(shots as f64, prev_shots) },
        dau_mau: Kpi { value: dau_mau, change: change(dau_mau, prev_dau_mau) },
    }
}

fn avg_dau_mau(series: &[DailyMetric]) -> f64 {
    let values: Vec<f64> = series.iter().map(|d| d.dau_mau).collect();
    mean(&values)
}

/// Relative traffic per hour: flat overnight, peaking mid-afternoon.
pub fn hourly_weights() -> [f64; HOURS] {
    let mut weights = [0.0; HOURS];
    for (h, w) in weights.iter_mut().enumerate() {
        let dist = h as f64 - HOUR_PEAK;
        *w = 0.3 + 0.7 * (-0.03 * dist * dist).exp();
    }
    weights
}

/// Chart buckets for the period: hourly for `D`, daily for `W`/`M`,
/// monthly for `Y` (last 12 months) and `ALL`.
pub fn chart_buckets(series: &[DailyMetric], period: Period) -> Vec<ChartBucket> {
    match period {
        Period::Day => series.last().map(hourly_buckets).unwrap_or_default(),
        Period::Week | Period::Month => series
            .iter()
            .map(|d| ChartBucket::from_day(d.date.format("%m-%d").to_string(), d))
            .collect(),
        Period::Year => {
            let months = monthly_buckets(series);
            let skip = months.len().saturating_sub(YEAR_MONTHS);
            months.into_iter().skip(skip).collect()
        }
        Period::All => monthly_buckets(series),
    }
}

/// Split one day into 24 buckets. Each additive field is apportioned
/// with largest remainder, so the hours sum back to the day exactly.
fn hourly_buckets(day: &DailyMetric) -> Vec<ChartBucket> {
    let weights = hourly_weights();
    let split = |v: u64| distribute(v, &weights);
    let users = split(day.new_users);
    let ios = split(day.new_users_ios);
    let android = split(day.new_users_android);
    let cats = split(day.new_cats);
    let stray = split(day.new_cats_stray);
    let home = split(day.new_cats_home);
    let shots = split(day.shots);

    (0..HOURS)
        .map(|h| ChartBucket {
            label: format!("{h}:00"),
            new_users: users[h],
            new_users_ios: ios[h],
            new_users_android: android[h],
            new_cats: cats[h],
            new_cats_stray: stray[h],
            new_cats_home: home[h],
            shots: shots[h],
            dau_mau: day.dau_mau,
        })
        .collect()
}

fn monthly_buckets(series: &[DailyMetric]) -> Vec<ChartBucket> {
    let mut months: Vec<((i32, u32), DailyMetric, usize)> = Vec::new();
    for d in series {
        let key = (d.date.year(), d.date.month());
        let same_month = months.last().is_some_and(|(k, _, _)| *k == key);
        if !same_month {
            months.push((key, d.clone(), 1));
            continue;
        }
        if let Some((_, acc, count)) = months.last_mut() {
            acc.add_counts(d);
            acc.dau_mau += d.dau_mau;
            *count += 1;
        }
    }
    months
        .into_iter()
        .map(|(_, mut acc, count)| {
            acc.dau_mau /= count as f64;
            ChartBucket::from_day(acc.date.format("%y-%m").to_string(), &acc)
        })
        .collect()
}

/// Spread `total` users over the age bands of `base` (used as weights),
/// then split each band into male/female by the band's own weights.
pub fn redistribute_pyramid(base: &[AgeSexBucket], total: u64) -> Pyramid {
    let band_weights: Vec<f64> = base.iter().map(|b| b.total() as f64).collect();
    let band_totals = distribute(total, &band_weights);

    base.iter()
        .zip(band_totals)
        .map(|(bucket, band_total)| {
            let parts = distribute(band_total, &[bucket.male as f64, bucket.female as f64]);
            AgeSexBucket {
                age_group: bucket.age_group,
                male: parts[0],
                female: parts[1],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(users: u64, ios: u64, cats: u64, stray: u64, shots: u64) -> DailyMetric {
        DailyMetric {
            date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            new_users: users,
            new_users_ios: ios,
            new_users_android: users - ios,
            new_cats: cats,
            new_cats_stray: stray,
            new_cats_home: cats - stray,
            shots,
            dau_mau: 0.25,
        }
    }

    #[test]
    fn platform_scaling_uses_user_ratio() {
        let d = day(50, 30, 120, 80, 600);
        let ios = apply_platform(&d, Platform::Ios, &EngagementConfig::default());
        assert_eq!(ios.new_users, 30);
        assert_eq!(ios.new_users_ios, 30);
        assert_eq!(ios.new_users_android, 0);
        assert_eq!(ios.new_cats, 72);
        assert_eq!(ios.shots, 360);
    }

    #[test]
    fn zero_denominator_zeroes_the_day() {
        let d = day(0, 0, 10, 4, 50);
        let android = apply_platform(&d, Platform::Android, &EngagementConfig::default());
        assert_eq!((android.new_users, android.new_cats, android.shots), (0, 0, 0));

        let no_cats = day(10, 5, 0, 0, 0);
        let stray = apply_cat_type(&no_cats, CatType::Stray, &EngagementConfig::default());
        assert_eq!((stray.new_cats, stray.shots), (0, 0));
        assert_eq!(stray.new_users, 10);
    }

    #[test]
    fn cat_type_scales_cats_and_shots_only() {
        let d = day(50, 30, 100, 25, 400);
        let home = apply_cat_type(&d, CatType::Home, &EngagementConfig::default());
        assert_eq!(home.new_users, 50);
        assert_eq!(home.new_cats, 75);
        assert_eq!(home.new_cats_stray, 0);
        assert_eq!(home.new_cats_home, 75);
        assert_eq!(home.shots, 300);
    }

    #[test]
    fn stray_view_after_platform_keeps_cats_equal_to_strays() {
        let engagement = EngagementConfig::default();
        // A third of 7 cats rounds to 2, but the type split rounds to 2 + 1.
        let ios = apply_platform(&day(3, 1, 7, 5, 40), Platform::Ios, &engagement);
        assert_eq!((ios.new_cats, ios.new_cats_stray, ios.new_cats_home), (2, 2, 1));

        let stray = apply_cat_type(&ios, CatType::Stray, &engagement);
        assert_eq!(stray.new_cats, 2);
        assert_eq!(stray.new_cats_stray, 2);
        assert_eq!(stray.new_cats_home, 0);
    }

    #[test]
    fn hourly_buckets_sum_to_the_day() {
        let d = day(100_003, 40_000, 977, 600, 4_321);
        let buckets = chart_buckets(std::slice::from_ref(&d), Period::Day);
        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets.iter().map(|b| b.new_users).sum::<u64>(), 100_003);
        assert_eq!(buckets.iter().map(|b| b.new_cats_stray).sum::<u64>(), 600);
        assert_eq!(buckets.iter().map(|b| b.shots).sum::<u64>(), 4_321);
        let peak = buckets.iter().max_by_key(|b| b.new_users).unwrap();
        assert_eq!(peak.label, "16:00");
    }

    #[test]
    fn pyramid_fallback_splits_evenly() {
        use crate::demographics::AgeGroup;
        let base: Vec<AgeSexBucket> = AgeGroup::ALL
            .iter()
            .map(|g| AgeSexBucket { age_group: *g, male: 0, female: 0 })
            .collect();
        let out = redistribute_pyramid(&base, 25);
        assert_eq!(out.iter().map(AgeSexBucket::total).sum::<u64>(), 25);
        assert!(out.iter().all(|b| b.male.abs_diff(b.female) <= 1));
    }
}
