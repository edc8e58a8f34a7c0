use crate::{
    error::{EngineError, EngineResult},
    rng::WorldRng,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A clamped normal coefficient: `clamp(normal(mean, sd), lo, hi)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClampedNormal {
    pub mean: f64,
    pub sd: f64,
    pub lo: f64,
    pub hi: f64,
}

impl ClampedNormal {
    pub const fn new(mean: f64, sd: f64, lo: f64, hi: f64) -> Self {
        Self { mean, sd, lo, hi }
    }

    pub fn draw(&self, rng: &mut WorldRng) -> f64 {
        rng.clamped_normal(self.mean, self.sd, self.lo, self.hi)
    }

    fn validate(&self, what: &str) -> EngineResult<()> {
        if !(self.sd > 0.0) || !(self.lo <= self.hi) {
            return Err(EngineError::invalid(format!(
                "{what}: needs sd > 0 and lo <= hi (sd={}, lo={}, hi={})",
                self.sd, self.lo, self.hi
            )));
        }
        Ok(())
    }
}

/// Uniform range `[min, max)` for floats, `[min, max]` for counts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn draw(&self, rng: &mut WorldRng) -> f64 {
        rng.uniform(self.min, self.max)
    }

    pub fn draw_int(&self, rng: &mut WorldRng) -> i64 {
        rng.int_range(self.min as i64, self.max as i64)
    }

    fn validate(&self, what: &str) -> EngineResult<()> {
        if !(self.min <= self.max) {
            return Err(EngineError::invalid(format!(
                "{what}: min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

// ── Global curve ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalCurveConfig {
    pub growth_base: f64,
    pub growth_amplitude: f64,
    /// Must be > 1 for a super-linear curve.
    pub growth_exponent: f64,
    pub seasonal_annual: f64,
    pub seasonal_semiannual: f64,
    pub weekend_bonus: Span,
    pub spike_probability: f64,
    pub spike_multiplier: Span,
    pub dip_count: Span,
    pub dip_half_width: Span,
    /// Multiplier at the bottom of a dip.
    pub dip_depth: Span,
    pub dip_floor: f64,
    /// Dip centres stay this many days away from both ends.
    pub dip_edge_margin: usize,
    pub noise: Span,
    pub user_floor: u64,
    pub cats_per_user: ClampedNormal,
    pub shots_per_cat: ClampedNormal,
    pub ios_share: ClampedNormal,
    pub stray_share: ClampedNormal,
    pub dau_mau_floor: f64,
    pub dau_mau_slope: f64,
    pub dau_mau_noise_sd: f64,
    pub dau_mau_band: Span,
}

impl Default for GlobalCurveConfig {
    fn default() -> Self {
        Self {
            growth_base: 30.0,
            growth_amplitude: 190.0,
            growth_exponent: 1.25,
            seasonal_annual: 0.10,
            seasonal_semiannual: 0.05,
            weekend_bonus: Span::new(1.10, 1.18),
            spike_probability: 0.02,
            spike_multiplier: Span::new(1.25, 1.85),
            dip_count: Span::new(6.0, 8.0),
            dip_half_width: Span::new(4.0, 12.0),
            dip_depth: Span::new(0.60, 0.85),
            dip_floor: 0.45,
            dip_edge_margin: 30,
            noise: Span::new(0.88, 1.16),
            user_floor: 5,
            cats_per_user: ClampedNormal::new(2.2, 0.8, 0.5, 5.0),
            shots_per_cat: ClampedNormal::new(4.5, 2.0, 1.0, 10.0),
            ios_share: ClampedNormal::new(0.38, 0.10, 0.12, 0.70),
            stray_share: ClampedNormal::new(0.62, 0.12, 0.30, 0.85),
            dau_mau_floor: 0.12,
            dau_mau_slope: 0.14,
            dau_mau_noise_sd: 0.015,
            dau_mau_band: Span::new(0.06, 0.42),
        }
    }
}

// ── Country distribution ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryNoiseConfig {
    pub weight_multiplier: ClampedNormal,
    pub cats_per_user_sd: f64,
    pub cats_per_user_bounds: Span,
    pub shots_per_cat_sd: f64,
    pub shots_per_cat_bounds: Span,
    pub ios_share_sd: f64,
    pub ios_share_bounds: Span,
    pub stray_share_sd: f64,
    pub stray_share_bounds: Span,
    pub dau_mau_multiplier: ClampedNormal,
    pub dau_mau_band: Span,
}

impl Default for CountryNoiseConfig {
    fn default() -> Self {
        Self {
            weight_multiplier: ClampedNormal::new(1.0, 0.18, 0.5, 1.6),
            cats_per_user_sd: 0.6,
            cats_per_user_bounds: Span::new(0.5, 5.0),
            shots_per_cat_sd: 1.5,
            shots_per_cat_bounds: Span::new(1.0, 10.0),
            ios_share_sd: 0.08,
            ios_share_bounds: Span::new(0.02, 0.95),
            stray_share_sd: 0.15,
            stray_share_bounds: Span::new(0.10, 0.95),
            dau_mau_multiplier: ClampedNormal::new(1.0, 0.1, 0.5, 1.5),
            dau_mau_band: Span::new(0.03, 0.45),
        }
    }
}

impl CountryNoiseConfig {
    pub fn cats_per_user(&self, mean: f64) -> ClampedNormal {
        ClampedNormal::new(mean, self.cats_per_user_sd, self.cats_per_user_bounds.min, self.cats_per_user_bounds.max)
    }

    pub fn shots_per_cat(&self, mean: f64) -> ClampedNormal {
        ClampedNormal::new(mean, self.shots_per_cat_sd, self.shots_per_cat_bounds.min, self.shots_per_cat_bounds.max)
    }

    pub fn ios_share(&self, mean: f64) -> ClampedNormal {
        ClampedNormal::new(mean, self.ios_share_sd, self.ios_share_bounds.min, self.ios_share_bounds.max)
    }

    pub fn stray_share(&self, mean: f64) -> ClampedNormal {
        ClampedNormal::new(mean, self.stray_share_sd, self.stray_share_bounds.min, self.stray_share_bounds.max)
    }
}

// ── Insight scoring ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Trailing days scanned. Independent of any active filter.
    pub window_days: usize,
    pub min_country_history: usize,
    pub min_window_days: usize,
    pub min_avg_volume: f64,
    pub max_half_width: usize,
    pub min_before_avg: f64,
    /// Percent increase that qualifies as a spike.
    pub spike_threshold_pct: f64,
    /// Percent change (negative) that qualifies as a dip.
    pub dip_threshold_pct: f64,
    pub spike_priority: f64,
    pub dip_priority: f64,
    pub second_spike_priority: f64,
    pub magnitude_weight: f64,
    pub dau_mau_min_days: usize,
    pub dau_mau_min_early: f64,
    pub dau_mau_threshold_pct: f64,
    pub dau_mau_weight: f64,
    pub record_min_days: usize,
    /// The peak must exceed `record_ratio` × the window average.
    pub record_ratio: f64,
    pub record_min_users: u64,
    pub record_priority: f64,
    pub stray_low_pct: f64,
    pub stray_high_pct: f64,
    pub stray_priority: f64,
    pub photo_min_days: usize,
    pub photo_growth_pct: f64,
    pub photo_weight: f64,
    pub leaders_enabled: bool,
    pub volume_leader_weight: f64,
    pub engagement_leader_weight: f64,
    pub engagement_min_cats: u64,
    pub max_picks: usize,
    pub max_per_kind: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            min_country_history: 14,
            min_window_days: 10,
            min_avg_volume: 5.0,
            max_half_width: 5,
            min_before_avg: 3.0,
            spike_threshold_pct: 50.0,
            dip_threshold_pct: -30.0,
            spike_priority: 80.0,
            dip_priority: 70.0,
            second_spike_priority: 50.0,
            magnitude_weight: 0.1,
            dau_mau_min_days: 7,
            dau_mau_min_early: 0.01,
            dau_mau_threshold_pct: 8.0,
            dau_mau_weight: 0.8,
            record_min_days: 3,
            record_ratio: 1.0,
            record_min_users: 10,
            record_priority: 30.0,
            stray_low_pct: 25.0,
            stray_high_pct: 70.0,
            stray_priority: 20.0,
            photo_min_days: 14,
            photo_growth_pct: 40.0,
            photo_weight: 0.5,
            leaders_enabled: false,
            volume_leader_weight: 8.0,
            engagement_leader_weight: 2.0,
            engagement_min_cats: 50,
            max_picks: 3,
            max_per_kind: 2,
        }
    }
}

// ── Engagement multipliers ─────────────────────────────────────────

/// Extra shot multipliers applied on top of the platform and
/// content-type ratios. 1.0 leaves shots proportional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngagementConfig {
    pub ios: f64,
    pub android: f64,
    pub stray: f64,
    pub home: f64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self { ios: 1.0, android: 1.0, stray: 1.0, home: 1.0 }
    }
}

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed: u64,
    pub horizon_days: usize,
    /// Last (most recent) day of every series.
    pub end_date: NaiveDate,
    pub global: GlobalCurveConfig,
    pub country: CountryNoiseConfig,
    pub insights: InsightConfig,
    pub engagement: EngagementConfig,
}

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_HORIZON_DAYS: usize = 548;
/// About a century of days.
pub const MAX_HORIZON_DAYS: usize = 36_525;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            horizon_days: DEFAULT_HORIZON_DAYS,
            end_date: default_end_date(),
            global: GlobalCurveConfig::default(),
            country: CountryNoiseConfig::default(),
            insights: InsightConfig::default(),
            engagement: EngagementConfig::default(),
        }
    }
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 10).unwrap_or(NaiveDate::MIN)
}

impl EngineConfig {
    /// Load from a JSON file. Fields missing from the file keep their
    /// defaults. In tests, use `EngineConfig::default_test()`.
    pub fn load(path: &str) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Short-horizon config for fast tests.
    pub fn default_test() -> Self {
        Self {
            horizon_days: 120,
            global: GlobalCurveConfig {
                dip_count: Span::new(2.0, 3.0),
                dip_edge_margin: 10,
                ..GlobalCurveConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject configs that would make generation meaningless.
    pub fn validate(&self) -> EngineResult<()> {
        if self.horizon_days == 0 {
            return Err(EngineError::invalid("horizon_days must be > 0"));
        }
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(EngineError::invalid(format!(
                "horizon_days must be <= {MAX_HORIZON_DAYS} (got {})",
                self.horizon_days
            )));
        }
        // The first day of the horizon must be a representable date.
        if self
            .end_date
            .checked_sub_signed(Duration::days(self.horizon_days as i64 - 1))
            .is_none()
        {
            return Err(EngineError::invalid(format!(
                "a {}-day horizon ending {} starts before the earliest date",
                self.horizon_days, self.end_date
            )));
        }
        let g = &self.global;
        if !(g.growth_exponent > 1.0) {
            return Err(EngineError::invalid("growth_exponent must be > 1"));
        }
        if !(0.0..=1.0).contains(&g.spike_probability) {
            return Err(EngineError::invalid("spike_probability must be in [0, 1]"));
        }
        if g.dip_half_width.min < 1.0 {
            return Err(EngineError::invalid("dip_half_width must be >= 1 day"));
        }
        if g.dip_count.min < 0.0 {
            return Err(EngineError::invalid("dip_count must be >= 0"));
        }
        for (what, span) in [
            ("weekend_bonus", g.weekend_bonus),
            ("spike_multiplier", g.spike_multiplier),
            ("dip_count", g.dip_count),
            ("dip_half_width", g.dip_half_width),
            ("dip_depth", g.dip_depth),
            ("noise", g.noise),
            ("dau_mau_band", g.dau_mau_band),
            ("country.dau_mau_band", self.country.dau_mau_band),
        ] {
            span.validate(what)?;
        }
        for (what, coeff) in [
            ("cats_per_user", g.cats_per_user),
            ("shots_per_cat", g.shots_per_cat),
            ("ios_share", g.ios_share),
            ("stray_share", g.stray_share),
            ("country.weight_multiplier", self.country.weight_multiplier),
            ("country.dau_mau_multiplier", self.country.dau_mau_multiplier),
            ("country.cats_per_user", self.country.cats_per_user(1.0)),
            ("country.shots_per_cat", self.country.shots_per_cat(1.0)),
            ("country.ios_share", self.country.ios_share(0.5)),
            ("country.stray_share", self.country.stray_share(0.5)),
        ] {
            coeff.validate(what)?;
        }
        if self.country.weight_multiplier.lo <= 0.0 {
            return Err(EngineError::invalid("country weight multiplier must stay > 0"));
        }
        if self.insights.window_days < 2 {
            return Err(EngineError::invalid("insights.window_days must be >= 2"));
        }
        Ok(())
    }
}
