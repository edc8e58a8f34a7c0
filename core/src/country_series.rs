//! Per-country daily series derived from the global series.
//!
//! Generation is day-major. For each day: one weight multiplier per
//! country (catalog order), a largest-remainder split of the day's
//! global users, then per country (catalog order): cats/user, shots/cat,
//! iOS share, stray share, dauMau multiplier.

use crate::{
    config::CountryNoiseConfig,
    distribute::{distribute, split_pair},
    geo::GeoProfile,
    metric::{sum_series, DailyMetric, Series},
    rng::WorldRng,
};

pub struct CountrySeriesGenerator<'a> {
    config: &'a CountryNoiseConfig,
    catalog: &'a [GeoProfile],
}

impl<'a> CountrySeriesGenerator<'a> {
    pub fn new(config: &'a CountryNoiseConfig, catalog: &'a [GeoProfile]) -> Self {
        Self { config, catalog }
    }

    /// One series per catalog entry, in catalog order, date-aligned with
    /// `global`. For every day the countries' `new_users` sum to the
    /// global day's `new_users` exactly.
    pub fn generate(&self, global: &[DailyMetric], rng: &mut WorldRng) -> Vec<Series> {
        let weight_sum: f64 = self.catalog.iter().map(|c| c.user_weight.max(0.0)).sum();
        let mut out: Vec<Series> = self
            .catalog
            .iter()
            .map(|_| Vec::with_capacity(global.len()))
            .collect();

        for day in global {
            let shares: Vec<f64> = self
                .catalog
                .iter()
                .map(|c| {
                    let base = if weight_sum > 0.0 { c.user_weight.max(0.0) / weight_sum } else { 0.0 };
                    base * self.config.weight_multiplier.draw(rng)
                })
                .collect();
            let users_by_country = distribute(day.new_users, &shares);

            for ((profile, users), series) in self
                .catalog
                .iter()
                .zip(users_by_country)
                .zip(out.iter_mut())
            {
                series.push(self.country_day(profile, day, users, rng));
            }
        }

        out
    }

    fn country_day(
        &self,
        profile: &GeoProfile,
        global_day: &DailyMetric,
        users: u64,
        rng: &mut WorldRng,
    ) -> DailyMetric {
        let cfg = self.config;
        let cats = (users as f64 * cfg.cats_per_user(profile.cats_per_user).draw(rng)).round() as u64;
        let shots = (cats as f64 * cfg.shots_per_cat(profile.shots_per_cat).draw(rng)).round() as u64;
        let (ios, android) = split_pair(users, cfg.ios_share(profile.ios_share).draw(rng));
        let (stray, home) = split_pair(cats, cfg.stray_share(profile.stray_share).draw(rng));
        let dau_mau = (global_day.dau_mau * cfg.dau_mau_multiplier.draw(rng))
            .clamp(cfg.dau_mau_band.min, cfg.dau_mau_band.max);

        DailyMetric {
            date: global_day.date,
            new_users: users,
            new_users_ios: ios,
            new_users_android: android,
            new_cats: cats,
            new_cats_stray: stray,
            new_cats_home: home,
            shots,
            dau_mau,
        }
    }
}

/// Sum country series back into a global-equivalent series.
///
/// `new_users` matches the source global series exactly; the other
/// fields come from independent country draws and diverge from it.
pub fn reduce_to_global(countries: &[Series]) -> Series {
    let members: Vec<&[DailyMetric]> = countries.iter().map(|s| s.as_slice()).collect();
    sum_series(&members)
}
