//! The generated world: every series, pyramid and retention curve,
//! built once from one seed and read-only afterwards.
//!
//! DRAW ORDER (one shared stream, never reorder):
//!   1. global series      (dips, then per-day draws)
//!   2. country series     (day-major, catalog order)
//!   3. global pyramid
//!   4. country pyramids   (catalog order)
//!   5. global retention   (ALL, iOS, Android)
//!   6. country retention  (catalog order)
//!
//! Filters and insights only read from a `GeneratedWorld`; nothing
//! mutates it after construction, so one world can be shared freely
//! across threads.

use crate::{
    config::EngineConfig,
    country_series::{reduce_to_global, CountrySeriesGenerator},
    demographics::{country_pyramid, global_pyramid, sum_pyramids, Pyramid},
    error::{EngineError, EngineResult},
    geo::{Continent, GeoProfile, COUNTRIES},
    global_series::GlobalSeriesGenerator,
    metric::{sum_series, total_users, DailyMetric, Series},
    retention::{country_curves, global_curves, PlatformCurves},
    rng::WorldRng,
};

#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    pub config: EngineConfig,
    pub catalog: Vec<GeoProfile>,
    pub global: Series,
    /// Aligned with `catalog`.
    pub countries: Vec<Series>,
    pub global_pyramid: Pyramid,
    /// Aligned with `catalog`.
    pub country_pyramids: Vec<Pyramid>,
    pub global_retention: PlatformCurves,
    /// Aligned with `catalog`.
    pub country_retention: Vec<PlatformCurves>,
}

impl GeneratedWorld {
    /// Generate the full world from `config`. Fails only on an invalid
    /// config.
    pub fn generate(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let catalog = COUNTRIES.to_vec();
        let mut rng = WorldRng::new(config.seed).with_name("world");

        let global = GlobalSeriesGenerator::new(&config.global, config.horizon_days, config.end_date)
            .generate(&mut rng);
        log::debug!("{}: global series done after {} draws", rng.name, rng.draws());

        let countries = CountrySeriesGenerator::new(&config.country, &catalog).generate(&global, &mut rng);
        log::debug!("{}: country series done after {} draws", rng.name, rng.draws());

        let world = Self::finish(config, catalog, global, countries, rng)?;
        log::info!(
            "world generated: seed={} days={} countries={} users={}",
            world.config.seed,
            world.global.len(),
            world.catalog.len(),
            total_users(&world.global),
        );
        Ok(world)
    }

    /// Build a world around caller-supplied series, e.g. small synthetic
    /// worlds in tests. Pyramids and retention curves are still drawn
    /// from `config.seed`. Every series must be date-aligned with
    /// `global`.
    pub fn from_parts(
        config: EngineConfig,
        catalog: Vec<GeoProfile>,
        global: Series,
        countries: Vec<Series>,
    ) -> EngineResult<Self> {
        if catalog.len() != countries.len() {
            return Err(EngineError::invalid(format!(
                "{} catalog entries but {} country series",
                catalog.len(),
                countries.len()
            )));
        }
        for (profile, series) in catalog.iter().zip(&countries) {
            let aligned = series.len() == global.len()
                && series.iter().zip(&global).all(|(c, g)| c.date == g.date);
            if !aligned {
                return Err(EngineError::invalid(format!(
                    "series for {} is not date-aligned with the global series",
                    profile.code
                )));
            }
        }
        let rng = WorldRng::new(config.seed).with_name("world-parts");
        Self::finish(config, catalog, global, countries, rng)
    }

    fn finish(
        config: EngineConfig,
        catalog: Vec<GeoProfile>,
        global: Series,
        countries: Vec<Series>,
        mut rng: WorldRng,
    ) -> EngineResult<Self> {
        let global_pyramid = global_pyramid(&mut rng);
        let country_pyramids: Vec<Pyramid> = catalog
            .iter()
            .map(|profile| country_pyramid(profile, &mut rng))
            .collect();
        log::debug!("{}: pyramids done after {} draws", rng.name, rng.draws());

        let global_retention = global_curves(&mut rng);
        let country_retention: Vec<PlatformCurves> =
            catalog.iter().map(|_| country_curves(&mut rng)).collect();
        log::debug!("{}: retention done after {} draws", rng.name, rng.draws());

        Ok(Self {
            config,
            catalog,
            global,
            countries,
            global_pyramid,
            country_pyramids,
            global_retention,
            country_retention,
        })
    }

    pub fn days(&self) -> usize {
        self.global.len()
    }

    pub fn country_index(&self, code: &str) -> Option<usize> {
        self.catalog.iter().position(|c| c.code == code)
    }

    pub fn country_series(&self, code: &str) -> Option<&[DailyMetric]> {
        self.country_index(code).map(|i| self.countries[i].as_slice())
    }

    /// Catalog indices of the countries on `continent`.
    pub fn continent_members(&self, continent: Continent) -> Vec<usize> {
        self.catalog
            .iter()
            .enumerate()
            .filter(|(_, c)| c.continent == continent)
            .map(|(i, _)| i)
            .collect()
    }

    /// Elementwise sum of a continent's country series, dauMau averaged.
    pub fn continent_series(&self, continent: Continent) -> Series {
        let members: Vec<&[DailyMetric]> = self
            .continent_members(continent)
            .into_iter()
            .map(|i| self.countries[i].as_slice())
            .collect();
        sum_series(&members)
    }

    pub fn continent_pyramid(&self, continent: Continent) -> Pyramid {
        sum_pyramids(
            self.continent_members(continent)
                .into_iter()
                .map(|i| &self.country_pyramids[i]),
        )
    }

    /// Global-equivalent series rebuilt from the countries. Users match
    /// the global series exactly; the other fields diverge.
    pub fn sum_countries(&self) -> Series {
        reduce_to_global(&self.countries)
    }
}
