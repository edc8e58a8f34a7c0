//! Static geographic catalog: continents and per-country behavioral
//! profiles that drive the shape of the generated data.

use crate::types::CountryCode;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Continent {
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    Europe,
    Asia,
    Africa,
    Oceania,
}

impl Continent {
    pub const ALL: [Continent; 6] = [
        Continent::NorthAmerica,
        Continent::SouthAmerica,
        Continent::Europe,
        Continent::Asia,
        Continent::Africa,
        Continent::Oceania,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NorthAmerica => "North America",
            Self::SouthAmerica => "South America",
            Self::Europe => "Europe",
            Self::Asia => "Asia",
            Self::Africa => "Africa",
            Self::Oceania => "Oceania",
        }
    }

    /// Exact display-name match. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Per-country behavioral coefficients. Immutable, defined once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoProfile {
    pub code: CountryCode,
    pub name: &'static str,
    pub continent: Continent,
    /// Relative user volume (USA = 100).
    pub user_weight: f64,
    pub cats_per_user: f64,
    pub shots_per_cat: f64,
    pub ios_share: f64,
    pub stray_share: f64,
}

const fn profile(
    code: CountryCode,
    name: &'static str,
    continent: Continent,
    user_weight: f64,
    cats_per_user: f64,
    shots_per_cat: f64,
    ios_share: f64,
    stray_share: f64,
) -> GeoProfile {
    GeoProfile { code, name, continent, user_weight, cats_per_user, shots_per_cat, ios_share, stray_share }
}

use Continent::*;

/// The fixed 25-country catalog. Order is part of the generation
/// contract: reordering changes every country's draws.
pub const COUNTRIES: [GeoProfile; 25] = [
    profile("USA", "United States",  NorthAmerica, 100.0, 2.5, 5.0, 0.58, 0.45),
    profile("CAN", "Canada",         NorthAmerica,  15.0, 2.0, 4.0, 0.56, 0.40),
    profile("MEX", "Mexico",         NorthAmerica,  20.0, 3.5, 7.5, 0.18, 0.72),
    profile("BRA", "Brazil",         SouthAmerica,  45.0, 3.2, 7.0, 0.20, 0.70),
    profile("ARG", "Argentina",      SouthAmerica,   8.0, 2.8, 6.0, 0.15, 0.66),
    profile("CHL", "Chile",          SouthAmerica,   4.0, 2.0, 4.5, 0.22, 0.62),
    profile("COL", "Colombia",       SouthAmerica,   7.0, 2.6, 5.0, 0.16, 0.68),
    profile("GBR", "United Kingdom", Europe,        30.0, 1.8, 4.0, 0.52, 0.30),
    profile("DEU", "Germany",        Europe,        25.0, 1.5, 3.5, 0.35, 0.25),
    profile("FRA", "France",         Europe,        22.0, 2.0, 4.5, 0.40, 0.38),
    profile("ESP", "Spain",          Europe,        15.0, 1.8, 4.0, 0.38, 0.55),
    profile("ITA", "Italy",          Europe,        17.0, 1.6, 3.8, 0.32, 0.60),
    profile("RUS", "Russia",         Europe,        28.0, 3.0, 6.0, 0.30, 0.64),
    profile("TUR", "Turkey",         Europe,        16.0, 4.5, 9.5, 0.22, 0.85),
    profile("IND", "India",          Asia,          80.0, 4.0, 8.0, 0.08, 0.80),
    profile("CHN", "China",          Asia,          60.0, 1.2, 3.0, 0.25, 0.50),
    profile("JPN", "Japan",          Asia,          35.0, 3.8, 9.0, 0.70, 0.48),
    profile("KOR", "South Korea",    Asia,          18.0, 2.8, 6.5, 0.30, 0.58),
    profile("IDN", "Indonesia",      Asia,          40.0, 3.8, 8.5, 0.10, 0.78),
    profile("THA", "Thailand",       Asia,          14.0, 3.5, 7.0, 0.25, 0.74),
    profile("PHL", "Philippines",    Asia,          13.0, 3.0, 7.0, 0.12, 0.76),
    profile("NGA", "Nigeria",        Africa,        10.0, 4.2, 9.0, 0.06, 0.82),
    profile("ZAF", "South Africa",   Africa,         6.0, 2.5, 5.5, 0.20, 0.60),
    profile("EGY", "Egypt",          Africa,         9.0, 3.8, 8.0, 0.12, 0.84),
    profile("AUS", "Australia",      Oceania,       12.0, 2.2, 5.5, 0.55, 0.35),
];

pub fn country_by_code(code: &str) -> Option<&'static GeoProfile> {
    COUNTRIES.iter().find(|c| c.code == code)
}

pub fn countries_in(continent: Continent) -> impl Iterator<Item = &'static GeoProfile> {
    COUNTRIES.iter().filter(move |c| c.continent == continent)
}
