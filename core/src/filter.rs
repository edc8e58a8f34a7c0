//! Query filters.
//!
//! A `Filter` is a value, never persisted. Unrecognised tokens fall
//! back to the field's default silently: period `M`, everything else
//! `ALL`.

use crate::{
    geo::{country_by_code, Continent},
    types::CountryCode,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Period {
    #[serde(rename = "D")]
    Day,
    #[serde(rename = "W")]
    Week,
    #[default]
    #[serde(rename = "M")]
    Month,
    #[serde(rename = "Y")]
    Year,
    #[serde(rename = "ALL")]
    All,
}

impl Period {
    pub fn parse(token: &str) -> Self {
        match token {
            "D" => Self::Day,
            "W" => Self::Week,
            "M" => Self::Month,
            "Y" => Self::Year,
            "ALL" => Self::All,
            _ => Self::default(),
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Day => "D",
            Self::Week => "W",
            Self::Month => "M",
            Self::Year => "Y",
            Self::All => "ALL",
        }
    }

    /// Trailing day count for a series of `series_len` days.
    pub fn days(&self, series_len: usize) -> usize {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
            Self::All => series_len,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Platform {
    #[default]
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "iOS")]
    Ios,
    #[serde(rename = "Android")]
    Android,
}

impl Platform {
    pub fn parse(token: &str) -> Self {
        match token {
            "iOS" => Self::Ios,
            "Android" => Self::Android,
            _ => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CatType {
    #[default]
    #[serde(rename = "ALL")]
    All,
    Stray,
    Home,
}

impl CatType {
    pub fn parse(token: &str) -> Self {
        match token {
            "Stray" => Self::Stray,
            "Home" => Self::Home,
            _ => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub period: Period,
    /// `None` means ALL.
    pub continent: Option<Continent>,
    /// `None` means ALL. Always a catalog code when set.
    pub country: Option<CountryCode>,
    pub platform: Platform,
    pub cat_type: CatType,
}

impl Filter {
    /// Build from raw tokens. Unknown continent names and country codes
    /// become ALL.
    pub fn parse(period: &str, continent: &str, country: &str, platform: &str, cat_type: &str) -> Self {
        Self {
            period: Period::parse(period),
            continent: Continent::from_name(continent),
            country: country_by_code(country).map(|c| c.code),
            platform: Platform::parse(platform),
            cat_type: CatType::parse(cat_type),
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn with_country(mut self, code: &str) -> Self {
        self.country = country_by_code(code).map(|c| c.code);
        self
    }

    pub fn with_continent(mut self, continent: Continent) -> Self {
        self.continent = Some(continent);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_cat_type(mut self, cat_type: CatType) -> Self {
        self.cat_type = cat_type;
        self
    }

    /// Every dimension ALL with the full-length period.
    pub fn unfiltered() -> Self {
        Self { period: Period::All, ..Self::default() }
    }
}

/// Wire form of a filter: five free-form tokens, each optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterTokens {
    pub period: String,
    pub continent: String,
    pub country: String,
    pub platform: String,
    pub cat_type: String,
}

impl From<&FilterTokens> for Filter {
    fn from(t: &FilterTokens) -> Self {
        Filter::parse(&t.period, &t.continent, &t.country, &t.platform, &t.cat_type)
    }
}
