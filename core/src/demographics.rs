//! Age/sex pyramids: one global, one per country.

use crate::{geo::GeoProfile, rng::WorldRng};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AgeGroup {
    #[serde(rename = "13-17")]
    Teen,
    #[serde(rename = "18-21")]
    Age18To21,
    #[serde(rename = "22-25")]
    Age22To25,
    #[serde(rename = "26-30")]
    Age26To30,
    #[serde(rename = "31-35")]
    Age31To35,
    #[serde(rename = "36-40")]
    Age36To40,
    #[serde(rename = "41-49")]
    Age41To49,
    #[serde(rename = "50-59")]
    Age50To59,
    #[serde(rename = "60-69")]
    Age60To69,
    #[serde(rename = "70+")]
    Age70Plus,
}

impl AgeGroup {
    /// Youngest first.
    pub const ALL: [AgeGroup; 10] = [
        AgeGroup::Teen,
        AgeGroup::Age18To21,
        AgeGroup::Age22To25,
        AgeGroup::Age26To30,
        AgeGroup::Age31To35,
        AgeGroup::Age36To40,
        AgeGroup::Age41To49,
        AgeGroup::Age50To59,
        AgeGroup::Age60To69,
        AgeGroup::Age70Plus,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Teen => "13-17",
            Self::Age18To21 => "18-21",
            Self::Age22To25 => "22-25",
            Self::Age26To30 => "26-30",
            Self::Age31To35 => "31-35",
            Self::Age36To40 => "36-40",
            Self::Age41To49 => "41-49",
            Self::Age50To59 => "50-59",
            Self::Age60To69 => "60-69",
            Self::Age70Plus => "70+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeSexBucket {
    pub age_group: AgeGroup,
    pub male: u64,
    pub female: u64,
}

impl AgeSexBucket {
    pub fn total(&self) -> u64 {
        self.male + self.female
    }
}

/// Ten buckets, youngest first.
pub type Pyramid = Vec<AgeSexBucket>;

const GLOBAL_PEAK: usize = 4;
const GLOBAL_SCALE: f64 = 5000.0;
const GLOBAL_FALLOFF: f64 = 0.12;
const GLOBAL_MIN: u64 = 50;

const COUNTRY_SCALE: f64 = 1000.0;
const COUNTRY_FALLOFF: f64 = 0.10;
const COUNTRY_MIN: u64 = 5;

fn bell(scale: f64, falloff: f64, idx: usize, peak: usize) -> f64 {
    let dist = idx.abs_diff(peak) as f64;
    (scale * (-falloff * dist * dist).exp()).round()
}

/// Global pyramid: bell curve peaking at 26-30. Draws male then female
/// per band, youngest band first.
pub fn global_pyramid(rng: &mut WorldRng) -> Pyramid {
    AgeGroup::ALL
        .iter()
        .enumerate()
        .map(|(idx, group)| {
            let base = bell(GLOBAL_SCALE, GLOBAL_FALLOFF, idx, GLOBAL_PEAK);
            let male = (base * rng.clamped_normal(1.0, 0.2, 0.5, 1.6)).round() as u64;
            let female = (base * rng.clamped_normal(0.85, 0.2, 0.4, 1.5)).round() as u64;
            AgeSexBucket {
                age_group: *group,
                male: male.max(GLOBAL_MIN),
                female: female.max(GLOBAL_MIN),
            }
        })
        .collect()
}

/// Country pyramid scaled by the country's user weight, with its peak
/// shifted 0-3 bands older than 22-25.
pub fn country_pyramid(profile: &GeoProfile, rng: &mut WorldRng) -> Pyramid {
    let scale = COUNTRY_SCALE * profile.user_weight / 100.0;
    let peak = 3 + rng.int_range(0, 3) as usize;
    AgeGroup::ALL
        .iter()
        .enumerate()
        .map(|(idx, group)| {
            let base = bell(scale, COUNTRY_FALLOFF, idx, peak);
            let male = (base * rng.clamped_normal(1.0, 0.3, 0.3, 2.0)).round() as u64;
            let female = (base * rng.clamped_normal(0.85, 0.3, 0.3, 1.8)).round() as u64;
            AgeSexBucket {
                age_group: *group,
                male: male.max(COUNTRY_MIN),
                female: female.max(COUNTRY_MIN),
            }
        })
        .collect()
}

/// Band-wise sum of several pyramids.
pub fn sum_pyramids<'a>(pyramids: impl IntoIterator<Item = &'a Pyramid>) -> Pyramid {
    let mut out: Pyramid = AgeGroup::ALL
        .iter()
        .map(|g| AgeSexBucket { age_group: *g, male: 0, female: 0 })
        .collect();
    for pyramid in pyramids {
        for (acc, bucket) in out.iter_mut().zip(pyramid) {
            acc.male += bucket.male;
            acc.female += bucket.female;
        }
    }
    out
}
