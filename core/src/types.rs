//! Shared primitive types used across the engine.

/// Zero-based index into a series. Index 0 is the oldest day.
pub type DayIndex = usize;

/// ISO 3166-1 alpha-3 country code, e.g. `"USA"`.
pub type CountryCode = &'static str;
