use cathunter_core::{
    config::{EngineConfig, InsightConfig},
    geo::{country_by_code, GeoProfile},
    insight::{InsightEngine, InsightKind},
    metric::{DailyMetric, Series},
    world::GeneratedWorld,
};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn day(i: usize, users: u64) -> DailyMetric {
    let cats = users * 2;
    DailyMetric {
        date: NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date") + Duration::days(i as i64),
        new_users: users,
        new_users_ios: users / 2,
        new_users_android: users - users / 2,
        new_cats: cats,
        new_cats_stray: cats / 2,
        new_cats_home: cats - cats / 2,
        shots: cats * 4,
        dau_mau: 0.2,
    }
}

fn series(users: impl IntoIterator<Item = u64>) -> Series {
    users.into_iter().enumerate().map(|(i, u)| day(i, u)).collect()
}

fn flat(days: usize, users: u64) -> Series {
    series(std::iter::repeat(users).take(days))
}

fn profile(code: &str) -> &'static GeoProfile {
    country_by_code(code).expect("catalog code")
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Thirty identical days carry no signal: no spike, no dip, no peak day.
#[test]
fn constant_series_produces_no_anomalies() {
    let cfg = InsightConfig::default();
    let engine = InsightEngine::new(&cfg);
    let global = flat(30, 100);
    let usa = flat(30, 100);

    let anomalies = engine.scan_countries(&[(profile("USA"), usa.as_slice())]);
    assert!(anomalies.spikes.is_empty());
    assert!(anomalies.dips.is_empty());

    let insights = engine.detect_from(&global, &[(profile("USA"), usa.as_slice())]);
    assert!(insights.is_empty(), "unexpected insights: {insights:?}");
}

#[test]
fn short_global_series_produces_nothing() {
    let cfg = InsightConfig::default();
    let engine = InsightEngine::new(&cfg);
    assert!(engine.detect_from(&flat(1, 500), &[]).is_empty());
    assert!(engine.detect_from(&[], &[]).is_empty());
}

#[test]
fn country_spike_and_dip_are_reported() {
    let cfg = InsightConfig::default();
    let engine = InsightEngine::new(&cfg);
    let global = flat(30, 100);
    let brazil = series((0..30).map(|i| if i < 20 { 20 } else { 60 }));
    let japan = series((0..30).map(|i| if i < 20 { 100 } else { 40 }));

    let insights = engine.detect_from(&global, &[(profile("BRA"), brazil.as_slice()), (profile("JPN"), japan.as_slice())]);

    let spike = insights
        .iter()
        .find(|i| i.kind == InsightKind::Positive)
        .expect("spike insight");
    assert!(
        spike.text.starts_with("Brazil: 3.0x user spike Jan 21"),
        "spike text: {}",
        spike.text
    );
    assert!(spike.text.ends_with("(20 → 60/day)"), "spike text: {}", spike.text);
    assert!(spike.priority > cfg.spike_priority);

    let dip = insights
        .iter()
        .find(|i| i.kind == InsightKind::Negative)
        .expect("dip insight");
    assert!(dip.text.starts_with("Japan: -60% users"), "dip text: {}", dip.text);
}

#[test]
fn dip_comes_from_a_different_country_than_the_spike() {
    let cfg = InsightConfig::default();
    let engine = InsightEngine::new(&cfg);
    let global = flat(30, 100);
    // Spikes then crashes: both a spike and a dip in one country.
    let mexico = series((0..30).map(|i| match i {
        0..=9 => 20,
        10..=19 => 80,
        _ => 10,
    }));

    let insights = engine.detect_from(&global, &[(profile("MEX"), mexico.as_slice())]);
    assert_eq!(insights.len(), 1, "{insights:?}");
    assert_eq!(insights[0].kind, InsightKind::Positive);
}

#[test]
fn record_day_is_reported_when_above_average() {
    let cfg = InsightConfig::default();
    let engine = InsightEngine::new(&cfg);
    let global = series((0..30).map(|i| if i == 10 { 400 } else { 100 }));

    let insights = engine.detect_from(&global, &[]);
    assert_eq!(insights.len(), 1, "{insights:?}");
    assert_eq!(insights[0].kind, InsightKind::Info);
    assert_eq!(insights[0].text, "Peak day Jan 11: 400 users, 800 cats, 3.2K shots");

    let mild = series((0..30).map(|i| if i == 10 { 150 } else { 100 }));
    let insights = engine.detect_from(&mild, &[]);
    assert_eq!(insights.len(), 1, "{insights:?}");
    assert_eq!(insights[0].text, "Peak day Jan 11: 150 users, 300 cats, 1.2K shots");

    // Two equal maxima: the earlier day is reported.
    let twin = series((0..30).map(|i| if i == 4 || i == 20 { 120 } else { 100 }));
    let insights = engine.detect_from(&twin, &[]);
    assert!(insights[0].text.starts_with("Peak day Jan 5:"), "{insights:?}");

    assert!(engine.detect_from(&flat(30, 100), &[]).is_empty());
}

#[test]
fn record_day_respects_the_minimum_user_count() {
    let cfg = InsightConfig::default();
    let small = series((0..30).map(|i| if i == 3 { 9 } else { 4 }));
    assert!(InsightEngine::new(&cfg).detect_from(&small, &[]).is_empty());
}

/// With the selection caps lifted, real generated data always has a
/// peak day in its trailing window.
#[test]
fn generated_world_has_a_peak_day_candidate() {
    let mut config = EngineConfig::default().with_seed(42);
    config.insights.max_picks = 100;
    config.insights.max_per_kind = 100;
    let world = GeneratedWorld::generate(config).expect("world");

    let insights = InsightEngine::new(&world.config.insights).detect(&world);
    let peak = insights
        .iter()
        .find(|i| i.text.starts_with("Peak day"))
        .expect("peak day candidate");
    assert_eq!(peak.kind, InsightKind::Info);
    assert_eq!(peak.priority, world.config.insights.record_priority);
}

#[test]
fn dau_mau_drift_and_photo_growth() {
    let cfg = InsightConfig::default();
    let engine = InsightEngine::new(&cfg);
    let mut global = series((0..30).map(|i| 100 + i * 10));
    for (i, d) in global.iter_mut().enumerate() {
        d.dau_mau = 0.30 - i as f64 * 0.004;
    }

    let insights = engine.detect_from(&global, &[]);
    let kinds: Vec<InsightKind> = insights.iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&InsightKind::Warning), "{insights:?}");
    assert!(
        insights.iter().any(|i| i.text.starts_with("Photos globally:")),
        "{insights:?}"
    );
    let warning = insights
        .iter()
        .find(|i| i.kind == InsightKind::Warning)
        .expect("warning");
    assert!(warning.text.starts_with("DAU/MAU down globally"), "{}", warning.text);
}

#[test]
fn leaders_only_when_enabled() {
    let global = flat(30, 100);
    let usa = flat(30, 80);
    let ind = flat(30, 20);
    let countries = [(profile("USA"), usa.as_slice()), (profile("IND"), ind.as_slice())];

    let cfg = InsightConfig::default();
    assert!(InsightEngine::new(&cfg).detect_from(&global, &countries).is_empty());

    let cfg = InsightConfig { leaders_enabled: true, ..InsightConfig::default() };
    let insights = InsightEngine::new(&cfg).detect_from(&global, &countries);
    assert_eq!(insights.len(), 2, "{insights:?}");
    assert!(insights.iter().all(|i| i.kind == InsightKind::Info));
    assert!(insights.iter().any(|i| i.text.starts_with("United States leads with 2.4K new users")));
}

#[test]
fn generated_world_respects_selection_caps() {
    for seed in [1, 42, 777, 2024] {
        let world = GeneratedWorld::generate(EngineConfig::default().with_seed(seed)).expect("world");
        let insights = InsightEngine::new(&world.config.insights).detect(&world);
        assert!(insights.len() <= 3, "seed {seed}: {} insights", insights.len());

        let mut per_kind: HashMap<InsightKind, usize> = HashMap::new();
        for i in &insights {
            *per_kind.entry(i.kind).or_default() += 1;
        }
        assert!(per_kind.values().all(|&n| n <= 2), "seed {seed}: {per_kind:?}");
        assert!(
            insights.windows(2).all(|p| p[0].priority >= p[1].priority),
            "seed {seed}: not sorted by priority"
        );
    }
}

#[test]
fn insights_serialise_with_type_field() {
    let cfg = InsightConfig::default();
    let global = series((0..30).map(|i| if i == 10 { 400 } else { 100 }));
    let insights = InsightEngine::new(&cfg).detect_from(&global, &[]);
    let json = serde_json::to_string(&insights).expect("serialise");
    assert!(json.contains("\"type\":\"info\""), "{json}");
}
