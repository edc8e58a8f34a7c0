use cathunter_core::{
    aggregate::{chart_buckets, compute_kpis, Aggregator},
    config::EngineConfig,
    demographics::AgeSexBucket,
    filter::{CatType, Filter, FilterTokens, Period, Platform},
    geo::{country_by_code, Continent, GeoProfile},
    metric::{total_users, DailyMetric, Series},
    world::GeneratedWorld,
};
use chrono::{Duration, NaiveDate};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn generated() -> GeneratedWorld {
    GeneratedWorld::generate(EngineConfig::default().with_seed(42)).expect("generate world")
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date")
}

/// `days` records with a fixed iOS and stray share.
fn synthetic(days: usize, ios_share: f64, stray_share: f64) -> Series {
    (0..days)
        .map(|i| {
            let users = 50 + 10 * i as u64;
            let cats = users * 2 + 3;
            let ios = (users as f64 * ios_share).round() as u64;
            let stray = (cats as f64 * stray_share).round() as u64;
            DailyMetric {
                date: start() + Duration::days(i as i64),
                new_users: users,
                new_users_ios: ios,
                new_users_android: users - ios,
                new_cats: cats,
                new_cats_stray: stray,
                new_cats_home: cats - stray,
                shots: cats * 4,
                dau_mau: 0.2,
            }
        })
        .collect()
}

fn usa_only_world(days: usize) -> GeneratedWorld {
    let usa: GeoProfile = *country_by_code("USA").expect("USA in catalog");
    let series = synthetic(days, 0.6, 0.45);
    GeneratedWorld::from_parts(EngineConfig::default_test(), vec![usa], series.clone(), vec![series])
        .expect("from_parts")
}

// ── Resolution ───────────────────────────────────────────────────────────────

#[test]
fn unfiltered_returns_global_series_unchanged() {
    let w = generated();
    let series = Aggregator::new(&w).filter_series(&Filter::unfiltered());
    assert_eq!(series, w.global);
}

#[test]
fn usa_ios_week_keeps_sixty_percent_of_users_and_cats() {
    let w = usa_only_world(21);
    let filter = Filter::parse("W", "ALL", "USA", "iOS", "ALL");
    let filtered = Aggregator::new(&w).filter_series(&filter);
    let source = &w.countries[0][w.days() - 7..];

    assert_eq!(filtered.len(), 7);
    for (f, s) in filtered.iter().zip(source) {
        assert_eq!(f.date, s.date);
        assert_eq!(f.new_users, (0.6 * s.new_users as f64).round() as u64, "{}", f.date);
        assert_eq!(f.new_users_android, 0);
        let ratio = s.new_users_ios as f64 / s.new_users as f64;
        assert_eq!(f.new_cats, (s.new_cats as f64 * ratio).round() as u64, "{}", f.date);
    }
}

#[test]
fn stray_view_counts_only_stray_cats() {
    let w = generated();
    let agg = Aggregator::new(&w);
    for code in ["USA", "BRA", "IND", "JPN", "NGA"] {
        let series = agg.filter_series(&Filter::parse("Y", "ALL", code, "iOS", "Stray"));
        assert_eq!(series.len(), 365, "{code}");
        for d in &series {
            assert_eq!(d.new_cats, d.new_cats_stray, "{code} {}", d.date);
            assert_eq!(d.new_cats_home, 0, "{code} {}", d.date);
        }
    }
}

#[test]
fn known_country_overrides_continent() {
    let w = generated();
    let agg = Aggregator::new(&w);
    let with_continent = agg.filter_series(&Filter::parse("M", "Asia", "BRA", "ALL", "ALL"));
    let country_only = agg.filter_series(&Filter::parse("M", "ALL", "BRA", "ALL", "ALL"));
    assert_eq!(with_continent, country_only);
}

#[test]
fn continent_sums_its_countries() {
    let w = generated();
    let filter = Filter::default().with_period(Period::All).with_continent(Continent::Oceania);
    let series = Aggregator::new(&w).filter_series(&filter);
    let australia = w.country_series("AUS").expect("AUS series");
    // Oceania holds only Australia.
    assert_eq!(total_users(&series), total_users(australia));

    let europe = Filter::unfiltered().with_continent(Continent::Europe);
    let expected: u64 = w
        .catalog
        .iter()
        .zip(&w.countries)
        .filter(|(p, _)| p.continent == Continent::Europe)
        .map(|(_, s)| total_users(s))
        .sum();
    assert_eq!(total_users(&Aggregator::new(&w).filter_series(&europe)), expected);
}

#[test]
fn wire_tokens_fall_back_silently() {
    let tokens: FilterTokens =
        serde_json::from_str(r#"{ "period": "fortnight", "country": "FRA", "catType": "Stray" }"#)
            .expect("tokens");
    let filter = Filter::from(&tokens);
    assert_eq!(filter.period, Period::Month);
    assert_eq!(filter.country, Some("FRA"));
    assert_eq!(filter.continent, None);
    assert_eq!(filter.platform, Platform::All);
    assert_eq!(filter.cat_type, CatType::Stray);
}

#[test]
fn builders_match_parsed_tokens() {
    let built = Filter::default()
        .with_period(Period::Week)
        .with_country("KOR")
        .with_platform(Platform::Android)
        .with_cat_type(CatType::Home);
    assert_eq!(built, Filter::parse("W", "ALL", "KOR", "Android", "Home"));
    assert_eq!(Filter::default().with_country("ZZZ").country, None);
}

// ── KPIs ─────────────────────────────────────────────────────────────────────

#[test]
fn previous_period_is_absent_for_all_and_short_series() {
    let w = usa_only_world(10);
    let agg = Aggregator::new(&w);
    assert!(agg.previous_period(&Filter::unfiltered()).is_none());
    // Two weeks needed, ten days available.
    assert!(agg.previous_period(&Filter::default().with_period(Period::Week)).is_none());
    assert!(agg.previous_period(&Filter::default().with_period(Period::Day)).is_some());

    let view = agg.dashboard(&Filter::default());
    assert_eq!(view.kpis.users.change, None);
}

#[test]
fn previous_period_applies_the_same_transforms() {
    let w = usa_only_world(21);
    let filter = Filter::parse("W", "ALL", "USA", "Android", "Home");
    let prev = Aggregator::new(&w).previous_period(&filter).expect("two weeks available");
    assert_eq!(prev.len(), 7);
    assert_eq!(prev[0].date, w.global[7].date);
    assert!(prev.iter().all(|d| d.new_users_ios == 0 && d.new_cats_stray == 0));
}

#[test]
fn pct_change_is_none_when_previous_is_zero() {
    let current = synthetic(3, 0.5, 0.5);
    let zero: Series = current.iter().map(|d| DailyMetric::empty(d.date)).collect();
    let kpis = compute_kpis(&current, Some(zero.as_slice()));
    assert_eq!(kpis.users.change, None);
    assert_eq!(kpis.cats.change, None);

    let kpis = compute_kpis(&current, Some(current.as_slice()));
    assert_eq!(kpis.users.change, Some(0.0));
}

#[test]
fn kpi_change_matches_formula() {
    let w = generated();
    let agg = Aggregator::new(&w);
    let filter = Filter::default();
    let view = agg.dashboard(&filter);
    let prev = agg.previous_period(&filter).expect("previous month");
    let curr = total_users(&view.series) as f64;
    let before = total_users(&prev) as f64;
    let expected = (curr - before) / before * 100.0;
    let got = view.kpis.users.change.expect("change present");
    assert!((got - expected).abs() < 1e-9, "got {got}, expected {expected}");
}

// ── Charts, pyramids, retention ──────────────────────────────────────────────

#[test]
fn chart_bucket_shapes_per_period() {
    let w = generated();
    let agg = Aggregator::new(&w);

    let day = agg.dashboard(&Filter::default().with_period(Period::Day));
    assert_eq!(day.chart.len(), 24);
    assert_eq!(day.chart.iter().map(|b| b.new_users).sum::<u64>(), day.series[0].new_users);

    let week = agg.dashboard(&Filter::default().with_period(Period::Week));
    assert_eq!(week.chart.len(), 7);
    assert_eq!(week.chart.last().map(|b| b.label.as_str()), Some("02-10"));

    let year = agg.dashboard(&Filter::default().with_period(Period::Year));
    assert_eq!(year.chart.len(), 12);
    assert_eq!(year.chart.last().map(|b| b.label.as_str()), Some("26-02"));

    let all = chart_buckets(&w.global, Period::All);
    assert_eq!(all.first().map(|b| b.label.as_str()), Some("24-08"));
    assert_eq!(all.iter().map(|b| b.new_users).sum::<u64>(), total_users(&w.global));
}

#[test]
fn age_sex_sums_to_filtered_users() {
    let w = generated();
    let agg = Aggregator::new(&w);
    let filters = [
        Filter::default(),
        Filter::parse("W", "Asia", "ALL", "iOS", "ALL"),
        Filter::parse("Y", "ALL", "NGA", "Android", "Stray"),
    ];
    for filter in &filters {
        let view = agg.dashboard(filter);
        let pyramid_total: u64 = view.age_sex.iter().map(AgeSexBucket::total).sum();
        assert_eq!(pyramid_total, total_users(&view.series), "{filter:?}");
    }
}

#[test]
fn retention_follows_country_and_platform() {
    let w = generated();
    let agg = Aggregator::new(&w);
    let idx = w.country_index("JPN").expect("JPN");

    let curve = agg.retention(&Filter::parse("M", "ALL", "JPN", "iOS", "ALL"));
    assert_eq!(curve, &w.country_retention[idx].ios);

    let curve = agg.retention(&Filter::parse("M", "Asia", "ALL", "Android", "ALL"));
    assert_eq!(curve, &w.global_retention.android);
}

#[test]
fn country_totals_keep_every_country() {
    let w = generated();
    let rows = Aggregator::new(&w).country_totals(&Filter::parse("M", "ALL", "DEU", "ALL", "ALL"));
    assert_eq!(rows.len(), w.catalog.len());
    let deu = rows.iter().find(|r| r.code == "DEU").expect("DEU row");
    let expected = total_users(&w.country_series("DEU").expect("DEU")[w.days() - 30..]);
    assert_eq!(deu.users, expected);
}

#[test]
fn dashboard_serialises_camel_case() {
    let w = usa_only_world(14);
    let view = Aggregator::new(&w).dashboard(&Filter::default());
    let json = serde_json::to_string(&view).expect("serialise");
    assert!(json.contains("\"newUsersIos\""));
    assert!(json.contains("\"dauMau\""));
    assert!(json.contains("\"ageSex\""));
    assert!(json.contains("\"catType\":\"ALL\""));
}
