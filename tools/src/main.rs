//! metrics-runner: headless query runner for the cat-hunter dashboard engine.
//!
//! Usage:
//!   metrics-runner --seed 42 --period W --country USA --platform iOS
//!   metrics-runner --config engine.json --json
//!   metrics-runner --seed 42 --ipc-mode

use anyhow::{Context, Result};
use cathunter_core::{
    aggregate::{Aggregator, DashboardView},
    config::EngineConfig,
    filter::{Filter, FilterTokens},
    insight::{Insight, InsightEngine},
    metric::{total_cats, total_shots, total_users},
    world::GeneratedWorld,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Query {
        #[serde(default)]
        filter: FilterTokens,
    },
    Insights,
    Quit,
}

#[derive(serde::Serialize)]
struct RunOutput<'a> {
    seed: u64,
    view: &'a DashboardView,
    insights: &'a [Insight],
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let json = args.iter().any(|a| a == "--json");

    let mut config = match str_arg(&args, "--config") {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading config {path}"))?,
        None => EngineConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);

    let filter = Filter::parse(
        str_arg(&args, "--period").unwrap_or("M"),
        str_arg(&args, "--continent").unwrap_or("ALL"),
        str_arg(&args, "--country").unwrap_or("ALL"),
        str_arg(&args, "--platform").unwrap_or("ALL"),
        str_arg(&args, "--cat-type").unwrap_or("ALL"),
    );

    if !ipc_mode && !json {
        println!("Cat Hunter: metrics-runner");
        println!("  seed:      {}", config.seed);
        println!("  horizon:   {} days to {}", config.horizon_days, config.end_date);
        println!();
    }

    let world = GeneratedWorld::generate(config)?;

    if ipc_mode {
        run_ipc_loop(&world)?;
        return Ok(());
    }

    let view = Aggregator::new(&world).dashboard(&filter);
    let insights = InsightEngine::new(&world.config.insights).detect(&world);

    if json {
        let out = RunOutput { seed: world.config.seed, view: &view, insights: &insights };
        println!("{}", serde_json::to_string(&out)?);
    } else {
        print_summary(&world, &view, &insights);
    }
    Ok(())
}

fn run_ipc_loop(world: &GeneratedWorld) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let aggregator = Aggregator::new(world);
    let insight_engine = InsightEngine::new(&world.config.insights);

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Bad command line: {e}");
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Query { filter } => {
                let view = aggregator.dashboard(&Filter::from(&filter));
                writeln!(stdout, "{}", serde_json::to_string(&view)?)?;
            }
            IpcCommand::Insights => {
                let insights = insight_engine.detect(world);
                writeln!(stdout, "{}", serde_json::to_string(&insights)?)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(world: &GeneratedWorld, view: &DashboardView, insights: &[Insight]) {
    let f = &view.filter;
    let k = &view.kpis;
    let change = |c: Option<f64>| c.map_or_else(|| "n/a".to_string(), |v| format!("{v:+.1}%"));

    println!("=== FILTER ===");
    println!("  period:    {}", f.period.token());
    println!("  continent: {}", f.continent.map_or("ALL", |c| c.name()));
    println!("  country:   {}", f.country.unwrap_or("ALL"));
    println!("  platform:  {:?}", f.platform);
    println!("  cat type:  {:?}", f.cat_type);

    println!();
    println!("=== KPIs ({} days) ===", view.series.len());
    println!("  users:     {:>10}  {}", k.users.value, change(k.users.change));
    println!("  cats:      {:>10}  {}", k.cats.value, change(k.cats.change));
    println!("  shots:     {:>10}  {}", k.shots.value, change(k.shots.change));
    println!("  dau/mau:   {:>10.3}  {}", k.dau_mau.value, change(k.dau_mau.change));

    println!();
    println!("=== CHART ({} buckets) ===", view.chart.len());
    for b in view.chart.iter().rev().take(6).rev() {
        println!("  {:>6} | users {:>7} | cats {:>7} | shots {:>8}", b.label, b.new_users, b.new_cats, b.shots);
    }

    println!();
    println!("=== AGE / SEX ===");
    for b in &view.age_sex {
        println!("  {:>6} | male {:>8} | female {:>8}", b.age_group.label(), b.male, b.female);
    }

    println!();
    println!("=== RETENTION ===");
    let points: Vec<String> = view.retention.iter().map(|p| format!("d{}={:.1}", p.day, p.rate)).collect();
    println!("  {}", points.join(" "));

    println!();
    println!("=== TOP COUNTRIES ===");
    let mut countries: Vec<_> = view.countries.iter().collect();
    countries.sort_by(|a, b| b.users.cmp(&a.users));
    for c in countries.iter().take(5) {
        println!("  {} {:<15} users {:>8}  cats {:>8}", c.code, c.name, c.users, c.cats);
    }

    println!();
    println!("=== INSIGHTS ===");
    if insights.is_empty() {
        println!("  (none)");
    }
    for i in insights {
        println!("  [{:?}] {}", i.kind, i.text);
    }

    // Users reconcile exactly; the other fields are drawn per country.
    let rebuilt = world.sum_countries();
    println!();
    println!("=== COUNTRY SUM VS GLOBAL ===");
    println!("  users: {:>10} vs {:>10}", total_users(&rebuilt), total_users(&world.global));
    println!("  cats:  {:>10} vs {:>10}", total_cats(&rebuilt), total_cats(&world.global));
    println!("  shots: {:>10} vs {:>10}", total_shots(&rebuilt), total_shots(&world.global));
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
