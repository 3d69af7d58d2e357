use clap::{Parser, ValueEnum};
use serde_json::json;
use shutoff_core::{
    spread::DEFAULT_HORIZONS, GridTopology, OptimizerConfig, ProximityModel, RiskConfig, Session,
    ShutoffPlan, TerrainConfig, TerrainGrid, TopologyData, WeatherState, WeatherTimeline,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Proximity {
    /// Distance to line midpoints
    Midpoint,
    /// Distance to the nearest point on each line
    Segment,
}

impl From<Proximity> for ProximityModel {
    fn from(p: Proximity) -> Self {
        match p {
            Proximity::Midpoint => ProximityModel::Midpoint,
            Proximity::Segment => ProximityModel::Segment,
        }
    }
}

/// Power-line shutoff planning demo over the Sonoma foothills grid
#[derive(Parser, Debug)]
#[command(name = "shutoff-demo")]
#[command(about = "Wildfire risk and de-energization planning demo", long_about = None)]
struct Args {
    /// Sustained wind speed in mph
    #[arg(short, long, default_value_t = 45.0)]
    wind_speed: f64,

    /// Wind gust in mph
    #[arg(short, long, default_value_t = 68.0)]
    gust: f64,

    /// Wind direction in degrees (0=North, 90=East)
    #[arg(long, default_value_t = 30.0)]
    wind_direction: f64,

    /// Temperature in °F
    #[arg(short, long, default_value_t = 98.0)]
    temperature: f64,

    /// Relative humidity in %
    #[arg(long, default_value_t = 8.0)]
    humidity: f64,

    /// Lightning probability (0-1)
    #[arg(long, default_value_t = 0.05)]
    lightning: f64,

    /// Use the mild autumn preset instead of the weather flags
    #[arg(short, long)]
    mild: bool,

    /// Plan against the windiest hour of a synthetic forecast this long (0 = off)
    #[arg(long, default_value_t = 0)]
    forecast_hours: u32,

    /// Most lines a plan may de-energize
    #[arg(short = 'n', long, default_value_t = 3)]
    max_shutoffs: usize,

    /// Allow plans that cut priority 1 feeders
    #[arg(long)]
    allow_critical: bool,

    /// Number of plans to report
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Which ranked plan to apply (1 = best, 0 = none)
    #[arg(short, long, default_value_t = 1)]
    apply: usize,

    /// Spread horizons in hours
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_HORIZONS.to_vec())]
    horizons: Vec<f64>,

    /// Terrain rows
    #[arg(long, default_value_t = 40)]
    rows: usize,

    /// Terrain columns
    #[arg(long, default_value_t = 40)]
    cols: usize,

    /// Terrain seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Cell-to-line distance model
    #[arg(long, value_enum, default_value_t = Proximity::Midpoint)]
    proximity: Proximity,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn weather_from(args: &Args) -> WeatherState {
    let base = if args.mild {
        WeatherState::mild()
    } else {
        WeatherState::new(
            args.wind_speed,
            args.gust,
            args.wind_direction,
            args.temperature,
            args.humidity,
            args.lightning,
        )
    };
    if args.forecast_hours == 0 {
        return base;
    }

    let timeline = WeatherTimeline::generate(&base, args.forecast_hours, args.seed);
    match timeline.peak() {
        Some(peak) => {
            info!(
                "Planning for forecast hour {} ({:.1} mph, {:.1}% RH)",
                peak.hour, *peak.weather.wind_speed, *peak.weather.humidity
            );
            peak.weather
        }
        None => base,
    }
}

/// Plan at 1-based `rank`; rank 0 selects nothing
fn selected_plan(plans: &[ShutoffPlan], rank: usize) -> Option<&ShutoffPlan> {
    rank.checked_sub(1).and_then(|idx| plans.get(idx))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let weather = weather_from(&args);

    let terrain = TerrainGrid::generate(&TerrainConfig {
        rows: args.rows,
        cols: args.cols,
        seed: args.seed,
        ..TerrainConfig::default()
    });
    let topology = GridTopology::new(TopologyData::sonoma_demo())?;
    let risk_config = RiskConfig {
        proximity: args.proximity.into(),
        ..RiskConfig::default()
    };
    let optimizer = OptimizerConfig {
        top_n: args.top,
        ..OptimizerConfig::new(args.max_shutoffs, !args.allow_critical)
    };
    let mut session = Session::with_config(terrain, topology, weather, risk_config, optimizer)?;

    let baseline_counts = session.baseline_risk().category_counts();
    let baseline_mean = session.baseline_risk().mean_risk();
    let plans = session
        .plans(args.max_shutoffs, !args.allow_critical)?
        .to_vec();

    let applied = selected_plan(&plans, args.apply).cloned();
    if let Some(plan) = &applied {
        session.apply_plan(plan)?;
    }
    let reduction = session.risk_reduction()?;
    let connectivity = session.connectivity();
    let summary = session.grid_summary();
    let affected = session.affected_facilities();
    let spread = session.spread_from_peak(&args.horizons);

    if args.json {
        let report = json!({
            "weather": weather,
            "red_flag": weather.is_red_flag(),
            "baseline": {
                "mean_risk": baseline_mean,
                "categories": baseline_counts,
            },
            "plans": plans,
            "applied": applied,
            "risk_reduction": reduction,
            "connectivity": connectivity,
            "grid_summary": summary,
            "affected_facilities": affected,
            "spread": spread.as_ref().map(|(ignition, scenarios)| json!({
                "ignition": ignition,
                "scenarios": scenarios,
            })),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("=== Wildfire Shutoff Planning Demo ===");
    println!(
        "Weather: {} wind ({} gusts) from {}, {}, {} RH{}",
        weather.wind_speed,
        weather.wind_gust,
        weather.wind_direction,
        weather.temperature,
        weather.humidity,
        if weather.is_red_flag() {
            "  [RED FLAG]"
        } else {
            ""
        }
    );
    println!(
        "Grid: {} substations, {} lines, {} critical facilities",
        summary.total_substations, summary.total_lines, summary.critical_facilities
    );
    println!();

    println!("=== Baseline Risk ===");
    println!("  Mean ignition risk: {:.4}", baseline_mean);
    println!(
        "  Cells: {} low, {} moderate, {} high, {} extreme",
        baseline_counts.low, baseline_counts.moderate, baseline_counts.high, baseline_counts.extreme
    );
    println!();

    println!(
        "=== Shutoff Plans (max {} lines, priority loads {}) ===",
        args.max_shutoffs,
        if args.allow_critical {
            "unprotected"
        } else {
            "protected"
        }
    );
    if plans.is_empty() {
        println!("  No feasible plans");
    }
    for plan in &plans {
        println!(
            "  #{:<2} {:<24} risk {:>7.4}  cost {:>6.4}  eff {:>8.4}  {}",
            plan.rank,
            plan.lines_disabled.join(", "),
            plan.total_risk_removed,
            plan.disruption_score,
            plan.efficiency_ratio,
            if plan.grid_connected {
                "connected".to_string()
            } else {
                format!("{} islands", plan.num_components)
            }
        );
    }
    println!();

    match &applied {
        Some(plan) => {
            println!("=== Applied Plan #{} ===", plan.rank);
            for (id, name) in plan.lines_disabled.iter().zip(&plan.line_names) {
                println!("  De-energized {} ({})", id, name);
            }
        }
        None => println!("=== No Plan Applied ==="),
    }
    println!(
        "  Mean risk: {:.4} -> {:.4} ({:.1}% reduction)",
        reduction.mean_risk_before, reduction.mean_risk_after, reduction.risk_reduction_pct
    );
    println!(
        "  Extreme cells: {} -> {} ({} eliminated)",
        reduction.extreme_cells_before,
        reduction.extreme_cells_after,
        reduction.extreme_cells_eliminated
    );
    println!(
        "  High+ cells: {} -> {}",
        reduction.high_risk_cells_before, reduction.high_risk_cells_after
    );
    println!(
        "  Grid: {} component(s){}",
        connectivity.num_components,
        if connectivity.isolated_substations.is_empty() {
            String::new()
        } else {
            format!(", isolated: {}", connectivity.isolated_substations.join(", "))
        }
    );
    for impact in &affected {
        println!(
            "  Facility {} ({:?}, {:?}) loses feeder {}",
            impact.name, impact.kind, impact.severity, impact.feeder
        );
    }
    println!();

    if let Some((ignition, scenarios)) = &spread {
        println!(
            "=== Fire Spread from Peak Cell ({:.4}, {:.4}) ===",
            ignition.lat, ignition.lon
        );
        for scenario in scenarios {
            let (lat_min, lat_max) = scenario
                .polygon
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p[1]), hi.max(p[1]))
                });
            let (lon_min, lon_max) = scenario
                .polygon
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p[0]), hi.max(p[0]))
                });
            println!(
                "  {:>5.1} h: lat {:.4}..{:.4}, lon {:.4}..{:.4}",
                scenario.hours, lat_min, lat_max, lon_min, lon_max
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plans() -> Vec<ShutoffPlan> {
        let mut session = Session::sonoma_demo(WeatherState::red_flag()).unwrap();
        session.plans(2, true).unwrap().to_vec()
    }

    #[test]
    fn test_apply_zero_selects_nothing() {
        assert!(selected_plan(&plans(), 0).is_none());
    }

    #[test]
    fn test_apply_rank_is_one_based() {
        let plans = plans();
        assert_eq!(selected_plan(&plans, 1).map(|p| p.rank), Some(1));
        assert_eq!(selected_plan(&plans, 2).map(|p| p.rank), Some(2));
        assert!(selected_plan(&plans, plans.len() + 1).is_none());
    }

    #[test]
    fn test_args_parse_apply_zero() {
        let args = Args::try_parse_from(["shutoff-demo", "--apply", "0"]).unwrap();
        assert_eq!(args.apply, 0);
    }
}
