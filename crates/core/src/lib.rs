//! Wildfire Shutoff Core Library
//!
//! Scores wildfire ignition risk over a terrain grid, searches for power-line
//! de-energization plans that cut that risk while keeping priority loads
//! supplied, and projects fire spread from the highest-risk cell.
//!
//! ## Pipeline
//!
//! - Topology + weather → per-cell line proximity → ignition risk grid
//! - Topology + weather → ranked shutoff plans (risk removed vs disruption)
//! - Selected plan → "after" risk grid → before/after comparison
//! - Peak risk cell → spread perimeters for several horizons
//!
//! Every pass is a pure function of its inputs. [`Session`] holds the
//! mutable operator state (weather, disabled lines) and caches derived
//! results.
//!
//! ```no_run
//! use shutoff_core::{Session, WeatherState};
//!
//! let mut session = Session::sonoma_demo(WeatherState::red_flag()).unwrap();
//! let best = session.plans(3, true).unwrap()[0].clone();
//! session.apply_plan(&best).unwrap();
//! let reduction = session.risk_reduction().unwrap();
//! println!("{:.1}% less risk", reduction.risk_reduction_pct);
//! ```

// Units, weather and noise
pub mod core_types;

// Terrain and power-grid data
pub mod grid;

// Scoring and planning
pub mod optimizer;
pub mod risk;
pub mod spread;

pub mod error;
pub mod session;

// Re-export core types
pub use core_types::{
    Degrees, Fahrenheit, Fraction, HourlyWeather, MilesPerHour, Percent, WeatherState,
    WeatherTimeline,
};

// Re-export data model
pub use grid::{
    CriticalFacility, FacilityImpact, FacilityKind, GridSummary, GridTopology, LineSet, PowerLine,
    Priority, Severity, Substation, TerrainCell, TerrainConfig, TerrainGrid, TopologyData,
};

// Re-export passes
pub use optimizer::{
    check_connectivity, compute_line_risk_scores, evaluate_shutoff, optimize_shutoffs,
    ConnectivityResult, OptimizerConfig, ShutoffPlan,
};
pub use risk::{
    assess_risk, compute_ignition_risk, compute_proximity, compute_risk_reduction, ProximityModel,
    RiskCategory, RiskCell, RiskConfig, RiskGrid, RiskReduction, RiskWeights,
};
pub use spread::{fire_spread_cone, spread_scenarios, IgnitionPoint, SpreadScenario};

pub use error::{ScenarioError, TerrainError, TopologyError};
pub use session::Session;
