//! De-energization planning
//!
//! - [`line_risk`]: per-line ignition scores
//! - [`connectivity`]: union-find component analysis
//! - [`shutoff`]: ranked plan search

pub mod connectivity;
pub mod line_risk;
pub mod shutoff;

pub use connectivity::{check_connectivity, count_components, ConnectivityResult};
pub use line_risk::{compute_line_risk_scores, line_risk_score};
pub use shutoff::{
    evaluate_shutoff, optimize_shutoffs, shutoff_candidates, OptimizerConfig, ShutoffPlan,
};
