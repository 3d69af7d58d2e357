//! Ignition risk scoring
//!
//! - [`proximity`]: per-cell exposure to energized power lines
//! - [`engine`]: weighted risk index and category binning
//! - [`counterfactual`]: before/after comparison of two passes

pub mod counterfactual;
pub mod engine;
pub mod proximity;

pub use counterfactual::{compute_risk_reduction, RiskReduction};
pub use engine::{
    assess_risk, compute_ignition_risk, ignition_risk, risk_color, thresholds, CategoryCounts,
    Perturbation, RiskCategory, RiskCell, RiskComponents, RiskConfig, RiskGrid, RiskWeights,
};
pub use proximity::{compute_proximity, ProximityModel, DECAY};
