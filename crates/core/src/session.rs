//! Explicit scenario state
//!
//! A [`Session`] owns the read-only terrain and topology plus the two things
//! an operator changes: the weather snapshot and the set of de-energized
//! lines. Derived results are cached and dropped when their inputs change:
//!
//! | Change                  | Invalidates                        |
//! |-------------------------|------------------------------------|
//! | weather                 | baseline, current risk, plan cache |
//! | disabled-line set       | current risk                       |
//!
//! Plans are cached per [`OptimizerConfig`], so switching `max_shutoffs` or
//! `protect_critical` back and forth doesn't repeat the search.

use crate::core_types::WeatherState;
use crate::error::ScenarioError;
use crate::grid::{
    FacilityImpact, GridSummary, GridTopology, LineSet, TerrainConfig, TerrainGrid, TopologyData,
};
use crate::optimizer::{
    check_connectivity, optimize_shutoffs, ConnectivityResult, OptimizerConfig, ShutoffPlan,
};
use crate::risk::engine::assess_validated;
use crate::risk::{compute_risk_reduction, RiskConfig, RiskGrid, RiskReduction};
use crate::spread::{spread_scenarios, IgnitionPoint, SpreadScenario};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info};

/// Scenario state for one operator session
#[derive(Debug, Clone)]
pub struct Session {
    terrain: TerrainGrid,
    topology: GridTopology,
    weather: WeatherState,
    risk_config: RiskConfig,
    /// Template for plan searches; `max_shutoffs`/`protect_critical` come per call
    optimizer: OptimizerConfig,
    disabled: LineSet,
    /// Every line energized, under the current weather
    baseline: RiskGrid,
    /// Risk with `disabled` applied; `None` until requested after a change
    current: Option<RiskGrid>,
    plan_cache: FxHashMap<OptimizerConfig, Vec<ShutoffPlan>>,
}

impl Session {
    /// Start a session with every line energized
    ///
    /// # Errors
    /// Same as [`Session::with_config`]; the default weights always validate.
    pub fn new(
        terrain: TerrainGrid,
        topology: GridTopology,
        weather: WeatherState,
    ) -> Result<Self, ScenarioError> {
        Self::with_config(
            terrain,
            topology,
            weather,
            RiskConfig::default(),
            OptimizerConfig::default(),
        )
    }

    /// Start a session with explicit risk and search settings
    ///
    /// The risk config is fixed for the session's lifetime, so its weights
    /// are checked once here.
    ///
    /// # Errors
    /// Returns [`ScenarioError::InvalidWeights`] if the risk weights don't
    /// validate.
    pub fn with_config(
        terrain: TerrainGrid,
        topology: GridTopology,
        weather: WeatherState,
        risk_config: RiskConfig,
        optimizer: OptimizerConfig,
    ) -> Result<Self, ScenarioError> {
        risk_config.weights.validate()?;
        let baseline =
            assess_validated(&terrain, &topology, &LineSet::new(), &weather, &risk_config);
        info!(
            "Session started: {} cells, {} lines, baseline mean risk {:.4}",
            terrain.len(),
            topology.lines().len(),
            baseline.mean_risk()
        );
        Ok(Self {
            terrain,
            topology,
            weather,
            risk_config,
            optimizer,
            disabled: LineSet::new(),
            baseline,
            current: None,
            plan_cache: FxHashMap::default(),
        })
    }

    /// Sonoma foothills terrain and grid under `weather`
    ///
    /// # Errors
    /// Returns [`ScenarioError::Topology`] if the demo topology fails
    /// validation.
    pub fn sonoma_demo(weather: WeatherState) -> Result<Self, ScenarioError> {
        let topology = GridTopology::new(TopologyData::sonoma_demo())?;
        let terrain = TerrainGrid::generate(&TerrainConfig::default());
        Self::new(terrain, topology, weather)
    }

    pub fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    pub fn topology(&self) -> &GridTopology {
        &self.topology
    }

    pub fn weather(&self) -> &WeatherState {
        &self.weather
    }

    pub fn risk_config(&self) -> &RiskConfig {
        &self.risk_config
    }

    /// Replace the weather snapshot; drops every derived result
    pub fn set_weather(&mut self, weather: WeatherState) {
        if weather == self.weather {
            return;
        }
        self.weather = weather;
        self.baseline = assess_validated(
            &self.terrain,
            &self.topology,
            &LineSet::new(),
            &self.weather,
            &self.risk_config,
        );
        self.current = None;
        self.plan_cache.clear();
        info!(
            "Weather updated: wind {} gust {} RH {}, baseline mean risk {:.4}",
            self.weather.wind_speed,
            self.weather.wind_gust,
            self.weather.humidity,
            self.baseline.mean_risk()
        );
    }

    /// Energize or de-energize one line
    ///
    /// # Errors
    /// Returns [`ScenarioError::UnknownLine`] if `id` isn't in the topology.
    pub fn set_line_active(&mut self, id: &str, active: bool) -> Result<(), ScenarioError> {
        if !self.topology.contains_line(id) {
            return Err(ScenarioError::UnknownLine(id.to_string()));
        }
        let changed = if active {
            self.disabled.remove(id)
        } else {
            self.disabled.insert(id.to_string())
        };
        if changed {
            debug!("Line {} {}", id, if active { "energized" } else { "de-energized" });
            self.current = None;
        }
        Ok(())
    }

    /// Lines currently de-energized by the operator
    pub fn disabled_lines(&self) -> &LineSet {
        &self.disabled
    }

    /// Re-energize every line
    pub fn reset_lines(&mut self) {
        if !self.disabled.is_empty() {
            self.disabled.clear();
            self.current = None;
        }
    }

    /// Replace the disabled set with a plan's lines
    ///
    /// # Errors
    /// Returns [`ScenarioError::UnknownLine`] if the plan names a line this
    /// topology doesn't have; the session is left unchanged.
    pub fn apply_plan(&mut self, plan: &ShutoffPlan) -> Result<(), ScenarioError> {
        if let Some(unknown) = plan
            .lines_disabled
            .iter()
            .find(|id| !self.topology.contains_line(id))
        {
            return Err(ScenarioError::UnknownLine(unknown.clone()));
        }
        let lines = plan.line_set();
        if lines != self.disabled {
            info!("Applying plan #{}: {:?}", plan.rank, plan.lines_disabled);
            self.disabled = lines;
            self.current = None;
        }
        Ok(())
    }

    /// Risk with every line energized
    pub fn baseline_risk(&self) -> &RiskGrid {
        &self.baseline
    }

    /// Risk with the current disabled set applied
    pub fn current_risk(&mut self) -> &RiskGrid {
        self.current.get_or_insert_with(|| {
            assess_validated(
                &self.terrain,
                &self.topology,
                &self.disabled,
                &self.weather,
                &self.risk_config,
            )
        })
    }

    /// Baseline vs current risk
    ///
    /// # Errors
    /// Only fails if the two grids differ in size, which a session never
    /// produces.
    pub fn risk_reduction(&mut self) -> Result<RiskReduction, ScenarioError> {
        let current = self.current.get_or_insert_with(|| {
            assess_validated(
                &self.terrain,
                &self.topology,
                &self.disabled,
                &self.weather,
                &self.risk_config,
            )
        });
        compute_risk_reduction(&self.baseline, current)
    }

    /// Ranked plans for the current weather, cached per search setting
    ///
    /// # Errors
    /// Returns [`ScenarioError::InvalidMaxShutoffs`] if `max_shutoffs` is 0.
    pub fn plans(
        &mut self,
        max_shutoffs: usize,
        protect_critical: bool,
    ) -> Result<&[ShutoffPlan], ScenarioError> {
        let config = OptimizerConfig {
            max_shutoffs,
            protect_critical,
            ..self.optimizer
        };
        match self.plan_cache.entry(config) {
            Entry::Occupied(entry) => {
                debug!("Plan cache hit for {:?}", config);
                Ok(entry.into_mut().as_slice())
            }
            Entry::Vacant(entry) => {
                let plans = optimize_shutoffs(&self.topology, &self.weather, &config)?;
                Ok(entry.insert(plans).as_slice())
            }
        }
    }

    /// Connectivity with the current disabled set
    pub fn connectivity(&self) -> ConnectivityResult {
        check_connectivity(&self.topology, &self.disabled)
    }

    /// Facilities without power under the current disabled set
    pub fn affected_facilities(&self) -> Vec<FacilityImpact> {
        self.topology.affected_facilities(&self.disabled)
    }

    pub fn grid_summary(&self) -> GridSummary {
        self.topology.grid_summary(&self.disabled)
    }

    /// Spread perimeters from the highest-risk cell of the current grid
    ///
    /// Returns `None` for an empty terrain grid.
    pub fn spread_from_peak(
        &mut self,
        horizons: &[f64],
    ) -> Option<(IgnitionPoint, Vec<SpreadScenario>)> {
        let peak = self.current_risk().max_cell()?;
        let ignition = IgnitionPoint::new(peak.cell.lat, peak.cell.lon);
        Some((ignition, spread_scenarios(ignition, &self.weather, horizons)))
    }
}
