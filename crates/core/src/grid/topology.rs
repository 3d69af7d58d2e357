//! Power-grid topology: substations, lines and the priority loads they feed
//!
//! [`TopologyData`] is the plain, serde-friendly description a caller loads
//! or builds; [`GridTopology::new`] validates it once and resolves every
//! reference into indices and coordinates. After construction the topology
//! is read-only. Which lines are energized is tracked separately as a
//! [`LineSet`] of disabled ids, so one topology can back many what-if passes.

use crate::error::TopologyError;
use nalgebra::Vector2;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Set of line ids; ordered so iteration and hashing are deterministic
pub type LineSet = BTreeSet<String>;

/// Substation (graph node)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// Latitude (degrees)
    pub lat: f64,
    /// Longitude (degrees)
    pub lon: f64,
    /// Capacity (MW)
    pub capacity_mw: f64,
}

/// Transmission/distribution line (graph edge)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerLine {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// Substation id at one end
    pub from: String,
    /// Substation id at the other end
    pub to: String,
    /// Operating voltage (kV)
    pub voltage_kv: f64,
    /// Vegetation encroachment risk [0, 1]
    pub vegetation_risk: f64,
    /// Equipment age (years)
    pub age_years: f64,
    /// Whether the line is energized in the base case
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Kind of priority load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityKind {
    Hospital,
    Shelter,
    Comms,
    Water,
    FireStation,
    Eoc,
    Traffic,
}

/// Facility priority tier (1 = critical … 3 = low)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Tier 1: life safety, must stay powered
    Critical = 1,
    /// Tier 2: important services
    Elevated = 2,
    /// Tier 3: nice to keep powered
    Low = 3,
}

impl Priority {
    /// Numeric tier
    pub fn tier(self) -> u8 {
        self as u8
    }
}

/// Priority load bound to exactly one supplying line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalFacility {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// Facility kind
    pub kind: FacilityKind,
    /// Latitude (degrees)
    pub lat: f64,
    /// Longitude (degrees)
    pub lon: f64,
    /// Supplying line id
    pub feeder: String,
    /// Priority tier
    pub priority: Priority,
}

/// Impact severity of losing power at a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Moderate,
}

impl From<Priority> for Severity {
    fn from(p: Priority) -> Self {
        match p {
            Priority::Critical => Severity::Critical,
            Priority::Elevated => Severity::High,
            Priority::Low => Severity::Moderate,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Moderate => "MODERATE",
        };
        f.write_str(s)
    }
}

/// A facility that loses power under a set of disabled lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityImpact {
    /// Facility id
    pub facility_id: String,
    /// Facility name
    pub name: String,
    /// Facility kind
    pub kind: FacilityKind,
    /// Disabled feeder
    pub feeder: String,
    /// Priority tier of the facility
    pub priority: Priority,
    /// Impact severity
    pub severity: Severity,
}

/// Line with endpoints resolved to coordinates `(lon, lat)`
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLine {
    /// The line record
    pub line: PowerLine,
    /// Index of the `from` substation
    pub from_idx: usize,
    /// Index of the `to` substation
    pub to_idx: usize,
    /// `from` position as (lon, lat)
    pub start: Vector2<f64>,
    /// `to` position as (lon, lat)
    pub end: Vector2<f64>,
}

impl ResolvedLine {
    /// Span midpoint as (lon, lat)
    pub fn midpoint(&self) -> Vector2<f64> {
        (self.start + self.end) * 0.5
    }
}

/// Raw topology description, validated by [`GridTopology::new`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopologyData {
    pub substations: Vec<Substation>,
    pub lines: Vec<PowerLine>,
    pub facilities: Vec<CriticalFacility>,
}

/// Summary of grid state under a set of disabled lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSummary {
    pub total_substations: usize,
    pub total_lines: usize,
    pub active_lines: usize,
    pub disabled_lines: usize,
    pub total_capacity_mw: f64,
    pub grid_connected: bool,
    pub num_components: usize,
    pub critical_facilities: usize,
    pub facilities_impacted: usize,
}

/// Validated, read-only grid topology
#[derive(Debug, Clone)]
pub struct GridTopology {
    substations: Vec<Substation>,
    lines: Vec<ResolvedLine>,
    facilities: Vec<CriticalFacility>,
    substation_index: FxHashMap<String, usize>,
    line_index: FxHashMap<String, usize>,
}

impl GridTopology {
    /// Validate and resolve a topology description
    ///
    /// # Errors
    /// - [`TopologyError::EmptyTopology`] if there are no substations
    /// - [`TopologyError::DuplicateId`] if any id repeats within its kind
    /// - [`TopologyError::UnknownSubstation`] / [`TopologyError::SelfLoop`]
    ///   for bad line endpoints
    /// - [`TopologyError::UnknownFeeder`] if a facility names a missing line
    pub fn new(data: TopologyData) -> Result<Self, TopologyError> {
        let TopologyData {
            substations,
            lines,
            facilities,
        } = data;

        if substations.is_empty() {
            return Err(TopologyError::EmptyTopology);
        }

        let mut substation_index = FxHashMap::default();
        for (idx, sub) in substations.iter().enumerate() {
            if substation_index.insert(sub.id.clone(), idx).is_some() {
                return Err(TopologyError::DuplicateId {
                    kind: "substation",
                    id: sub.id.clone(),
                });
            }
        }

        let mut line_index = FxHashMap::default();
        let mut resolved = Vec::with_capacity(lines.len());
        for (idx, line) in lines.into_iter().enumerate() {
            let lookup = |sub_id: &str| {
                substation_index
                    .get(sub_id)
                    .copied()
                    .ok_or_else(|| TopologyError::UnknownSubstation {
                        line: line.id.clone(),
                        substation: sub_id.to_string(),
                    })
            };
            let from_idx = lookup(&line.from)?;
            let to_idx = lookup(&line.to)?;
            if from_idx == to_idx {
                return Err(TopologyError::SelfLoop {
                    line: line.id.clone(),
                });
            }
            if line_index.insert(line.id.clone(), idx).is_some() {
                return Err(TopologyError::DuplicateId {
                    kind: "line",
                    id: line.id.clone(),
                });
            }

            let a = &substations[from_idx];
            let b = &substations[to_idx];
            resolved.push(ResolvedLine {
                start: Vector2::new(a.lon, a.lat),
                end: Vector2::new(b.lon, b.lat),
                from_idx,
                to_idx,
                line,
            });
        }

        let mut facility_ids = FxHashSet::default();
        for facility in &facilities {
            if !facility_ids.insert(facility.id.as_str()) {
                return Err(TopologyError::DuplicateId {
                    kind: "facility",
                    id: facility.id.clone(),
                });
            }
            if !line_index.contains_key(&facility.feeder) {
                return Err(TopologyError::UnknownFeeder {
                    facility: facility.id.clone(),
                    line: facility.feeder.clone(),
                });
            }
        }

        Ok(GridTopology {
            substations,
            lines: resolved,
            facilities,
            substation_index,
            line_index,
        })
    }

    /// Substations in declaration order
    pub fn substations(&self) -> &[Substation] {
        &self.substations
    }

    /// Lines in declaration order
    pub fn lines(&self) -> &[ResolvedLine] {
        &self.lines
    }

    /// Priority loads in declaration order
    pub fn facilities(&self) -> &[CriticalFacility] {
        &self.facilities
    }

    /// Look up a line by id
    pub fn line(&self, id: &str) -> Option<&ResolvedLine> {
        self.line_index.get(id).map(|&idx| &self.lines[idx])
    }

    /// Index of a line by id, matching [`GridTopology::lines`]
    pub fn line_idx(&self, id: &str) -> Option<usize> {
        self.line_index.get(id).copied()
    }

    /// Index of a substation by id
    pub fn substation_idx(&self, id: &str) -> Option<usize> {
        self.substation_index.get(id).copied()
    }

    /// Whether `id` names a known line
    pub fn contains_line(&self, id: &str) -> bool {
        self.line_index.contains_key(id)
    }

    /// Lines energized once `disabled` is switched off
    pub fn active_lines<'a>(
        &'a self,
        disabled: &'a LineSet,
    ) -> impl Iterator<Item = &'a ResolvedLine> + 'a {
        self.lines
            .iter()
            .filter(move |l| l.line.active && !disabled.contains(&l.line.id))
    }

    /// Ids of every line feeding at least one facility, any tier
    pub fn critical_feeders(&self) -> LineSet {
        self.facilities.iter().map(|f| f.feeder.clone()).collect()
    }

    /// Whether line `id` carries power once `disabled` is switched off
    ///
    /// Lines inactive in the base topology and unknown ids are dead.
    pub fn is_energized(&self, id: &str, disabled: &LineSet) -> bool {
        !disabled.contains(id) && self.line(id).is_some_and(|l| l.line.active)
    }

    /// Facilities without power when `disabled` lines are switched off,
    /// including those already on a base-inactive feeder
    pub fn affected_facilities(&self, disabled: &LineSet) -> Vec<FacilityImpact> {
        self.impacts(|f| !self.is_energized(&f.feeder, disabled))
    }

    /// Facilities whose feeder is one of `lines`
    pub fn facilities_fed_by(&self, lines: &LineSet) -> Vec<FacilityImpact> {
        self.impacts(|f| lines.contains(&f.feeder))
    }

    fn impacts(&self, mut lost: impl FnMut(&CriticalFacility) -> bool) -> Vec<FacilityImpact> {
        self.facilities
            .iter()
            .filter(|f| lost(f))
            .map(|f| FacilityImpact {
                facility_id: f.id.clone(),
                name: f.name.clone(),
                kind: f.kind,
                feeder: f.feeder.clone(),
                priority: f.priority,
                severity: f.priority.into(),
            })
            .collect()
    }

    /// Line and facility counts plus connectivity under `disabled`
    ///
    /// Base-inactive lines count as disabled, matching what the connectivity
    /// check removes.
    pub fn grid_summary(&self, disabled: &LineSet) -> GridSummary {
        let disabled_count = self
            .lines
            .iter()
            .filter(|l| !l.line.active || disabled.contains(&l.line.id))
            .count();
        let connectivity = crate::optimizer::check_connectivity(self, disabled);

        GridSummary {
            total_substations: self.substations.len(),
            total_lines: self.lines.len(),
            active_lines: self.lines.len() - disabled_count,
            disabled_lines: disabled_count,
            total_capacity_mw: self.substations.iter().map(|s| s.capacity_mw).sum(),
            grid_connected: connectivity.connected,
            num_components: connectivity.num_components,
            critical_facilities: self.facilities.len(),
            facilities_impacted: self.affected_facilities(disabled).len(),
        }
    }
}

impl TopologyData {
    /// Sonoma County demo grid: 5 substations, 8 lines, 8 priority loads
    pub fn sonoma_demo() -> Self {
        let sub = |id: &str, name: &str, lat: f64, lon: f64, capacity_mw: f64| Substation {
            id: id.to_string(),
            name: name.to_string(),
            lat,
            lon,
            capacity_mw,
        };
        let line = |id: &str, name: &str, from: &str, to: &str, kv: f64, veg: f64, age: f64| {
            PowerLine {
                id: id.to_string(),
                name: name.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                voltage_kv: kv,
                vegetation_risk: veg,
                age_years: age,
                active: true,
            }
        };
        let facility = |id: &str,
                        name: &str,
                        kind: FacilityKind,
                        (lat, lon): (f64, f64),
                        feeder: &str,
                        priority: Priority| CriticalFacility {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            lat,
            lon,
            feeder: feeder.to_string(),
            priority,
        };

        use FacilityKind as K;
        use Priority as P;

        TopologyData {
            substations: vec![
                sub("SUB-01", "Sonoma Valley Substation", 38.505, -122.84, 120.0),
                sub("SUB-02", "Bennett Ridge Substation", 38.545, -122.78, 85.0),
                sub("SUB-03", "Mark West Substation", 38.530, -122.73, 150.0),
                sub("SUB-04", "Glen Ellen Substation", 38.490, -122.86, 60.0),
                sub("SUB-05", "Kenwood Substation", 38.560, -122.70, 95.0),
            ],
            lines: vec![
                line("PL-01", "Bennett-Mark West 115kV", "SUB-02", "SUB-03", 115.0, 0.85, 42.0),
                line("PL-02", "Sonoma-Glen Ellen 60kV", "SUB-01", "SUB-04", 60.0, 0.45, 28.0),
                line("PL-03", "Glen Ellen-Bennett 60kV", "SUB-04", "SUB-02", 60.0, 0.72, 35.0),
                line("PL-04", "Mark West-Kenwood 115kV", "SUB-03", "SUB-05", 115.0, 0.90, 38.0),
                line("PL-05", "Sonoma-Bennett Ridge 115kV", "SUB-01", "SUB-02", 115.0, 0.60, 25.0),
                line("PL-06", "Kenwood-Bennett 60kV", "SUB-05", "SUB-02", 60.0, 0.78, 51.0),
                line("PL-07", "Sonoma-Kenwood Trunk 230kV", "SUB-01", "SUB-05", 230.0, 0.55, 18.0),
                line("PL-08", "Glen Ellen-Kenwood Feeder 60kV", "SUB-04", "SUB-05", 60.0, 0.82, 45.0),
            ],
            facilities: vec![
                facility("CF-01", "Sonoma Valley Hospital", K::Hospital, (38.502, -122.835), "PL-02", P::Critical),
                facility("CF-02", "Mark West Emergency Shelter", K::Shelter, (38.528, -122.74), "PL-01", P::Critical),
                facility("CF-03", "Bennett Ridge Comm Tower", K::Comms, (38.548, -122.79), "PL-01", P::Elevated),
                facility("CF-04", "Glen Ellen Water Pump Station", K::Water, (38.488, -122.855), "PL-02", P::Critical),
                facility("CF-05", "Kenwood Fire Station", K::FireStation, (38.558, -122.71), "PL-04", P::Critical),
                facility("CF-06", "Sonoma County EOC", K::Eoc, (38.510, -122.82), "PL-05", P::Critical),
                facility("CF-07", "Highway 12 Traffic Control", K::Traffic, (38.515, -122.78), "PL-05", P::Low),
                facility("CF-08", "Oakmont Senior Living", K::Shelter, (38.540, -122.75), "PL-01", P::Critical),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> GridTopology {
        GridTopology::new(TopologyData::sonoma_demo()).unwrap()
    }

    fn set(ids: &[&str]) -> LineSet {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_demo_topology_valid() {
        let topo = demo();
        assert_eq!(topo.substations().len(), 5);
        assert_eq!(topo.lines().len(), 8);
        assert_eq!(topo.facilities().len(), 8);
        assert!(topo.contains_line("PL-07"));
        assert!(!topo.contains_line("PL-99"));
        assert_eq!(topo.substation_idx("SUB-03"), Some(2));
    }

    #[test]
    fn test_resolved_midpoint() {
        let topo = demo();
        let pl = topo.line("PL-01").unwrap();
        let mid = pl.midpoint();
        assert!((mid.x - (-122.78 + -122.73) / 2.0).abs() < 1e-12);
        assert!((mid.y - (38.545 + 38.530) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_substation_rejected() {
        let mut data = TopologyData::sonoma_demo();
        data.lines[2].to = "SUB-99".to_string();
        let err = GridTopology::new(data).unwrap_err();
        assert_eq!(
            err,
            TopologyError::UnknownSubstation {
                line: "PL-03".to_string(),
                substation: "SUB-99".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_feeder_rejected() {
        let mut data = TopologyData::sonoma_demo();
        data.facilities[0].feeder = "PL-42".to_string();
        let err = GridTopology::new(data).unwrap_err();
        assert!(matches!(err, TopologyError::UnknownFeeder { ref facility, .. } if facility == "CF-01"));
    }

    #[test]
    fn test_duplicate_and_self_loop_rejected() {
        let mut dup = TopologyData::sonoma_demo();
        dup.lines[1].id = "PL-01".to_string();
        assert!(matches!(
            GridTopology::new(dup),
            Err(TopologyError::DuplicateId { kind: "line", .. })
        ));

        let mut looped = TopologyData::sonoma_demo();
        looped.lines[0].to = looped.lines[0].from.clone();
        assert!(matches!(
            GridTopology::new(looped),
            Err(TopologyError::SelfLoop { .. })
        ));

        assert_eq!(
            GridTopology::new(TopologyData::default()).unwrap_err(),
            TopologyError::EmptyTopology
        );
    }

    #[test]
    fn test_critical_feeders() {
        let feeders = demo().critical_feeders();
        assert_eq!(feeders, set(&["PL-01", "PL-02", "PL-04", "PL-05"]));
    }

    #[test]
    fn test_affected_facilities_severity() {
        let topo = demo();
        let impacts = topo.affected_facilities(&set(&["PL-05"]));
        assert_eq!(impacts.len(), 2);
        assert_eq!(impacts[0].facility_id, "CF-06");
        assert_eq!(impacts[0].severity, Severity::Critical);
        assert_eq!(impacts[1].facility_id, "CF-07");
        assert_eq!(impacts[1].severity, Severity::Moderate);

        assert!(topo.affected_facilities(&set(&["PL-03"])).is_empty());
    }

    #[test]
    fn test_active_lines_excludes_disabled() {
        let topo = demo();
        let disabled = set(&["PL-01", "PL-08"]);
        let active: Vec<&str> = topo
            .active_lines(&disabled)
            .map(|l| l.line.id.as_str())
            .collect();
        assert_eq!(active, vec!["PL-02", "PL-03", "PL-04", "PL-05", "PL-06", "PL-07"]);
    }

    #[test]
    fn test_grid_summary() {
        let topo = demo();
        let summary = topo.grid_summary(&set(&["PL-02", "PL-03"]));
        assert_eq!(summary.total_lines, 8);
        assert_eq!(summary.active_lines, 6);
        assert_eq!(summary.disabled_lines, 2);
        assert_eq!(summary.total_capacity_mw, 510.0);
        // SUB-04 is only reachable through PL-02, PL-03 and PL-08
        assert!(summary.grid_connected);
        assert_eq!(summary.facilities_impacted, 2);
    }

    #[test]
    fn test_base_inactive_line_counts_as_disabled() {
        let mut data = TopologyData::sonoma_demo();
        data.lines[0].active = false;
        let topo = GridTopology::new(data).unwrap();
        let none = LineSet::new();

        assert!(!topo.is_energized("PL-01", &none));
        assert!(topo.is_energized("PL-02", &none));
        assert!(!topo.is_energized("PL-02", &set(&["PL-02"])));
        assert!(!topo.is_energized("PL-99", &none));

        let summary = topo.grid_summary(&none);
        assert_eq!(summary.disabled_lines, 1);
        assert_eq!(summary.active_lines, 7);
        assert_eq!(summary.active_lines, topo.active_lines(&none).count());
        assert_eq!(summary.facilities_impacted, 3);

        let ids: Vec<String> = topo
            .affected_facilities(&none)
            .into_iter()
            .map(|f| f.facility_id)
            .collect();
        assert_eq!(ids, vec!["CF-02", "CF-03", "CF-08"]);

        // Naming the dead line again doesn't double count it
        let summary = topo.grid_summary(&set(&["PL-01", "PL-05"]));
        assert_eq!(summary.disabled_lines, 2);
        assert_eq!(summary.facilities_impacted, 5);
    }

    #[test]
    fn test_facilities_fed_by_ignores_base_state() {
        let mut data = TopologyData::sonoma_demo();
        data.lines[0].active = false;
        let topo = GridTopology::new(data).unwrap();
        let fed = topo.facilities_fed_by(&set(&["PL-05"]));
        assert_eq!(fed.len(), 2);
        assert!(fed.iter().all(|f| f.feeder == "PL-05"));
    }

    #[test]
    fn test_priority_tiers() {
        assert_eq!(Priority::Critical.tier(), 1);
        assert_eq!(Priority::Low.tier(), 3);
        assert_eq!(Severity::from(Priority::Elevated).to_string(), "HIGH");
    }
}
