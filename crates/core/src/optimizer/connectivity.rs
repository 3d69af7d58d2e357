//! Substation connectivity under a set of removed lines
//!
//! Union-find over substation indices. Components are reported in a fixed
//! order (by the declaration index of their first substation, members in
//! declaration order) so callers see the same output every time.

use crate::grid::{GridTopology, LineSet, ResolvedLine};
use serde::{Deserialize, Serialize};

/// Outcome of a connectivity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityResult {
    /// Exactly one component remains
    pub connected: bool,
    /// Number of connected components
    pub num_components: usize,
    /// Substation ids per component
    pub components: Vec<Vec<String>>,
    /// Substations left without any energized line
    pub isolated_substations: Vec<String>,
}

fn find(parent: &mut [usize], i: usize) -> usize {
    if parent[i] != i {
        parent[i] = find(parent, parent[i]);
    }
    parent[i]
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let pa = find(parent, a);
    let pb = find(parent, b);
    if pa != pb {
        // Keep the lower index as root so labels are stable
        let (lo, hi) = if pa < pb { (pa, pb) } else { (pb, pa) };
        parent[hi] = lo;
    }
}

/// Component label per substation over the lines `keep` accepts
///
/// Labels are the lowest substation index in each component.
fn labels_where(topology: &GridTopology, keep: impl Fn(usize, &ResolvedLine) -> bool) -> Vec<usize> {
    let n = topology.substations().len();
    let mut parent: Vec<usize> = (0..n).collect();
    for (idx, line) in topology.lines().iter().enumerate() {
        if line.line.active && keep(idx, line) {
            union(&mut parent, line.from_idx, line.to_idx);
        }
    }
    (0..n).map(|i| find(&mut parent, i)).collect()
}

fn count_roots(labels: &[usize]) -> usize {
    labels
        .iter()
        .enumerate()
        .filter(|(i, root)| i == *root)
        .count()
}

/// Number of components with `removed` lines taken out
///
/// Lines already inactive in the base topology are treated as removed too.
pub fn count_components(topology: &GridTopology, removed: &LineSet) -> usize {
    count_roots(&labels_where(topology, |_, l| !removed.contains(&l.line.id)))
}

/// Component count with lines removed by index, for the optimizer's inner loop
pub(crate) fn count_components_by_index(topology: &GridTopology, removed: &[usize]) -> usize {
    count_roots(&labels_where(topology, |idx, _| !removed.contains(&idx)))
}

/// Full connectivity report with `removed` lines taken out
pub fn check_connectivity(topology: &GridTopology, removed: &LineSet) -> ConnectivityResult {
    let labels = labels_where(topology, |_, l| !removed.contains(&l.line.id));
    let substations = topology.substations();

    // Roots are the minimum index in their component, so visiting in index
    // order yields components ordered by first member
    let mut slot_of_root: Vec<Option<usize>> = vec![None; labels.len()];
    let mut components: Vec<Vec<String>> = Vec::new();
    for (idx, &root) in labels.iter().enumerate() {
        let slot = match slot_of_root[root] {
            Some(slot) => slot,
            None => {
                components.push(Vec::new());
                slot_of_root[root] = Some(components.len() - 1);
                components.len() - 1
            }
        };
        components[slot].push(substations[idx].id.clone());
    }

    let isolated_substations = components
        .iter()
        .filter(|c| c.len() == 1)
        .flatten()
        .cloned()
        .collect();

    ConnectivityResult {
        connected: components.len() == 1,
        num_components: components.len(),
        components,
        isolated_substations,
    }
}
