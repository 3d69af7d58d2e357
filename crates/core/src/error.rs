//! Error types
//!
//! Only structural problems are errors. An empty candidate set, a grid that
//! splits into islands, or calm/bone-dry weather are all valid outcomes that
//! the scoring code handles in-band.

use thiserror::Error;

/// Invalid power-grid topology, raised when a [`crate::GridTopology`] is built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Topology has no substations
    #[error("Topology has no substations")]
    EmptyTopology,

    /// Two entities of the same kind share an id
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId {
        /// Entity kind ("substation", "line", "facility")
        kind: &'static str,
        /// The repeated id
        id: String,
    },

    /// A line endpoint names a substation that doesn't exist
    #[error("Line {line} references unknown substation {substation}")]
    UnknownSubstation {
        /// Offending line id
        line: String,
        /// Missing substation id
        substation: String,
    },

    /// A line connects a substation to itself
    #[error("Line {line} starts and ends at the same substation")]
    SelfLoop {
        /// Offending line id
        line: String,
    },

    /// A facility's feeder names a line that doesn't exist
    #[error("Facility {facility} is fed by unknown line {line}")]
    UnknownFeeder {
        /// Offending facility id
        facility: String,
        /// Missing line id
        line: String,
    },
}

/// Invalid terrain grid layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerrainError {
    /// Cell count doesn't match rows × cols
    #[error("Expected {expected} cells for the grid dimensions, got {got}")]
    DimensionMismatch {
        /// rows × cols
        expected: usize,
        /// Cells supplied
        got: usize,
    },

    /// A cell's (i, j) doesn't match its row-major position
    #[error("Cell at position {index} has indices ({i}, {j}), expected row-major order")]
    OutOfOrder {
        /// Position in the supplied sequence
        index: usize,
        /// Row index carried by the cell
        i: usize,
        /// Column index carried by the cell
        j: usize,
    },
}

/// Errors from scenario passes and session operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    /// Topology failed validation while building a scenario
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Line id not present in the topology
    #[error("Unknown line id: {0}")]
    UnknownLine(String),

    /// Plan search needs at least one line per plan
    #[error("Invalid max shutoffs: {0} (must be at least 1)")]
    InvalidMaxShutoffs(usize),

    /// Risk weights are negative, non-finite or don't sum to 1
    #[error("Risk weights must be non-negative and sum to 1 (sum = {0})")]
    InvalidWeights(String),

    /// Proximity array doesn't cover the terrain grid
    #[error("Proximity array has {got} entries for a grid of {expected} cells")]
    ProximityMismatch {
        /// Cells in the grid
        expected: usize,
        /// Entries supplied
        got: usize,
    },

    /// Before/after grids don't cover the same cells
    #[error("Risk grids differ in size: before has {before} cells, after has {after}")]
    GridMismatch {
        /// Cells in the "before" grid
        before: usize,
        /// Cells in the "after" grid
        after: usize,
    },
}
