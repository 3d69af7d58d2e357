//! Static scenario data: terrain cells and the power-grid topology

pub mod terrain;
pub mod topology;

// Re-export main types
pub use terrain::*;
pub use topology::*;
