//! Geometric representations and kernel operations

pub mod kernel;
pub mod representation;

pub use representation::{CurveRep, RegionRep, RepKind, Representation, SolidRep};
