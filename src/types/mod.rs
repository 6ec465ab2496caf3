//! Core types used throughout the library

pub mod bounds;
pub mod flags;
pub mod id;
pub mod plane;
pub mod vector;

pub use bounds::BoundingBox3D;
pub use flags::ItemFlags;
pub use id::{GroupId, ItemId, MaterialId, VersionId};
pub use plane::Plane;
pub use vector::Vector3;
