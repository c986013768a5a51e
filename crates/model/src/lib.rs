//! Boutscope Data Model
//!
//! Defines the core data contracts shared by the analyzers:
//! - **Geometry:** Sub-pixel points, integer pixel coordinates, and regions
//! - **Trajectory:** Per-frame position traces and the speed traces derived from them
//! - **Bout:** Discrete movement episodes with their kinematics
//! - **Tail:** Per-segment tail posture measurements
//!
//! All positions are in image pixels. Every trace is indexed by frame number.

pub mod bout;
pub mod geometry;
pub mod tail;
pub mod trajectory;

pub use bout::*;
pub use geometry::*;
pub use tail::*;
pub use trajectory::*;
