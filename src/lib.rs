//! A 2D irregular-shape nesting engine: NFP-driven placement over a genetic
//! search of part orderings and rotations.
//!
//! The public surface is deliberately small: build polygons with
//! [`Polygon::new`], configure an [`Engine`] with a [`Config`], call
//! [`Engine::initialize`]/[`Engine::start`], then drive [`Engine::step`]
//! from whatever scheduling loop the caller owns (there is no internal
//! thread — see `engine`'s module docs). SVG/DXF parsing, rendering, unit
//! conversion, and a CLI are explicitly out of scope and are a caller's
//! responsibility, not this crate's.

pub mod alignment;
pub mod boolean;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod genetic;
pub mod nfp;
pub mod placement;
pub mod point;
pub mod polygon;

pub use config::{Config, DegeneracyOverrides, PlacementType};
pub use engine::{Engine, EngineState, NestingResult, ProgressCallback, ResultCallback};
pub use error::{NestError, Result};
pub use point::Point;
pub use polygon::{BoundingBox, Polygon};
