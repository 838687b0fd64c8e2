//! Tour optimization engine for last-mile package delivery
//!
//! Groups pending packages into stops, locates them, orders them with a
//! nearest-neighbor heuristic (optionally priority and time-window aware)
//! and projects arrival times along the resulting tour.

pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod services;
pub mod types;

pub use error::TourError;
pub use services::optimizer::{ConstraintConfig, OptimizerStrategy};
pub use services::tour::{RequestTrace, Stage, TourAssembler};
pub use types::{DeliveryPoint, Package, RouteSettings, TourRequest, TourResult};
