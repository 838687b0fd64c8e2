//! Business logic services

pub mod address;
pub mod geo;
pub mod geocoding;
pub mod grouping;
pub mod matrix;
pub mod nominatim;
pub mod optimizer;
pub mod routing;
pub mod schedule;
pub mod tour;
