//! Linear regression (ordinary least squares and ridge) implementing the
//! permimp-core [`Model`](permimp_core::Model) capability.

mod config;
mod error;
mod model;
mod solve;

pub use config::LinearRegressionConfig;
pub use error::LinearError;
pub use model::LinearRegression;
