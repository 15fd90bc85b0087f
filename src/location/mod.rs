pub mod model;
pub mod service;
pub mod v1;

pub use model::Location;
