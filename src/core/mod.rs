pub mod engine;
pub mod geo;
pub mod inference;
pub mod normalizer;
pub mod recommender;
pub mod rules;

pub use crate::domain::model::{Center, Condition, GeoPoint, Query, Recommendation, Record, Rule};
pub use crate::domain::ports::{RecordSource, Storage};
pub use crate::utils::error::Result;
