//! Free-text answer checking: normalization, matching and validation.

mod matcher;
mod normalize;

pub use matcher::{matches, validate};
pub use normalize::normalize;
