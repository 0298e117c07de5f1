//! Response normalization and structural diffing

mod diff;
mod normalize;

pub use diff::diff;
pub use normalize::{Normalizer, VOLATILE_FIELDS};
