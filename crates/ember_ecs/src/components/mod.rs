//! Component types shared by every consumer of the entity store.

mod transform;
pub use transform::*;
