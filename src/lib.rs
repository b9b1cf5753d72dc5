pub mod error;
pub mod holder;
pub mod memory;
pub mod schema;
pub mod validity;
pub mod vector;
pub mod view;

pub use crate::error::{Error, Result};
pub use crate::holder::{FixedSizeBinaryHolder, NullableFixedSizeBinaryHolder};
pub use crate::memory::{Buffer, BufferAllocator, RootAllocator};
pub use crate::schema::{Field, FixedSizeBinaryType};
pub use crate::vector::FixedSizeBinaryVector;

#[cfg(test)]
mod tests;
