pub mod error;
pub mod offer;
pub mod region;

pub use error::*;
pub use offer::*;
pub use region::*;

#[cfg(test)]
pub(crate) mod fixtures;
