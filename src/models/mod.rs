//! Data models for the marketplace.
//!
//! Wire format is camelCase JSON throughout.

mod brand;
mod listing;
mod message;
mod saved;

pub use brand::*;
pub use listing::*;
pub use message::*;
pub use saved::*;
