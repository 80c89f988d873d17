//! Access token records persisted by token stores.

pub mod record;
pub mod secret;

pub use record::*;
pub use secret::*;
