pub mod decision;
pub mod document;
pub mod error;
pub mod snapshot;

pub use decision::*;
pub use document::*;
pub use error::*;
pub use snapshot::*;
