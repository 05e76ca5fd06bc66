//! Edit sessions and the coordinator that switches between them.
//!
//! - `edit_session`: one document's baseline/current content (`EditSession`)
//! - `coordinator`: the actor owning all sessions (`SessionCoordinator`)
//! - `handle`: cloneable request API for Presenters (`CoordinatorHandle`)

mod coordinator;
mod edit_session;
mod handle;


pub use coordinator::SessionCoordinator;
pub use edit_session::{EditSession, LoadFuture, SaveFuture, SaveOutcome, SaveReport};
pub use handle::CoordinatorHandle;
