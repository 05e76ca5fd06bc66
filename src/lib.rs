pub mod config;
pub mod models;
pub mod presenter;
pub mod services;
pub mod session;
mod utils;

pub use config::EditorConfig;
pub use models::*;
pub use presenter::{ChannelPresenter, Presenter, PresenterEvent};
pub use services::gateway::{GatewaySettings, PersistenceGateway, SimulatedGateway, StoredDocument};
pub use session::{CoordinatorHandle, EditSession, SaveOutcome, SaveReport, SessionCoordinator};
