use menu_editor::services::seed;
use menu_editor::{
    ChannelPresenter, CoordinatorHandle, DocumentId, EditorConfig, EditorError, PresenterEvent,
    SessionCoordinator, SimulatedGateway, UnsavedDecision,
};
use std::panic;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Save attempts before the walkthrough gives up and discards instead.
const MAX_SAVE_ATTEMPTS: usize = 5;

#[derive(Debug, thiserror::Error)]
enum WalkthroughError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("Load of '{id}' failed: {reason}")]
    LoadFailed { id: DocumentId, reason: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "menu_editor=debug,info".into()))
        .init();

    info!("Starting menu editor walkthrough...");

    let config = EditorConfig::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        EditorConfig::default()
    });

    if config.is_development() {
        info!("Configuration: {:?}", config);
    }

    let documents = config.document_ids();
    let gateway = Arc::new(SimulatedGateway::with_documents(
        config.gateway_settings(),
        documents
            .iter()
            .map(|id| (id.clone(), seed::initial_content(id))),
    ));
    let (presenter, mut events) = ChannelPresenter::channel();
    let handle = SessionCoordinator::start(documents.clone(), gateway.clone(), Arc::new(presenter));

    if let Err(e) = walkthrough(&handle, &mut events, &documents).await {
        error!("Walkthrough aborted: {}", e);
        return;
    }

    match handle.dirty_documents().await {
        Ok(dirty) if dirty.is_empty() => info!("No unsaved changes, safe to exit"),
        Ok(dirty) => warn!("Exiting with unsaved changes in {:?}", dirty),
        Err(e) => error!("Could not check for unsaved changes: {}", e),
    }
    for id in &documents {
        if let Some(stored) = gateway.stored(id).await {
            info!(
                "Stored {}: {}",
                id,
                serde_json::to_string(&stored).unwrap_or_else(|_| "Unable to serialize".to_string())
            );
        }
    }
}

async fn walkthrough(
    handle: &CoordinatorHandle,
    events: &mut UnboundedReceiver<PresenterEvent>,
    documents: &[DocumentId],
) -> Result<(), WalkthroughError> {
    let Some(first) = documents.first().cloned() else {
        warn!("No documents configured");
        return Ok(());
    };

    handle.request_activate(first.clone()).await?;
    let content = wait_for_activation(events, &first).await?;

    let Some(second) = documents.get(1).cloned() else {
        info!("Only one document configured, nothing to switch to");
        return Ok(());
    };

    // Add a dish, then switch away and answer SAVE until the store accepts it.
    handle
        .edit(first.clone(), format!("{}\nSpecial: Chef's tasting plate", content))
        .await?;
    let mut attempts = 0;
    loop {
        attempts += 1;
        handle.request_activate(second.clone()).await?;
        expect_decision(events, &first).await?;

        let decision = if attempts > MAX_SAVE_ATTEMPTS {
            UnsavedDecision::Discard
        } else {
            UnsavedDecision::Save
        };
        info!("Answering {} for '{}' (attempt {})", decision, first, attempts);
        handle.confirm_save_or_discard(decision).await?;

        if settle_switch(events, &second).await? {
            break;
        }
    }

    let Some(third) = documents.get(2).cloned() else {
        return Ok(());
    };

    // Edit the second menu and walk away from it with DISCARD.
    handle.edit(second.clone(), "Water").await?;
    let snapshot = handle.snapshot(second.clone()).await?;
    info!(
        "Before discarding: {}",
        serde_json::to_string(&snapshot).unwrap_or_else(|_| "Unable to serialize".to_string())
    );
    handle.request_activate(third.clone()).await?;
    expect_decision(events, &second).await?;
    handle.confirm_save_or_discard(UnsavedDecision::Discard).await?;
    wait_for_activation(events, &third).await?;
    Ok(())
}

async fn next_event(
    events: &mut UnboundedReceiver<PresenterEvent>,
) -> Result<PresenterEvent, EditorError> {
    let event = events
        .recv()
        .await
        .ok_or(EditorError::CoordinatorClosed)?;
    info!("Presenter <- {:?}", event);
    Ok(event)
}

async fn wait_for_activation(
    events: &mut UnboundedReceiver<PresenterEvent>,
    target: &DocumentId,
) -> Result<String, WalkthroughError> {
    loop {
        match next_event(events).await? {
            PresenterEvent::Activated { id, content } if id == *target => return Ok(content),
            PresenterEvent::LoadFailed { id, reason } => {
                return Err(WalkthroughError::LoadFailed { id, reason });
            }
            _ => {}
        }
    }
}

async fn expect_decision(
    events: &mut UnboundedReceiver<PresenterEvent>,
    dirty: &DocumentId,
) -> Result<(), EditorError> {
    loop {
        if let PresenterEvent::DecisionRequested { id } = next_event(events).await? {
            if id == *dirty {
                return Ok(());
            }
        }
    }
}

/// True once `target` is active, false if the switch was reverted.
async fn settle_switch(
    events: &mut UnboundedReceiver<PresenterEvent>,
    target: &DocumentId,
) -> Result<bool, WalkthroughError> {
    loop {
        match next_event(events).await? {
            PresenterEvent::Activated { id, .. } if id == *target => return Ok(true),
            PresenterEvent::SelectionReverted { .. } => return Ok(false),
            PresenterEvent::LoadFailed { id, reason } => {
                return Err(WalkthroughError::LoadFailed { id, reason });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn load_failure_keeps_its_reason() {
        let (tx, mut events) = mpsc::unbounded_channel();
        let tuesday = DocumentId::from("TUESDAY");
        let reason = "Request for 'TUESDAY' was abandoned before completing".to_string();
        tx.send(PresenterEvent::SaveSucceeded { id: DocumentId::from("MONDAY") })
            .unwrap();
        tx.send(PresenterEvent::LoadFailed { id: tuesday.clone(), reason: reason.clone() })
            .unwrap();

        match settle_switch(&mut events, &tuesday).await {
            Err(WalkthroughError::LoadFailed { id, reason: got }) => {
                assert_eq!(id, tuesday);
                assert_eq!(got, reason);
            }
            other => panic!("expected load failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn activation_wait_reports_closed_channel() {
        let (tx, mut events) = mpsc::unbounded_channel::<PresenterEvent>();
        drop(tx);

        let err = wait_for_activation(&mut events, &DocumentId::from("MONDAY"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalkthroughError::Editor(EditorError::CoordinatorClosed)));
    }
}
