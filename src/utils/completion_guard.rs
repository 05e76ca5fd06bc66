use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

/// Posts a fallback message if dropped before `complete` is called.
///
/// Background tasks hold one of these so that a task which unwinds or is
/// aborted still reports back to the coordinator.
pub struct CompletionGuard<T> {
    tx: Option<UnboundedSender<T>>,
    fallback: Option<T>,
}

impl<T> CompletionGuard<T> {
    pub fn new(tx: UnboundedSender<T>, fallback: T) -> Self {
        Self {
            tx: Some(tx),
            fallback: Some(fallback),
        }
    }

    pub fn complete(mut self, message: T) {
        self.fallback = None;
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(message);
        }
    }
}

impl<T> Drop for CompletionGuard<T> {
    fn drop(&mut self) {
        if let (Some(tx), Some(fallback)) = (self.tx.take(), self.fallback.take()) {
            warn!("Background task ended without reporting, posting fallback completion");
            let _ = tx.send(fallback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn complete_sends_only_the_message() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        CompletionGuard::new(tx, "fallback").complete("done");
        assert_eq!(rx.try_recv(), Ok("done"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn drop_sends_fallback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drop(CompletionGuard::new(tx, "fallback"));
        assert_eq!(rx.try_recv(), Ok("fallback"));
    }

    #[tokio::test]
    async fn panicking_task_still_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let _guard = CompletionGuard::new(tx, "fallback");
            panic!("gateway blew up");
        });
        assert!(task.await.is_err());
        assert_eq!(rx.recv().await, Some("fallback"));
    }
}
