//! Single-slot handle holding the last rendered payload.
//!
//! The slot is replaced whole; readers clone an `Arc` and never observe a
//! partially updated payload.

use crate::core::RenderPayload;
use std::sync::Arc;
use tokio::sync::watch;

type Slot = Option<Arc<RenderPayload>>;

/// Writer side of the render slot, owned by whoever renders.
#[derive(Debug, Clone)]
pub struct RenderHandle {
    sender: Arc<watch::Sender<Slot>>,
}

impl RenderHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the current payload, returning the previous one.
    pub fn replace(&self, payload: Arc<RenderPayload>) -> Option<Arc<RenderPayload>> {
        self.sender.send_replace(Some(payload))
    }

    pub fn current(&self) -> Option<Arc<RenderPayload>> {
        self.sender.borrow().clone()
    }

    /// Create a read-only view of the slot.
    pub fn subscribe(&self) -> RenderView {
        RenderView {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for RenderHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader side of the render slot.
#[derive(Debug, Clone)]
pub struct RenderView {
    receiver: watch::Receiver<Slot>,
}

impl RenderView {
    /// The last successfully rendered payload, if any.
    pub fn current(&self) -> Option<Arc<RenderPayload>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next replacement. Returns `false` once the handle is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HistoryWindow, LatestSnapshot, TransformSettings};

    fn payload() -> Arc<RenderPayload> {
        Arc::new(RenderPayload::build(
            &LatestSnapshot::new(),
            &HistoryWindow::default(),
            &TransformSettings::default(),
        ))
    }

    #[test]
    fn test_replace_swaps_whole_payload() {
        let handle = RenderHandle::new();
        let view = handle.subscribe();
        assert!(view.current().is_none());

        let first = payload();
        assert!(handle.replace(Arc::clone(&first)).is_none());
        assert_eq!(view.current().unwrap().cycle_id, first.cycle_id);

        let second = payload();
        let previous = handle.replace(Arc::clone(&second)).unwrap();
        assert_eq!(previous.cycle_id, first.cycle_id);
        assert_eq!(handle.current().unwrap().cycle_id, second.cycle_id);
    }

    #[tokio::test]
    async fn test_view_is_notified() {
        let handle = RenderHandle::new();
        let mut view = handle.subscribe();

        let p = payload();
        handle.replace(Arc::clone(&p));
        assert!(view.changed().await);
        assert_eq!(view.current().unwrap().cycle_id, p.cycle_id);

        drop(handle);
        assert!(!view.changed().await);
    }
}
