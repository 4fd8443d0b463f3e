use tokio::sync::mpsc;

use crate::event::RenderEvent;

/// Handle onto the render thread's inbound queue. Pushes never block, so
/// input-thread handlers can submit work while holding the layout lock.
#[derive(Clone)]
pub struct RenderHandle {
    tx: mpsc::UnboundedSender<RenderEvent>,
}

impl RenderHandle {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RenderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn push_event(&self, event: RenderEvent) {
        let _ = self.tx.send(event);
    }

    pub fn request_render(&self) {
        self.push_event(RenderEvent::RequestRender);
    }

    pub fn request_exit(&self) {
        self.push_event(RenderEvent::Exit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_is_received_in_order() {
        let (handle, mut rx) = RenderHandle::new();
        handle.request_render();
        handle.push_event(RenderEvent::WriteString("x".into()));
        assert_eq!(rx.try_recv().unwrap(), RenderEvent::RequestRender);
        assert_eq!(rx.try_recv().unwrap(), RenderEvent::WriteString("x".into()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn push_after_receiver_dropped_is_ignored() {
        let (handle, rx) = RenderHandle::new();
        drop(rx);
        handle.request_render();
    }
}
