//! Cooperative cancellation for mapping runs.
//!
//! The run checks the signal between stages. A cancelled run rolls the
//! session back to its open, unresolved state.

use tokio::sync::watch;

/// Operator side: triggers cancellation.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Run side: observed between stages.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelHandle {
    /// Create a (handle, signal) pair.
    pub fn new() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelSignal { rx: Some(rx) })
    }

    pub fn cancel(&self) {
        // send_replace succeeds even when every signal has been dropped
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Another signal observing this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: Some(self.tx.subscribe()),
        }
    }
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_reaches_every_signal() {
        let (handle, signal) = CancelHandle::new();
        let second = handle.signal();
        assert!(!signal.is_cancelled());

        handle.cancel();
        assert!(signal.is_cancelled());
        assert!(second.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_never_signal() {
        assert!(!CancelSignal::never().is_cancelled());
    }
}
