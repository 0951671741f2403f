//! Cooperative cancellation.
//!
//! A `CancelToken` is observed at every statement boundary (cheap atomic
//! flag) and participates in every blocking select through its `done`
//! receiver: cancelling drops the paired `Sender`, which makes the
//! receiver permanently ready — the same shape as a closed `Done()`
//! channel in the source runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

/// The cancelling half. Call [`CancelSource::cancel`] to signal; dropping
/// the source without cancelling also signals, so hold it for as long as
/// the execution may run.
pub struct CancelSource {
    tx: Option<Sender<()>>,
    flag: Arc<AtomicBool>,
}

impl CancelSource {
    /// Create a source and its observing token.
    pub fn new() -> (CancelSource, CancelToken) {
        let (tx, rx) = bounded::<()>(0);
        let flag = Arc::new(AtomicBool::new(false));
        let source = CancelSource {
            tx: Some(tx),
            flag: flag.clone(),
        };
        let token = CancelToken {
            flag,
            done: rx,
            hold: None,
        };
        (source, token)
    }

    /// Signal cancellation to every holder of the token.
    pub fn cancel(&mut self) {
        self.flag.store(true, Ordering::SeqCst);
        self.tx.take();
    }
}

impl Drop for CancelSource {
    fn drop(&mut self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// The observing half, cloned into every evaluation and spawned task that
/// shares the cancellation scope.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    done: Receiver<()>,
    // `never` tokens keep their sender alive so the channel never closes.
    hold: Option<Arc<Sender<()>>>,
}

impl CancelToken {
    /// A token that is never cancelled, for executions without a context.
    pub fn never() -> Self {
        let (tx, rx) = bounded::<()>(0);
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
            done: rx,
            hold: Some(Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.hold.is_none() && self.flag.load(Ordering::Relaxed)
    }

    /// The receiver selected against in blocking operations.
    pub(crate) fn done(&self) -> &Receiver<()> {
        &self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_sets_flag_and_closes_done() {
        let (mut source, token) = CancelSource::new();
        assert!(!token.is_cancelled());
        source.cancel();
        assert!(token.is_cancelled());
        // The done channel reports disconnect once cancelled.
        assert!(token.done().try_recv().is_err());
    }

    #[test]
    fn dropping_source_cancels() {
        let (source, token) = CancelSource::new();
        drop(source);
        assert!(token.is_cancelled());
    }

    #[test]
    fn never_token_stays_live() {
        let token = CancelToken::never();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        assert!(!clone.is_cancelled());
    }
}
