//! Script channels.
//!
//! `make(chan)` builds a rendezvous channel, `make(chan, n)` a buffered
//! one. Every blocking operation is a select against the cancellation
//! token. Closing drops the stored sender; receivers drain buffered
//! values and then observe disconnect, which is the close signal.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Select, Sender};
use parking_lot::RwLock;

use crate::ast::Pos;

use super::cancel::CancelToken;
use super::errors::{self, EvalError};
use super::value::Value;

#[derive(Clone)]
pub struct Channel(Arc<ChanInner>);

struct ChanInner {
    tx: RwLock<Option<Sender<Value>>>,
    rx: Receiver<Value>,
    capacity: usize,
}

impl Channel {
    /// Capacity zero is a rendezvous channel: sends block until a
    /// matching receive.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Channel(Arc::new(ChanInner {
            tx: RwLock::new(Some(tx)),
            rx,
            capacity,
        }))
    }

    pub fn capacity(&self) -> usize {
        self.0.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.0.tx.read().is_none()
    }

    /// Close the channel. Further sends fail; receives drain and then
    /// report closure.
    pub fn close(&self) {
        self.0.tx.write().take();
    }

    /// Send, selecting against cancellation.
    pub fn send(&self, cancel: &CancelToken, value: Value, pos: Pos) -> Result<(), EvalError> {
        let tx = self.0.tx.read().clone();
        let Some(tx) = tx else {
            return Err(errors::user_throw("send on closed channel", pos));
        };
        let mut sel = Select::new();
        let cancelled = sel.recv(cancel.done());
        let ready = sel.send(&tx);
        let oper = sel.select();
        match oper.index() {
            i if i == cancelled => {
                let _ = oper.recv(cancel.done());
                Err(errors::interrupt())
            }
            i if i == ready => oper
                .send(&tx, value)
                .map_err(|_| errors::user_throw("send on closed channel", pos)),
            _ => unreachable!("select returned unknown operation"),
        }
    }

    /// Receive, selecting against cancellation. `Ok(None)` means the
    /// channel is closed and drained.
    pub fn recv(&self, cancel: &CancelToken) -> Result<Option<Value>, EvalError> {
        let mut sel = Select::new();
        let cancelled = sel.recv(cancel.done());
        let ready = sel.recv(&self.0.rx);
        let oper = sel.select();
        match oper.index() {
            i if i == cancelled => {
                let _ = oper.recv(cancel.done());
                Err(errors::interrupt())
            }
            i if i == ready => Ok(oper.recv(&self.0.rx).ok()),
            _ => unreachable!("select returned unknown operation"),
        }
    }

    /// Identity comparison.
    pub fn same(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn buffered_send_recv() {
        let ch = Channel::new(1);
        let cancel = CancelToken::never();
        ch.send(&cancel, Value::Int(7), Pos::default())
            .expect("send");
        assert_eq!(ch.recv(&cancel).expect("recv"), Some(Value::Int(7)));
    }

    #[test]
    fn rendezvous_send_meets_receiver() {
        let ch = Channel::new(0);
        let cancel = CancelToken::never();
        let sender = ch.clone();
        let sender_cancel = cancel.clone();
        let handle = thread::spawn(move || {
            sender
                .send(&sender_cancel, Value::Int(1), Pos::default())
                .expect("send");
        });
        assert_eq!(ch.recv(&cancel).expect("recv"), Some(Value::Int(1)));
        handle.join().expect("join");
    }

    #[test]
    fn close_drains_then_reports() {
        let ch = Channel::new(2);
        let cancel = CancelToken::never();
        ch.send(&cancel, Value::Int(1), Pos::default())
            .expect("send");
        ch.close();
        assert!(ch.is_closed());
        assert_eq!(ch.recv(&cancel).expect("recv"), Some(Value::Int(1)));
        assert_eq!(ch.recv(&cancel).expect("recv"), None);
    }

    #[test]
    fn send_on_closed_fails() {
        let ch = Channel::new(1);
        let cancel = CancelToken::never();
        ch.close();
        assert!(ch.send(&cancel, Value::Nil, Pos::default()).is_err());
    }

    #[test]
    fn blocked_recv_interrupted_by_cancel() {
        let ch = Channel::new(0);
        let (mut source, token) = super::super::cancel::CancelSource::new();
        let receiver = ch.clone();
        let handle = thread::spawn(move || receiver.recv(&token));
        thread::sleep(std::time::Duration::from_millis(20));
        source.cancel();
        let result = handle.join().expect("join");
        assert!(result.expect_err("interrupt").is_interrupt());
    }
}
