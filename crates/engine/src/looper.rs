//! Single-threaded message loop.
//!
//! One worker thread drains a FIFO queue and hands every message to a
//! single handler, which is the only code allowed to touch playback
//! state. Producers on other threads append through [`LooperHandle`];
//! [`LooperHandle::post_sync`] additionally inserts a barrier and blocks
//! the poster until the barrier (and therefore everything queued before
//! it) has been processed.

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, unbounded, Sender};
use tracing::trace;

enum Envelope<M> {
    Msg(M),
    Barrier(Sender<()>),
    Quit,
}

/// Anything a handler can post messages into.
///
/// [`LooperHandle`] is the live implementation; tests substitute a
/// recording sink so dispatch logic runs without a thread.
pub trait MessageSink<M> {
    /// Append to the queue tail. Returns `false` if the loop is gone.
    fn post(&self, msg: M) -> bool;
}

/// Cloneable producer handle for a [`Looper`].
pub struct LooperHandle<M> {
    tx: Sender<Envelope<M>>,
}

impl<M> Clone for LooperHandle<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M> LooperHandle<M> {
    /// Post `msg` followed by a barrier and block until the barrier has
    /// been processed, guaranteeing all previously queued work is done.
    ///
    /// Must not be called from the worker thread itself. Returns `false`
    /// if the loop quit before reaching the barrier.
    pub fn post_sync(&self, msg: M) -> bool {
        let (ack_tx, ack_rx) = bounded(1);
        if self.tx.send(Envelope::Msg(msg)).is_err() {
            return false;
        }
        if self.tx.send(Envelope::Barrier(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv().is_ok()
    }

    /// Request the loop to stop after draining what is already queued.
    /// Idempotent.
    pub fn quit(&self) {
        let _ = self.tx.send(Envelope::Quit);
    }
}

impl<M> MessageSink<M> for LooperHandle<M> {
    fn post(&self, msg: M) -> bool {
        self.tx.send(Envelope::Msg(msg)).is_ok()
    }
}

/// Owns the worker thread; joins it on drop.
pub struct Looper<M> {
    handle: LooperHandle<M>,
    worker: Option<JoinHandle<()>>,
}

impl<M: Send + 'static> Looper<M> {
    /// Spawn the worker thread. The handler receives each message along
    /// with a handle it can use to post follow-up work to the tail of
    /// the queue.
    pub fn spawn<F>(name: &str, mut handler: F) -> io::Result<Self>
    where
        F: FnMut(M, &LooperHandle<M>) + Send + 'static,
    {
        let (tx, rx) = unbounded::<Envelope<M>>();
        let self_handle = LooperHandle { tx: tx.clone() };
        let worker = thread::Builder::new().name(name.to_string()).spawn(move || {
            for envelope in rx.iter() {
                match envelope {
                    Envelope::Msg(msg) => handler(msg, &self_handle),
                    Envelope::Barrier(ack) => {
                        let _ = ack.send(());
                    }
                    Envelope::Quit => {
                        trace!("message loop quitting");
                        break;
                    }
                }
            }
        })?;

        Ok(Self {
            handle: LooperHandle { tx },
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> LooperHandle<M> {
        self.handle.clone()
    }

    /// Whether the worker thread is still running. After a quit this
    /// flips once the worker finishes draining.
    pub fn is_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    pub fn quit(&self) {
        self.handle.quit();
    }
}

impl<M> Drop for Looper<M> {
    fn drop(&mut self) {
        self.handle.quit();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
