//! Worker-thread compositor endpoint reached over request/reply channels.
//!
//! Each call is a synchronous round trip from the caller's point of view. A
//! worker that has shut down or panicked surfaces as [`ActorError::Disconnected`].

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;

use crate::bridge::{CompositableHandle, CompositorActor, TransactionId};

/// Compositor-side handler living on the actor's worker thread.
pub trait CompositorHost: Send + 'static {
    fn update_compositable_handle(&mut self, txn: TransactionId, handle: CompositableHandle)
        -> bool;
}

impl<F> CompositorHost for F
where
    F: FnMut(TransactionId, CompositableHandle) -> bool + Send + 'static,
{
    fn update_compositable_handle(
        &mut self,
        txn: TransactionId,
        handle: CompositableHandle,
    ) -> bool {
        self(txn, handle)
    }
}

#[derive(Debug, Error)]
pub enum ActorError {
    #[error("compositor actor is gone")]
    Disconnected,

    #[error("compositor actor did not reply within {0:?}")]
    Timeout(Duration),

    #[error("failed to spawn compositor actor: {0}")]
    Spawn(String),
}

enum Request {
    UpdateCompositableHandle {
        txn: TransactionId,
        handle: CompositableHandle,
        reply: mpsc::SyncSender<bool>,
    },
    Shutdown,
}

/// Handle to a compositor host running on its own worker thread.
pub struct ActorChannel {
    tx: Option<mpsc::Sender<Request>>,
    worker: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl ActorChannel {
    pub fn spawn(host: impl CompositorHost, timeout: Duration) -> Result<Self, ActorError> {
        let (tx, rx) = mpsc::channel::<Request>();
        let worker = std::thread::Builder::new()
            .name("ember-compositor-actor".into())
            .spawn(move || run_actor(host, rx))
            .map_err(|err| ActorError::Spawn(err.to_string()))?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            timeout,
        })
    }

    pub fn update_compositable_handle(
        &self,
        txn: TransactionId,
        handle: CompositableHandle,
    ) -> Result<bool, ActorError> {
        let tx = self.tx.as_ref().ok_or(ActorError::Disconnected)?;
        let (reply, reply_rx) = mpsc::sync_channel(1);
        tx.send(Request::UpdateCompositableHandle { txn, handle, reply })
            .map_err(|_| ActorError::Disconnected)?;

        match reply_rx.recv_timeout(self.timeout) {
            Ok(ok) => Ok(ok),
            Err(RecvTimeoutError::Timeout) => Err(ActorError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ActorError::Disconnected),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Stops the worker and waits for it. Later calls fail with `Disconnected`.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Request::Shutdown);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("compositor actor panicked");
            }
        }
    }
}

impl CompositorActor for ActorChannel {
    fn send_update_compositable_handle(
        &self,
        txn: TransactionId,
        handle: CompositableHandle,
    ) -> bool {
        match self.update_compositable_handle(txn, handle) {
            Ok(ok) => ok,
            Err(err) => {
                tracing::debug!(txn = txn.0, "compositor actor call failed: {err}");
                false
            }
        }
    }
}

impl Drop for ActorChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ActorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorChannel")
            .field("connected", &self.is_connected())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn run_actor(mut host: impl CompositorHost, rx: mpsc::Receiver<Request>) {
    while let Ok(request) = rx.recv() {
        match request {
            Request::UpdateCompositableHandle { txn, handle, reply } => {
                let ok = host.update_compositable_handle(txn, handle);
                // The caller may have timed out and dropped its receiver.
                let _ = reply.send(ok);
            }
            Request::Shutdown => break,
        }
    }
    tracing::debug!("compositor actor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn round_trip_returns_host_result() {
        let host = |txn: TransactionId, _handle: CompositableHandle| txn.0 % 2 == 0;
        let actor = ActorChannel::spawn(host, TIMEOUT).unwrap();

        assert!(actor
            .update_compositable_handle(TransactionId(2), CompositableHandle(1))
            .unwrap());
        assert!(!actor.send_update_compositable_handle(TransactionId(3), CompositableHandle(1)));
    }

    #[test]
    fn shut_down_actor_reports_disconnected() {
        let host = |_: TransactionId, _: CompositableHandle| true;
        let mut actor = ActorChannel::spawn(host, TIMEOUT).unwrap();
        actor.shutdown();
        assert!(!actor.is_connected());
        assert!(matches!(
            actor.update_compositable_handle(TransactionId(1), CompositableHandle(1)),
            Err(ActorError::Disconnected)
        ));
        assert!(!actor.send_update_compositable_handle(TransactionId(1), CompositableHandle(1)));
    }

    #[test]
    fn panicking_host_is_an_ordinary_failure() {
        let host =
            |_: TransactionId, _: CompositableHandle| -> bool { panic!("compositor crashed") };
        let actor = ActorChannel::spawn(host, TIMEOUT).unwrap();
        assert!(matches!(
            actor.update_compositable_handle(TransactionId(1), CompositableHandle(1)),
            Err(ActorError::Disconnected)
        ));
        // The worker is gone; later sends fail the same way.
        assert!(!actor.send_update_compositable_handle(TransactionId(2), CompositableHandle(1)));
    }

    #[test]
    fn slow_host_times_out() {
        let host = |_: TransactionId, _: CompositableHandle| {
            std::thread::sleep(Duration::from_millis(200));
            true
        };
        let actor = ActorChannel::spawn(host, Duration::from_millis(10)).unwrap();
        assert!(matches!(
            actor.update_compositable_handle(TransactionId(1), CompositableHandle(1)),
            Err(ActorError::Timeout(_))
        ));
    }
}
