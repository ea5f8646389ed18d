use std::fmt;
use std::rc::Rc;

/// Compositor transaction the handle update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(pub u64);

/// Shared compositable resource handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositableHandle(pub u64);

/// Caller-side end of the out-of-process compositor boundary.
///
/// A `false` return means the endpoint is gone or the send failed.
pub trait CompositorActor {
    fn send_update_compositable_handle(
        &self,
        txn: TransactionId,
        handle: CompositableHandle,
    ) -> bool;
}

/// How handle updates reach the compositor. Chosen once per context.
#[derive(Clone)]
pub enum BridgeStrategy {
    InProcess,
    OutOfProcess(Rc<dyn CompositorActor>),
}

impl BridgeStrategy {
    pub(crate) fn connect(&self) -> ResourceHandleBridge {
        match self {
            BridgeStrategy::InProcess => ResourceHandleBridge::Direct,
            BridgeStrategy::OutOfProcess(actor) => ResourceHandleBridge::Remote {
                actor: Rc::clone(actor),
            },
        }
    }

    pub fn is_out_of_process(&self) -> bool {
        matches!(self, BridgeStrategy::OutOfProcess(_))
    }
}

impl fmt::Debug for BridgeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeStrategy::InProcess => f.write_str("InProcess"),
            BridgeStrategy::OutOfProcess(_) => f.write_str("OutOfProcess"),
        }
    }
}

/// Live bridge owned by a context while it is not lost.
#[derive(Clone)]
pub enum ResourceHandleBridge {
    /// Same process: the compositor sees the handle directly.
    Direct,
    /// Out of process: one outstanding actor reference.
    Remote { actor: Rc<dyn CompositorActor> },
}

impl ResourceHandleBridge {
    pub fn update_handle(&self, txn: TransactionId, handle: CompositableHandle) -> bool {
        match self {
            ResourceHandleBridge::Direct => true,
            ResourceHandleBridge::Remote { actor } => {
                let ok = actor.send_update_compositable_handle(txn, handle);
                if !ok {
                    tracing::debug!(
                        txn = txn.0,
                        handle = handle.0,
                        "remote compositable handle update failed"
                    );
                }
                ok
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ResourceHandleBridge::Remote { .. })
    }
}

impl fmt::Debug for ResourceHandleBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceHandleBridge::Direct => f.write_str("Direct"),
            ResourceHandleBridge::Remote { .. } => f.write_str("Remote"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedActor {
        replies: RefCell<Vec<bool>>,
        calls: RefCell<Vec<(TransactionId, CompositableHandle)>>,
    }

    impl CompositorActor for ScriptedActor {
        fn send_update_compositable_handle(
            &self,
            txn: TransactionId,
            handle: CompositableHandle,
        ) -> bool {
            self.calls.borrow_mut().push((txn, handle));
            self.replies.borrow_mut().remove(0)
        }
    }

    #[test]
    fn direct_always_succeeds() {
        let bridge = BridgeStrategy::InProcess.connect();
        assert!(!bridge.is_remote());
        assert!(bridge.update_handle(TransactionId(1), CompositableHandle(2)));
    }

    #[test]
    fn remote_returns_actor_result_verbatim() {
        let actor = Rc::new(ScriptedActor {
            replies: RefCell::new(vec![true, false]),
            calls: RefCell::new(Vec::new()),
        });
        let bridge = BridgeStrategy::OutOfProcess(actor.clone()).connect();
        assert!(bridge.is_remote());

        assert!(bridge.update_handle(TransactionId(7), CompositableHandle(70)));
        assert!(!bridge.update_handle(TransactionId(8), CompositableHandle(80)));
        assert_eq!(
            *actor.calls.borrow(),
            vec![
                (TransactionId(7), CompositableHandle(70)),
                (TransactionId(8), CompositableHandle(80)),
            ]
        );
    }
}
