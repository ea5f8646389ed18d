use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::bridge::{BridgeStrategy, ResourceHandleBridge};
use crate::diagnostics::Diagnostics;
use crate::notify::{EventNotifier, CONTEXT_LOST_EVENT, CONTEXT_RESTORED_EVENT};
use crate::registry::{ContextId, DependentObjectRegistry, ErrorReporter};
use crate::stats::ContextStats;
use crate::task_queue::TaskQueue;
use crate::{Extension, ExtensionObject, GlError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossStatus {
    Ready,
    /// Lost; restorable in principle.
    Lost,
    /// Lost at the client's request.
    LostManually,
    /// Terminal.
    LostForever,
}

impl LossStatus {
    pub fn is_lost(self) -> bool {
        self != LossStatus::Ready
    }

    fn is_restorable(self) -> bool {
        matches!(self, LossStatus::Lost | LossStatus::LostManually)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossReason {
    /// Silent or driver-detected, not attributed to this context.
    None,
    /// Device or driver fault attributed to this context.
    Guilty,
    /// Explicit client request.
    Manual,
}

impl LossReason {
    pub fn status(self) -> LossStatus {
        match self {
            LossReason::None => LossStatus::Lost,
            LossReason::Guilty => LossStatus::LostForever,
            LossReason::Manual => LossStatus::LostManually,
        }
    }
}

/// Re-validates the backing device before a lost context is restored.
pub trait BackingProbe {
    fn revalidate(&self) -> Result<(), String>;
}

impl<F: Fn() -> Result<(), String>> BackingProbe for F {
    fn revalidate(&self) -> Result<(), String> {
        self()
    }
}

/// Probe for backends that can always be re-created.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysAvailable;

impl BackingProbe for AlwaysAvailable {
    fn revalidate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Everything that only exists while the context is alive.
///
/// Dropping it detaches every dependent object and releases the bridge.
pub(crate) struct NotLostData {
    pub(crate) registry: DependentObjectRegistry,
    pub(crate) bridge: ResourceHandleBridge,
    pub(crate) extensions: Vec<Rc<ExtensionObject>>,
}

impl NotLostData {
    fn new(bridge: ResourceHandleBridge) -> Self {
        Self {
            registry: DependentObjectRegistry::new(),
            bridge,
            extensions: Vec::new(),
        }
    }

    pub(crate) fn extension(&self, kind: Extension) -> Option<&Rc<ExtensionObject>> {
        self.extensions.iter().find(|ext| ext.kind() == kind)
    }
}

impl Drop for NotLostData {
    fn drop(&mut self) {
        self.registry.unregister_all();
    }
}

struct LossState {
    status: LossStatus,
    not_lost: Option<NotLostData>,
    restore_pending: bool,
    generation: u32,
}

pub(crate) struct Shared {
    id: ContextId,
    owner: ThreadId,
    state: RefCell<LossState>,
    latch: RefCell<crate::ErrorLatch>,
    diagnostics: Diagnostics,
    notifier: EventNotifier,
    tasks: TaskQueue,
    out_of_process: bool,
    /// Reconnects the bridge on restore. Cleared once the context is lost forever.
    strategy: RefCell<Option<BridgeStrategy>>,
    probe: Box<dyn BackingProbe>,
    stats: Arc<ContextStats>,
}

impl Shared {
    fn assert_owner_thread(&self) {
        assert_eq!(
            thread::current().id(),
            self.owner,
            "context {} used off its owning thread",
            self.id.get()
        );
    }

    pub(crate) fn latch_error(&self, error: GlError) {
        if self.latch.borrow_mut().set_if_unset(error) {
            self.stats.inc_errors_latched();
        }
    }

    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        self.diagnostics.warn(&self.stats, args);
    }

    /// Drops the strategy's actor reference. Must not be called with `state` borrowed.
    fn release_strategy(&self) {
        let released = self.strategy.borrow_mut().take();
        if released.is_some() {
            tracing::debug!(context = self.id.get(), "released bridge strategy");
        }
    }
}

impl ErrorReporter for Shared {
    fn report(&self, error: GlError, args: fmt::Arguments<'_>) {
        self.latch_error(error);
        self.warn(args);
    }
}

pub(crate) struct ControllerParts {
    pub(crate) diagnostics: Diagnostics,
    pub(crate) notifier: EventNotifier,
    pub(crate) tasks: TaskQueue,
    pub(crate) strategy: BridgeStrategy,
    pub(crate) probe: Box<dyn BackingProbe>,
    pub(crate) stats: Arc<ContextStats>,
}

/// Context-loss state machine.
///
/// `Ready -> {Lost, LostManually, LostForever}` via [`Self::trigger_loss`];
/// `Lost | LostManually -> Ready` only through a restore. Host notifications are
/// posted to the [`TaskQueue`] and never run inside the call that caused them.
#[derive(Clone)]
pub struct ContextLossController {
    shared: Rc<Shared>,
}

impl ContextLossController {
    pub(crate) fn new(parts: ControllerParts) -> Self {
        let bridge = parts.strategy.connect();
        let shared = Shared {
            id: ContextId::next(),
            owner: thread::current().id(),
            state: RefCell::new(LossState {
                status: LossStatus::Ready,
                not_lost: Some(NotLostData::new(bridge)),
                restore_pending: false,
                generation: 0,
            }),
            latch: RefCell::new(crate::ErrorLatch::new()),
            diagnostics: parts.diagnostics,
            notifier: parts.notifier,
            tasks: parts.tasks,
            out_of_process: parts.strategy.is_out_of_process(),
            strategy: RefCell::new(Some(parts.strategy)),
            probe: parts.probe,
            stats: parts.stats,
        };
        Self {
            shared: Rc::new(shared),
        }
    }

    pub fn context_id(&self) -> ContextId {
        self.shared.id
    }

    pub fn status(&self) -> LossStatus {
        self.shared.state.borrow().status
    }

    pub fn is_lost(&self) -> bool {
        self.status().is_lost()
    }

    /// Generation of the live `NotLostData`; bumped by every successful restore.
    pub fn generation(&self) -> u32 {
        self.shared.state.borrow().generation
    }

    pub fn restore_pending(&self) -> bool {
        self.shared.state.borrow().restore_pending
    }

    /// Loses the context. Returns `false` (and latches `InvalidOperation`) if it
    /// was already lost.
    pub fn trigger_loss(&self, reason: LossReason) -> bool {
        let shared = &self.shared;
        shared.assert_owner_thread();

        let released = {
            let mut state = shared.state.borrow_mut();
            if state.status != LossStatus::Ready {
                drop(state);
                shared.report(
                    GlError::InvalidOperation,
                    format_args!("loseContext: Context is already lost."),
                );
                return false;
            }

            let detached = state
                .not_lost
                .as_mut()
                .map_or(0, |data| data.registry.unregister_all());
            let released = state.not_lost.take();

            shared.latch.borrow_mut().supersede(GlError::ContextLost);
            state.status = reason.status();
            state.restore_pending = false;

            tracing::warn!(
                context = shared.id.get(),
                ?reason,
                status = ?state.status,
                detached,
                "context lost"
            );
            released
        };
        // Released data must drop after the state borrow ends.
        drop(released);
        if reason.status() == LossStatus::LostForever {
            shared.release_strategy();
        }

        shared.stats.inc_losses();
        shared.stats.inc_errors_latched();
        shared.warn(format_args!("Context lost."));

        let weak = Rc::downgrade(shared);
        shared.tasks.post(move || deliver_context_lost(&weak));
        true
    }

    /// Requests a restore. The context comes back on a later turn, after the
    /// backing device re-validates.
    pub fn restore_context(&self) -> bool {
        let shared = &self.shared;
        shared.assert_owner_thread();

        let rejection = {
            let mut state = shared.state.borrow_mut();
            match state.status {
                LossStatus::Ready => Some("restoreContext: Context is not lost."),
                LossStatus::LostForever => Some("restoreContext: Context cannot be restored."),
                _ if state.restore_pending => Some("restoreContext: Restore already pending."),
                _ => {
                    state.restore_pending = true;
                    None
                }
            }
        };
        if let Some(message) = rejection {
            shared.report(GlError::InvalidOperation, format_args!("{message}"));
            return false;
        }

        schedule_restore(shared);
        true
    }

    /// Runs `f` against the live data, or returns `None` if the context is lost.
    pub(crate) fn with_live<R>(&self, f: impl FnOnce(&mut NotLostData) -> R) -> Option<R> {
        self.shared.assert_owner_thread();
        let mut state = self.shared.state.borrow_mut();
        state.not_lost.as_mut().map(f)
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    pub(crate) fn downgrade(&self) -> Weak<Shared> {
        Rc::downgrade(&self.shared)
    }

    pub(crate) fn upgrade(weak: &Weak<Shared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    pub(crate) fn drain_error(&self) -> Option<GlError> {
        self.shared.latch.borrow_mut().drain()
    }

    pub(crate) fn stats(&self) -> &Arc<ContextStats> {
        &self.shared.stats
    }

    pub(crate) fn tasks(&self) -> &TaskQueue {
        &self.shared.tasks
    }

    pub(crate) fn is_out_of_process(&self) -> bool {
        self.shared.out_of_process
    }
}

impl fmt::Debug for ContextLossController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("ContextLossController")
            .field("id", &self.shared.id)
            .field("status", &state.status)
            .field("generation", &state.generation)
            .field("restore_pending", &state.restore_pending)
            .finish()
    }
}

fn deliver_context_lost(weak: &Weak<Shared>) {
    let Some(shared) = weak.upgrade() else {
        tracing::debug!("context dropped before {CONTEXT_LOST_EVENT} delivery");
        return;
    };
    shared.assert_owner_thread();

    // Listeners may call back into the context; nothing is borrowed here.
    let use_default_handler = shared.notifier.dispatch_named_event(CONTEXT_LOST_EVENT);

    let mut state = shared.state.borrow_mut();
    if use_default_handler && state.status.is_restorable() {
        // Nobody asked to keep the context around.
        state.status = LossStatus::LostForever;
        drop(state);
        shared.release_strategy();
        tracing::debug!(context = shared.id.get(), "loss not handled; context lost forever");
        return;
    }
    if state.status == LossStatus::Lost && !state.restore_pending {
        state.restore_pending = true;
        drop(state);
        schedule_restore(&shared);
    }
}

fn schedule_restore(shared: &Rc<Shared>) {
    let weak = Rc::downgrade(shared);
    shared.tasks.post(move || complete_restore(&weak));
}

fn complete_restore(weak: &Weak<Shared>) {
    let Some(shared) = weak.upgrade() else {
        tracing::debug!("context dropped before restore");
        return;
    };
    shared.assert_owner_thread();

    {
        let mut state = shared.state.borrow_mut();
        state.restore_pending = false;
        if !state.status.is_restorable() {
            tracing::debug!(context = shared.id.get(), status = ?state.status, "restore abandoned");
            return;
        }
    }

    shared.stats.inc_restores_attempted();
    let reconnected = match shared.probe.revalidate() {
        Ok(()) => {
            let bridge = shared.strategy.borrow().as_ref().map(BridgeStrategy::connect);
            bridge.ok_or_else(|| "bridge strategy released".to_owned())
        }
        Err(err) => Err(err),
    };
    let bridge = match reconnected {
        Ok(bridge) => bridge,
        Err(err) => {
            shared.state.borrow_mut().status = LossStatus::LostForever;
            shared.release_strategy();
            tracing::warn!(context = shared.id.get(), "context restore failed: {err}");
            shared.warn(format_args!("Failed to restore context: {err}"));
            return;
        }
    };

    {
        let mut state = shared.state.borrow_mut();
        state.generation += 1;
        state.not_lost = Some(NotLostData::new(bridge));
        state.status = LossStatus::Ready;
        tracing::debug!(
            context = shared.id.get(),
            generation = state.generation,
            "context restored"
        );
    }
    // A restored context starts with no pending error.
    shared.latch.borrow_mut().drain();
    shared.stats.inc_restores_succeeded();

    shared.notifier.dispatch_named_event(CONTEXT_RESTORED_EVENT);
}
