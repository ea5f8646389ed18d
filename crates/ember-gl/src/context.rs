use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::bridge::{BridgeStrategy, CompositableHandle, CompositorActor, TransactionId};
use crate::config::ContextConfig;
use crate::controller::{
    AlwaysAvailable, BackingProbe, ContextLossController, ControllerParts, LossReason,
    LossStatus, Shared,
};
use crate::diagnostics::{DiagnosticSink, Diagnostics, TracingDiagnostics};
use crate::notify::{EventNotifier, PresentationSurface};
use crate::registry::{
    validate_for_context, warn_if_deleted, ContextId, DependentObject, Extension, ObjectKind,
};
use crate::stats::ContextStats;
use crate::task_queue::TaskQueue;
use crate::{BuildError, GlError};

/// Assembles a [`GlContext`] from its external collaborators.
pub struct GlContextBuilder {
    config: ContextConfig,
    surface: Option<PresentationSurface>,
    actor: Option<Rc<dyn CompositorActor>>,
    probe: Box<dyn BackingProbe>,
    sink: Box<dyn DiagnosticSink>,
    tasks: TaskQueue,
    stats: Arc<ContextStats>,
}

impl GlContextBuilder {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            surface: None,
            actor: None,
            probe: Box::new(AlwaysAvailable),
            sink: Box::new(TracingDiagnostics),
            tasks: TaskQueue::new(),
            stats: Arc::new(ContextStats::new()),
        }
    }

    pub fn surface(mut self, surface: PresentationSurface) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Compositor endpoint used when the config asks for out-of-process updates.
    pub fn actor(mut self, actor: Rc<dyn CompositorActor>) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn probe(mut self, probe: impl BackingProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Queue the host drains to deliver deferred notifications.
    pub fn task_queue(mut self, tasks: TaskQueue) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn stats(mut self, stats: Arc<ContextStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn build(self) -> Result<GlContext, BuildError> {
        let surface = self.surface.ok_or(BuildError::MissingSurface)?;
        let strategy = match (self.config.out_of_process, self.actor) {
            (true, Some(actor)) => BridgeStrategy::OutOfProcess(actor),
            (true, None) => return Err(BuildError::MissingActor),
            (false, actor) => {
                if actor.is_some() {
                    tracing::debug!("in-process context ignores the provided compositor actor");
                }
                BridgeStrategy::InProcess
            }
        };

        let controller = ContextLossController::new(ControllerParts {
            diagnostics: Diagnostics::new(self.sink, self.config.max_warnings),
            notifier: EventNotifier::new(surface),
            tasks: self.tasks,
            strategy,
            probe: self.probe,
            stats: self.stats,
        });
        tracing::debug!(
            context = controller.context_id().get(),
            out_of_process = self.config.out_of_process,
            "created context"
        );
        Ok(GlContext { controller })
    }
}

/// Client-side handle to a possibly remote GL context.
///
/// Every operation checks liveness first. Failures are latched and read back
/// through [`GlContext::get_error`]; nothing here returns `Err` for GL misuse.
#[derive(Debug)]
pub struct GlContext {
    controller: ContextLossController,
}

impl GlContext {
    pub fn builder(config: ContextConfig) -> GlContextBuilder {
        GlContextBuilder::new(config)
    }

    pub fn id(&self) -> ContextId {
        self.controller.context_id()
    }

    pub fn controller(&self) -> &ContextLossController {
        &self.controller
    }

    pub fn status(&self) -> LossStatus {
        self.controller.status()
    }

    pub fn is_context_lost(&self) -> bool {
        self.controller.is_lost()
    }

    pub fn is_out_of_process(&self) -> bool {
        self.controller.is_out_of_process()
    }

    pub fn stats(&self) -> Arc<ContextStats> {
        Arc::clone(self.controller.stats())
    }

    pub fn task_queue(&self) -> TaskQueue {
        self.controller.tasks().clone()
    }

    /// Returns and clears the pending error.
    pub fn get_error(&self) -> Option<GlError> {
        self.controller.drain_error()
    }

    pub fn trigger_loss(&self, reason: LossReason) -> bool {
        self.controller.trigger_loss(reason)
    }

    pub fn restore_context(&self) -> bool {
        self.controller.restore_context()
    }

    /// Number of live dependent objects, or `None` once lost.
    pub fn dependent_count(&self) -> Option<usize> {
        self.controller.with_live(|data| data.registry.len())
    }

    /// Creates an object bound to this context. `None` if the context is lost.
    pub fn create_object(&self, kind: ObjectKind) -> Option<Rc<DependentObject>> {
        if let ObjectKind::Extension(_) = kind {
            self.controller.shared().latch_error(GlError::InvalidEnum);
            return None;
        }
        let id = self.id();
        let obj = self.controller.with_live(|data| {
            let obj = DependentObject::new(kind, id);
            data.registry.register(&obj);
            obj
        });
        if obj.is_none() {
            self.reject_lost();
        }
        obj
    }

    /// Gate run by every call that consumes an object argument.
    pub fn validate_object(&self, obj: &DependentObject, arg_name: &str) -> bool {
        if self.is_context_lost() {
            self.reject_lost();
            return false;
        }
        warn_if_deleted(obj, self.id(), arg_name, self.controller.shared())
    }

    /// Marks `obj` deleted. Deleting twice is a silent no-op.
    pub fn delete_object(&self, obj: &DependentObject) {
        if self.is_context_lost() {
            self.reject_lost();
            return;
        }
        if !validate_for_context(obj, self.id(), "obj", self.controller.shared()) {
            return;
        }
        obj.mark_deleted();
    }

    /// Looks up an extension by name. Repeated lookups return the same object
    /// until the context is lost.
    pub fn get_extension(&self, name: &str) -> Option<Rc<ExtensionObject>> {
        let kind = Extension::from_name(name)?;
        let id = self.id();
        let weak = self.controller.downgrade();
        let ext = self.controller.with_live(|data| {
            if let Some(ext) = data.extension(kind) {
                return Rc::clone(ext);
            }
            let object = DependentObject::new(ObjectKind::Extension(kind), id);
            data.registry.register_owned(Rc::clone(&object));
            let ext = Rc::new(ExtensionObject {
                kind,
                object,
                context: weak,
            });
            data.extensions.push(Rc::clone(&ext));
            ext
        });
        if ext.is_none() {
            self.reject_lost();
        }
        ext
    }

    /// Pushes a new compositable handle to the compositor.
    ///
    /// Returns `false` when the context is lost or the remote call fails; neither
    /// latches an error.
    pub fn update_compositable_handle(
        &self,
        txn: TransactionId,
        handle: CompositableHandle,
    ) -> bool {
        let stats = self.controller.stats();
        stats.inc_handle_updates_attempted();
        // The actor may call back into this context.
        let bridge = self.controller.with_live(|data| data.bridge.clone());
        let ok = bridge.is_some_and(|bridge| bridge.update_handle(txn, handle));
        if ok {
            stats.inc_handle_updates_succeeded();
        }
        ok
    }

    fn reject_lost(&self) {
        self.controller.shared().latch_error(GlError::InvalidOperation);
    }
}

/// Extension object handed out by [`GlContext::get_extension`].
///
/// Like every dependent, it is detached by context loss. The `WEBGL_lose_context`
/// entry points keep working afterwards since restoring is their purpose.
#[derive(Debug)]
pub struct ExtensionObject {
    kind: Extension,
    object: Rc<DependentObject>,
    context: Weak<Shared>,
}

impl ExtensionObject {
    pub fn kind(&self) -> Extension {
        self.kind
    }

    pub fn object(&self) -> &Rc<DependentObject> {
        &self.object
    }

    pub fn is_detached(&self) -> bool {
        self.object.is_detached()
    }

    /// `WEBGL_lose_context.loseContext()`. No-op for other extensions.
    pub fn lose_context(&self) -> bool {
        match self.lose_context_target() {
            Some(controller) => controller.trigger_loss(LossReason::Manual),
            None => false,
        }
    }

    /// `WEBGL_lose_context.restoreContext()`. No-op for other extensions.
    pub fn restore_context(&self) -> bool {
        match self.lose_context_target() {
            Some(controller) => controller.restore_context(),
            None => false,
        }
    }

    fn lose_context_target(&self) -> Option<ContextLossController> {
        if self.kind != Extension::LoseContext {
            return None;
        }
        ContextLossController::upgrade(&self.context)
    }
}
