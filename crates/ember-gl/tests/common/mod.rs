#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ember_gl::{
    CompositableHandle, CompositorActor, ContextConfig, EventTarget, GlContext, HostEvent,
    PresentationSurface, TaskQueue, TransactionId, CONTEXT_LOST_EVENT,
};

/// Host surface that records every event and optionally cancels `webglcontextlost`.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub events: RefCell<Vec<String>>,
    pub cancel_lost: Cell<bool>,
}

impl RecordingSurface {
    pub fn canceling() -> Rc<Self> {
        let surface = Rc::new(Self::default());
        surface.cancel_lost.set(true);
        surface
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl EventTarget for RecordingSurface {
    fn dispatch_event(&self, event: &HostEvent<'_>) -> bool {
        self.events.borrow_mut().push(event.name.to_owned());
        !(event.name == CONTEXT_LOST_EVENT && self.cancel_lost.get())
    }
}

/// Compositor endpoint that counts calls and answers with a fixed reply.
#[derive(Debug)]
pub struct CountingActor {
    pub calls: RefCell<Vec<(TransactionId, CompositableHandle)>>,
    pub reply: Cell<bool>,
}

impl CountingActor {
    pub fn new(reply: bool) -> Rc<Self> {
        Rc::new(Self {
            calls: RefCell::new(Vec::new()),
            reply: Cell::new(reply),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl CompositorActor for CountingActor {
    fn send_update_compositable_handle(
        &self,
        txn: TransactionId,
        handle: CompositableHandle,
    ) -> bool {
        self.calls.borrow_mut().push((txn, handle));
        self.reply.get()
    }
}

pub struct Harness {
    pub ctx: GlContext,
    pub surface: Rc<RecordingSurface>,
    pub tasks: TaskQueue,
    pub warnings: Rc<RefCell<Vec<String>>>,
}

impl Harness {
    pub fn in_process(surface: Rc<RecordingSurface>) -> Self {
        Self::with_config(ContextConfig::default(), surface, None)
    }

    pub fn with_config(
        config: ContextConfig,
        surface: Rc<RecordingSurface>,
        actor: Option<Rc<dyn CompositorActor>>,
    ) -> Self {
        let tasks = TaskQueue::new();
        let warnings = Rc::new(RefCell::new(Vec::new()));
        let sink_log = Rc::clone(&warnings);

        let mut builder = GlContext::builder(config)
            .surface(PresentationSurface::Canvas(surface.clone()))
            .task_queue(tasks.clone())
            .diagnostics(move |msg: &str| sink_log.borrow_mut().push(msg.to_owned()));
        if let Some(actor) = actor {
            builder = builder.actor(actor);
        }

        Self {
            ctx: builder.build().expect("build context"),
            surface,
            tasks,
            warnings,
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }
}
