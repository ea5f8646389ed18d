use std::fmt;
use std::rc::Rc;

pub const CONTEXT_LOST_EVENT: &str = "webglcontextlost";
pub const CONTEXT_RESTORED_EVENT: &str = "webglcontextrestored";

/// A host notification. Context events are always cancelable, bubbling and trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostEvent<'a> {
    pub name: &'a str,
    pub cancelable: bool,
    pub bubbles: bool,
    pub trusted: bool,
}

impl<'a> HostEvent<'a> {
    pub fn context_event(name: &'a str) -> Self {
        Self {
            name,
            cancelable: true,
            bubbles: true,
            trusted: true,
        }
    }
}

/// Host-side receiver of context events.
///
/// Returns whether default handling should proceed, i.e. `false` if any
/// listener canceled the event.
pub trait EventTarget {
    fn dispatch_event(&self, event: &HostEvent<'_>) -> bool;
}

impl<F: Fn(&HostEvent<'_>) -> bool> EventTarget for F {
    fn dispatch_event(&self, event: &HostEvent<'_>) -> bool {
        self(event)
    }
}

/// Whichever surface currently owns presentation. Exactly one is active.
#[derive(Clone)]
pub enum PresentationSurface {
    /// Canvas element attached to a document.
    Canvas(Rc<dyn EventTarget>),
    /// Offscreen/headless surface.
    Offscreen(Rc<dyn EventTarget>),
}

impl PresentationSurface {
    fn target(&self) -> &dyn EventTarget {
        match self {
            PresentationSurface::Canvas(target) | PresentationSurface::Offscreen(target) => {
                target.as_ref()
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PresentationSurface::Canvas(_) => "canvas",
            PresentationSurface::Offscreen(_) => "offscreen",
        }
    }
}

impl fmt::Debug for PresentationSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PresentationSurface").field(&self.kind()).finish()
    }
}

/// Dispatches context events to the active presentation surface.
#[derive(Debug, Clone)]
pub struct EventNotifier {
    surface: PresentationSurface,
}

impl EventNotifier {
    pub fn new(surface: PresentationSurface) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> &PresentationSurface {
        &self.surface
    }

    pub fn dispatch_named_event(&self, name: &str) -> bool {
        let use_default_handler = self
            .surface
            .target()
            .dispatch_event(&HostEvent::context_event(name));
        tracing::debug!(
            event = name,
            surface = self.surface.kind(),
            use_default_handler,
            "dispatched context event"
        );
        use_default_handler
    }
}
