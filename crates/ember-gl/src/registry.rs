use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::GlError;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a context instance. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Extensions a context can hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    LoseContext,
    VertexArrayObject,
    DebugRendererInfo,
}

impl Extension {
    pub fn from_name(name: &str) -> Option<Self> {
        // Extension names are matched case-insensitively.
        let ext = match name.to_ascii_uppercase().as_str() {
            "WEBGL_LOSE_CONTEXT" => Extension::LoseContext,
            "OES_VERTEX_ARRAY_OBJECT" => Extension::VertexArrayObject,
            "WEBGL_DEBUG_RENDERER_INFO" => Extension::DebugRendererInfo,
            _ => return None,
        };
        Some(ext)
    }

    pub fn name(self) -> &'static str {
        match self {
            Extension::LoseContext => "WEBGL_lose_context",
            Extension::VertexArrayObject => "OES_vertex_array_object",
            Extension::DebugRendererInfo => "WEBGL_debug_renderer_info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Buffer,
    Framebuffer,
    Program,
    Query,
    Renderbuffer,
    Sampler,
    Shader,
    Texture,
    VertexArray,
    Extension(Extension),
}

/// Any object bound to a context.
///
/// The back-reference is a plain [`ContextId`]; `None` means the object has been
/// detached by a context loss and is permanently unusable.
#[derive(Debug)]
pub struct DependentObject {
    kind: ObjectKind,
    context: Cell<Option<ContextId>>,
    deleted: Cell<bool>,
}

impl DependentObject {
    pub(crate) fn new(kind: ObjectKind, context: ContextId) -> Rc<Self> {
        Rc::new(Self {
            kind,
            context: Cell::new(Some(context)),
            deleted: Cell::new(false),
        })
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn context(&self) -> Option<ContextId> {
        self.context.get()
    }

    pub fn is_detached(&self) -> bool {
        self.context.get().is_none()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.get()
    }

    pub(crate) fn mark_deleted(&self) {
        self.deleted.set(true);
    }

    pub(crate) fn detach(&self) {
        self.context.set(None);
    }
}

/// Where validation failures go: a latched GL error plus a console warning.
pub(crate) trait ErrorReporter {
    fn report(&self, error: GlError, args: fmt::Arguments<'_>);
}

enum Entry {
    /// Owned by the context (extensions).
    Owned(Rc<DependentObject>),
    /// Owned by the caller; dropped objects are pruned lazily.
    Tracked(Weak<DependentObject>),
}

impl Entry {
    fn object(&self) -> Option<Rc<DependentObject>> {
        match self {
            Entry::Owned(obj) => Some(Rc::clone(obj)),
            Entry::Tracked(obj) => obj.upgrade(),
        }
    }
}

/// Tracked entries are swept once the list reaches this length at least.
const MIN_PRUNE_AT: usize = 32;

/// Objects that must be detached when their context is lost.
#[derive(Default)]
pub struct DependentObjectRegistry {
    entries: Vec<Entry>,
    prune_at: usize,
}

impl DependentObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a caller-owned object without extending its lifetime.
    pub fn register(&mut self, obj: &Rc<DependentObject>) {
        if self.entries.len() >= self.prune_at {
            self.prune();
            self.prune_at = (self.entries.len() * 2).max(MIN_PRUNE_AT);
        }
        self.entries.push(Entry::Tracked(Rc::downgrade(obj)));
    }

    fn prune(&mut self) {
        self.entries.retain(|entry| match entry {
            Entry::Owned(_) => true,
            Entry::Tracked(weak) => weak.strong_count() > 0,
        });
    }

    /// Tracks an object the registry keeps alive until it is cleared.
    pub fn register_owned(&mut self, obj: Rc<DependentObject>) {
        self.entries.push(Entry::Owned(obj));
    }

    /// Detaches every live object and empties the registry.
    pub fn unregister_all(&mut self) -> usize {
        let mut detached = 0;
        for entry in self.entries.drain(..) {
            if let Some(obj) = entry.object() {
                obj.detach();
                detached += 1;
            }
        }
        detached
    }

    /// Number of objects still alive.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.object().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for DependentObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependentObjectRegistry")
            .field("live", &self.len())
            .finish()
    }
}

/// True iff `obj` is attached to `context`. Otherwise latches `InvalidOperation`.
pub(crate) fn validate_for_context(
    obj: &DependentObject,
    context: ContextId,
    arg_name: &str,
    reporter: &impl ErrorReporter,
) -> bool {
    if obj.context() == Some(context) {
        return true;
    }
    reporter.report(
        GlError::InvalidOperation,
        format_args!("{arg_name}: object from different WebGL context (or older generation of this one) passed as argument"),
    );
    false
}

/// Validates `obj`, then latches `InvalidValue` if it was already deleted.
///
/// Returns `true` only when the object is usable.
pub(crate) fn warn_if_deleted(
    obj: &DependentObject,
    context: ContextId,
    arg_name: &str,
    reporter: &impl ErrorReporter,
) -> bool {
    if !validate_for_context(obj, context, arg_name, reporter) {
        return false;
    }
    if obj.is_deleted() {
        reporter.report(
            GlError::InvalidValue,
            format_args!("{arg_name}: object is already deleted"),
        );
        return false;
    }
    true
}
