use crate::GlError;

/// Single-slot mailbox for the next error reported by `get_error`.
///
/// The first error wins until drained; later errors are dropped rather than
/// queued so a flood of invalid calls cannot accumulate.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorLatch {
    pending: Option<GlError>,
}

impl ErrorLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches `error` if nothing is pending. Returns whether it was stored.
    pub fn set_if_unset(&mut self, error: GlError) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(error);
        true
    }

    /// Overwrites whatever is pending. Only context loss takes this path.
    pub fn supersede(&mut self, error: GlError) {
        self.pending = Some(error);
    }

    pub fn drain(&mut self) -> Option<GlError> {
        self.pending.take()
    }

    pub fn peek(&self) -> Option<GlError> {
        self.pending
    }

    pub fn is_set(&self) -> bool {
        self.pending.is_some()
    }
}


#[cfg(all(test, not(target_arch = "wasm32")))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_error() -> impl Strategy<Value = GlError> {
        prop_oneof![
            Just(GlError::InvalidEnum),
            Just(GlError::InvalidValue),
            Just(GlError::InvalidOperation),
            Just(GlError::OutOfMemory),
            Just(GlError::InvalidFramebufferOperation),
            Just(GlError::ContextLost),
        ]
    }

    proptest! {
        #[test]
        fn drain_returns_first_of_any_burst(errors in proptest::collection::vec(any_error(), 1..16)) {
            let mut latch = ErrorLatch::new();
            for err in &errors {
                latch.set_if_unset(*err);
            }
            prop_assert_eq!(latch.drain(), Some(errors[0]));
            prop_assert_eq!(latch.drain(), None);
        }
    }
}
