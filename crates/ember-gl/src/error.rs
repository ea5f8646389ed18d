use thiserror::Error;

/// GL-level error codes surfaced through [`crate::ErrorLatch`].
///
/// These are never returned as `Err`; callers poll them via
/// [`crate::GlContext::get_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlError {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    OutOfMemory,
    InvalidFramebufferOperation,
    ContextLost,
}

impl GlError {
    /// Numeric GL enum value for this error.
    pub fn code(self) -> u32 {
        match self {
            GlError::InvalidEnum => 0x0500,
            GlError::InvalidValue => 0x0501,
            GlError::InvalidOperation => 0x0502,
            GlError::OutOfMemory => 0x0505,
            GlError::InvalidFramebufferOperation => 0x0506,
            GlError::ContextLost => 0x9242,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0x0500 => GlError::InvalidEnum,
            0x0501 => GlError::InvalidValue,
            0x0502 => GlError::InvalidOperation,
            0x0505 => GlError::OutOfMemory,
            0x0506 => GlError::InvalidFramebufferOperation,
            0x9242 => GlError::ContextLost,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GlError::InvalidEnum => "INVALID_ENUM",
            GlError::InvalidValue => "INVALID_VALUE",
            GlError::InvalidOperation => "INVALID_OPERATION",
            GlError::OutOfMemory => "OUT_OF_MEMORY",
            GlError::InvalidFramebufferOperation => "INVALID_FRAMEBUFFER_OPERATION",
            GlError::ContextLost => "CONTEXT_LOST_WEBGL",
        }
    }
}

/// Failure to assemble a [`crate::GlContext`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("out-of-process context requested but no compositor actor was provided")]
    MissingActor,

    #[error("no presentation surface was provided")]
    MissingSurface,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_webgl_enums() {
        assert_eq!(GlError::InvalidOperation.code(), 0x0502);
        assert_eq!(GlError::ContextLost.code(), 0x9242);
        assert_eq!(GlError::from_code(0x0501), Some(GlError::InvalidValue));
        assert_eq!(GlError::from_code(0), None);
    }
}
