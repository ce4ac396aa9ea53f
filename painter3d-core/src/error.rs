/// Errors raised while building or loading geometry
use thiserror::Error;

/// Malformed geometry or styling detected at construction time.
///
/// Everything here is reported before the first frame is produced: a face
/// pointing past the vertex list or a color array of the wrong length would
/// otherwise corrupt the depth sort silently.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },

    #[error("face {face} has {found} vertices, expected {expected}")]
    ArityMismatch {
        face: usize,
        expected: usize,
        found: usize,
    },

    #[error("faces need at least three vertices, got {0}")]
    DegenerateFace(usize),

    #[error("{what}: got {actual} colors, expected {expected}")]
    ColorCount {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what}: got {actual} values, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("failed to parse {format} data: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GeometryError {
    pub(crate) fn parse(format: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeometryError>;
