// ============================================================================
// ERROR TAXONOMY
// ============================================================================

pub type PaintResult<T> = Result<T, PaintError>;

#[derive(thiserror::Error, Debug)]
pub enum PaintError {
    /// Pixel access outside `[0, width) x [0, height)`.
    #[error("pixel ({x}, {y}) is outside the {width}x{height} surface")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    /// Undo requested with no snapshots in the ring.
    #[error("Nothing to undo")]
    EmptyHistory,

    #[error("invalid canvas dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("font error: {0}")]
    Font(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl PaintError {
    pub fn script(line: usize, message: impl Into<String>) -> Self {
        Self::Script {
            line,
            message: message.into(),
        }
    }

    pub fn font(message: impl Into<String>) -> Self {
        Self::Font(message.into())
    }
}
