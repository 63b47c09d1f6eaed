use thiserror::Error;

/// Invariant violations raised by the editing machinery. These indicate a
/// broken caller contract, not a recoverable runtime condition.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("action applied without a region")]
    ActionMissingRegion,

    #[error("action applied before any snapshot was taken")]
    ActionMissingSnapshot,

    #[error("canvas dimensions must be positive, got {width}x{height}")]
    InvalidCanvasSize { width: i32, height: i32 },

    #[error("no selection to operate on")]
    NoSelection,

    #[error("selection image data was already extracted")]
    SelectionAlreadyExtracted,
}
