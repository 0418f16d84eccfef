use crate::digest::DigestPipeline;

/// Shared application state accessible from all handlers.
///
/// Read-only after startup; requests share nothing else.
pub struct AppState {
    pub pipeline: DigestPipeline,
}
