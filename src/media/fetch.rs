use super::PipelineKind;

/// A speculative background fetch of one pipeline's source for a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchRequest {
    /// Echoed back with the outcome so late completions can be matched.
    pub ticket: u64,
    pub track_id: String,
    pub pipeline: PipelineKind,
    pub uri: String,
}

/// Network collaborator used for warm starts. Fetches are idempotent; the
/// outcome is reported back through `Player::handle_preload`.
pub trait Prefetcher {
    fn prefetch(&mut self, request: PrefetchRequest);
}
