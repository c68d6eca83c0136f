//! Host media collaborators: the pipeline and prefetch traits the player core
//! drives, and simulated implementations used by the binary and the tests.

mod fetch;
mod pipeline;
mod simulated;

pub use fetch::{PrefetchRequest, Prefetcher};
pub use pipeline::{MediaEvent, MediaPipeline, PipelineKind, PlayRejected, ReadyState};
pub use simulated::{SimulatedFetcher, SimulatedPipeline};

#[cfg(test)]
mod tests;
