//! Named, generation-scoped timers owned by the player core.
//!
//! The player never sleeps: the host asks for [`Scheduler::next_deadline`],
//! waits, and calls back in with the current time. A task whose generation is
//! older than the current load is dropped instead of run.

use std::time::Instant;

use crate::media::PipelineKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Periodic drift correction while playing.
    DriftCheck,
    /// Periodic near-end detection while playing.
    EndPoll,
    /// Start playback if readiness never arrives after a load.
    ResumeFallback,
    /// Re-fetch a pipeline's source after a load error.
    LoadRetry(PipelineKind),
    /// Give up waiting for a seek to settle.
    SeekTimeout,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::DriftCheck => "drift-check",
            TaskKind::EndPoll => "end-poll",
            TaskKind::ResumeFallback => "resume-fallback",
            TaskKind::LoadRetry(PipelineKind::Audio) => "load-retry-audio",
            TaskKind::LoadRetry(PipelineKind::Video) => "load-retry-video",
            TaskKind::SeekTimeout => "seek-timeout",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub kind: TaskKind,
    pub due: Instant,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    /// Schedule `kind`, replacing any pending task of the same kind.
    pub fn schedule(&mut self, kind: TaskKind, due: Instant, generation: u64) {
        self.tasks.retain(|t| t.kind != kind);
        self.tasks.push(ScheduledTask {
            kind,
            due,
            generation,
        });
    }

    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.kind != kind);
        before != self.tasks.len()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|t| t.due).min()
    }

    /// Remove and return every task due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<ScheduledTask> {
        let mut due: Vec<ScheduledTask> = Vec::new();
        self.tasks.retain(|t| {
            if t.due <= now {
                due.push(*t);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|t| t.due);
        due
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
