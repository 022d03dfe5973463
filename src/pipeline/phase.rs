//! Phase plan: which stages run together and what they wait on
//!
//! Phases execute in order. Within a phase the `concurrent` stages run
//! together and settle before the `sequential` ones start. A phase's gate
//! is checked against the record before any of its stages launch.

use crate::types::{AssessmentRecord, PipelinePhase, StageName};

/// Precondition for launching a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    /// The named slot must be written (success or failure)
    SlotPopulated(StageName),
}

impl Gate {
    pub fn is_open(self, record: &AssessmentRecord) -> bool {
        match self {
            Gate::Open => true,
            Gate::SlotPopulated(stage) => record.is_populated(stage),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasePlan {
    pub phase: PipelinePhase,
    pub gate: Gate,
    pub concurrent: &'static [StageName],
    pub sequential: &'static [StageName],
}

impl PhasePlan {
    pub fn stages(&self) -> impl Iterator<Item = StageName> + '_ {
        self.concurrent.iter().chain(self.sequential).copied()
    }
}

/// Identity runs alone after the I/O-bound pair settles to bound peak load.
/// Content and Behavioral wait on the transcription slot, not its success.
pub const PHASES: [PhasePlan; 2] = [
    PhasePlan {
        phase: PipelinePhase::Phase1Running,
        gate: Gate::Open,
        concurrent: &[StageName::Quality, StageName::Transcription],
        sequential: &[StageName::Identity],
    },
    PhasePlan {
        phase: PipelinePhase::Phase2Running,
        gate: Gate::SlotPopulated(StageName::Transcription),
        concurrent: &[StageName::Content, StageName::Behavioral],
        sequential: &[],
    },
];
