//! Epic → Stories → Merge pipeline job model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Lifecycle of a pipeline job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Starting,
    GeneratingEpics,
    GeneratingStories,
    Merging,
    Completed,
    Failed,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::GeneratingEpics => "generating_epics",
            Self::GeneratingStories => "generating_stories",
            Self::Merging => "merging",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Forward-only transitions; any non-terminal state may fail.
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Starting, Self::GeneratingEpics)
            | (Self::GeneratingEpics, Self::GeneratingStories)
            | (Self::GeneratingStories, Self::Merging)
            | (Self::Merging, Self::Completed) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    Pending,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineProgress {
    pub epics: PhaseStatus,
    pub stories: PhaseStatus,
    pub merge: PhaseStatus,
}

/// Pipeline phase names, used for progress updates and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Epics,
    Stories,
    Merge,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Epics => "epics",
            Self::Stories => "stories",
            Self::Merge => "merge",
        }
    }
}

impl PipelineProgress {
    /// Advance a phase. Moving backwards is ignored.
    pub fn advance(&mut self, phase: PipelinePhase, status: PhaseStatus) {
        let slot = match phase {
            PipelinePhase::Epics => &mut self.epics,
            PipelinePhase::Stories => &mut self.stories,
            PipelinePhase::Merge => &mut self.merge,
        };
        if status > *slot {
            *slot = status;
        }
    }
}

/// State of one background pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineJob {
    pub pipeline_id: String,
    pub status: PipelineStatus,
    pub session_id: String,
    pub user_input: String,
    pub progress: PipelineProgress,
    pub epics_file: Option<PathBuf>,
    pub stories_files: Vec<PathBuf>,
    pub final_file: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl PipelineJob {
    pub fn new(
        pipeline_id: impl Into<String>,
        session_id: impl Into<String>,
        user_input: impl Into<String>,
    ) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            status: PipelineStatus::Starting,
            session_id: session_id.into(),
            user_input: user_input.into(),
            progress: PipelineProgress::default(),
            epics_file: None,
            stories_files: Vec::new(),
            final_file: None,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }
}

/// One epic parsed from generator output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    /// 1-based position in the generator output.
    pub number: usize,
    pub title: String,
    pub content: String,
}

/// `<id>_epics.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpicsArtifact {
    pub agent_name: String,
    pub content: String,
    pub execution_time: f64,
    pub confidence_level: f64,
    pub created_at: DateTime<Utc>,
}

/// `<id>_stories_epic_<n>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoriesArtifact {
    pub epic_number: usize,
    pub epic_title: String,
    pub stories_content: String,
    pub execution_time: f64,
    pub created_at: DateTime<Utc>,
}
