//! Markdown rendering of the merged development plan.

use chrono::{DateTime, Utc};
use std::fmt::{self, Write};

use crate::domain::models::{EpicsArtifact, StoriesArtifact};

const EXECUTIVE_SUMMARY: &str = "This development plan was generated from multi-agent analysis and includes comprehensive epics with detailed user stories.";

const NEXT_STEPS: [&str; 4] = [
    "Review and prioritize epics",
    "Break down stories into technical tasks",
    "Estimate effort and create sprint plan",
    "Begin implementation",
];

/// Render the final plan. Stories are listed by ascending epic number
/// regardless of the order they are passed in.
pub fn render_development_plan(
    pipeline_id: &str,
    epics: &EpicsArtifact,
    stories: &[StoriesArtifact],
    generated_at: DateTime<Utc>,
) -> String {
    let mut sorted: Vec<&StoriesArtifact> = stories.iter().collect();
    sorted.sort_by_key(|s| s.epic_number);

    let mut out = String::new();
    // Writes into a String never fail.
    write_plan(&mut out, pipeline_id, epics, &sorted, generated_at)
        .map_or_else(|_| String::new(), |()| out)
}

fn write_plan(
    out: &mut impl Write,
    pipeline_id: &str,
    epics: &EpicsArtifact,
    sorted: &[&StoriesArtifact],
    generated_at: DateTime<Utc>,
) -> fmt::Result {
    let generation_time =
        epics.execution_time + sorted.iter().map(|s| s.execution_time).sum::<f64>();

    writeln!(out, "# Development Plan")?;
    writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out)?;
    writeln!(out, "## Executive Summary")?;
    writeln!(out, "{EXECUTIVE_SUMMARY}")?;
    writeln!(out)?;
    writeln!(out, "## Epics Overview")?;
    writeln!(out)?;
    writeln!(out, "{}", epics.content)?;
    writeln!(out)?;
    writeln!(out, "## Detailed Epic-Story Breakdown")?;
    writeln!(out)?;

    for story in sorted {
        writeln!(out, "### Epic {}: {}", story.epic_number, story.epic_title)?;
        writeln!(out)?;
        writeln!(out, "#### User Stories:")?;
        writeln!(out, "{}", story.stories_content)?;
        writeln!(out)?;
        writeln!(out, "---")?;
        writeln!(out)?;
    }

    writeln!(out, "## Development Summary")?;
    writeln!(out, "- **Total Epics**: {}", sorted.len())?;
    writeln!(out, "- **Pipeline ID**: {pipeline_id}")?;
    writeln!(out, "- **Generation Time**: {generation_time:.2} seconds")?;
    writeln!(out, "- **Confidence Level**: {}", epics.confidence_level)?;
    writeln!(out)?;
    writeln!(out, "## Next Steps")?;
    for (i, step) in NEXT_STEPS.iter().enumerate() {
        writeln!(out, "{}. {step}", i + 1)?;
    }
    Ok(())
}
