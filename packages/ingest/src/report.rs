//! End-of-run summary rendering.

use std::fmt::Write as _;

use findmypark_ingest_models::{PassReport, RunSummary};

const RULE: &str = "============================================================";

/// Renders the per-pass counts and the post-load distributions as plain
/// text.
#[must_use]
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Load summary");
    let _ = writeln!(out, "{RULE}");

    if summary.passes.is_empty() {
        let _ = writeln!(out, "No passes completed");
    }
    for pass in &summary.passes {
        let _ = writeln!(out, "{}", pass_line(pass));
    }

    for (distribution, counts) in &summary.distributions {
        let _ = writeln!(out, "\n{}:", distribution.label());
        if counts.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for count in counts {
            let _ = writeln!(out, "  {}: {}", count.category, count.count);
        }
    }

    out
}

fn pass_line(pass: &PassReport) -> String {
    let mut line = format!(
        "{:<12} read {:>7}  written {:>7}  skipped {:>7}  ({:.1}s)",
        pass.dataset.to_string(),
        pass.rows_read,
        pass.inserted,
        pass.skipped_total(),
        pass.duration.as_secs_f64(),
    );

    if !pass.skipped.is_empty() {
        let reasons = pass
            .skipped
            .iter()
            .map(|(reason, n)| format!("{reason}: {n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(line, "\n{:<12} {reasons}", "");
    }

    line
}

#[cfg(test)]
mod tests {
    use findmypark_ingest_models::{Dataset, SkipReason};
    use findmypark_park_models::{CategoryCount, Distribution};

    use super::*;

    #[test]
    fn renders_passes_and_distributions() {
        let mut parks = PassReport::new(Dataset::Parks);
        parks.rows_read = 3;
        parks.inserted = 2;
        parks.skip(SkipReason::NoGeometry);

        let summary = RunSummary {
            passes: vec![parks],
            distributions: vec![(
                Distribution::TrailDifficulty,
                vec![CategoryCount {
                    category: "Unkown".to_string(),
                    count: 4,
                }],
            )],
        };

        let text = render_summary(&summary);
        assert!(text.contains("Parks"));
        assert!(text.contains("written       2"));
        assert!(text.contains("no_geometry: 1"));
        assert!(text.contains("Trail difficulty statistics:"));
        assert!(text.contains("  Unkown: 4"));
    }

    #[test]
    fn empty_summary() {
        let text = render_summary(&RunSummary::default());
        assert!(text.contains("No passes completed"));
    }
}
