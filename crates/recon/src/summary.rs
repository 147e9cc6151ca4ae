use serde::Serialize;

use crate::engine::ResolveOutput;
use crate::model::ChangeOutcome;

/// Aggregate statistics for one resolution run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveSummary {
    pub proposals: usize,
    pub applied: usize,
    pub skipped: usize,
    pub rows_added_nbim: usize,
    pub rows_added_custody: usize,
    pub fallback_used: bool,
    pub skip_reasons: Vec<String>,
}

/// Summarize a run against the input ledger sizes.
pub fn compute_summary(
    output: &ResolveOutput,
    nbim_in: usize,
    custody_in: usize,
) -> ResolveSummary {
    let mut applied = 0;
    let mut skip_reasons = Vec::new();

    for outcome in &output.outcomes {
        match outcome {
            ChangeOutcome::Applied => applied += 1,
            ChangeOutcome::Skipped { reason } => skip_reasons.push(reason.clone()),
        }
    }

    ResolveSummary {
        proposals: output.proposal_count,
        applied,
        skipped: skip_reasons.len(),
        rows_added_nbim: output.nbim.len().saturating_sub(nbim_in),
        rows_added_custody: output.custody.len().saturating_sub(custody_in),
        fallback_used: output.fallback_used,
        skip_reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts() {
        let output = ResolveOutput {
            nbim: Vec::new(),
            custody: Vec::new(),
            outcomes: vec![
                ChangeOutcome::Applied,
                ChangeOutcome::Skipped { reason: "row 9 out of range for CUSTODY".into() },
                ChangeOutcome::Applied,
            ],
            proposal_count: 3,
            fallback_used: false,
        };
        let summary = compute_summary(&output, 0, 0);
        assert_eq!(summary.proposals, 3);
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.skip_reasons.len(), 1);
        assert!(summary.skip_reasons[0].contains("out of range"));
    }
}
