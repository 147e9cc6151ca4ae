use std::collections::HashMap;

use crate::apply::apply_changes;
use crate::config::Tolerance;
use crate::error::ReconError;
use crate::model::{
    AlignField, Change, ChangeOutcome, ChangePayload, FieldValue, MatchedPair, Record, Source,
    ALIGN_FIELDS,
};
use crate::propose::{propose, CONFIDENCE_RECOMPUTE};
use crate::refine::refine;
use crate::report::AnalysisReport;

/// Fields the refiner may adjust after a field alignment.
const RECOMPUTE_FIELDS: [AlignField; 3] =
    [AlignField::NetAmount, AlignField::TaxAmount, AlignField::TaxRate];

/// Result of one resolution run.
#[derive(Debug)]
pub struct ResolveOutput {
    pub nbim: Vec<Record>,
    pub custody: Vec<Record>,
    /// One outcome per applied proposal; empty in fallback mode.
    pub outcomes: Vec<ChangeOutcome>,
    pub proposal_count: usize,
    /// True when the primary path failed and the minimal fallback ran.
    pub fallback_used: bool,
}

/// Resolve discrepancies between the two ledgers, guided by the analysis
/// report. Always returns corrected ledgers: if proposal assembly fails for
/// any reason, a minimal fallback alignment runs instead of propagating the
/// error.
pub fn resolve(
    nbim: &[Record],
    custody: &[Record],
    report: &AnalysisReport,
    tolerance: &Tolerance,
) -> ResolveOutput {
    match assemble_proposals(nbim, custody, report, tolerance) {
        Ok(proposals) => {
            let proposal_count = proposals.len();
            let (nbim_out, custody_out, outcomes) = apply_changes(nbim, custody, &proposals);
            ResolveOutput {
                nbim: nbim_out,
                custody: custody_out,
                outcomes,
                proposal_count,
                fallback_used: false,
            }
        }
        Err(_) => fallback_resolve(nbim, custody, report),
    }
}

/// Primary path: per report row, recover the business key, build the pair,
/// run the proposer, and let the refiner append numeric-consistency changes
/// after each originating proposal. Report rows whose key matches neither
/// ledger are silently skipped.
fn assemble_proposals(
    nbim: &[Record],
    custody: &[Record],
    report: &AnalysisReport,
    tolerance: &Tolerance,
) -> Result<Vec<Change>, ReconError> {
    let nbim_index = key_index(nbim);
    let custody_index = key_index(custody);

    let mut proposals = Vec::new();

    for row in &report.row_analyses {
        let key = row.business_key()?;

        let nbim_i = nbim_index.get(&key).copied();
        let custody_i = custody_index.get(&key).copied();

        let pair = MatchedPair {
            nbim: nbim_i.map(|i| nbim[i].clone()),
            custody: custody_i.map(|i| custody[i].clone()),
            nbim_index: nbim_i,
            custody_index: custody_i,
        };

        for change in propose(&pair, tolerance) {
            match &change.payload {
                ChangePayload::AddRow(_) => proposals.push(change),
                ChangePayload::Set { field, value } => {
                    let current = match change.target {
                        Source::Nbim => nbim_i.map(|i| &nbim[i]),
                        Source::Custody => custody_i.map(|i| &custody[i]),
                    };
                    match current {
                        Some(current) => {
                            let extras =
                                recompute_changes(current, &change, *field, value, tolerance);
                            proposals.push(change);
                            // Refiner changes come after the originating
                            // proposal, so the recomputation wins conflicts.
                            proposals.extend(extras);
                        }
                        None => proposals.push(change),
                    }
                }
            }
        }
    }

    Ok(proposals)
}

/// Refine a snapshot of the target row with the proposed value applied, and
/// emit a change for each of net/tax/rate the recomputation moved away from
/// the row's current value. The aligned field itself is not a
/// recomputation — its proposal already carries the new value.
fn recompute_changes(
    current: &Record,
    change: &Change,
    field: AlignField,
    value: &FieldValue,
    tolerance: &Tolerance,
) -> Vec<Change> {
    let mut snapshot = current.clone();
    if snapshot.set_align_value(field, value).is_err() {
        // Unusable proposal; leave it to the applier to skip.
        return Vec::new();
    }
    let refined = refine(&snapshot, tolerance);

    let mut extras = Vec::new();
    for f in RECOMPUTE_FIELDS {
        if f == field {
            continue;
        }
        let recomputed = numeric_field(&refined, f);
        if numeric_field(current, f) != recomputed {
            extras.push(Change {
                target: change.target,
                row_index: change.row_index,
                payload: ChangePayload::Set {
                    field: f,
                    value: FieldValue::from_number(recomputed),
                },
                reason: format!("recompute {f} for gross/tax/net consistency"),
                confidence: CONFIDENCE_RECOMPUTE,
            });
        }
    }
    extras
}

fn numeric_field(record: &Record, field: AlignField) -> Option<f64> {
    match field {
        AlignField::NetAmount => record.net_amount,
        AlignField::TaxAmount => record.tax_amount,
        AlignField::TaxRate => record.tax_rate,
        _ => None,
    }
}

/// (isin, event_key) -> row index. Later duplicates overwrite earlier ones,
/// so a duplicated key resolves to its last occurrence.
fn key_index(ledger: &[Record]) -> HashMap<(String, String), usize> {
    let mut index = HashMap::with_capacity(ledger.len());
    for (i, record) in ledger.iter().enumerate() {
        index.insert(record.business_key(), i);
    }
    index
}

/// Minimal fallback: for rows the report flags as missing records, clone
/// the present side into the absent ledger; for matched rows overwrite
/// custody's aligned fields with NBIM's values directly, with no numeric
/// refinement. Never removes rows, so output counts stay at least the
/// input counts.
fn fallback_resolve(nbim: &[Record], custody: &[Record], report: &AnalysisReport) -> ResolveOutput {
    let nbim_index = key_index(nbim);
    let custody_index = key_index(custody);

    let mut nbim_out = nbim.to_vec();
    let mut custody_out = custody.to_vec();

    for row in &report.row_analyses {
        // Best-effort key recovery; malformed rows are skipped here instead
        // of failing the whole run.
        let key = match row.business_key() {
            Ok(k) => k,
            Err(_) => continue,
        };
        let nbim_i = nbim_index.get(&key).copied();
        let custody_i = custody_index.get(&key).copied();

        match (nbim_i, custody_i) {
            (Some(ni), None) if row.is_missing_record() => {
                let mut clone = nbim[ni].clone();
                clone.source = Source::Custody;
                custody_out.push(clone);
            }
            (None, Some(ci)) if row.is_missing_record() => {
                let mut clone = custody[ci].clone();
                clone.source = Source::Nbim;
                nbim_out.push(clone);
            }
            (Some(ni), Some(ci)) => {
                let source_row = nbim[ni].clone();
                let target = &mut custody_out[ci];
                for field in ALIGN_FIELDS {
                    // Same-shape copy between records cannot mismatch.
                    let _ = target.set_align_value(field, &source_row.align_value(field));
                }
            }
            // One-sided but not flagged missing, or matching neither ledger:
            // leave both sides as they are.
            _ => {}
        }
    }

    ResolveOutput {
        nbim: nbim_out,
        custody: custody_out,
        outcomes: Vec::new(),
        proposal_count: 0,
        fallback_used: true,
    }
}
