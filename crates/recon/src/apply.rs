use crate::model::{Change, ChangeOutcome, ChangePayload, Record, Source};

/// Apply a batch of changes to copies of both ledgers.
///
/// Best-effort: a change with no row index, an out-of-range index, or a
/// value that does not fit its field is skipped with a reason; the rest of
/// the batch continues. Changes apply strictly in list order, so conflicting
/// writes to the same cell resolve last-write-wins.
pub fn apply_changes(
    nbim: &[Record],
    custody: &[Record],
    changes: &[Change],
) -> (Vec<Record>, Vec<Record>, Vec<ChangeOutcome>) {
    let mut nbim_out = nbim.to_vec();
    let mut custody_out = custody.to_vec();
    let mut outcomes = Vec::with_capacity(changes.len());

    for change in changes {
        let outcome = apply_one(&mut nbim_out, &mut custody_out, change);
        outcomes.push(outcome);
    }

    (nbim_out, custody_out, outcomes)
}

fn apply_one(
    nbim: &mut Vec<Record>,
    custody: &mut Vec<Record>,
    change: &Change,
) -> ChangeOutcome {
    match &change.payload {
        ChangePayload::AddRow(row) => {
            let mut new_row = (**row).clone();
            // Force the canonical tag; the clone keeps the donor's tag
            // otherwise.
            new_row.source = change.target;
            match change.target {
                Source::Nbim => nbim.push(new_row),
                Source::Custody => custody.push(new_row),
            }
            ChangeOutcome::Applied
        }
        ChangePayload::Set { field, value } => {
            let index = match change.row_index {
                Some(i) => i,
                None => {
                    return ChangeOutcome::Skipped {
                        reason: "field change without a target row".into(),
                    }
                }
            };

            let ledger = match change.target {
                Source::Nbim => nbim,
                Source::Custody => custody,
            };

            let row = match ledger.get_mut(index) {
                Some(r) => r,
                None => {
                    return ChangeOutcome::Skipped {
                        reason: format!("row {index} out of range for {}", change.target),
                    }
                }
            };

            match row.set_align_value(*field, value) {
                Ok(()) => ChangeOutcome::Applied,
                Err(mismatch) => ChangeOutcome::Skipped {
                    reason: format!("value does not fit field {}", mismatch.field),
                },
            }
        }
    }
}
