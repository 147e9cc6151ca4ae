use crate::config::Tolerance;
use crate::model::{
    Change, ChangePayload, FieldValue, MatchedPair, Source, ALIGN_FIELDS,
};

/// Confidence on row-clone proposals for missing records.
pub const CONFIDENCE_ADD_ROW: f64 = 0.9;
/// Confidence on field alignments toward the authoritative side.
pub const CONFIDENCE_ALIGN: f64 = 0.85;
/// Confidence on refiner-emitted recomputations.
pub const CONFIDENCE_RECOMPUTE: f64 = 0.8;

/// Propose corrections for one pair. NBIM is the authoritative source:
/// missing rows are cloned from the present side, and on conflicts the
/// custody field is set to the NBIM value. Deterministic, per-field,
/// asymmetric — not a statistical merge.
pub fn propose(pair: &MatchedPair, tolerance: &Tolerance) -> Vec<Change> {
    let mut proposals = Vec::new();

    // Missing-record cases: clone from the present side and stop.
    if pair.nbim.is_none() {
        if let (Some(custody), Some(_)) = (&pair.custody, pair.custody_index) {
            proposals.push(Change {
                target: Source::Nbim,
                row_index: None,
                payload: ChangePayload::AddRow(Box::new(custody.clone())),
                reason: "create NBIM row from custody record (missing in NBIM)".into(),
                confidence: CONFIDENCE_ADD_ROW,
            });
        }
        return proposals;
    }
    if pair.custody.is_none() {
        if let (Some(nbim), Some(_)) = (&pair.nbim, pair.nbim_index) {
            proposals.push(Change {
                target: Source::Custody,
                row_index: None,
                payload: ChangePayload::AddRow(Box::new(nbim.clone())),
                reason: "create custody row from NBIM record (missing in custody)".into(),
                confidence: CONFIDENCE_ADD_ROW,
            });
        }
        return proposals;
    }

    let (nbim, custody) = match (&pair.nbim, &pair.custody) {
        (Some(n), Some(c)) => (n, c),
        _ => return proposals,
    };

    for field in ALIGN_FIELDS {
        let src = nbim.align_value(field);
        let dst = custody.align_value(field);
        if !equivalent(&src, &dst, tolerance) {
            proposals.push(Change {
                target: Source::Custody,
                row_index: pair.custody_index,
                payload: ChangePayload::Set { field, value: src },
                reason: format!("align {field} to NBIM authoritative value"),
                confidence: CONFIDENCE_ALIGN,
            });
        }
    }

    proposals
}

/// Field equivalence: absent≈absent and NaN≈NaN count as equal, numeric
/// values (including numeric text) compare with relative+absolute
/// tolerance, everything else falls back to normalized string equality.
pub fn equivalent(a: &FieldValue, b: &FieldValue, tolerance: &Tolerance) -> bool {
    if matches!(a, FieldValue::Missing) && matches!(b, FieldValue::Missing) {
        return true;
    }

    if let (Some(af), Some(bf)) = (a.as_number(), b.as_number()) {
        if af.is_nan() && bf.is_nan() {
            return true;
        }
        return tolerance.close(af, bf);
    }

    a.to_string().trim() == b.to_string().trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlignField, Record, Source};
    use chrono::NaiveDate;

    fn rec(source: Source) -> Record {
        Record {
            event_key: "1".into(),
            isin: "X".into(),
            sedol: None,
            ticker: None,
            company_name: None,
            ex_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            payment_date: NaiveDate::from_ymd_opt(2025, 3, 24),
            record_date: None,
            dividend_rate: Some(1.0),
            nominal_basis: Some(1000.0),
            gross_amount: Some(120.0),
            net_amount: Some(100.0),
            tax_amount: Some(20.0),
            tax_rate: Some(16.7),
            currency: Some("USD".into()),
            custodian: None,
            bank_account: None,
            source,
        }
    }

    fn both(nbim: Record, custody: Record) -> MatchedPair {
        MatchedPair {
            nbim: Some(nbim),
            custody: Some(custody),
            nbim_index: Some(0),
            custody_index: Some(0),
        }
    }

    #[test]
    fn equivalent_tolerance() {
        let t = Tolerance::default();
        let n = |v: f64| FieldValue::Number(v);
        assert!(equivalent(&n(1.0), &n(1.0), &t));
        assert!(equivalent(&n(1.000000049), &n(1.0), &t));
        assert!(!equivalent(&n(1.1), &n(1.0), &t));
        assert!(equivalent(&n(f64::NAN), &n(f64::NAN), &t));
        assert!(equivalent(&FieldValue::Missing, &FieldValue::Missing, &t));
        assert!(!equivalent(&FieldValue::Missing, &n(0.0), &t));
        assert!(equivalent(&FieldValue::Text("100".into()), &n(100.0), &t));
        assert!(equivalent(
            &FieldValue::Text("USD".into()),
            &FieldValue::Text(" USD".into()),
            &t
        ));
    }

    #[test]
    fn missing_in_custody_proposes_add_row() {
        let pair = MatchedPair {
            nbim: Some(rec(Source::Nbim)),
            custody: None,
            nbim_index: Some(3),
            custody_index: None,
        };
        let props = propose(&pair, &Tolerance::default());
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].target, Source::Custody);
        assert_eq!(props[0].row_index, None);
        assert_eq!(props[0].confidence, CONFIDENCE_ADD_ROW);
        match &props[0].payload {
            ChangePayload::AddRow(r) => assert_eq!(r.isin, "X"),
            other => panic!("expected AddRow, got {other:?}"),
        }
    }

    #[test]
    fn missing_in_nbim_proposes_add_row() {
        let pair = MatchedPair {
            nbim: None,
            custody: Some(rec(Source::Custody)),
            nbim_index: None,
            custody_index: Some(7),
        };
        let props = propose(&pair, &Tolerance::default());
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].target, Source::Nbim);
        assert!(matches!(props[0].payload, ChangePayload::AddRow(_)));
    }

    #[test]
    fn identical_pair_proposes_nothing() {
        let props = propose(&both(rec(Source::Nbim), rec(Source::Custody)), &Tolerance::default());
        assert!(props.is_empty());
    }

    #[test]
    fn conflicting_fields_align_to_nbim() {
        let nbim = rec(Source::Nbim);
        let mut custody = rec(Source::Custody);
        custody.net_amount = Some(90.0);
        custody.currency = Some("EUR".into());

        let props = propose(&both(nbim, custody), &Tolerance::default());
        assert_eq!(props.len(), 2);

        // Alignment order follows ALIGN_FIELDS.
        match &props[0].payload {
            ChangePayload::Set { field, value } => {
                assert_eq!(*field, AlignField::NetAmount);
                assert_eq!(*value, FieldValue::Number(100.0));
            }
            other => panic!("unexpected payload {other:?}"),
        }
        match &props[1].payload {
            ChangePayload::Set { field, value } => {
                assert_eq!(*field, AlignField::Currency);
                assert_eq!(*value, FieldValue::Text("USD".into()));
            }
            other => panic!("unexpected payload {other:?}"),
        }
        for p in &props {
            assert_eq!(p.target, Source::Custody);
            assert_eq!(p.row_index, Some(0));
            assert_eq!(p.confidence, CONFIDENCE_ALIGN);
        }
    }

    #[test]
    fn nbim_empty_cell_clears_custody() {
        let mut nbim = rec(Source::Nbim);
        nbim.tax_rate = None;
        let custody = rec(Source::Custody);

        let props = propose(&both(nbim, custody), &Tolerance::default());
        assert_eq!(props.len(), 1);
        match &props[0].payload {
            ChangePayload::Set { field, value } => {
                assert_eq!(*field, AlignField::TaxRate);
                assert_eq!(*value, FieldValue::Missing);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn date_mismatch_aligns() {
        let nbim = rec(Source::Nbim);
        let mut custody = rec(Source::Custody);
        custody.payment_date = NaiveDate::from_ymd_opt(2025, 3, 25);

        let props = propose(&both(nbim, custody), &Tolerance::default());
        assert_eq!(props.len(), 1);
        match &props[0].payload {
            ChangePayload::Set { field, value } => {
                assert_eq!(*field, AlignField::PaymentDate);
                assert_eq!(
                    *value,
                    FieldValue::Date(NaiveDate::from_ymd_opt(2025, 3, 24).unwrap())
                );
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
