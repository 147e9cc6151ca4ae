use crate::model::{
    AmountDiffs, DateFlags, DiscrepancyMetrics, ImpliedTaxRates, MatchedPair, PositionDiff,
    RecordStatus,
};

/// Quantify the break between the two sides of a pair.
///
/// Pure function of the pair: no IO, no external calls. For one-sided pairs
/// the sole record's net amount becomes the impact estimate.
pub fn classify(pair: &MatchedPair) -> DiscrepancyMetrics {
    let (nbim, custody) = match (&pair.nbim, &pair.custody) {
        (None, Some(c)) => {
            return DiscrepancyMetrics {
                status: RecordStatus::MissingInNbim,
                missing_impact: Some(c.net_amount.unwrap_or(0.0)),
                amounts: None,
                dates: None,
                position: None,
                tax_rates: None,
                currency: c.currency.clone(),
            }
        }
        (Some(n), None) => {
            return DiscrepancyMetrics {
                status: RecordStatus::MissingInCustody,
                missing_impact: Some(n.net_amount.unwrap_or(0.0)),
                amounts: None,
                dates: None,
                position: None,
                tax_rates: None,
                currency: n.currency.clone(),
            }
        }
        (None, None) => {
            // Defensive: unreachable for matcher-produced pairs.
            return DiscrepancyMetrics {
                status: RecordStatus::BothMissing,
                missing_impact: None,
                amounts: None,
                dates: None,
                position: None,
                tax_rates: None,
                currency: None,
            };
        }
        (Some(n), Some(c)) => (n, c),
    };

    let nbim_net = nbim.net_amount.unwrap_or(0.0);
    let custody_net = custody.net_amount.unwrap_or(0.0);
    let nbim_gross = nbim.gross_amount.unwrap_or(0.0);
    let custody_gross = custody.gross_amount.unwrap_or(0.0);
    let nbim_tax = nbim.tax_amount.unwrap_or(0.0);
    let custody_tax = custody.tax_amount.unwrap_or(0.0);

    let amounts = AmountDiffs {
        net_abs: (nbim_net - custody_net).abs(),
        gross_abs: (nbim_gross - custody_gross).abs(),
        tax_abs: (nbim_tax - custody_tax).abs(),
        net_pct: pct_diff(nbim_net, custody_net),
        gross_pct: pct_diff(nbim_gross, custody_gross),
        tax_pct: pct_diff(nbim_tax, custody_tax),
    };

    let dates = DateFlags {
        ex_date_match: nbim.ex_date == custody.ex_date,
        payment_date_match: nbim.payment_date == custody.payment_date,
        record_date_match: nbim.record_date == custody.record_date,
    };

    let nbim_basis = nbim.nominal_basis.unwrap_or(0.0);
    let custody_basis = custody.nominal_basis.unwrap_or(0.0);
    let position = PositionDiff {
        basis_abs: (nbim_basis - custody_basis).abs(),
        basis_pct: pct_diff(nbim_basis, custody_basis),
        position_match: nbim_basis == custody_basis,
    };

    let tax_rates = if nbim_gross > 0.0 && custody_gross > 0.0 {
        let nbim_rate = nbim_tax / nbim_gross * 100.0;
        let custody_rate = custody_tax / custody_gross * 100.0;
        Some(ImpliedTaxRates {
            nbim_rate,
            custody_rate,
            rate_abs: (nbim_rate - custody_rate).abs(),
        })
    } else {
        None
    };

    DiscrepancyMetrics {
        status: RecordStatus::Matched,
        missing_impact: None,
        amounts: Some(amounts),
        dates: Some(dates),
        position: Some(position),
        tax_rates,
        currency: nbim.currency.clone(),
    }
}

/// Percentage difference with a denominator floor of 1.
///
/// The floor avoids divide-by-zero but distorts percentages for sub-unit
/// amounts; downstream consumers depend on this exact behavior, so keep it.
fn pct_diff(a: f64, b: f64) -> f64 {
    ((a - b) / f64::max(f64::max(a, b), 1.0)).abs() * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Record, Source};
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

    fn pair(nbim: Option<Record>, custody: Option<Record>) -> MatchedPair {
        let nbim_index = nbim.as_ref().map(|_| 0);
        let custody_index = custody.as_ref().map(|_| 0);
        MatchedPair { nbim, custody, nbim_index, custody_index }
    }

    #[test]
    fn missing_in_custody_impact() {
        let m = classify(&pair(Some(rec(Source::Nbim)), None));
        assert_eq!(m.status, RecordStatus::MissingInCustody);
        assert_eq!(m.missing_impact, Some(100.0));
        assert!(m.amounts.is_none());
    }

    #[test]
    fn missing_in_nbim_impact() {
        let m = classify(&pair(None, Some(rec(Source::Custody))));
        assert_eq!(m.status, RecordStatus::MissingInNbim);
        assert_eq!(m.missing_impact, Some(100.0));
    }

    #[test]
    fn both_missing_is_defensive() {
        let m = classify(&pair(None, None));
        assert_eq!(m.status, RecordStatus::BothMissing);
        assert_eq!(m.missing_impact, None);
    }

    #[test]
    fn matched_amount_diffs() {
        let nbim = rec(Source::Nbim);
        let mut custody = rec(Source::Custody);
        custody.net_amount = Some(90.0);
        custody.tax_amount = Some(30.0);

        let m = classify(&pair(Some(nbim), Some(custody)));
        assert_eq!(m.status, RecordStatus::Matched);
        let a = m.amounts.unwrap();
        assert!((a.net_abs - 10.0).abs() < 1e-9);
        assert!((a.tax_abs - 10.0).abs() < 1e-9);
        assert_eq!(a.gross_abs, 0.0);
        // net pct: 10 / max(100, 90, 1) * 100 = 10%
        assert!((a.net_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn denominator_floor_for_sub_unit_amounts() {
        let mut nbim = rec(Source::Nbim);
        let mut custody = rec(Source::Custody);
        nbim.net_amount = Some(0.5);
        custody.net_amount = Some(0.2);
        let m = classify(&pair(Some(nbim), Some(custody)));
        // Denominator floors at 1, so 0.3 / 1 * 100 = 30%, not 60%.
        let a = m.amounts.unwrap();
        assert!((a.net_pct - 30.0).abs() < 1e-9);
    }

    #[test]
    fn date_flags() {
        let nbim = rec(Source::Nbim);
        let mut custody = rec(Source::Custody);
        custody.payment_date = NaiveDate::from_ymd_opt(2025, 3, 25);
        let m = classify(&pair(Some(nbim), Some(custody)));
        let d = m.dates.unwrap();
        assert!(d.ex_date_match);
        assert!(!d.payment_date_match);
        // Both record dates absent: counts as a match.
        assert!(d.record_date_match);
    }

    #[test]
    fn implied_tax_rates_require_positive_gross() {
        let nbim = rec(Source::Nbim);
        let mut custody = rec(Source::Custody);
        custody.tax_amount = Some(30.0);
        let m = classify(&pair(Some(nbim.clone()), Some(custody.clone())));
        let t = m.tax_rates.unwrap();
        assert!((t.nbim_rate - 20.0 / 120.0 * 100.0).abs() < 1e-9);
        assert!((t.rate_abs - 10.0 / 120.0 * 100.0).abs() < 1e-9);

        custody.gross_amount = Some(0.0);
        let m = classify(&pair(Some(nbim), Some(custody)));
        assert!(m.tax_rates.is_none());
    }

    #[test]
    fn position_diff_from_nominal_basis() {
        let nbim = rec(Source::Nbim);
        let mut custody = rec(Source::Custody);
        custody.nominal_basis = Some(900.0);
        let m = classify(&pair(Some(nbim), Some(custody)));
        let p = m.position.unwrap();
        assert!((p.basis_abs - 100.0).abs() < 1e-9);
        assert!(!p.position_match);
    }
}
