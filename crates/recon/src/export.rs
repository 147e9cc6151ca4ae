use crate::error::ReconError;
use crate::model::Record;

/// Column order for exported ledgers. Stable across runs so downstream
/// diffs stay meaningful.
const EXPORT_HEADERS: [&str; 18] = [
    "event_key",
    "isin",
    "sedol",
    "ticker",
    "company_name",
    "ex_date",
    "payment_date",
    "record_date",
    "dividend_rate",
    "nominal_basis",
    "gross_amount",
    "net_amount",
    "tax_amount",
    "tax_rate",
    "currency",
    "custodian",
    "bank_account",
    "source",
];

/// Serialize a corrected ledger to semicolon-delimited CSV. Dates render
/// as YYYY-MM-DD; absent cells render empty.
pub fn ledger_to_csv(rows: &[Record]) -> Result<String, ReconError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());

    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|e| ReconError::Io(e.to_string()))?;

    for row in rows {
        let fields: [String; 18] = [
            row.event_key.clone(),
            row.isin.clone(),
            text(&row.sedol),
            text(&row.ticker),
            text(&row.company_name),
            date(&row.ex_date),
            date(&row.payment_date),
            date(&row.record_date),
            number(&row.dividend_rate),
            number(&row.nominal_basis),
            number(&row.gross_amount),
            number(&row.net_amount),
            number(&row.tax_amount),
            number(&row.tax_rate),
            text(&row.currency),
            text(&row.custodian),
            text(&row.bank_account),
            row.source.tag().to_string(),
        ];
        writer
            .write_record(&fields)
            .map_err(|e| ReconError::Io(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReconError::Io(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReconError::Io(e.to_string()))
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn date(value: &Option<chrono::NaiveDate>) -> String {
    value.map(|d| d.to_string()).unwrap_or_default()
}

fn number(value: &Option<f64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use chrono::NaiveDate;

    #[test]
    fn roundtrip_shape() {
        let rows = vec![Record {
            event_key: "100045".into(),
            isin: "US1234567890".into(),
            sedol: Some("B1YW440".into()),
            ticker: None,
            company_name: Some("Acme Corp".into()),
            ex_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            payment_date: NaiveDate::from_ymd_opt(2025, 3, 24),
            record_date: None,
            dividend_rate: Some(1.25),
            nominal_basis: Some(1000.0),
            gross_amount: Some(1250.0),
            net_amount: Some(1062.5),
            tax_amount: Some(187.5),
            tax_rate: Some(15.0),
            currency: Some("USD".into()),
            custodian: Some("CITI".into()),
            bank_account: None,
            source: Source::Nbim,
        }];

        let out = ledger_to_csv(&rows).unwrap();
        let mut lines = out.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("event_key;isin;sedol"));
        assert!(header.ends_with(";source"));

        let line = lines.next().unwrap();
        assert!(line.contains("100045;US1234567890;B1YW440;;Acme Corp;2025-03-10"));
        assert!(line.ends_with(";NBIM"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_ledger_is_header_only() {
        let out = ledger_to_csv(&[]).unwrap();
        assert_eq!(out.lines().count(), 1);
    }
}
