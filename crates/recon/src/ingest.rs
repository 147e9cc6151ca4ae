use chrono::NaiveDate;

use crate::error::ReconError;
use crate::model::{Record, Source};

/// Source files use day-first dates ("15.03.2025").
const DATE_FORMAT: &str = "%d.%m.%Y";

/// Load the NBIM dividend bookings CSV (semicolon-delimited) into the
/// common record schema.
pub fn load_nbim_csv(csv_data: &str) -> Result<Vec<Record>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers = read_headers(&mut reader)?;
    let col = Columns::new("NBIM", &headers);

    let event_key = col.required("COAC_EVENT_KEY")?;
    let isin = col.required("ISIN")?;
    let sedol = col.optional("SEDOL");
    let ticker = col.optional("TICKER");
    let company = col.optional("ORGANISATION_NAME");
    let ex_date = col.required("EXDATE")?;
    let payment_date = col.required("PAYMENT_DATE")?;
    let dividend_rate = col.optional("DIVIDENDS_PER_SHARE");
    let nominal_basis = col.optional("NOMINAL_BASIS");
    let gross = col.required("GROSS_AMOUNT_QUOTATION")?;
    let net = col.required("NET_AMOUNT_QUOTATION")?;
    let tax = col.optional("WTHTAX_COST_QUOTATION");
    let tax_rate = col.optional("WTHTAX_RATE");
    let currency = col.required("QUOTATION_CURRENCY")?;
    let custodian = col.optional("CUSTODIAN");
    let bank_account = col.optional("BANK_ACCOUNT");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        let get = |i: Option<usize>| i.and_then(|i| record.get(i)).unwrap_or("").trim();
        let record_id = get(Some(event_key)).to_string();

        rows.push(Record {
            event_key: record_id.clone(),
            isin: get(Some(isin)).to_string(),
            sedol: non_empty(get(sedol)),
            ticker: non_empty(get(ticker)),
            company_name: non_empty(get(company)),
            ex_date: parse_date("NBIM", &record_id, get(Some(ex_date)))?,
            payment_date: parse_date("NBIM", &record_id, get(Some(payment_date)))?,
            record_date: None,
            dividend_rate: parse_amount("NBIM", &record_id, get(dividend_rate))?,
            nominal_basis: parse_amount("NBIM", &record_id, get(nominal_basis))?,
            gross_amount: parse_amount("NBIM", &record_id, get(Some(gross)))?,
            net_amount: parse_amount("NBIM", &record_id, get(Some(net)))?,
            tax_amount: parse_amount("NBIM", &record_id, get(tax))?,
            tax_rate: parse_amount("NBIM", &record_id, get(tax_rate))?,
            currency: non_empty(get(Some(currency))),
            custodian: non_empty(get(custodian)),
            bank_account: non_empty(get(bank_account)),
            source: Source::Nbim,
        });
    }

    Ok(rows)
}

/// Load the custody dividend bookings CSV. Custody carries no ticker or
/// company name, and its `CURRENCIES` column may hold several codes —
/// only the first is taken.
pub fn load_custody_csv(csv_data: &str) -> Result<Vec<Record>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers = read_headers(&mut reader)?;
    let col = Columns::new("CUSTODY", &headers);

    let event_key = col.required("COAC_EVENT_KEY")?;
    let isin = col.required("ISIN")?;
    let sedol = col.optional("SEDOL");
    let ex_date = col.required("EX_DATE")?;
    let pay_date = col.required("PAY_DATE")?;
    let div_rate = col.optional("DIV_RATE");
    let nominal_basis = col.optional("NOMINAL_BASIS");
    let gross = col.required("GROSS_AMOUNT")?;
    let net = col.required("NET_AMOUNT_QC")?;
    let tax = col.optional("TAX");
    let tax_rate = col.optional("TAX_RATE");
    let currencies = col.required("CURRENCIES")?;
    let custodian = col.optional("CUSTODIAN");
    let bank_accounts = col.optional("BANK_ACCOUNTS");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        let get = |i: Option<usize>| i.and_then(|i| record.get(i)).unwrap_or("").trim();
        let record_id = get(Some(event_key)).to_string();

        let currency = get(Some(currencies))
            .split_whitespace()
            .next()
            .map(str::to_string);

        rows.push(Record {
            event_key: record_id.clone(),
            isin: get(Some(isin)).to_string(),
            sedol: non_empty(get(sedol)),
            ticker: None,
            company_name: None,
            ex_date: parse_date("CUSTODY", &record_id, get(Some(ex_date)))?,
            payment_date: parse_date("CUSTODY", &record_id, get(Some(pay_date)))?,
            record_date: None,
            dividend_rate: parse_amount("CUSTODY", &record_id, get(div_rate))?,
            nominal_basis: parse_amount("CUSTODY", &record_id, get(nominal_basis))?,
            gross_amount: parse_amount("CUSTODY", &record_id, get(Some(gross)))?,
            net_amount: parse_amount("CUSTODY", &record_id, get(Some(net)))?,
            tax_amount: parse_amount("CUSTODY", &record_id, get(tax))?,
            tax_rate: parse_amount("CUSTODY", &record_id, get(tax_rate))?,
            currency: currency.filter(|c| !c.is_empty()),
            custodian: non_empty(get(custodian)),
            bank_account: non_empty(get(bank_accounts)),
            source: Source::Custody,
        });
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Columns<'a> {
    ledger: &'static str,
    headers: &'a [String],
}

impl<'a> Columns<'a> {
    fn new(ledger: &'static str, headers: &'a [String]) -> Self {
        Self { ledger, headers }
    }

    fn required(&self, name: &str) -> Result<usize, ReconError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReconError::MissingColumn {
                ledger: self.ledger.into(),
                column: name.into(),
            })
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn read_headers(
    reader: &mut csv::Reader<&[u8]>,
) -> Result<Vec<String>, ReconError> {
    Ok(reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_date(
    ledger: &str,
    record_id: &str,
    value: &str,
) -> Result<Option<NaiveDate>, ReconError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ReconError::DateParse {
            ledger: ledger.into(),
            record_id: record_id.into(),
            value: value.into(),
        })
}

fn parse_amount(ledger: &str, record_id: &str, value: &str) -> Result<Option<f64>, ReconError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ReconError::AmountParse {
            ledger: ledger.into(),
            record_id: record_id.into(),
            value: value.into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NBIM_CSV: &str = "\
COAC_EVENT_KEY;ISIN;SEDOL;TICKER;ORGANISATION_NAME;EXDATE;PAYMENT_DATE;DIVIDENDS_PER_SHARE;NOMINAL_BASIS;GROSS_AMOUNT_QUOTATION;NET_AMOUNT_QUOTATION;WTHTAX_COST_QUOTATION;WTHTAX_RATE;QUOTATION_CURRENCY;CUSTODIAN;BANK_ACCOUNT
100045;US1234567890;B1YW440;ACME;Acme Corp;10.03.2025;24.03.2025;1.25;1000;1250.0;1062.5;187.5;15;USD;CITI;12345
100046;GB0002374006;0237400;;Diageo plc;13.03.2025;27.03.2025;0.8;500;400.0;400.0;0;0;GBP;CITI;12345
";

    const CUSTODY_CSV: &str = "\
COAC_EVENT_KEY;ISIN;SEDOL;EX_DATE;PAY_DATE;DIV_RATE;NOMINAL_BASIS;GROSS_AMOUNT;NET_AMOUNT_QC;TAX;TAX_RATE;CURRENCIES;CUSTODIAN;BANK_ACCOUNTS
100045;US1234567890;B1YW440;10.03.2025;24.03.2025;1.25;1000;1250.0;1062.5;187.5;15;USD NOK;CITI;12345
";

    #[test]
    fn nbim_normalization() {
        let rows = load_nbim_csv(NBIM_CSV).unwrap();
        assert_eq!(rows.len(), 2);

        let r = &rows[0];
        assert_eq!(r.event_key, "100045");
        assert_eq!(r.isin, "US1234567890");
        assert_eq!(r.ticker.as_deref(), Some("ACME"));
        assert_eq!(r.company_name.as_deref(), Some("Acme Corp"));
        assert_eq!(r.ex_date, NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(r.payment_date, NaiveDate::from_ymd_opt(2025, 3, 24));
        assert_eq!(r.gross_amount, Some(1250.0));
        assert_eq!(r.net_amount, Some(1062.5));
        assert_eq!(r.tax_amount, Some(187.5));
        assert_eq!(r.tax_rate, Some(15.0));
        assert_eq!(r.currency.as_deref(), Some("USD"));
        assert_eq!(r.source, Source::Nbim);

        // Empty ticker cell becomes None.
        assert_eq!(rows[1].ticker, None);
    }

    #[test]
    fn custody_normalization() {
        let rows = load_custody_csv(CUSTODY_CSV).unwrap();
        assert_eq!(rows.len(), 1);

        let r = &rows[0];
        assert_eq!(r.event_key, "100045");
        assert_eq!(r.ticker, None);
        assert_eq!(r.company_name, None);
        // First token of the CURRENCIES column.
        assert_eq!(r.currency.as_deref(), Some("USD"));
        assert_eq!(r.source, Source::Custody);
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = load_nbim_csv("ISIN;EXDATE\nUS1;10.03.2025\n").unwrap_err();
        assert!(err.to_string().contains("COAC_EVENT_KEY"));
    }

    #[test]
    fn bad_date_names_the_record() {
        let csv = NBIM_CSV.replace("10.03.2025", "2025-03-10");
        let err = load_nbim_csv(&csv).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("100045"), "got: {msg}");
        assert!(msg.contains("2025-03-10"), "got: {msg}");
    }

    #[test]
    fn bad_amount_names_the_record() {
        let csv = NBIM_CSV.replace(";1250.0;", ";12,50;");
        let err = load_nbim_csv(&csv).unwrap_err();
        assert!(err.to_string().contains("12,50"));
    }
}
