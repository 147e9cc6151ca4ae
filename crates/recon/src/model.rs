use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Which ledger a record belongs to. Set exactly once at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    Nbim,
    Custody,
}

impl Source {
    /// Canonical tag written into the `source` column on export.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Nbim => "NBIM",
            Self::Custody => "CUSTODY",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// One dividend booking line, normalized to the common schema.
///
/// Monetary fields are decimals; compare them with tolerance, never `==`.
/// `record_date` is carried for the classifier's date flags even though
/// neither source file populates it today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub event_key: String,
    pub isin: String,
    pub sedol: Option<String>,
    pub ticker: Option<String>,
    pub company_name: Option<String>,
    pub ex_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub record_date: Option<NaiveDate>,
    pub dividend_rate: Option<f64>,
    pub nominal_basis: Option<f64>,
    pub gross_amount: Option<f64>,
    pub net_amount: Option<f64>,
    pub tax_amount: Option<f64>,
    pub tax_rate: Option<f64>,
    pub currency: Option<String>,
    pub custodian: Option<String>,
    pub bank_account: Option<String>,
    pub source: Source,
}

impl Record {
    /// Business key = (isin, event_key). Not unique within a ledger;
    /// duplicates are resolved by arrival order in the matcher.
    pub fn business_key(&self) -> (String, String) {
        (self.isin.clone(), self.event_key.clone())
    }

    /// Read one of the eight alignment fields as a generic value.
    pub fn align_value(&self, field: AlignField) -> FieldValue {
        match field {
            AlignField::NetAmount => FieldValue::from_number(self.net_amount),
            AlignField::GrossAmount => FieldValue::from_number(self.gross_amount),
            AlignField::TaxAmount => FieldValue::from_number(self.tax_amount),
            AlignField::TaxRate => FieldValue::from_number(self.tax_rate),
            AlignField::Currency => FieldValue::from_text(self.currency.clone()),
            AlignField::ExDate => FieldValue::from_date(self.ex_date),
            AlignField::PaymentDate => FieldValue::from_date(self.payment_date),
            AlignField::NominalBasis => FieldValue::from_number(self.nominal_basis),
        }
    }

    /// Write one of the alignment fields. A value whose shape does not fit
    /// the field (e.g. a date into `net_amount`) is a type mismatch; the
    /// applier turns that into a per-change skip.
    pub fn set_align_value(
        &mut self,
        field: AlignField,
        value: &FieldValue,
    ) -> Result<(), FieldTypeMismatch> {
        let mismatch = || FieldTypeMismatch { field };
        match field {
            AlignField::NetAmount => {
                self.net_amount = value.as_number_field().ok_or_else(mismatch)?
            }
            AlignField::GrossAmount => {
                self.gross_amount = value.as_number_field().ok_or_else(mismatch)?
            }
            AlignField::TaxAmount => {
                self.tax_amount = value.as_number_field().ok_or_else(mismatch)?
            }
            AlignField::TaxRate => self.tax_rate = value.as_number_field().ok_or_else(mismatch)?,
            AlignField::NominalBasis => {
                self.nominal_basis = value.as_number_field().ok_or_else(mismatch)?
            }
            AlignField::Currency => self.currency = value.as_text_field().ok_or_else(mismatch)?,
            AlignField::ExDate => self.ex_date = value.as_date_field().ok_or_else(mismatch)?,
            AlignField::PaymentDate => {
                self.payment_date = value.as_date_field().ok_or_else(mismatch)?
            }
        }
        Ok(())
    }
}

/// A proposed value does not fit the target field's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTypeMismatch {
    pub field: AlignField,
}

// ---------------------------------------------------------------------------
// Alignment fields + values
// ---------------------------------------------------------------------------

/// The fields the correction proposer aligns from NBIM into custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignField {
    NetAmount,
    GrossAmount,
    TaxAmount,
    TaxRate,
    Currency,
    ExDate,
    PaymentDate,
    NominalBasis,
}

/// Alignment order matters: proposals are emitted field by field in this
/// order, and application order decides last-write-wins conflicts.
pub const ALIGN_FIELDS: [AlignField; 8] = [
    AlignField::NetAmount,
    AlignField::GrossAmount,
    AlignField::TaxAmount,
    AlignField::TaxRate,
    AlignField::Currency,
    AlignField::ExDate,
    AlignField::PaymentDate,
    AlignField::NominalBasis,
];

impl AlignField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetAmount => "net_amount",
            Self::GrossAmount => "gross_amount",
            Self::TaxAmount => "tax_amount",
            Self::TaxRate => "tax_rate",
            Self::Currency => "currency",
            Self::ExDate => "ex_date",
            Self::PaymentDate => "payment_date",
            Self::NominalBasis => "nominal_basis",
        }
    }
}

impl std::fmt::Display for AlignField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value carried by a proposal. `Missing` clears the cell;
/// proposing NBIM's empty cell over a populated custody cell is deliberate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Missing,
}

impl FieldValue {
    pub fn from_number(v: Option<f64>) -> Self {
        match v {
            Some(n) => Self::Number(n),
            None => Self::Missing,
        }
    }

    pub fn from_text(v: Option<String>) -> Self {
        match v {
            Some(s) => Self::Text(s),
            None => Self::Missing,
        }
    }

    pub fn from_date(v: Option<NaiveDate>) -> Self {
        match v {
            Some(d) => Self::Date(d),
            None => Self::Missing,
        }
    }

    /// Numeric view, parsing numeric text as well (equivalence treats
    /// `"100"` and `100.0` as the same value).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_number_field(&self) -> Option<Option<f64>> {
        match self {
            Self::Number(n) => Some(Some(*n)),
            Self::Missing => Some(None),
            _ => None,
        }
    }

    fn as_text_field(&self) -> Option<Option<String>> {
        match self {
            Self::Text(s) => Some(Some(s.clone())),
            Self::Missing => Some(None),
            _ => None,
        }
    }

    fn as_date_field(&self) -> Option<Option<NaiveDate>> {
        match self {
            Self::Date(d) => Some(Some(*d)),
            Self::Missing => Some(None),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{d}"),
            Self::Missing => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Pair matching
// ---------------------------------------------------------------------------

/// One NBIM record paired with one custody record by business key.
/// At most one side is absent; both-absent only occurs for report rows
/// whose key matches neither ledger (defensive, normally unreachable).
#[derive(Debug, Clone)]
pub struct MatchedPair {
    pub nbim: Option<Record>,
    pub custody: Option<Record>,
    pub nbim_index: Option<usize>,
    pub custody_index: Option<usize>,
}

// ---------------------------------------------------------------------------
// Discrepancy metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Matched,
    MissingInNbim,
    MissingInCustody,
    BothMissing,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::MissingInNbim => write!(f, "missing_in_nbim"),
            Self::MissingInCustody => write!(f, "missing_in_custody"),
            Self::BothMissing => write!(f, "both_missing"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AmountDiffs {
    pub net_abs: f64,
    pub gross_abs: f64,
    pub tax_abs: f64,
    pub net_pct: f64,
    pub gross_pct: f64,
    pub tax_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateFlags {
    pub ex_date_match: bool,
    pub payment_date_match: bool,
    pub record_date_match: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionDiff {
    pub basis_abs: f64,
    pub basis_pct: f64,
    pub position_match: bool,
}

/// Implied withholding rates, computed only when both gross amounts are
/// positive.
#[derive(Debug, Clone, Serialize)]
pub struct ImpliedTaxRates {
    pub nbim_rate: f64,
    pub custody_rate: f64,
    pub rate_abs: f64,
}

/// Quantitative break metrics for one matched pair. Derived and stateless;
/// recomputed on demand, never cached across runs.
#[derive(Debug, Clone, Serialize)]
pub struct DiscrepancyMetrics {
    pub status: RecordStatus,
    /// Net amount of the sole record for missing-record pairs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_impact: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amounts: Option<AmountDiffs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<DateFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rates: Option<ImpliedTaxRates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

// ---------------------------------------------------------------------------
// Changes
// ---------------------------------------------------------------------------

/// What a proposal does to its target ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangePayload {
    /// Set a single alignment field on an existing row.
    Set { field: AlignField, value: FieldValue },
    /// Append a full new row; `row_index` is irrelevant for these.
    AddRow(Box<Record>),
}

/// A single correction candidate, not yet applied. Proposals form an
/// ordered list; application order decides conflicting writes.
#[derive(Debug, Clone, Serialize)]
pub struct Change {
    pub target: Source,
    /// Index into the target ledger; `None` for row additions.
    pub row_index: Option<usize>,
    pub payload: ChangePayload,
    pub reason: String,
    pub confidence: f64,
}

/// Per-change application result. Skips are observable, not swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOutcome {
    Applied,
    Skipped { reason: String },
}
