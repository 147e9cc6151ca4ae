use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Run config validation error (empty file name, bad tolerance, etc.).
    ConfigValidation(String),
    /// Missing required column in a source CSV.
    MissingColumn { ledger: String, column: String },
    /// Date parse error in a source CSV.
    DateParse { ledger: String, record_id: String, value: String },
    /// Amount parse error in a source CSV.
    AmountParse { ledger: String, record_id: String, value: String },
    /// Malformed analysis report (bad JSON or non-scalar identifier field).
    ReportParse(String),
    /// IO error (file read, CSV write, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { ledger, column } => {
                write!(f, "ledger '{ledger}': missing column '{column}'")
            }
            Self::DateParse { ledger, record_id, value } => {
                write!(f, "ledger '{ledger}', record '{record_id}': cannot parse date '{value}'")
            }
            Self::AmountParse { ledger, record_id, value } => {
                write!(f, "ledger '{ledger}', record '{record_id}': cannot parse amount '{value}'")
            }
            Self::ReportParse(msg) => write!(f, "report parse error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
