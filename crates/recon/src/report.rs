use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ReconError;

/// Analysis report produced by the narrative collaborator. The engine only
/// reads identifier and status fields; narrative content is ignored and
/// left in `raw_fields` untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub row_analyses: Vec<RowAnalysis>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RowAnalysis {
    /// Usually "ISIN-EventKey".
    #[serde(default)]
    pub row_id: Option<String>,
    #[serde(default)]
    pub event_key: Option<String>,
    #[serde(default)]
    pub overall_status: Option<String>,
    /// Original source column values as reported by the collaborator.
    #[serde(default)]
    pub raw_fields: HashMap<String, serde_json::Value>,
}

impl AnalysisReport {
    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        serde_json::from_str(input).map_err(|e| ReconError::ReportParse(e.to_string()))
    }
}

impl RowAnalysis {
    /// Recover the (isin, event_key) business key for this row.
    ///
    /// Prefers raw-field identifiers, falling back to the `row_id` prefix
    /// before the first `-` and the row's own `event_key`. Either part may
    /// come back empty; an empty key simply misses both ledger lookups.
    pub fn business_key(&self) -> Result<(String, String), ReconError> {
        let isin = match self.raw_scalar("ISIN")? {
            Some(v) => v,
            None => self
                .row_id
                .as_deref()
                .and_then(|id| id.split('-').next())
                .unwrap_or("")
                .to_string(),
        };

        let event_key = match self.raw_scalar("COAC_EVENT_KEY")? {
            Some(v) => v,
            None => self.event_key.clone().unwrap_or_default(),
        };

        Ok((isin, event_key))
    }

    /// A raw field as a scalar string. Empty strings and nulls count as
    /// absent; arrays and objects are malformed report content.
    fn raw_scalar(&self, key: &str) -> Result<Option<String>, ReconError> {
        match self.raw_fields.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) if s.is_empty() => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
            Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
            Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(ReconError::ReportParse(format!(
                "raw field '{key}' is not a scalar: {other}"
            ))),
        }
    }

    /// True when the collaborator flagged this row as a missing record.
    pub fn is_missing_record(&self) -> bool {
        self.overall_status.as_deref() == Some("missing_record")
    }
}
