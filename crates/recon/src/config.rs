use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// One reconciliation run: the three input files, output paths, and numeric
/// tolerances. Constructed once and passed down; the engine holds no global
/// state.
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub inputs: InputsConfig,
    #[serde(default)]
    pub tolerance: Tolerance,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputsConfig {
    /// NBIM dividend bookings CSV (semicolon-delimited).
    pub nbim: String,
    /// Custody dividend bookings CSV (semicolon-delimited).
    pub custody: String,
    /// Analysis report JSON from the narrative collaborator.
    pub report: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub nbim: Option<String>,
    #[serde(default)]
    pub custody: Option<String>,
    /// JSON run summary.
    #[serde(default)]
    pub summary: Option<String>,
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

/// Numeric comparison tolerances. `rel`/`abs` drive field equivalence in
/// the proposer; `net_window` is the refiner's net-amount window.
#[derive(Debug, Clone, Deserialize)]
pub struct Tolerance {
    #[serde(default = "default_rel")]
    pub rel: f64,
    #[serde(default = "default_abs")]
    pub abs: f64,
    #[serde(default = "default_net_window")]
    pub net_window: f64,
}

fn default_rel() -> f64 {
    1e-6
}

fn default_abs() -> f64 {
    1e-6
}

fn default_net_window() -> f64 {
    0.01
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rel: default_rel(),
            abs: default_abs(),
            net_window: default_net_window(),
        }
    }
}

impl Tolerance {
    /// `isclose` over two decimals: within `rel` of the larger magnitude,
    /// or within `abs` absolutely.
    pub fn close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= f64::max(self.rel * f64::max(a.abs(), b.abs()), self.abs)
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for (label, path) in [
            ("inputs.nbim", &self.inputs.nbim),
            ("inputs.custody", &self.inputs.custody),
            ("inputs.report", &self.inputs.report),
        ] {
            if path.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "{label} must not be empty"
                )));
            }
        }

        let t = &self.tolerance;
        if t.rel < 0.0 || t.abs < 0.0 || t.net_window < 0.0 {
            return Err(ReconError::ConfigValidation(
                "tolerances must be non-negative".into(),
            ));
        }

        Ok(())
    }
}
