use crate::config::Tolerance;
use crate::model::Record;

/// Restore the accounting identity `net = gross − tax` on a row snapshot.
///
/// Total function: rows without enough inputs come back unchanged.
/// Precedence: a present tax rate wins over a present tax amount, so a
/// rate aligned from NBIM re-derives both tax and net.
pub fn refine(row: &Record, tolerance: &Tolerance) -> Record {
    let mut out = row.clone();

    match (row.gross_amount, row.tax_rate) {
        (Some(gross), Some(rate)) => {
            let tax = round_dp(gross * (rate / 100.0), 2);
            out.tax_amount = Some(tax);
            match row.net_amount {
                // Keep a net already within the configured window of the
                // identity.
                Some(net) if (net - (gross - tax)).abs() <= tolerance.net_window => {}
                _ => out.net_amount = Some(round_dp(gross - tax, 2)),
            }
        }
        _ => {
            if let (Some(gross), Some(tax)) = (row.gross_amount, row.tax_amount) {
                out.net_amount = Some(round_dp(gross - tax, 2));
                if gross != 0.0 {
                    out.tax_rate = Some(round_dp(tax / gross * 100.0, 4));
                }
            }
        }
    }

    out
}

/// Round to `dp` decimal places, half away from zero. Exact halves round
/// up in magnitude (0.125 → 0.13), unlike bankers' rounding.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    let factor = 10f64.powi(dp as i32);
    (value * factor).round() / factor
}
