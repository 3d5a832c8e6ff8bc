//! Process capability index (CPK) of a measurement sample.
//!
//! CPU = (USL - mean) / (3σ), CPL = (mean - LSL) / (3σ), with σ the sample
//! standard deviation (n - 1 denominator). CPK is the smaller of the two when
//! both bounds are present and the one-sided index otherwise.

/// Outcome of a capability calculation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Capability {
    /// Count of valid numeric values in the sample.
    pub sample_size: usize,
    /// `None` with no bound, fewer than two values, or zero spread.
    pub cpk: Option<f64>,
}

/// Mean and sample standard deviation, `None` below two values.
fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some((mean, variance.sqrt()))
}

/// Computes the capability index of `values` against the optional bounds.
///
/// Non-finite values are discarded before anything else.
pub fn capability<I>(values: I, usl: Option<f64>, lsl: Option<f64>) -> Capability
where
    I: IntoIterator<Item = f64>,
{
    let values: Vec<f64> = values.into_iter().filter(|value| value.is_finite()).collect();
    // Identical readings have zero spread even when the computed std does not.
    let constant = values.windows(2).all(|pair| pair[0] == pair[1]);
    let cpk = mean_and_std(&values)
        .filter(|(_, std)| !constant && *std > 0.0)
        .and_then(|(mean, std)| {
            let cpu = usl.map(|usl| (usl - mean) / (3.0 * std));
            let cpl = lsl.map(|lsl| (mean - lsl) / (3.0 * std));
            match (cpu, cpl) {
                (Some(cpu), Some(cpl)) => Some(cpu.min(cpl)),
                (Some(cpu), None) => Some(cpu),
                (None, Some(cpl)) => Some(cpl),
                (None, None) => None,
            }
        });
    Capability {
        sample_size: values.len(),
        cpk,
    }
}
