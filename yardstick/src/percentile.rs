/// A quantile that has both the raw value and the field label it is reported under.
///
/// We work with quantiles for floating-point precision, but reporters show percentiles using the
/// labels dashboards already know: `0.99` is labeled `_99`, `0.999` is labeled `_99_9`.
///
/// The 50th percentile is special-cased and labeled `median`.
#[derive(Debug, Clone, PartialEq)]
pub struct Percentile(f64, String);

impl Percentile {
    /// Creates a new [`Percentile`] from a quantile.
    ///
    /// All values are clamped between 0.0 and 1.0.
    pub fn new(quantile: f64) -> Percentile {
        let clamped = quantile.max(0.0).min(1.0);

        // Rounding keeps values like 0.95 from rendering as 94.99999999999999.
        let display = (clamped * 100_000.0).round() / 1000.0;
        let label = if display == 50.0 {
            "median".to_string()
        } else {
            format!("_{}", display).replace('.', "_")
        };

        Percentile(clamped, label)
    }

    /// Gets the field label.
    pub fn label(&self) -> &str {
        self.1.as_str()
    }

    /// Gets the raw quantile value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Parses a slice of quantiles into a vector of [`Percentile`]s.
pub fn parse_percentiles(quantiles: &[f64]) -> Vec<Percentile> {
    quantiles.iter().map(|q| Percentile::new(*q)).collect()
}
