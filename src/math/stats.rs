use serde::Serialize;

/// Summary statistics of a numeric data window.
///
/// NaN cells (missing or unparsable values) are counted in `nans` and
/// excluded from every other field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub count: usize,
    pub nans: usize,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub mean: f64,
    /// Sample variance; zero for fewer than two values.
    pub var: f64,
    pub sd: f64,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            count: 0,
            nans: 0,
            min: f64::NAN,
            max: f64::NAN,
            sum: 0.0,
            mean: f64::NAN,
            var: 0.0,
            sd: 0.0,
        }
    }
}

impl Statistics {
    fn push(&mut self, x: f64, m2: &mut f64) {
        if x.is_nan() {
            self.nans += 1;
            return;
        }
        if self.count == 0 {
            self.min = x;
            self.max = x;
            self.mean = 0.0;
        }
        self.count += 1;
        self.min = self.min.min(x);
        self.max = self.max.max(x);
        self.sum += x;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        *m2 += delta * (x - self.mean);
    }
}

/// Single-pass (Welford) statistics over `values`.
pub fn compute_stats(values: impl IntoIterator<Item = f64>) -> Statistics {
    let mut stats = Statistics::default();
    let mut m2 = 0.0;
    for x in values {
        stats.push(x, &mut m2);
    }
    if stats.count > 1 {
        stats.var = m2 / (stats.count - 1) as f64;
        stats.sd = stats.var.sqrt();
    }
    stats
}
