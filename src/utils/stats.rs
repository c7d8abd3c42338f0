//! Running statistics over vector samples
//!
//! Used to summarize gradient estimates across ascent iterations or across
//! repeated estimator trials.

use nalgebra::DVector;

/// Running mean and variance per component
///
/// Batches are merged with the parallel-axis formula, so single samples and
/// whole batches can be mixed freely.
#[derive(Debug, Clone)]
pub struct RunningMeanStd {
    mean: DVector<f64>,
    var: DVector<f64>,
    count: f64,
}

impl RunningMeanStd {
    /// Create empty statistics for `size`-dimensional samples
    pub fn new(size: usize) -> Self {
        Self { mean: DVector::zeros(size), var: DVector::zeros(size), count: 0.0 }
    }

    /// Add a single sample
    pub fn push(&mut self, sample: &DVector<f64>) {
        self.update(std::slice::from_ref(sample));
    }

    /// Merge a batch of samples
    pub fn update(&mut self, samples: &[DVector<f64>]) {
        if samples.is_empty() {
            return;
        }

        let batch_size = samples.len() as f64;
        let dim = self.mean.len();

        let mut batch_mean = DVector::zeros(dim);
        for sample in samples {
            batch_mean += sample;
        }
        batch_mean /= batch_size;

        let mut batch_var = DVector::zeros(dim);
        for sample in samples {
            let diff = sample - &batch_mean;
            batch_var += diff.component_mul(&diff);
        }
        batch_var /= batch_size;

        let delta = &batch_mean - &self.mean;
        let total_count = self.count + batch_size;

        self.mean += &delta * (batch_size / total_count);

        let m_a = &self.var * self.count;
        let m_b = batch_var * batch_size;
        let m2 = m_a + m_b + delta.component_mul(&delta) * (self.count * batch_size / total_count);
        self.var = m2 / total_count;

        self.count = total_count;
    }

    /// Current mean
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Current (population) variance
    pub fn var(&self) -> &DVector<f64> {
        &self.var
    }

    /// Sum of per-component variances
    pub fn total_var(&self) -> f64 {
        self.var.sum()
    }

    /// Current standard deviation
    pub fn std(&self) -> DVector<f64> {
        self.var.map(f64::sqrt)
    }

    /// Get number of samples seen
    pub fn count(&self) -> usize {
        self.count as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(xs: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(xs)
    }

    #[test]
    fn test_batch_statistics() {
        let mut stats = RunningMeanStd::new(2);
        stats.update(&[v(&[1.0, 2.0]), v(&[2.0, 4.0]), v(&[3.0, 6.0])]);

        assert!((stats.mean()[0] - 2.0).abs() < 1e-12);
        assert!((stats.mean()[1] - 4.0).abs() < 1e-12);
        assert!((stats.var()[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((stats.var()[1] - 8.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.count(), 3);
    }

    #[test]
    fn test_incremental_matches_batch() {
        let samples = [v(&[1.0]), v(&[5.0]), v(&[-2.0]), v(&[0.5])];

        let mut batch = RunningMeanStd::new(1);
        batch.update(&samples);

        let mut incremental = RunningMeanStd::new(1);
        for s in &samples {
            incremental.push(s);
        }

        assert!((batch.mean()[0] - incremental.mean()[0]).abs() < 1e-12);
        assert!((batch.var()[0] - incremental.var()[0]).abs() < 1e-12);
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut stats = RunningMeanStd::new(3);
        stats.update(&[]);
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.total_var(), 0.0);
    }
}
