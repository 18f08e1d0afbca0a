//! Classification metrics.

use burn::prelude::*;
use burn::tensor::ElementConversion;

/// Metrics collected for one epoch
#[derive(Debug, Clone, Default)]
pub struct EpochMetrics {
    /// Average training loss over the epoch
    pub train_loss: f64,
    /// Training accuracy over the epoch (0.0 to 1.0)
    pub train_accuracy: f64,
    /// Average validation loss
    pub val_loss: f64,
    /// Validation accuracy (0.0 to 1.0)
    pub val_accuracy: f64,
}

/// Running sums for loss/accuracy over a pass
#[derive(Debug, Clone, Default)]
pub struct RunningMetrics {
    loss_sum: f64,
    batches: usize,
    correct: usize,
    total: usize,
}

impl RunningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one batch
    pub fn record(&mut self, loss: f64, correct: usize, batch_size: usize) {
        self.loss_sum += loss;
        self.batches += 1;
        self.correct += correct;
        self.total += batch_size;
    }

    /// Average loss across recorded batches
    pub fn avg_loss(&self) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            self.loss_sum / self.batches as f64
        }
    }

    /// Accuracy across recorded samples (0.0 to 1.0)
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    /// Number of samples recorded
    pub fn samples(&self) -> usize {
        self.total
    }
}

/// Count correct predictions in a batch of logits against integer targets
pub fn count_correct<B: Backend>(output: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predictions = output.argmax(1).squeeze::<1>(1);
    let correct: i64 = predictions.equal(targets).int().sum().into_scalar().elem();
    correct as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_running_metrics_empty() {
        let metrics = RunningMetrics::new();
        assert_eq!(metrics.avg_loss(), 0.0);
        assert_eq!(metrics.accuracy(), 0.0);
    }

    #[test]
    fn test_running_metrics_accumulation() {
        let mut metrics = RunningMetrics::new();
        metrics.record(0.5, 3, 4);
        metrics.record(0.3, 4, 4);

        assert!((metrics.avg_loss() - 0.4).abs() < 1e-9);
        assert!((metrics.accuracy() - 7.0 / 8.0).abs() < 1e-9);
        assert_eq!(metrics.samples(), 8);
    }

    #[test]
    fn test_count_correct() {
        let device = Default::default();

        // Two samples: first predicts class 1, second predicts class 0
        let logits = Tensor::<TestBackend, 2>::from_floats(
            TensorData::new(vec![0.1f32, 0.9, 0.8, 0.2], [2, 2]),
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_data(
            TensorData::new(vec![1i64, 1], [2]),
            &device,
        );

        assert_eq!(count_correct(logits, targets), 1);
    }
}
