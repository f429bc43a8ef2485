use std::collections::BTreeMap;

/// Mean validation accuracy an epoch must exceed to move on.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// What the curriculum decided after an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurriculumStep {
    Stay,
    Promote {
        from:   usize,
        to:     usize,
        /// epochs spent at `from`, the epoch just recorded included
        epochs: usize,
    },
}

/// Tracks how long each number length took and decides promotions.
///
/// Promotion is a one-way ratchet: a later drop in accuracy never moves
/// the length back down, and the time-to-success table only grows.
#[derive(Debug, Clone)]
pub struct Curriculum {
    threshold:       f64,
    time_to_success: BTreeMap<usize, usize>,
}

impl Curriculum {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, time_to_success: BTreeMap::new() }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Count one finished epoch at `number_length` and compare its mean
    /// accuracy with the threshold (strictly greater promotes).
    pub fn record_epoch(&mut self, number_length: usize, mean_accuracy: f64) -> CurriculumStep {
        let epochs = self.time_to_success.entry(number_length).or_insert(0);
        *epochs += 1;

        if mean_accuracy > self.threshold {
            CurriculumStep::Promote { from: number_length, to: number_length + 1, epochs: *epochs }
        } else {
            CurriculumStep::Stay
        }
    }

    /// number length → epochs spent there, in ascending length order.
    pub fn time_to_success(&self) -> &BTreeMap<usize, usize> {
        &self.time_to_success
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
