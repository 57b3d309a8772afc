//! Statistical detection of scripted heartbeat traffic

use dwell_config::TrackingParams;

/// Verdict over a learner's recent heartbeat intervals
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BotAssessment {
    /// Not enough samples to decide
    Insufficient { samples: usize },
    Human { stddev_secs: f64 },
    BotLike { stddev_secs: f64, samples: usize },
}

#[derive(Debug, Clone)]
pub struct BotDetector {
    min_samples: usize,
    stddev_threshold: f64,
}

impl BotDetector {
    pub fn new(params: &TrackingParams) -> Self {
        Self {
            min_samples: params.bot_min_samples.max(2),
            stddev_threshold: params.bot_stddev_threshold,
        }
    }

    pub fn assess(&self, intervals: &[f64]) -> BotAssessment {
        let samples = intervals.len();
        if samples < self.min_samples {
            return BotAssessment::Insufficient { samples };
        }

        match sample_stddev(intervals) {
            Some(stddev_secs) if stddev_secs < self.stddev_threshold => BotAssessment::BotLike {
                stddev_secs,
                samples,
            },
            Some(stddev_secs) => BotAssessment::Human { stddev_secs },
            None => BotAssessment::Insufficient { samples },
        }
    }
}

/// Sample standard deviation (n - 1 denominator); `None` for fewer than two values
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}
