//! Completion percentage policy

use dwell_config::SubsectionPolicy;

/// Percentage of a subsection completed after `time_spent_seconds` of validated time.
///
/// With a recommended time `R` (minutes) the result is `100 * t / (R * 60)`,
/// clamped to 100. Without one, `min_time_seconds` acts as a floor: reaching it
/// counts as fully viewed, anything less is proportional.
pub fn completion_percentage(time_spent_seconds: u64, policy: &SubsectionPolicy) -> f64 {
    let t = time_spent_seconds as f64;

    match policy.required_time_minutes {
        Some(minutes) if minutes > 0 => {
            let required = f64::from(minutes) * 60.0;
            (100.0 * t / required).min(100.0)
        }
        _ => {
            let min = f64::from(policy.min_time_seconds);
            if min <= 0.0 || t >= min {
                100.0
            } else {
                100.0 * t / min
            }
        }
    }
}
