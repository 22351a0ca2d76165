use chrono::{Days, NaiveDate};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// Largest deviation, in degrees Celsius, of a synthetic point from the
/// current reading.
pub const HISTORY_MAX_OFFSET: f64 = 2.0;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub temperature: f64,
}

impl HistoryPoint {
    pub fn label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Fabricates `days` past readings around `current`, followed by `current`
/// itself dated `today`. The result is ordered oldest first.
///
/// None of the past values are real measurements: each one is the current
/// reading plus uniform noise in `[-HISTORY_MAX_OFFSET, HISTORY_MAX_OFFSET]`,
/// rounded to hundredths.
pub fn generate_history<R: Rng + ?Sized>(
    current: f64,
    days: usize,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<HistoryPoint> {
    let noise = Uniform::new_inclusive(-HISTORY_MAX_OFFSET, HISTORY_MAX_OFFSET)
        .expect("Offset bounds are finite and ordered");

    let mut history: Vec<HistoryPoint> = (1..=days as u64)
        .rev()
        .filter_map(|days_ago| today.checked_sub_days(Days::new(days_ago)))
        .map(|date| HistoryPoint {
            date,
            temperature: perturb(current, noise.sample(rng)),
        })
        .collect();

    history.push(HistoryPoint {
        date: today,
        temperature: current,
    });
    history
}

fn perturb(current: f64, offset: f64) -> f64 {
    let rounded = ((current + offset) * 100.0).round() / 100.0;
    // Rounding may step just past the bound when `current` has more than two
    // decimals.
    rounded.clamp(current - HISTORY_MAX_OFFSET, current + HISTORY_MAX_OFFSET)
}
