// Durations of a second, a minute, an hour and a day.
const DURATIONS_MS: [u64; 4] = [1000, 1000 * 60, 1000 * 60 * 60, 1000 * 60 * 60 * 24];
const ISO_DESIGNATORS: [char; 4] = ['S', 'M', 'H', 'D'];

#[derive(Debug, Clone, Copy, Default)]
pub struct DurationFormat {
    /// Count hours past 24 instead of showing days.
    pub omit_days: bool,
    pub omit_ms: bool,
}

impl DurationFormat {
    pub const SHORT: DurationFormat = DurationFormat {
        omit_days: false,
        omit_ms: true,
    };
    pub const HOURS: DurationFormat = DurationFormat {
        omit_days: true,
        omit_ms: true,
    };
}

/// Splits milliseconds into the leading non-zero units (largest first) and the ms remainder.
fn split_duration(mut ms: u64, omit_days: bool) -> (Vec<u64>, u64) {
    let units = if omit_days { &DURATIONS_MS[..3] } else { &DURATIONS_MS[..] };
    let mut values = Vec::with_capacity(units.len());
    for unit in units.iter().rev() {
        let value = ms / unit;
        if values.is_empty() && value == 0 {
            continue;
        }
        values.push(value);
        ms -= value * unit;
    }
    (values, ms)
}

/// Converts a millisecond duration to `D:HH:MM:SS.mmm`, dropping leading zero units.
///
/// 754_321 ms renders as `12:34.321`, or `12:34` with `omit_ms`.
pub fn ms_to_duration(ms: u64, format: DurationFormat) -> String {
    let (values, remainder) = split_duration(ms, format.omit_days);
    let main = if values.is_empty() {
        "0".to_string()
    } else {
        values
            .iter()
            .enumerate()
            .map(|(n, v)| if n == 0 { v.to_string() } else { format!("{v:02}") })
            .collect::<Vec<_>>()
            .join(":")
    };
    if format.omit_ms {
        main
    } else {
        format!("{main}.{remainder:03}")
    }
}

/// ISO 8601 rendering of a duration, e.g. `P1DT2H3M4S`. Milliseconds are dropped.
pub fn ms_to_iso_duration(ms: u64) -> String {
    let (values, _) = split_duration(ms, false);
    let offset = ISO_DESIGNATORS.len() - values.len();
    let mut date = String::new();
    let mut time = String::new();
    for (n, value) in values.iter().enumerate() {
        if *value == 0 {
            continue;
        }
        let designator = ISO_DESIGNATORS[ISO_DESIGNATORS.len() - 1 - (offset + n)];
        if designator == 'D' {
            date.push_str(&format!("{value}D"));
        } else {
            time.push_str(&format!("{value}{designator}"));
        }
    }
    if date.is_empty() && time.is_empty() {
        return "PT0S".to_string();
    }
    if time.is_empty() {
        format!("P{date}")
    } else {
        format!("P{date}T{time}")
    }
}

/// `numerator / denominator` in hundredths of a percent, rounded half-up.
fn hundredths_of_percent(numerator: u128, denominator: u128) -> u128 {
    (numerator * 20_000 + denominator) / (2 * denominator)
}

fn render_hundredths(hundredths: u128) -> String {
    format!("{}.{:02}%", hundredths / 100, hundredths % 100)
}

/// Renders a ratio as `NN.NN%`, rounded half-up. `None` when there is nothing to divide by.
pub fn make_percentage(amount: u64, total: u64) -> Option<String> {
    if total == 0 {
        return None;
    }
    Some(render_hundredths(hundredths_of_percent(amount as u128, total as u128)))
}

/// Signed difference between a specific rate and the regular one, e.g. `+4.17%`.
///
/// Both rates are `(won, played)` counts; a zero difference renders as `+0.00%`.
pub fn differential_percentage(regular: (u64, u64), specific: (u64, u64)) -> Option<String> {
    let (regular_won, regular_played) = regular;
    let (specific_won, specific_played) = specific;
    if regular_played == 0 || specific_played == 0 {
        return None;
    }
    let difference = specific_won as i128 * regular_played as i128 - regular_won as i128 * specific_played as i128;
    let sign = if difference >= 0 { '+' } else { '-' };
    let hundredths = hundredths_of_percent(difference.unsigned_abs(), specific_played as u128 * regular_played as u128);
    Some(format!("{sign}{}", render_hundredths(hundredths)))
}

/// Floor of the mean.
pub fn average(items: &[u64]) -> Option<u64> {
    if items.is_empty() {
        return None;
    }
    Some(items.iter().sum::<u64>() / items.len() as u64)
}

pub fn rounded_average(items: &[u32]) -> Option<u32> {
    if items.is_empty() {
        return None;
    }
    let sum: u64 = items.iter().map(|v| *v as u64).sum();
    Some((sum as f64 / items.len() as f64).round() as u32)
}

/// Median; even-length samples take the floor of the middle pair's mean.
pub fn median(items: &[u64]) -> Option<u64> {
    if items.is_empty() {
        return None;
    }
    let mut sorted = items.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_to_duration() {
        assert_eq!(ms_to_duration(754_321, DurationFormat::default()), "12:34.321");
        assert_eq!(ms_to_duration(754_321, DurationFormat::SHORT), "12:34");
        assert_eq!(ms_to_duration(3_600_000 + 5_000, DurationFormat::SHORT), "1:00:05");
        assert_eq!(ms_to_duration(90_000_000, DurationFormat::SHORT), "1:01:00:00");
        assert_eq!(ms_to_duration(90_000_000, DurationFormat::HOURS), "25:00:00");
        assert_eq!(ms_to_duration(42, DurationFormat::default()), "0.042");
    }

    #[test]
    fn test_ms_to_iso_duration() {
        assert_eq!(ms_to_iso_duration(93_784_000), "P1DT2H3M4S");
        assert_eq!(ms_to_iso_duration(86_400_000), "P1D");
        assert_eq!(ms_to_iso_duration(61_000), "PT1M1S");
        assert_eq!(ms_to_iso_duration(0), "PT0S");
    }

    #[test]
    fn test_percentages() {
        assert_eq!(make_percentage(1, 3), Some("33.33%".to_string()));
        assert_eq!(make_percentage(2, 3), Some("66.67%".to_string()));
        assert_eq!(make_percentage(1, 8), Some("12.50%".to_string()));
        assert_eq!(make_percentage(3, 3), Some("100.00%".to_string()));
        assert_eq!(make_percentage(1, 0), None);
        assert_eq!(make_percentage(0, 7), Some("0.00%".to_string()));
    }

    #[test]
    fn test_percentages_round_exact_ties_up() {
        // 7.125% and 31.375% sit exactly between two hundredths.
        assert_eq!(make_percentage(57, 800), Some("7.13%".to_string()));
        assert_eq!(make_percentage(251, 800), Some("31.38%".to_string()));
        assert_eq!(make_percentage(301, 800), Some("37.63%".to_string()));
        for total in 1..=2000u64 {
            for amount in 0..=total {
                let exact = (amount * 20_000 + total) / (2 * total);
                let expected = format!("{}.{:02}%", exact / 100, exact % 100);
                assert_eq!(make_percentage(amount, total), Some(expected), "{amount}/{total}");
            }
        }
    }

    #[test]
    fn test_differential_percentage() {
        assert_eq!(differential_percentage((1, 2), (11, 20)).as_deref(), Some("+5.00%"));
        assert_eq!(differential_percentage((1, 2), (2, 5)).as_deref(), Some("-10.00%"));
        assert_eq!(differential_percentage((1, 2), (2, 4)).as_deref(), Some("+0.00%"));
        // 57.125% against 50% is an exact tie at 7.125%.
        assert_eq!(differential_percentage((1, 2), (457, 800)).as_deref(), Some("+7.13%"));
        assert_eq!(differential_percentage((1, 2), (343, 800)).as_deref(), Some("-7.13%"));
        assert_eq!(differential_percentage((0, 0), (1, 2)), None);
        assert_eq!(differential_percentage((1, 2), (0, 0)), None);
    }

    #[test]
    fn test_average_and_median() {
        assert_eq!(average(&[500, 100, 900]), Some(500));
        assert_eq!(average(&[1, 2]), Some(1));
        assert_eq!(median(&[900, 100, 500]), Some(500));
        assert_eq!(median(&[1, 2, 3, 4]), Some(2));
        assert_eq!(median(&[]), None);
        assert_eq!(rounded_average(&[100, 101]), Some(101));
    }
}
