//! Formatting helpers shared by the analyzers and the CLI.

use crate::types::Trend;

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid rendering "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Format a metric for headline text (e.g., "4.5", "4").
pub fn format_metric(value: f64) -> String {
    format!("{}", round1(value))
}

/// Format a percent change with an explicit sign (e.g., "+12.5%", "-3%").
pub fn format_percent(delta: f64) -> String {
    let delta = round1(delta);
    if delta >= 0.0 {
        format!("+{}%", delta)
    } else {
        format!("{}%", delta)
    }
}

/// Arrow shown next to a headline value.
pub fn trend_arrow(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "↑",
        Trend::Down => "↓",
        Trend::Neutral => "→",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round1() {
        assert_eq!(round1(4.25), 4.3);
        assert_eq!(round1(3.333), 3.3);
        assert_eq!(round1(4.0), 4.0);
        assert_eq!(round1(-0.04), 0.0);
        assert!(round1(-0.04).is_sign_positive());
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(4.5), "4.5");
        assert_eq!(format_metric(4.0), "4");
        assert_eq!(format_metric(3.96), "4");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(12.345), "+12.3%");
        assert_eq!(format_percent(-33.333), "-33.3%");
        assert_eq!(format_percent(0.0), "+0%");
    }

    #[test]
    fn test_trend_arrow() {
        assert_eq!(trend_arrow(Trend::Up), "↑");
        assert_eq!(trend_arrow(Trend::Down), "↓");
        assert_eq!(trend_arrow(Trend::Neutral), "→");
    }
}
