//! Latency summaries.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: usize,
    pub avg: Duration,
    pub min: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub max: Duration,
}

impl LatencyStats {
    /// Summarise a latency series. `None` for an empty series.
    ///
    /// Percentiles use the nearest-rank index `len * p / 100`, clamped to the
    /// last sample.
    pub fn from_samples(samples: &[Duration]) -> Option<LatencyStats> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let len = sorted.len();
        let sum: Duration = sorted.iter().sum();
        let at = |pct: usize| sorted[(len * pct / 100).min(len - 1)];

        Some(LatencyStats {
            count: len,
            avg: sum / len as u32,
            min: sorted[0],
            p50: at(50),
            p95: at(95),
            p99: at(99),
            max: sorted[len - 1],
        })
    }
}

pub fn duration_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

/// Human-readable duration: ns below 1us, then us, ms, s.
pub fn format_ns(ns: u128) -> String {
    if ns < 1_000 {
        format!("{} ns", ns)
    } else if ns < 1_000_000 {
        format!("{:.2} us", ns as f64 / 1_000.0)
    } else if ns < 1_000_000_000 {
        format!("{:.2} ms", ns as f64 / 1_000_000.0)
    } else {
        format!("{:.2} s", ns as f64 / 1_000_000_000.0)
    }
}

/// Fixed-width latency table, one line per labelled series.
pub fn render_table(rows: &[(String, LatencyStats)]) -> String {
    let width = rows
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0)
        .max("Series".len());
    let mut out = format!(
        "{:<width$}  {:>8}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}\n",
        "Series",
        "samples",
        "avg",
        "p50",
        "p95",
        "p99",
        "max",
        width = width
    );
    out.push_str(&"-".repeat(width + 70));
    out.push('\n');
    for (label, s) in rows {
        out.push_str(&format!(
            "{:<width$}  {:>8}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}\n",
            label,
            s.count,
            format_ns(s.avg.as_nanos()),
            format_ns(s.p50.as_nanos()),
            format_ns(s.p95.as_nanos()),
            format_ns(s.p99.as_nanos()),
            format_ns(s.max.as_nanos()),
            width = width
        ));
    }
    out
}

/// Percentage change from `base` to `candidate` and a short verdict for
/// latency values (lower is better).
pub fn latency_delta(base: Duration, candidate: Duration) -> (f64, &'static str) {
    let base_ns = base.as_nanos() as f64;
    let delta_pct = if base_ns > 0.0 {
        (candidate.as_nanos() as f64 - base_ns) / base_ns * 100.0
    } else {
        0.0
    };
    let hint = if delta_pct < -1.0 {
        "faster"
    } else if delta_pct > 1.0 {
        "slower"
    } else {
        "~same"
    };
    (delta_pct, hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_has_no_stats() {
        assert!(LatencyStats::from_samples(&[]).is_none());
    }

    #[test]
    fn percentiles_follow_sorted_order() {
        let samples: Vec<Duration> = (1..=100).rev().map(Duration::from_micros).collect();
        let s = LatencyStats::from_samples(&samples).unwrap();
        assert_eq!(s.count, 100);
        assert_eq!(s.min, Duration::from_micros(1));
        assert_eq!(s.max, Duration::from_micros(100));
        assert_eq!(s.p50, Duration::from_micros(51));
        assert_eq!(s.p99, Duration::from_micros(100));
    }

    #[test]
    fn format_ns_picks_unit() {
        assert_eq!(format_ns(999), "999 ns");
        assert_eq!(format_ns(1_500), "1.50 us");
        assert_eq!(format_ns(2_250_000), "2.25 ms");
    }

    #[test]
    fn delta_verdicts() {
        let base = Duration::from_micros(100);
        assert_eq!(latency_delta(base, Duration::from_micros(150)), (50.0, "slower"));
        assert_eq!(latency_delta(base, Duration::from_micros(50)), (-50.0, "faster"));
        assert_eq!(latency_delta(base, base).1, "~same");
        assert_eq!(latency_delta(Duration::ZERO, base).0, 0.0);
    }
}
