use core_sim::Micros;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectorySummary {
    pub months: usize,
    pub p5_return_bps: i64,
    pub p50_return_bps: i64,
    pub p95_return_bps: i64,
    pub worst_month_bps: i64,
    pub best_month_bps: i64,
    pub max_drawdown: f64,
}

#[derive(Debug, Default, Clone)]
pub struct TrajectoryMetrics {
    last_nav: Option<Micros>,
    peak_nav: Option<Micros>,
    returns_bps: Vec<i64>,
    max_drawdown: f64,
}

impl TrajectoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_nav(&mut self, nav: Micros) {
        if let Some(previous) = self.last_nav {
            if previous > 0 {
                self.returns_bps.push(return_bps(previous, nav));
            }
        }
        self.last_nav = Some(nav);

        let peak = self.peak_nav.map_or(nav, |peak| peak.max(nav));
        self.peak_nav = Some(peak);
        if peak > 0 {
            let drawdown = (peak - nav) as f64 / peak as f64;
            self.max_drawdown = self.max_drawdown.max(drawdown);
        }
    }

    pub fn summary(&self) -> Option<TrajectorySummary> {
        if self.returns_bps.is_empty() {
            return None;
        }

        let mut sorted = self.returns_bps.clone();
        sorted.sort_unstable();
        let months = sorted.len();

        Some(TrajectorySummary {
            months,
            p5_return_bps: percentile_nearest_rank(&sorted, 5),
            p50_return_bps: percentile_nearest_rank(&sorted, 50),
            p95_return_bps: percentile_nearest_rank(&sorted, 95),
            worst_month_bps: sorted[0],
            best_month_bps: sorted[months - 1],
            max_drawdown: self.max_drawdown,
        })
    }
}

fn return_bps(previous: Micros, current: Micros) -> i64 {
    let delta = current as i128 - previous as i128;
    let bps = delta * 10_000 / previous as i128;
    bps.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

fn percentile_nearest_rank(sorted: &[i64], percentile: usize) -> i64 {
    let count = sorted.len();
    let rank = (percentile * count).div_ceil(100);
    sorted[rank.saturating_sub(1)]
}

#[cfg(test)]
mod tests {
    use super::TrajectoryMetrics;

    #[test]
    fn single_observation_has_no_summary() {
        let mut metrics = TrajectoryMetrics::new();
        metrics.record_nav(1_000_000);

        assert!(metrics.summary().is_none());
    }

    #[test]
    fn monthly_returns_and_percentiles_are_reported() {
        let mut metrics = TrajectoryMetrics::new();

        for nav in [1_000, 1_010, 1_000, 950, 1_045, 1_045] {
            metrics.record_nav(nav);
        }

        let summary = metrics.summary().expect("five returns recorded");
        assert_eq!(summary.months, 5);
        assert_eq!(summary.worst_month_bps, -500);
        assert_eq!(summary.best_month_bps, 1_000);
        assert_eq!(summary.p50_return_bps, 0);
        assert_eq!(summary.p5_return_bps, -500);
        assert_eq!(summary.p95_return_bps, 1_000);
        assert!((summary.max_drawdown - 60.0 / 1_010.0).abs() < 1e-12);
    }

    #[test]
    fn non_positive_base_months_are_skipped() {
        let mut metrics = TrajectoryMetrics::new();

        for nav in [100, -20, 50, 75] {
            metrics.record_nav(nav);
        }

        let summary = metrics.summary().unwrap();
        assert_eq!(summary.months, 2);
        assert_eq!(summary.worst_month_bps, -12_000);
        assert_eq!(summary.best_month_bps, 5_000);
        assert_eq!(summary.max_drawdown, 1.2);
    }
}
