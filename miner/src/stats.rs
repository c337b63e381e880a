//! Instrumentation collected by the driver.
//!
//! One entry per iteration (seeded insertions record zero time and zero
//! searched nodes, keeping the histories aligned with the summary).

use std::fmt::{Display, Error, Formatter};
use std::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct Stats {
    /// BIC score of the model before the first insertion.
    pub initial_score: f64,
    /// Wall-clock time of each mining iteration.
    pub loop_times: Vec<Duration>,
    /// Nodes visited by each invocation of the search.
    pub search_space: Vec<u64>,
    /// Number of independent components after each insertion.
    pub independent_components: Vec<usize>,
    /// Per-component summary sizes after each insertion.
    pub summary_sizes: Vec<Vec<usize>>,
    /// Cumulative time spent fitting submodels.
    pub fit_time: Duration,
    /// Iterative-scaling fits that hit the sweep cap.
    pub scaling_failures: u64,
}

impl Stats {
    pub fn iterations(&self) -> usize {
        self.loop_times.len()
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        fn label(f: &mut Formatter<'_>, label: &str) -> Result<(), Error> {
            write!(f, "{label:<22}: ")
        }
        label(f, "iterations")?;
        writeln!(f, "{}", self.iterations())?;
        label(f, "mining time")?;
        writeln!(f, "{:.3}s", self.loop_times.iter().map(Duration::as_secs_f64).sum::<f64>())?;
        label(f, "model fit time")?;
        writeln!(f, "{:.3}s", self.fit_time.as_secs_f64())?;
        label(f, "searched nodes")?;
        writeln!(f, "{}", self.search_space.iter().sum::<u64>())?;
        label(f, "independent components")?;
        writeln!(f, "{}", self.independent_components.last().copied().unwrap_or(0))?;
        label(f, "scaling failures")?;
        write!(f, "{}", self.scaling_failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_line_oriented() {
        let stats = Stats {
            initial_score: 10.0,
            loop_times: vec![Duration::from_millis(5)],
            search_space: vec![42],
            independent_components: vec![1],
            summary_sizes: vec![vec![1]],
            ..Stats::default()
        };
        let text = stats.to_string();
        assert!(text.contains("iterations"));
        assert!(text.contains("42"));
    }
}
