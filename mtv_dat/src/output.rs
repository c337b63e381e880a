//! Result writers.
//!
//! `summary.dat` holds one mined itemset per line as attribute names; the
//! `stats` file is a line-oriented report consumed by downstream
//! visualization tooling.

use std::fmt::Write;

use itertools::Itertools;
use mtv::Miner;

/// Renders the summary, one itemset per line in insertion order.
pub fn summary(miner: &Miner) -> String {
    let headers = miner.dataset().headers();
    let mut out = String::new();
    for &x in miner.summary() {
        out.push_str(&x.format_with(headers));
        out.push('\n');
    }
    out
}

/// Renders the per-iteration statistics.
pub fn stats(miner: &Miner) -> String {
    let stats = miner.stats();
    let mut out = String::new();
    writeln!(out, "transactions: {}", miner.dataset().len()).unwrap();
    writeln!(out, "attributes: {}", miner.dataset().num_attrs()).unwrap();
    writeln!(out, "iterations: {}", stats.iterations()).unwrap();
    writeln!(out, "initial_score: {:.6}", stats.initial_score).unwrap();
    writeln!(out, "scaling_failures: {}", stats.scaling_failures).unwrap();
    writeln!(out, "iter\ttime_s\tbic\theuristic\tcomponents\tsizes\tsearched").unwrap();
    for i in 0..miner.summary().len() {
        writeln!(
            out,
            "{i}\t{:.6}\t{:.6}\t{:.6}\t{}\t[{}]\t{}",
            stats.loop_times[i].as_secs_f64(),
            miner.bic_scores()[i],
            miner.heuristics()[i],
            stats.independent_components[i],
            stats.summary_sizes[i].iter().join(","),
            stats.search_space[i],
        )
        .unwrap();
    }
    out
}

#[cfg(test)]
mod tests {
    use mtv::{Dataset, Itemset, Miner, MinerParams};

    use super::*;

    fn mined() -> Miner {
        let rows: Vec<Itemset> = std::iter::repeat(Itemset::from_bits(0b110))
            .take(60)
            .chain(std::iter::repeat(Itemset::from_bits(0b001)).take(40))
            .collect();
        let data = Dataset::new(rows, vec!["a".into(), "b".into(), "c".into()]).unwrap();
        let mut miner = Miner::new(
            data,
            MinerParams {
                k: Some(1),
                min_support: 0.1,
                ..MinerParams::default()
            },
        )
        .unwrap();
        miner.run();
        miner
    }

    #[test]
    fn summary_lists_attribute_names() {
        let miner = mined();
        assert_eq!(summary(&miner), "b c\n");
    }

    #[test]
    fn stats_report_one_row_per_iteration() {
        let miner = mined();
        let text = stats(&miner);
        assert!(text.starts_with("transactions: 100\n"));
        let rows: Vec<&str> = text.lines().collect();
        // Header block, column names, one iteration row.
        assert_eq!(rows.len(), 7);
        assert!(rows[6].starts_with("0\t"));
        assert!(rows[6].ends_with(&miner.stats().search_space[0].to_string()));
    }
}
