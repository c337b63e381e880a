//! The MTV driver.
//!
//! The outer loop repeatedly searches for the itemset the model is most
//! wrong about, adds it to the summary, refits the affected submodel and
//! stops when the BIC score worsens (or after `k` itemsets when a target
//! count is given).

use std::time::Instant;

use hashbrown::HashMap;
use thiserror::Error;

use crate::dataset::{Dataset, DatasetError, Frequencies};
use crate::itemset::Itemset;
use crate::model::GlobalModel;
use crate::search::{divergence, SearchContext};
use crate::stats::Stats;

#[derive(Error, Debug)]
pub enum ParamError {
    #[error("min support must lie in [0, 1], got {0}")]
    Support(f64),
    #[error("the search must retain at least one candidate")]
    TopZ,
    #[error("the component size cap must be at least 1")]
    MaxComponent,
}

#[derive(Error, Debug)]
#[error("unknown attribute name: {0}")]
pub struct HeaderNotFound(pub String);

/// Construction-time failures of the driver.
#[derive(Error, Debug)]
pub enum MinerError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Param(#[from] ParamError),
}

/// Tuning knobs of the mining loop.
#[derive(Clone, Debug)]
pub struct MinerParams {
    /// Stop after this many itemsets; `None` stops on a worsening BIC score.
    pub k: Option<usize>,
    /// Largest candidate itemset considered; 0 is unbounded.
    pub max_size: usize,
    /// Minimum frequency of a candidate.
    pub min_support: f64,
    /// Number of candidates retained by each search invocation.
    pub top_z: usize,
    /// Once a component holds this many itemsets, its attributes leave the
    /// search space. `None` disables the cap.
    pub max_component: Option<usize>,
    /// Mine negated patterns as well, doubling the attribute universe.
    pub add_negated: bool,
    /// Prune candidates whose divergence does not improve on their parent.
    pub greedy: bool,
}

impl Default for MinerParams {
    fn default() -> MinerParams {
        MinerParams {
            k: None,
            max_size: 0,
            min_support: 0.05,
            top_z: 10,
            max_component: None,
            add_negated: false,
            greedy: false,
        }
    }
}

impl MinerParams {
    fn validate(&self) -> Result<(), ParamError> {
        if !(0.0..=1.0).contains(&self.min_support) {
            return Err(ParamError::Support(self.min_support));
        }
        if self.top_z == 0 {
            return Err(ParamError::TopZ);
        }
        if self.max_component == Some(0) {
            return Err(ParamError::MaxComponent);
        }
        Ok(())
    }
}

/// The mining driver: dataset, caches, model and summary.
pub struct Miner {
    data: Dataset,
    params: MinerParams,
    frequencies: Frequencies,
    model: GlobalModel,
    summary: Vec<Itemset>,
    union_of_summary: Itemset,
    /// Candidate singletons in the fixed order the search enumerates them.
    candidates: Vec<Itemset>,
    /// Attributes of saturated components, excluded from the search space.
    blacklist: Itemset,
    /// `Some(n)` when the universe holds `n` positive attributes mirrored by
    /// `n` negated ones.
    negated_width: Option<u32>,
    bic_scores: Vec<f64>,
    heuristics: Vec<f64>,
    stats: Stats,
}

impl Miner {
    pub fn new(data: Dataset, params: MinerParams) -> Result<Miner, MinerError> {
        params.validate()?;
        let negated_width = params.add_negated.then(|| data.num_attrs());
        let data = if params.add_negated {
            data.with_negations()?
        } else {
            data
        };
        let mut frequencies = Frequencies::new();
        let model = GlobalModel::new(&data, &mut frequencies);
        let initial_score = model.score(&data, 0);
        let candidates: Vec<Itemset> = data.singletons().collect();
        Ok(Miner {
            data,
            params,
            frequencies,
            model,
            summary: Vec::new(),
            union_of_summary: Itemset::EMPTY,
            candidates,
            blacklist: Itemset::EMPTY,
            negated_width,
            bic_scores: Vec::new(),
            heuristics: Vec::new(),
            stats: Stats {
                initial_score,
                ..Stats::default()
            },
        })
    }

    /// Builds a driver with a pre-selected summary. Every seed goes through
    /// the regular insertion path, submodel and free-singleton refits
    /// included; seeds record zero loop time.
    pub fn with_seeds(
        data: Dataset,
        params: MinerParams,
        seeds: Vec<Itemset>,
    ) -> Result<Miner, MinerError> {
        let mut miner = Miner::new(data, params)?;
        for x in seeds {
            miner.add_itemset(x);
            miner.stats.loop_times.push(Default::default());
            miner.stats.search_space.push(0);
        }
        Ok(miner)
    }

    /// Runs the mining loop to convergence and returns the summary.
    pub fn run(&mut self) -> &[Itemset] {
        while !self.finished() {
            let start = Instant::now();
            let x = self.find_best_itemset();
            if !self.validate(x) {
                break;
            }
            self.add_itemset(x);
            self.stats.loop_times.push(start.elapsed());
            tracing::info!(
                itemset = %x,
                bic = *self.bic_scores.last().unwrap(),
                components = self.model.num_components(),
                searched = *self.stats.search_space.last().unwrap(),
                elapsed = ?start.elapsed(),
                "added itemset"
            );
        }
        &self.summary
    }

    /// Searches for the itemset whose frequency diverges the most from the
    /// current model.
    ///
    /// Returns the best non-singleton candidate; when the top-z list holds
    /// none, the best entry is returned verbatim and fails validation, which
    /// terminates the loop.
    pub fn find_best_itemset(&mut self) -> Itemset {
        let candidates: Vec<Itemset> = self
            .candidates
            .iter()
            .copied()
            .filter(|y| !self.blacklist.contains(*y))
            .collect();
        let context = SearchContext::new(
            &self.data,
            &mut self.frequencies,
            &self.model,
            &self.summary,
            self.params.min_support,
            self.params.max_size,
            self.params.greedy,
            self.negated_width,
        );
        let (top, visited) = context.run(&candidates, self.params.top_z);
        self.stats.search_space.push(visited);

        for candidate in top.iter() {
            if !candidate.itemset.is_empty() && !candidate.itemset.is_singleton() {
                return candidate.itemset;
            }
        }
        tracing::debug!("no non-singleton candidate in the top-{} list", self.params.top_z);
        top.best().map_or(Itemset::EMPTY, |c| c.itemset)
    }

    /// Appends `x` to the summary and brings the model up to date.
    ///
    /// All summary growth must go through here, or the model and the
    /// bookkeeping drift apart.
    pub fn add_itemset(&mut self, x: Itemset) {
        debug_assert!(!self.summary.contains(&x));
        let f = self.frequencies.fr(&self.data, x);
        let p = self.model.query(x);
        self.heuristics.push(divergence(f, p));
        self.summary.push(x);
        self.union_of_summary |= x;

        let fit_start = Instant::now();
        let (id, outcome) = self.model.insert(x, &self.data, &mut self.frequencies);
        self.stats.fit_time += fit_start.elapsed();
        if !outcome.converged {
            self.stats.scaling_failures += 1;
            tracing::warn!(
                itemset = %x,
                max_error = outcome.max_error,
                sweeps = outcome.sweeps,
                "iterative scaling did not converge, keeping last weights"
            );
        }

        if let Some(q) = self.params.max_component {
            let component = self.model.component(id);
            if component.num_itemsets() >= q {
                self.blacklist |= component.attrs();
                tracing::debug!(
                    attrs = %component.attrs(),
                    "component reached {q} itemsets, blacklisting its singletons"
                );
            }
        }

        self.bic_scores.push(self.score());
        self.stats.independent_components.push(self.model.num_components());
        self.stats
            .summary_sizes
            .push(self.model.components().map(|c| c.num_itemsets()).collect());
    }

    fn finished(&self) -> bool {
        if let Some(k) = self.params.k {
            return self.summary.len() >= k;
        }
        // Stop when the latest insertion worsened the score.
        let n = self.bic_scores.len();
        n > 1 && self.bic_scores[n - 2] < self.bic_scores[n - 1]
    }

    /// Whether the search result may extend the summary. Singletons and the
    /// empty set mean the search found nothing the model mispredicts.
    fn validate(&self, x: Itemset) -> bool {
        if x.is_empty() {
            tracing::debug!("search exhausted: best candidate is the empty set");
            return false;
        }
        if x.is_singleton() {
            tracing::warn!(itemset = %x, "search returned a singleton, stopping");
            return false;
        }
        true
    }

    /// BIC score of the current model; lower is better.
    pub fn score(&self) -> f64 {
        self.model.score(&self.data, self.summary.len())
    }

    /// Model estimate for an arbitrary itemset.
    pub fn query(&self, y: Itemset) -> f64 {
        self.model.query(y)
    }

    /// Model estimate for an itemset given by attribute names.
    pub fn query_headers(&self, names: &[&str]) -> Result<f64, HeaderNotFound> {
        let mut y = Itemset::EMPTY;
        for name in names {
            match self.data.attr_index(name) {
                Some(a) => y |= Itemset::singleton(a),
                None => return Err(HeaderNotFound(name.to_string())),
            }
        }
        Ok(self.query(y))
    }

    /// Multiplicative weights of every constraint across all submodels.
    pub fn weights(&self) -> HashMap<Itemset, f64> {
        self.model.weights()
    }

    /// Product of the normalizing constants of every submodel.
    pub fn u0(&self) -> f64 {
        self.model.u0()
    }

    pub fn summary(&self) -> &[Itemset] {
        &self.summary
    }

    pub fn union_of_summary(&self) -> Itemset {
        self.union_of_summary
    }

    /// The dataset as mined (negated columns included when the extension is
    /// active).
    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    pub fn model(&self) -> &GlobalModel {
        &self.model
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn initial_score(&self) -> f64 {
        self.stats.initial_score
    }

    /// BIC score after each insertion.
    pub fn bic_scores(&self) -> &[f64] {
        &self.bic_scores
    }

    /// Divergence of each summary itemset at the time it was added.
    pub fn heuristics(&self) -> &[f64] {
        &self.heuristics
    }

    pub fn blacklist(&self) -> Itemset {
        self.blacklist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(bits: u64) -> Itemset {
        Itemset::from_bits(bits)
    }

    fn dataset(rows: &[u64]) -> Dataset {
        Dataset::from_transactions(rows.iter().map(|&b| set(b)).collect()).unwrap()
    }

    #[test]
    fn params_are_validated() {
        let bad_support = MinerParams {
            min_support: 1.5,
            ..MinerParams::default()
        };
        assert!(matches!(
            Miner::new(dataset(&[0b11]), bad_support),
            Err(MinerError::Param(ParamError::Support(_)))
        ));
        let bad_z = MinerParams {
            top_z: 0,
            ..MinerParams::default()
        };
        assert!(matches!(
            Miner::new(dataset(&[0b11]), bad_z),
            Err(MinerError::Param(ParamError::TopZ))
        ));
    }

    #[test]
    fn validation_rejects_degenerate_results() {
        let miner = Miner::new(dataset(&[0b11, 0b01]), MinerParams::default()).unwrap();
        assert!(!miner.validate(Itemset::EMPTY));
        assert!(!miner.validate(set(0b10)));
        assert!(miner.validate(set(0b11)));
    }

    #[test]
    fn header_queries() {
        let data = Dataset::new(
            vec![set(0b01), set(0b10), set(0b11)],
            vec!["a".to_string(), "b".to_string()],
        )
        .unwrap();
        let miner = Miner::new(data, MinerParams::default()).unwrap();
        let p = miner.query_headers(&["a", "b"]).unwrap();
        assert!((p - miner.query(set(0b11))).abs() < 1e-12);
        assert!(miner.query_headers(&["a", "c"]).is_err());
    }

    #[test]
    fn seeds_go_through_the_regular_path() {
        let rows = [0b0011, 0b0011, 0b1100, 0b1111, 0b0101, 0b1010, 0b0110, 0b1001];
        let miner = Miner::with_seeds(
            dataset(&rows),
            MinerParams::default(),
            vec![set(0b0011), set(0b1100)],
        )
        .unwrap();
        assert_eq!(miner.summary(), &[set(0b0011), set(0b1100)]);
        assert_eq!(miner.model().num_components(), 2);
        assert_eq!(miner.bic_scores().len(), 2);
        assert_eq!(miner.stats().loop_times.len(), 2);
        // The seeded attributes left the free-singleton factor.
        assert_eq!(miner.model().free_singletons().attrs(), Itemset::EMPTY);
    }
}
