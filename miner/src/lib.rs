//! Mining informative itemset summaries with maximum-entropy models.
//!
//! Given a binary transaction dataset, the miner iteratively selects the
//! itemset whose observed frequency diverges the most from the prediction of
//! a maximum-entropy model constrained by the itemsets selected so far, and
//! scores each extension of the summary with the Bayesian Information
//! Criterion.
//!
//! The model factorizes into independent submodels, one per connected
//! component of the attribute co-occurrence graph induced by the summary
//! ([`graph`]). Each submodel is fit by iterative scaling ([`model`]) and
//! candidate itemsets are enumerated by a branch-and-bound search over the
//! itemset lattice ([`search`]). The outer loop lives in [`miner`].

pub mod dataset;
pub mod graph;
pub mod itemset;
pub mod miner;
pub mod model;
pub mod search;
pub mod stats;

pub use dataset::{Dataset, DatasetError, Frequencies};
pub use itemset::Itemset;
pub use miner::{HeaderNotFound, Miner, MinerError, MinerParams, ParamError};
pub use stats::Stats;
