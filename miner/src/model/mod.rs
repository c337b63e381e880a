//! Probabilistic models over the attribute universe.
//!
//! The global distribution is a product of independent factors: one MaxEnt
//! submodel per component of the independence graph, and one closed-form
//! model for the attributes no summary itemset touches.

pub mod maxent;
pub mod singletons;

pub use maxent::{Constraint, MaxEntModel, ScalingOutcome};
pub use singletons::SingletonModel;

use hashbrown::HashMap;

use crate::dataset::{Dataset, Frequencies};
use crate::graph::{Component, ComponentGraph, ComponentId};
use crate::itemset::Itemset;

/// The composed model: graph components plus the free-singleton factor.
pub struct GlobalModel {
    graph: ComponentGraph,
    free: SingletonModel,
}

impl GlobalModel {
    /// The initial model: every observed attribute free and independent.
    pub fn new(data: &Dataset, fr: &mut Frequencies) -> GlobalModel {
        let margins: Vec<(Itemset, f64)> = data
            .singletons()
            .map(|s| (s, fr.fr(data, s)))
            .collect();
        GlobalModel {
            graph: ComponentGraph::new(),
            free: SingletonModel::new(margins),
        }
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.graph.components()
    }

    pub fn num_components(&self) -> usize {
        self.graph.len()
    }

    pub fn component(&self, id: ComponentId) -> &Component {
        &self.graph[id]
    }

    pub fn free_singletons(&self) -> &SingletonModel {
        &self.free
    }

    /// Adds a summary itemset: merges the components it bridges, refits the
    /// merged submodel and releases its attributes from the free-singleton
    /// factor (whose closed form needs no further fitting).
    pub fn insert(
        &mut self,
        x: Itemset,
        data: &Dataset,
        fr: &mut Frequencies,
    ) -> (ComponentId, ScalingOutcome) {
        let (id, outcome) = self.graph.insert(x, data, fr);
        let absorbed = self.graph[id].attrs();
        self.free.release(absorbed);
        (id, outcome)
    }

    /// Probability that a sample contains `y`, factorized over the
    /// independent submodels intersecting it.
    pub fn query(&self, y: Itemset) -> f64 {
        let mut mask = y;
        let mut p = 1.0;
        for component in self.graph.components() {
            if component.attrs().intersects(mask) {
                let part = mask & component.attrs();
                mask = mask.minus(part);
                p *= component.model().marginal(part);
            }
        }
        p * self.free.query(mask)
    }

    /// Probability of the exact world `w` over the observed universe.
    pub fn world_prob(&self, w: Itemset) -> f64 {
        let mut p = self.free.world_prob(w & self.free.attrs());
        for component in self.graph.components() {
            p *= component.model().world_prob(w & component.attrs());
        }
        p
    }

    /// BIC score of the model on the data: negative log-likelihood plus the
    /// complexity penalty. Lower is better.
    pub fn score(&self, data: &Dataset, summary_len: usize) -> f64 {
        let mut s = self.free.neg_log_likelihood(data.transactions());
        for component in self.graph.components() {
            s += component.model().neg_log_likelihood(data.transactions());
        }
        s + 0.5 * summary_len as f64 * (data.len() as f64).log2()
    }

    /// Multiplicative weights of every constraint across all submodels.
    pub fn weights(&self) -> HashMap<Itemset, f64> {
        let mut u = HashMap::new();
        for component in self.graph.components() {
            let model = component.model();
            for c in model.itemset_constraints().iter().chain(model.singleton_constraints()) {
                u.insert(c.set, c.weight());
            }
        }
        u
    }

    /// Product of the normalizing constants of every factor.
    pub fn u0(&self) -> f64 {
        let mut u0 = self.free.u0();
        for component in self.graph.components() {
            u0 *= component.model().u0();
        }
        u0
    }
}
