//! Branch-and-bound search for the itemset that most improves the model.
//!
//! Candidates are scored by the Bernoulli Kullback-Leibler divergence between
//! their observed frequency and the model's estimate: the search looks for
//! the itemset the model is most wrong about. The recursion enumerates the
//! lattice as prefix + remaining singletons, pruning on support, summary
//! membership, an interval upper bound on the divergence, itemset size, and
//! (optionally) non-improving children.

use hashbrown::HashMap;

use crate::dataset::{Dataset, Frequencies};
use crate::itemset::Itemset;
use crate::model::GlobalModel;

/// Bernoulli KL divergence between an observed frequency `f` and a model
/// estimate `p`.
///
/// Defined by continuity at the boundaries: `0·log(0/x) = 0`, and a positive
/// frequency against a zero estimate is infinite surprise.
pub fn divergence(f: f64, p: f64) -> f64 {
    let f = f.clamp(0.0, 1.0);
    let p = p.clamp(0.0, 1.0);
    fn term(a: f64, b: f64) -> f64 {
        if a == 0.0 {
            0.0
        } else if b == 0.0 {
            f64::INFINITY
        } else {
            a * (a / b).ln()
        }
    }
    term(f, p) + term(1.0 - f, 1.0 - p)
}

/// One scored candidate.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    pub itemset: Itemset,
    pub value: f64,
}

/// The top-z candidates, descending by value, ties broken by insertion order.
pub struct TopCandidates {
    entries: Vec<Candidate>,
    capacity: usize,
}

impl TopCandidates {
    pub fn new(capacity: usize) -> TopCandidates {
        debug_assert!(capacity >= 1);
        TopCandidates {
            entries: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Inserts unless the list is full and every kept candidate is at least
    /// as good.
    pub fn offer(&mut self, itemset: Itemset, value: f64) {
        if self.is_full() && value <= self.floor() {
            return;
        }
        let position = self
            .entries
            .iter()
            .position(|c| c.value < value)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, Candidate { itemset, value });
        self.entries.truncate(self.capacity);
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Value of the worst kept candidate.
    pub fn floor(&self) -> f64 {
        self.entries.last().map_or(f64::NEG_INFINITY, |c| c.value)
    }

    pub fn best(&self) -> Option<Candidate> {
        self.entries.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter()
    }
}

/// One invocation of FindBestItemset over the current model.
///
/// Holds the per-invocation query cache; model parameters must not change
/// while the search runs.
pub(crate) struct SearchContext<'a> {
    data: &'a Dataset,
    fr: &'a mut Frequencies,
    model: &'a GlobalModel,
    summary: &'a [Itemset],
    min_support: f64,
    max_size: usize,
    greedy: bool,
    /// `Some(n)` when the universe holds `n` positive attributes mirrored by
    /// `n` negated ones.
    negated_width: Option<u32>,
    query_cache: HashMap<Itemset, f64>,
    visited: u64,
}

impl<'a> SearchContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        data: &'a Dataset,
        fr: &'a mut Frequencies,
        model: &'a GlobalModel,
        summary: &'a [Itemset],
        min_support: f64,
        max_size: usize,
        greedy: bool,
        negated_width: Option<u32>,
    ) -> SearchContext<'a> {
        SearchContext {
            data,
            fr,
            model,
            summary,
            min_support,
            max_size,
            greedy,
            negated_width,
            query_cache: HashMap::new(),
            visited: 0,
        }
    }

    /// Searches the lattice spanned by `candidates`, returning the top-z
    /// list and the number of nodes visited.
    pub(crate) fn run(mut self, candidates: &[Itemset], z: usize) -> (TopCandidates, u64) {
        let mut top = TopCandidates::new(z);
        self.descend(Itemset::EMPTY, candidates, &mut top, 0.0);
        (top, self.visited)
    }

    fn descend(&mut self, x: Itemset, remaining: &[Itemset], top: &mut TopCandidates, parent_value: f64) {
        let fr_x = self.fr.fr(self.data, x);
        if fr_x < self.min_support || self.summary.contains(&x) {
            return;
        }
        let p_x = self.query(x);
        let value = divergence(fr_x, p_x);
        if self.greedy && value < parent_value {
            return;
        }
        top.offer(x, value);

        // Any extension X' of X within this branch satisfies
        // fr(XY) <= fr(X') <= fr(X) and p(XY) <= p(X') <= p(X); the
        // divergence over those intervals is maximized at the corners.
        let xy = x | Itemset::union_of(remaining.iter().copied());
        let fr_xy = self.fr.fr(self.data, xy);
        let p_xy = self.query(xy);
        let bound = divergence(fr_x, p_xy).max(divergence(fr_xy, p_x));
        if top.is_full() && bound <= top.floor() {
            return;
        }
        if self.max_size != 0 && x.len() as usize >= self.max_size {
            return;
        }
        for (i, &y) in remaining.iter().enumerate() {
            self.visited += 1;
            if self.admits(x, y) {
                self.descend(x | y, &remaining[i + 1..], top, value);
            }
        }
    }

    fn query(&mut self, x: Itemset) -> f64 {
        if let Some(&p) = self.query_cache.get(&x) {
            return p;
        }
        let p = self.model.query(x);
        self.query_cache.insert(x, p);
        p
    }

    /// Whether the singleton `y` may extend the prefix `x`.
    ///
    /// Without the negation extension every extension is valid. With it, an
    /// itemset holds at most one negated attribute and never an attribute
    /// together with its own negation.
    fn admits(&self, x: Itemset, y: Itemset) -> bool {
        let Some(n) = self.negated_width else {
            return true;
        };
        if y.bits() >> n != 0 {
            // y is negated: x must hold no negated attribute and not y's
            // positive counterpart.
            x.bits() >> n == 0 && !x.contains(Itemset::from_bits(y.bits() >> n))
        } else {
            !x.contains(Itemset::from_bits(y.bits() << n))
        }
    }
}
