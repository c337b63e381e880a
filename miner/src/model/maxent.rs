//! Maximum-entropy submodels fit by iterative scaling.
//!
//! A submodel covers one group of attributes and is constrained by the
//! frequencies of the summary itemsets falling inside the group, plus one
//! marginal constraint per attribute. The distribution has the product form
//! `p(w) = u0 · ∏ U_Y^{1[Y ⊆ w]}` over the worlds `w` of the group's
//! subspace; iterative scaling adjusts one multiplicative weight `U_Y` at a
//! time until every constrained marginal matches its target.

use env_param::EnvParam;

use crate::itemset::Itemset;

/// Convergence tolerance on `|p(Y) - fr(Y)|`.
static SCALING_EPSILON: EnvParam<f64> = EnvParam::new("MTV_SCALING_EPSILON", "1e-3");
/// Upper bound on full sweeps over the constraint set.
static SCALING_MAX_SWEEPS: EnvParam<u32> = EnvParam::new("MTV_SCALING_MAX_SWEEPS", "1000");
/// Group width beyond which world enumeration gets expensive enough to warn about.
static ENUM_WARN_ATTRS: EnvParam<u32> = EnvParam::new("MTV_ENUM_WARN_ATTRS", "20");

/// Weight clamps for constraints with degenerate targets or estimates.
const WEIGHT_FLOOR: f64 = 1e-12;
const WEIGHT_CEIL: f64 = 1e12;

/// One frequency constraint: the model must predict `target` for `set`.
#[derive(Clone, Copy, Debug)]
pub struct Constraint {
    pub set: Itemset,
    pub target: f64,
    weight: f64,
}

impl Constraint {
    fn new(set: Itemset, target: f64) -> Constraint {
        Constraint {
            set,
            target,
            weight: 1.0,
        }
    }

    /// Multiplicative MaxEnt weight after fitting.
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Outcome of an iterative-scaling fit.
///
/// A fit that did not converge is not fatal: the model keeps its last
/// weights and the caller decides how loudly to complain.
#[derive(Clone, Copy, Debug)]
pub struct ScalingOutcome {
    pub converged: bool,
    pub sweeps: u32,
    pub max_error: f64,
}

/// Maximum-entropy distribution over one attribute group.
pub struct MaxEntModel {
    attrs: Itemset,
    /// Summary-itemset constraints first, then one constraint per singleton.
    constraints: Vec<Constraint>,
    num_itemsets: usize,
    /// Probability of the empty world in the group's subspace.
    u0: f64,
}

impl MaxEntModel {
    /// Builds an unfit model from itemset constraints and per-singleton
    /// marginals. The initial distribution is uniform over the subspace.
    pub fn new(itemsets: Vec<(Itemset, f64)>, singletons: Vec<(Itemset, f64)>) -> MaxEntModel {
        let num_itemsets = itemsets.len();
        let constraints: Vec<Constraint> = itemsets
            .into_iter()
            .chain(singletons)
            .map(|(set, target)| Constraint::new(set, target))
            .collect();
        let attrs = Itemset::union_of(constraints.iter().map(|c| c.set));
        let u0 = 0.5f64.powi(attrs.len() as i32);
        MaxEntModel {
            attrs,
            constraints,
            num_itemsets,
            u0,
        }
    }

    /// The attribute group covered by this model.
    pub fn attrs(&self) -> Itemset {
        self.attrs
    }

    /// The summary itemsets constraining this model, in insertion order.
    pub fn itemset_constraints(&self) -> &[Constraint] {
        &self.constraints[..self.num_itemsets]
    }

    pub fn singleton_constraints(&self) -> &[Constraint] {
        &self.constraints[self.num_itemsets..]
    }

    pub fn num_itemsets(&self) -> usize {
        self.num_itemsets
    }

    pub fn u0(&self) -> f64 {
        self.u0
    }

    /// Runs iterative scaling until every constrained marginal is within
    /// epsilon of its target, or the sweep cap is reached.
    pub fn fit(&mut self) -> ScalingOutcome {
        let epsilon = SCALING_EPSILON.get();
        let max_sweeps = SCALING_MAX_SWEEPS.get();
        if self.attrs.len() > ENUM_WARN_ATTRS.get() {
            tracing::warn!(
                attrs = self.attrs.len(),
                "large attribute group, world enumeration will be slow"
            );
        }
        let mut max_error = f64::INFINITY;
        for sweep in 1..=max_sweeps {
            max_error = 0.0;
            for i in 0..self.constraints.len() {
                let Constraint { set, target, weight } = self.constraints[i];
                let p = self.marginal(set);
                max_error = max_error.max((p - target).abs());
                let factor = scaling_factor(target, p);
                self.constraints[i].weight = (weight * factor).clamp(WEIGHT_FLOOR, WEIGHT_CEIL);
                self.renormalize();
            }
            if max_error <= epsilon {
                return ScalingOutcome {
                    converged: true,
                    sweeps: sweep,
                    max_error,
                };
            }
        }
        ScalingOutcome {
            converged: false,
            sweeps: max_sweeps,
            max_error,
        }
    }

    /// Probability that a sample from the subspace contains `x`.
    ///
    /// `x` must lie within the model's attribute group.
    pub fn marginal(&self, x: Itemset) -> f64 {
        debug_assert!(self.attrs.contains(x));
        self.attrs
            .subsets()
            .filter(|w| w.contains(x))
            .map(|w| self.world_prob(w))
            .sum()
    }

    /// Probability of the exact world `w` within the subspace.
    pub fn world_prob(&self, w: Itemset) -> f64 {
        debug_assert!(self.attrs.contains(w));
        let mut mass = self.u0;
        for c in &self.constraints {
            if w.contains(c.set) {
                mass *= c.weight;
            }
        }
        mass
    }

    /// Negative log-likelihood of the transactions projected onto the group.
    pub fn neg_log_likelihood(&self, transactions: &[Itemset]) -> f64 {
        -transactions
            .iter()
            .map(|&t| self.world_prob(t & self.attrs).max(f64::MIN_POSITIVE).ln())
            .sum::<f64>()
    }

    fn renormalize(&mut self) {
        let total: f64 = self.attrs.subsets().map(|w| self.world_prob(w)).sum();
        debug_assert!(total > 0.0);
        self.u0 /= total;
    }
}

/// Update factor `θ(1-p) / (p(1-θ))`, clamped when either side is degenerate.
fn scaling_factor(target: f64, p: f64) -> f64 {
    if p <= 0.0 {
        return if target > 0.0 { WEIGHT_CEIL } else { 1.0 };
    }
    if p >= 1.0 {
        return if target < 1.0 { WEIGHT_FLOOR } else { 1.0 };
    }
    if target <= 0.0 {
        return WEIGHT_FLOOR;
    }
    if target >= 1.0 {
        return WEIGHT_CEIL;
    }
    (target * (1.0 - p)) / (p * (1.0 - target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(bits: u64) -> Itemset {
        Itemset::from_bits(bits)
    }

    fn fit(itemsets: Vec<(Itemset, f64)>, singletons: Vec<(Itemset, f64)>) -> MaxEntModel {
        let mut m = MaxEntModel::new(itemsets, singletons);
        let outcome = m.fit();
        assert!(outcome.converged, "fit did not converge: {outcome:?}");
        m
    }

    #[test]
    fn independent_singletons() {
        let m = fit(vec![], vec![(set(0b01), 0.5), (set(0b10), 0.6)]);
        assert!((m.marginal(set(0b01)) - 0.5).abs() < 1e-3);
        assert!((m.marginal(set(0b10)) - 0.6).abs() < 1e-3);
        // With no joint constraint the attributes stay independent.
        assert!((m.marginal(set(0b11)) - 0.3).abs() < 1e-3);
        assert!((m.marginal(Itemset::EMPTY) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn joint_constraint_is_honored() {
        let m = fit(
            vec![(set(0b11), 0.4)],
            vec![(set(0b01), 0.5), (set(0b10), 0.6)],
        );
        assert!((m.marginal(set(0b11)) - 0.4).abs() < 1e-3);
        assert!((m.marginal(set(0b01)) - 0.5).abs() < 1e-3);
        assert!((m.marginal(set(0b10)) - 0.6).abs() < 1e-3);
    }

    #[test]
    fn distribution_is_normalized() {
        let m = fit(
            vec![(set(0b011), 0.3), (set(0b110), 0.25)],
            vec![(set(0b001), 0.5), (set(0b010), 0.4), (set(0b100), 0.45)],
        );
        let total: f64 = m.attrs().subsets().map(|w| m.world_prob(w)).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn marginals_are_monotone() {
        let m = fit(
            vec![(set(0b11), 0.4)],
            vec![(set(0b01), 0.5), (set(0b10), 0.6)],
        );
        assert!(m.marginal(set(0b01)) >= m.marginal(set(0b11)));
        assert!(m.marginal(Itemset::EMPTY) >= m.marginal(set(0b01)));
    }

    #[test]
    fn degenerate_targets_do_not_blow_up() {
        let mut m = MaxEntModel::new(
            vec![(set(0b11), 0.0)],
            vec![(set(0b01), 0.5), (set(0b10), 0.5)],
        );
        m.fit();
        let p = m.marginal(set(0b11));
        assert!(p.is_finite());
        assert!(p < 1e-3);
        let total: f64 = m.attrs().subsets().map(|w| m.world_prob(w)).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn likelihood_prefers_the_fitting_model() {
        // Raw worlds, the empty world included: likelihood is over exact
        // projections, not containment.
        let data: Vec<Itemset> = [0b11, 0b11, 0b00, 0b00]
            .into_iter()
            .map(set)
            .collect();
        let constrained = fit(
            vec![(set(0b11), 0.5)],
            vec![(set(0b01), 0.5), (set(0b10), 0.5)],
        );
        let independent = fit(vec![], vec![(set(0b01), 0.5), (set(0b10), 0.5)]);
        assert!(constrained.neg_log_likelihood(&data) < independent.neg_log_likelihood(&data));
    }
}
