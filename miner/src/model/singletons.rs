//! The free-singleton model.
//!
//! Attributes that no summary itemset touches are mutually independent under
//! the maximum-entropy principle, so their submodel has a closed form: each
//! attribute keeps its observed marginal and queries are products. No
//! iterative scaling is needed; refitting after an attribute group is
//! absorbed into a component amounts to dropping its marginals.

use crate::itemset::Itemset;

/// Independent per-attribute marginals for every attribute outside the
/// component graph.
pub struct SingletonModel {
    /// `(attribute, fr(attribute))`, in increasing attribute order.
    margins: Vec<(u32, f64)>,
    attrs: Itemset,
}

impl SingletonModel {
    /// Builds the model from singleton itemsets and their frequencies.
    pub fn new(margins: impl IntoIterator<Item = (Itemset, f64)>) -> SingletonModel {
        let margins: Vec<(u32, f64)> = margins
            .into_iter()
            .map(|(s, f)| {
                debug_assert!(s.is_singleton());
                (s.attrs().next().unwrap(), f)
            })
            .collect();
        let attrs = Itemset::union_of(margins.iter().map(|&(a, _)| Itemset::singleton(a)));
        SingletonModel { margins, attrs }
    }

    /// Attributes currently owned by the model.
    pub fn attrs(&self) -> Itemset {
        self.attrs
    }

    /// Drops the marginals of attributes absorbed into a component.
    pub fn release(&mut self, absorbed: Itemset) {
        self.margins.retain(|&(a, _)| !absorbed.contains(Itemset::singleton(a)));
        self.attrs = self.attrs.minus(absorbed);
    }

    /// Probability that a sample contains every attribute of `x`.
    ///
    /// Attributes unknown to the model (never observed in the data) have
    /// probability zero.
    pub fn query(&self, x: Itemset) -> f64 {
        let mut p = 1.0;
        for a in x.attrs() {
            match self.margins.iter().find(|&&(b, _)| b == a) {
                Some(&(_, f)) => p *= f,
                None => return 0.0,
            }
        }
        p
    }

    /// Probability of the exact world `w` over the owned attributes.
    pub fn world_prob(&self, w: Itemset) -> f64 {
        debug_assert!(self.attrs.contains(w));
        self.margins
            .iter()
            .map(|&(a, f)| if w.contains(Itemset::singleton(a)) { f } else { 1.0 - f })
            .product()
    }

    /// Negative log-likelihood of the transactions projected onto the owned
    /// attributes.
    pub fn neg_log_likelihood(&self, transactions: &[Itemset]) -> f64 {
        -transactions
            .iter()
            .map(|&t| self.world_prob(t & self.attrs).max(f64::MIN_POSITIVE).ln())
            .sum::<f64>()
    }

    /// Probability of the empty world, the normalizing constant of the
    /// product form.
    pub fn u0(&self) -> f64 {
        self.margins.iter().map(|&(_, f)| 1.0 - f).product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(margins: &[(u32, f64)]) -> SingletonModel {
        SingletonModel::new(margins.iter().map(|&(a, f)| (Itemset::singleton(a), f)))
    }

    #[test]
    fn queries_are_products() {
        let m = model(&[(0, 0.5), (1, 0.25), (3, 0.8)]);
        assert_eq!(m.query(Itemset::EMPTY), 1.0);
        assert_eq!(m.query(Itemset::singleton(1)), 0.25);
        assert!((m.query(Itemset::from_bits(0b1011)) - 0.5 * 0.25 * 0.8).abs() < 1e-12);
        // Attribute 2 was never observed.
        assert_eq!(m.query(Itemset::singleton(2)), 0.0);
    }

    #[test]
    fn worlds_sum_to_one() {
        let m = model(&[(0, 0.3), (1, 0.6)]);
        let total: f64 = m.attrs().subsets().map(|w| m.world_prob(w)).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((m.u0() - 0.7 * 0.4).abs() < 1e-12);
    }

    #[test]
    fn release_drops_marginals() {
        let mut m = model(&[(0, 0.5), (1, 0.25), (2, 0.8)]);
        m.release(Itemset::from_bits(0b011));
        assert_eq!(m.attrs(), Itemset::singleton(2));
        assert_eq!(m.query(Itemset::singleton(2)), 0.8);
        assert_eq!(m.query(Itemset::singleton(0)), 0.0);
    }
}
