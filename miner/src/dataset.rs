//! Transaction datasets and the frequency oracle.

use hashbrown::HashMap;
use thiserror::Error;

use crate::itemset::{Itemset, MAX_ATTRS};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("dataset has no non-empty transactions")]
    Empty,
    #[error("dataset uses {0} attributes but at most {1} are supported")]
    TooManyAttributes(usize, u32),
}

/// An immutable multiset of transactions over a binary attribute universe.
///
/// Empty transactions are dropped on construction; the dataset is read-only
/// afterwards.
pub struct Dataset {
    transactions: Vec<Itemset>,
    headers: Vec<String>,
    universe: Itemset,
}

impl Dataset {
    /// Builds a dataset from raw transactions and one name per attribute.
    ///
    /// Headers shorter than the observed attribute range are padded with
    /// numeric names.
    pub fn new(transactions: Vec<Itemset>, headers: Vec<String>) -> Result<Dataset, DatasetError> {
        if headers.len() > MAX_ATTRS as usize {
            return Err(DatasetError::TooManyAttributes(headers.len(), MAX_ATTRS));
        }
        let transactions: Vec<Itemset> = transactions.into_iter().filter(|t| !t.is_empty()).collect();
        if transactions.is_empty() {
            return Err(DatasetError::Empty);
        }
        let universe = Itemset::union_of(transactions.iter().copied());
        let width = universe.attrs().last().map_or(0, |a| a as usize + 1);
        let mut headers = headers;
        for a in headers.len()..width {
            headers.push(a.to_string());
        }
        Ok(Dataset {
            transactions,
            headers,
            universe,
        })
    }

    /// Builds a dataset with numeric attribute names.
    pub fn from_transactions(transactions: Vec<Itemset>) -> Result<Dataset, DatasetError> {
        Dataset::new(transactions, Vec::new())
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> &[Itemset] {
        &self.transactions
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Attributes appearing in at least one transaction.
    pub fn universe(&self) -> Itemset {
        self.universe
    }

    /// Width of the attribute universe (header count).
    pub fn num_attrs(&self) -> u32 {
        self.headers.len() as u32
    }

    /// The singleton itemsets observed in the data, in attribute order.
    pub fn singletons(&self) -> impl Iterator<Item = Itemset> {
        self.universe.singletons()
    }

    pub fn attr_index(&self, name: &str) -> Option<u32> {
        self.headers.iter().position(|h| h == name).map(|i| i as u32)
    }

    /// Doubles the universe with negated columns: attribute `i + n` is set in
    /// a transaction iff attribute `i` is absent from it. Negated columns are
    /// named after their positive counterpart with a `!` prefix.
    pub fn with_negations(self) -> Result<Dataset, DatasetError> {
        let n = self.num_attrs();
        if 2 * n > MAX_ATTRS {
            return Err(DatasetError::TooManyAttributes(2 * n as usize, MAX_ATTRS));
        }
        let positives = (1u64 << n) - 1;
        let transactions: Vec<Itemset> = self
            .transactions
            .iter()
            .map(|t| Itemset::from_bits(t.bits() | ((!t.bits() & positives) << n)))
            .collect();
        let mut headers = self.headers;
        for i in 0..n as usize {
            headers.push(format!("!{}", headers[i]));
        }
        let universe = Itemset::union_of(transactions.iter().copied());
        Ok(Dataset {
            transactions,
            headers,
            universe,
        })
    }
}

/// Memoizing frequency oracle: `fr(X)` is the fraction of transactions
/// containing `X`.
///
/// The first query for an itemset scans the dataset; the result is cached for
/// the lifetime of the oracle.
#[derive(Default)]
pub struct Frequencies {
    cache: HashMap<Itemset, f64>,
}

impl Frequencies {
    pub fn new() -> Frequencies {
        Frequencies::default()
    }

    pub fn fr(&mut self, data: &Dataset, x: Itemset) -> f64 {
        if let Some(&p) = self.cache.get(&x) {
            return p;
        }
        let matching = data.transactions().iter().filter(|t| t.contains(x)).count();
        let p = matching as f64 / data.len() as f64;
        debug_assert!((0.0..=1.0).contains(&p));
        self.cache.insert(x, p);
        p
    }

    /// Number of distinct itemsets queried so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
