//! Bitmask itemsets.
//!
//! An itemset is a set of attributes encoded as an unsigned integer, bit `i`
//! set iff attribute `i` is present. All lattice operations are O(1) machine
//! integer operations; itemsets are never materialized as index collections
//! on hot paths.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, BitXor};

use itertools::Itertools;

/// Widest representable attribute universe.
pub const MAX_ATTRS: u32 = u64::BITS;

/// A set of attributes, encoded as a bitmask.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Itemset(u64);

impl Itemset {
    pub const EMPTY: Itemset = Itemset(0);

    pub const fn from_bits(bits: u64) -> Itemset {
        Itemset(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// The itemset containing exactly the attribute `attr`.
    pub fn singleton(attr: u32) -> Itemset {
        debug_assert!(attr < MAX_ATTRS);
        Itemset(1 << attr)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of attributes in the set.
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_singleton(self) -> bool {
        self.0.count_ones() == 1
    }

    /// True iff `other` is a subset of `self`.
    pub const fn contains(self, other: Itemset) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Itemset) -> bool {
        self.0 & other.0 != 0
    }

    /// Set difference.
    pub const fn minus(self, other: Itemset) -> Itemset {
        Itemset(self.0 & !other.0)
    }

    /// Bitwise-OR fold of a collection of itemsets.
    pub fn union_of(sets: impl IntoIterator<Item = Itemset>) -> Itemset {
        sets.into_iter().fold(Itemset::EMPTY, |acc, x| acc | x)
    }

    /// Indices of the attributes in the set, in increasing order.
    pub fn attrs(self) -> Attrs {
        Attrs(self.0)
    }

    /// The singleton itemsets contained in the set, in increasing attribute order.
    pub fn singletons(self) -> impl Iterator<Item = Itemset> {
        self.attrs().map(Itemset::singleton)
    }

    /// All subsets of the set, including the empty set and the set itself.
    ///
    /// There are `2^len` of them; callers are expected to keep the set small.
    pub fn subsets(self) -> Subsets {
        Subsets {
            mask: self.0,
            next: Some(self.0),
        }
    }

    /// Renders the set as whitespace-separated attribute names.
    ///
    /// Attributes without a header fall back to their numeric index.
    pub fn format_with(self, headers: &[String]) -> String {
        self.attrs()
            .map(|a| match headers.get(a as usize) {
                Some(name) => name.clone(),
                None => a.to_string(),
            })
            .join(" ")
    }
}

impl BitOr for Itemset {
    type Output = Itemset;
    fn bitor(self, rhs: Itemset) -> Itemset {
        Itemset(self.0 | rhs.0)
    }
}

impl BitOrAssign for Itemset {
    fn bitor_assign(&mut self, rhs: Itemset) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Itemset {
    type Output = Itemset;
    fn bitand(self, rhs: Itemset) -> Itemset {
        Itemset(self.0 & rhs.0)
    }
}

impl BitXor for Itemset {
    type Output = Itemset;
    fn bitxor(self, rhs: Itemset) -> Itemset {
        Itemset(self.0 ^ rhs.0)
    }
}

impl fmt::Debug for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.attrs().join(", "))
    }
}

impl fmt::Display for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Iterator over the attribute indices of an itemset.
#[derive(Clone)]
pub struct Attrs(u64);

impl Iterator for Attrs {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let attr = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(attr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

/// Iterator over all subsets of a bitmask, from the full set down to the
/// empty set.
pub struct Subsets {
    mask: u64,
    next: Option<u64>,
}

impl Iterator for Subsets {
    type Item = Itemset;

    fn next(&mut self) -> Option<Itemset> {
        let current = self.next?;
        self.next = if current == 0 {
            None
        } else {
            Some((current - 1) & self.mask)
        };
        Some(Itemset(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_operations() {
        let a = Itemset::from_bits(0b0110);
        let b = Itemset::from_bits(0b0011);
        assert_eq!(a | b, Itemset::from_bits(0b0111));
        assert_eq!(a & b, Itemset::from_bits(0b0010));
        assert_eq!(a ^ b, Itemset::from_bits(0b0101));
        assert_eq!(a.minus(b), Itemset::from_bits(0b0100));
        assert!(a.contains(Itemset::from_bits(0b0100)));
        assert!(!a.contains(b));
        assert!(a.intersects(b));
        assert!(!a.intersects(Itemset::from_bits(0b1000)));
        assert!(Itemset::from_bits(0b1).contains(Itemset::EMPTY));
    }

    #[test]
    fn cardinality() {
        assert_eq!(Itemset::EMPTY.len(), 0);
        assert!(Itemset::EMPTY.is_empty());
        assert!(Itemset::singleton(5).is_singleton());
        assert!(!Itemset::from_bits(0b11).is_singleton());
        assert_eq!(Itemset::from_bits(0b1011).len(), 3);
    }

    #[test]
    fn attr_iteration() {
        let x = Itemset::from_bits(0b101001);
        assert_eq!(x.attrs().collect::<Vec<_>>(), vec![0, 3, 5]);
        let singles: Vec<_> = x.singletons().collect();
        assert_eq!(
            singles,
            vec![Itemset::singleton(0), Itemset::singleton(3), Itemset::singleton(5)]
        );
    }

    #[test]
    fn union_fold() {
        let sets = [0b001, 0b010, 0b110].map(Itemset::from_bits);
        assert_eq!(Itemset::union_of(sets), Itemset::from_bits(0b111));
        assert_eq!(Itemset::union_of(std::iter::empty::<Itemset>()), Itemset::EMPTY);
    }

    #[test]
    fn subset_enumeration() {
        let x = Itemset::from_bits(0b1010);
        let subsets: Vec<_> = x.subsets().collect();
        assert_eq!(subsets.len(), 4);
        for s in &subsets {
            assert!(x.contains(*s));
        }
        assert!(subsets.contains(&Itemset::EMPTY));
        assert!(subsets.contains(&x));
        assert_eq!(Itemset::EMPTY.subsets().count(), 1);
    }

    #[test]
    fn formatting() {
        let headers = vec!["milk".to_string(), "bread".to_string()];
        let x = Itemset::from_bits(0b101);
        assert_eq!(x.format_with(&headers), "milk 2");
        assert_eq!(format!("{:?}", Itemset::from_bits(0b101)), "{0, 2}");
    }
}
