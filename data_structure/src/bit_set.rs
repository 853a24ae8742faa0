use std::marker::PhantomData;

use crate::{index::vec::Idx, BitVec};

/// A fixed-capacity set of indices backed by a bit vector.
///
/// Binary operations require both operands to have the same domain size.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DenseBitSet<I: Idx> {
    bits: BitVec<usize>,
    _marker: PhantomData<fn(&I)>,
}

impl<I: Idx> DenseBitSet<I> {
    pub fn new_empty(domain_size: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, domain_size),
            _marker: PhantomData,
        }
    }

    pub fn new_filled(domain_size: usize) -> Self {
        Self {
            bits: BitVec::repeat(true, domain_size),
            _marker: PhantomData,
        }
    }

    pub fn domain_size(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the element was not present.
    pub fn insert(&mut self, elem: I) -> bool {
        let was_set = self.bits[elem.index()];
        self.bits.set(elem.index(), true);
        !was_set
    }

    /// Returns `true` if the element was present.
    pub fn remove(&mut self, elem: I) -> bool {
        let was_set = self.bits[elem.index()];
        self.bits.set(elem.index(), false);
        was_set
    }

    pub fn contains(&self, elem: I) -> bool {
        self.bits.get(elem.index()).is_some_and(|bit| *bit)
    }

    pub fn union(&mut self, other: &Self) {
        assert_eq!(self.domain_size(), other.domain_size());
        for idx in other.bits.iter_ones() {
            self.bits.set(idx, true);
        }
    }

    pub fn intersect(&mut self, other: &Self) {
        assert_eq!(self.domain_size(), other.domain_size());
        for idx in other.bits.iter_zeros() {
            self.bits.set(idx, false);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn iter(&self) -> impl Iterator<Item = I> + '_ {
        self.bits.iter_ones().map(I::new)
    }
}

impl<I: Idx> std::fmt::Debug for DenseBitSet<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_operations() {
        let mut a = DenseBitSet::<usize>::new_empty(8);
        assert!(a.insert(1));
        assert!(!a.insert(1));
        a.insert(3);
        a.insert(5);

        let mut b = DenseBitSet::new_filled(8);
        b.remove(3);

        let mut meet = a.clone();
        meet.intersect(&b);
        assert_eq!(meet.iter().collect::<Vec<_>>(), vec![1, 5]);

        let mut join = DenseBitSet::new_empty(8);
        join.insert(7);
        join.union(&a);
        assert_eq!(join.iter().collect::<Vec<_>>(), vec![1, 3, 5, 7]);
        assert_eq!(join.count(), 4);
        assert!(!join.contains(0));
        assert!(DenseBitSet::<usize>::new_empty(4).is_empty());
    }
}
