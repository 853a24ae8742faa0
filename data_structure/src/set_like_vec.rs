use crate::FxHashSet;

/// A stack that holds each element at most once.
///
/// Pushing an element that is already on the stack is a no-op, which makes it
/// a convenient worklist for fixed-point algorithms.
pub struct SetLikeVec<T: Copy> {
    vec: Vec<T>,
    set: FxHashSet<T>,
}

impl<T> SetLikeVec<T>
where
    T: Copy,
{
    pub fn new() -> Self {
        Self {
            vec: Vec::default(),
            set: FxHashSet::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }
}

impl<T> Default for SetLikeVec<T>
where
    T: Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SetLikeVec<T>
where
    T: Copy + Eq + std::hash::Hash,
{
    /// Returns `true` if the value was not on the stack.
    pub fn push(&mut self, value: T) -> bool {
        let inserted = self.set.insert(value);
        if inserted {
            self.vec.push(value);
        }
        inserted
    }

    pub fn pop(&mut self) -> Option<T> {
        self.vec.pop().inspect(|value| {
            self.set.remove(value);
        })
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: std::borrow::Borrow<Q>,
        Q: ?Sized + std::hash::Hash + Eq,
    {
        self.set.contains(value)
    }
}

impl<T: Copy + Eq + std::hash::Hash> Extend<T> for SetLikeVec<T> {
    fn extend<Iter: IntoIterator<Item = T>>(&mut self, iter: Iter) {
        for value in iter {
            self.push(value);
        }
    }
}
