//! Meet operators shared by the set-valued analyses.

use std::collections::BTreeSet;

pub fn set_union<T: Ord + Clone>(values: &[&BTreeSet<T>]) -> BTreeSet<T> {
    values
        .iter()
        .flat_map(|value| value.iter().cloned())
        .collect()
}

/// The intersection of all `values`, or the empty set if there are none.
pub fn set_intersection<T: Ord + Clone>(values: &[&BTreeSet<T>]) -> BTreeSet<T> {
    let Some((first, rest)) = values.split_first() else {
        return BTreeSet::new();
    };
    first
        .iter()
        .filter(|element| rest.iter().all(|value| value.contains(element)))
        .cloned()
        .collect()
}

/// Sorted elements joined by `, `.
pub(super) fn join_sorted<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    let mut values: Vec<String> = values.into_iter().map(|value| value.to_string()).collect();
    values.sort();
    values.join(", ")
}
