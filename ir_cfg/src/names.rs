use data_structure::FxHashSet;
use ir::Label;

/// Hands out block labels that do not clash with any label of the function.
#[derive(Debug, Clone, Default)]
pub(crate) struct LabelGenerator {
    taken: FxHashSet<Label>,
}

impl LabelGenerator {
    /// Returns `false` if the label was already taken.
    pub(crate) fn reserve(&mut self, label: &str) -> bool {
        self.taken.insert(label.to_string())
    }

    /// `b{position}`, or `b{position}_{n}` when a source label already uses it.
    pub(crate) fn positional(&mut self, position: usize) -> Label {
        let base = format!("b{position}");
        if self.reserve(&base) {
            return base;
        }
        self.fresh(&format!("{base}_"))
    }

    /// `{base}1`, `{base}2`, ... whichever is free first.
    pub(crate) fn fresh(&mut self, base: &str) -> Label {
        (1..)
            .map(|i| format!("{base}{i}"))
            .find(|label| self.reserve(label))
            .unwrap_or_else(|| unreachable!("label space is unbounded"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_labels_avoid_source_labels() {
        let mut names = LabelGenerator::default();
        assert!(names.reserve("b2"));
        assert!(names.reserve("entry1"));
        assert!(!names.reserve("b2"));
        assert_eq!(names.positional(1), "b1");
        assert_eq!(names.positional(2), "b2_1");
        assert_eq!(names.fresh("entry"), "entry2");
        assert_eq!(names.fresh("entry"), "entry3");
    }
}
