use crate::Cfg;

impl Cfg {
    /// Renders the graph in Graphviz dot syntax.
    ///
    /// Nodes appear in layout order and edges grouped by source label, so the
    /// output is stable across runs. Dots in labels become underscores since
    /// they are not valid in bare dot identifiers.
    pub fn to_dot(&self) -> String {
        let mut dot = format!("digraph {} {{\n", self.function_name());
        for (_, block) in self.blocks() {
            dot.push_str(&format!("    {};\n", block.label()));
        }

        let mut sources: Vec<_> = self.blocks().collect();
        sources.sort_by(|(_, a), (_, b)| a.label().cmp(b.label()));
        for (_, block) in sources {
            for &successor in block.successors() {
                dot.push_str(&format!(
                    "    {} -> {}\n",
                    block.label(),
                    self.label(successor)
                ));
            }
        }
        dot.push_str("}\n");
        dot.replace('.', "_")
    }
}

#[cfg(test)]
mod tests {
    use crate::Cfg;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dot_output() {
        let program = test_utility::load_program("cfg-program");
        let cfg = Cfg::new(&program.functions[0]).unwrap();
        assert_eq!(
            cfg.to_dot(),
            "digraph main {\n    b1;\n    b2;\n    somewhere;\n    b1 -> somewhere\n    b2 -> somewhere\n}\n"
        );
    }

    #[test]
    fn test_dots_in_labels_are_escaped() {
        let program = test_utility::load_program("while");
        let cfg = Cfg::new(&program.functions[0]).unwrap();
        let dot = cfg.to_dot();
        assert!(dot.contains("    while_cond -> while_finish\n"), "{dot}");
        assert!(!dot.contains('.'));
    }
}
