use data_structure::FxHashSet;
use ir_analysis::{
    dataflow::{ConstantPropagation, LiveVariables, ReachingDefinitions},
    run, Analysis, DataFlowAnalysis,
};
use ir_cfg::{BlockId, Cfg};
use proptest::prelude::*;
use test_utility::arbitrary_function;

/// Blocks reachable from the entry without passing through `removed`.
fn reachable_without(cfg: &Cfg, removed: Option<BlockId>) -> FxHashSet<BlockId> {
    let mut seen = FxHashSet::default();
    if removed == Some(cfg.entry()) {
        return seen;
    }
    let mut stack = vec![cfg.entry()];
    seen.insert(cfg.entry());
    while let Some(block) = stack.pop() {
        for &successor in cfg[block].successors() {
            if Some(successor) != removed && seen.insert(successor) {
                stack.push(successor);
            }
        }
    }
    seen
}

fn same_results<A: DataFlowAnalysis>(function: &ir::Function) -> bool {
    let analysis = Analysis::new(function.clone());
    let cfg = analysis.cfg().unwrap();
    let first = run::<A>(function, &analysis).unwrap();
    let second = run::<A>(function, &analysis).unwrap();
    first.dictionary(cfg) == second.dictionary(cfg) && first.text(cfg) == second.text(cfg)
}

proptest! {
    #[test]
    fn dominators_match_reachability(function in arbitrary_function()) {
        let analysis = Analysis::new(function);
        let cfg = analysis.cfg().unwrap();
        let dominators = analysis.dominators().unwrap();
        let reachable = reachable_without(cfg, None);

        prop_assert_eq!(dominators.blocks().len(), reachable.len());
        for &b in &reachable {
            prop_assert!(dominators.dominates(b, b));
            prop_assert!(dominators.dominates(cfg.entry(), b));
            for &a in &reachable {
                let expected = a == b || !reachable_without(cfg, Some(a)).contains(&b);
                prop_assert_eq!(dominators.dominates(a, b), expected);
            }
        }
    }

    #[test]
    fn dominance_is_transitive(function in arbitrary_function()) {
        let analysis = Analysis::new(function);
        let dominators = analysis.dominators().unwrap();
        let blocks = dominators.blocks();
        for &a in blocks {
            for &b in blocks {
                for &c in blocks {
                    if dominators.dominates(a, b) && dominators.dominates(b, c) {
                        prop_assert!(dominators.dominates(a, c));
                    }
                }
            }
        }
    }

    #[test]
    fn tree_parents_are_immediate_dominators(function in arbitrary_function()) {
        let analysis = Analysis::new(function);
        let cfg = analysis.cfg().unwrap();
        let dominators = analysis.dominators().unwrap();
        let tree = analysis.dominance_tree().unwrap();
        prop_assert_eq!(tree.root(), cfg.entry());
        prop_assert_eq!(tree.preorder().len(), dominators.blocks().len());
        for &block in dominators.blocks() {
            let Some(idom) = tree.immediate_dominator(block) else {
                prop_assert_eq!(block, cfg.entry());
                continue;
            };
            prop_assert!(dominators.strictly_dominates(idom, block));
            // Every other strict dominator also dominates the parent.
            for &other in dominators.blocks() {
                if dominators.strictly_dominates(other, block) {
                    prop_assert!(dominators.dominates(other, idom));
                }
            }
        }
    }

    #[test]
    fn frontier_matches_definition(function in arbitrary_function()) {
        let analysis = Analysis::new(function);
        let cfg = analysis.cfg().unwrap();
        let dominators = analysis.dominators().unwrap();
        let frontier = analysis.dominance_frontier().unwrap();
        for &a in dominators.blocks() {
            let mut expected: Vec<BlockId> = dominators
                .blocks()
                .iter()
                .copied()
                .filter(|&b| {
                    cfg[b].predecessors().iter().any(|&p| dominators.dominates(a, p))
                        && !dominators.strictly_dominates(a, b)
                })
                .collect();
            expected.sort_by(|x, y| cfg.label(*x).cmp(cfg.label(*y)));
            prop_assert_eq!(frontier.frontier(a), expected.as_slice());
        }
    }

    #[test]
    fn analyses_are_idempotent(function in arbitrary_function()) {
        prop_assert!(same_results::<LiveVariables>(&function));
        prop_assert!(same_results::<ReachingDefinitions>(&function));
        prop_assert!(same_results::<ConstantPropagation>(&function));
    }
}
