use std::io::Write;

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use ir::Function;
use ir_analysis::{
    dataflow::{
        AvailableExpressions, ConstantPropagation, DefinedVariables, InitializedVariables,
        LiveVariables, ReachingDefinitions,
    },
    Analysis, DataFlowAnalysis,
};
use ir_cfg::Cfg;
use ir_passes::{
    DeadCodeElimination, LocalValueNumbering, LvnConfig, NaiveFromSsa, PassManager, ToSsa,
};
use session::Session;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the control-flow graph of every function in dot syntax
    Cfg,
    /// Print the result of a dataflow analysis for every function
    Df {
        #[clap(value_enum)]
        analysis: DataFlowKind,
    },
    /// Print dominance information of every function as JSON
    Dom {
        #[clap(value_enum)]
        analysis: DominanceKind,
    },
    /// Convert the program into or out of SSA form
    Ssa {
        #[clap(value_enum)]
        direction: SsaKind,
    },
    /// Remove instructions whose results are never read
    Dce,
    /// Reuse values already computed in the same block
    Lvn {
        /// Treat the operands of commutative operators as unordered
        #[clap(short, long)]
        canonicalise: bool,
        /// Propagate copies and constants through `id`
        #[clap(short, long)]
        propagate: bool,
        /// Evaluate operations on known values
        #[clap(short, long)]
        fold: bool,
    },
    /// Run the program
    Interp {
        #[clap(allow_hyphen_values = true)]
        /// Arguments of `main`
        arguments: Vec<String>,
    },
    /// Print the program in text form
    Print,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DataFlowKind {
    Defined,
    Live,
    Cprop,
    Initvar,
    Expr,
    Reaching,
    Dom,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DominanceKind {
    Sets,
    Tree,
    Front,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SsaKind {
    To,
    From,
    Roundtrip,
}

pub fn run(session: &Session, command: &Command, output: &mut dyn Write) -> Result<()> {
    let mut program = session
        .program()
        .with_context(|| format!("failed to read a program from {}", session.input))?;
    tracing::debug!(input = %session.input, functions = program.functions.len(), "loaded program");

    match command {
        Command::Cfg => {
            for function in &program.functions {
                write!(output, "{}", Cfg::new(function)?.to_dot())?;
            }
        }
        Command::Df { analysis } => {
            for function in &program.functions {
                write!(output, "{}", data_flow(function, *analysis)?)?;
            }
        }
        Command::Dom { analysis: kind } => {
            for function in &program.functions {
                let analysis = Analysis::new(function.clone());
                let cfg = analysis.cfg()?;
                let json = match kind {
                    DominanceKind::Sets => analysis.dominators()?.to_json(cfg)?,
                    DominanceKind::Tree => analysis.dominance_tree()?.to_json(cfg)?,
                    DominanceKind::Front => analysis.dominance_frontier()?.to_json(cfg)?,
                };
                writeln!(output, "{json}")?;
            }
        }
        Command::Ssa { direction } => {
            let passes = PassManager::new().verify(session.compiler_option.verify);
            let mut passes = match direction {
                SsaKind::To => passes.add_pass(ToSsa),
                SsaKind::From => passes.add_pass(NaiveFromSsa),
                SsaKind::Roundtrip => passes.add_pass(ToSsa).add_pass(NaiveFromSsa),
            };
            passes.run(&mut program)?;
            writeln!(output, "{}", program.to_json()?)?;
        }
        Command::Dce => {
            PassManager::new()
                .verify(session.compiler_option.verify)
                .add_pass(DeadCodeElimination)
                .run(&mut program)?;
            writeln!(output, "{}", program.to_json()?)?;
        }
        Command::Lvn {
            canonicalise,
            propagate,
            fold,
        } => {
            let config = LvnConfig {
                canonicalise: *canonicalise,
                copy_propagation: *propagate,
                constant_propagation: *propagate,
                constant_folding: *fold,
            };
            PassManager::new()
                .verify(session.compiler_option.verify)
                .add_pass(LocalValueNumbering::new(config))
                .run(&mut program)?;
            writeln!(output, "{}", program.to_json()?)?;
        }
        Command::Interp { arguments } => {
            interpreter::run(&program, arguments, output)?;
        }
        Command::Print => write!(output, "{program}")?,
    }
    Ok(())
}

fn data_flow(function: &Function, kind: DataFlowKind) -> Result<String> {
    fn text<A: DataFlowAnalysis>(function: &Function, analysis: &Analysis) -> Result<String> {
        let data = ir_analysis::run::<A>(function, analysis)?;
        Ok(data.text(analysis.cfg()?))
    }

    let analysis = Analysis::new(function.clone());
    match kind {
        DataFlowKind::Defined => text::<DefinedVariables>(function, &analysis),
        DataFlowKind::Live => text::<LiveVariables>(function, &analysis),
        DataFlowKind::Cprop => text::<ConstantPropagation>(function, &analysis),
        DataFlowKind::Initvar => text::<InitializedVariables>(function, &analysis),
        DataFlowKind::Expr => text::<AvailableExpressions>(function, &analysis),
        DataFlowKind::Reaching => text::<ReachingDefinitions>(function, &analysis),
        // Printed as the dictionary of dominator sets, like `dom sets`.
        DataFlowKind::Dom => {
            let json = analysis.dominators()?.to_json(analysis.cfg()?)?;
            Ok(json + "\n")
        }
    }
}
