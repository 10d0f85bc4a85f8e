//! The graph interpreter (§4.6): node tree, evaluator, and graph runner.

mod eval;
mod graph;
mod node;

pub use eval::{evaluate, EvalContext};
pub use graph::{run_graph, Graph};
pub use node::{AttributeRef, Node};
