//! A system's graph: a flat list of `Mutate` outputs, plus an advisory list
//! of inputs the interpreter never consults (§4.6).

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, EngineResult};

use super::eval::{evaluate, EvalContext};
use super::node::Node;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Retrieve nodes naming what this graph reads. Tooling-only; `run_graph`
    /// never looks at it.
    pub inputs: Vec<Node>,
    pub outputs: Vec<Node>,
}

impl Graph {
    pub fn new(inputs: Vec<Node>, outputs: Vec<Node>) -> Self {
        Graph { inputs, outputs }
    }
}

/// Execute every output in document order. Each output must be a `Mutate`
/// node; evaluating it both produces and commits its value.
pub fn run_graph(graph: &Graph, ctx: &mut EvalContext) -> EngineResult<()> {
    for (position, output) in graph.outputs.iter().enumerate() {
        if !output.is_mutate() {
            warn!(position, "graph output is not a Mutate node");
            return Err(EngineError::domain(
                "run_graph",
                format!("output at position {position} is not a Mutate node"),
            ));
        }
        evaluate(output, ctx)?;
    }
    Ok(())
}
