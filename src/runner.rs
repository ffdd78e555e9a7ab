//! Execution engine.
//!
//! A plan is a single source followed by stateless operations. All stateless
//! operations are fused into one pass; in parallel mode the source is split into
//! contiguous partitions and each partition runs the fused chain on a rayon
//! worker. Per-partition outputs are concatenated in partition order.

use crate::collection::RFBound;
use crate::node::{DynOp, Node, Partition, VecOps};
use crate::pipeline::{NodeId, Pipeline};
use anyhow::{Context, Result, anyhow, bail};
use rayon::prelude::*;
use std::any::Any;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    Sequential,
    Parallel {
        threads: Option<usize>,
        partitions: Option<usize>,
    },
}

#[derive(Clone, Debug)]
pub struct Runner {
    pub mode: ExecMode,
    pub default_partitions: usize,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(ExecMode::Parallel {
            threads: None,
            partitions: None,
        })
    }
}

struct Plan {
    payload: Arc<dyn Any + Send + Sync>,
    vec_ops: Arc<dyn VecOps>,
    ops: Vec<Arc<dyn DynOp>>,
}

impl Runner {
    #[must_use]
    pub fn new(mode: ExecMode) -> Self {
        Self {
            mode,
            default_partitions: 2 * num_cpus::get().max(2),
        }
    }

    /// Execute the chain ending at `terminal` and materialize it as `Vec<T>`.
    pub fn run_collect<T: RFBound>(&self, p: &Pipeline, terminal: NodeId) -> Result<Vec<T>> {
        let plan = plan(p.chain_to(terminal)?)?;
        match self.mode {
            ExecMode::Sequential => exec_seq::<T>(&plan),
            ExecMode::Parallel {
                threads,
                partitions,
            } => {
                let parts = partitions.unwrap_or(self.default_partitions);
                match threads {
                    Some(t) => {
                        let pool = rayon::ThreadPoolBuilder::new()
                            .num_threads(t)
                            .build()
                            .context("build worker pool")?;
                        pool.install(|| exec_par::<T>(&plan, parts))
                    }
                    None => exec_par::<T>(&plan, parts),
                }
            }
        }
    }
}

fn plan(chain: Vec<Node>) -> Result<Plan> {
    let mut nodes = chain.into_iter();
    let Some(Node::Source { payload, vec_ops }) = nodes.next() else {
        bail!("plan must start with a source node");
    };
    let mut ops = Vec::new();
    for node in nodes {
        match node {
            Node::Stateless(more) => ops.extend(more),
            Node::Source { .. } => bail!("unexpected additional source in plan"),
        }
    }
    Ok(Plan {
        payload,
        vec_ops,
        ops,
    })
}

fn fuse(ops: &[Arc<dyn DynOp>], input: Partition) -> Result<Partition> {
    ops.iter().try_fold(input, |acc, op| {
        op.apply(acc).with_context(|| format!("stage `{}`", op.name()))
    })
}

fn into_vec<T: 'static>(part: Partition) -> Result<Vec<T>> {
    part.downcast::<Vec<T>>()
        .map(|v| *v)
        .map_err(|_| anyhow!("terminal type mismatch: expected Vec<{}>", std::any::type_name::<T>()))
}

fn exec_seq<T: RFBound>(plan: &Plan) -> Result<Vec<T>> {
    let input = plan
        .vec_ops
        .clone_any(plan.payload.as_ref())
        .ok_or_else(|| anyhow!("source is not Vec<{}>", plan.vec_ops.elem_name()))?;
    into_vec(fuse(&plan.ops, input)?)
}

fn exec_par<T: RFBound>(plan: &Plan, partitions: usize) -> Result<Vec<T>> {
    let total = plan.vec_ops.len(plan.payload.as_ref()).unwrap_or(0);
    let parts = partitions.max(1).min(total.max(1));
    let chunks = plan
        .vec_ops
        .split(plan.payload.as_ref(), parts)
        .ok_or_else(|| anyhow!("source is not Vec<{}>", plan.vec_ops.elem_name()))?;

    let outputs = chunks
        .into_par_iter()
        .map(|chunk| fuse(&plan.ops, chunk))
        .collect::<Result<Vec<_>>>()?;

    let mut out = Vec::with_capacity(total);
    for part in outputs {
        out.extend(into_vec::<T>(part)?);
    }
    Ok(out)
}
