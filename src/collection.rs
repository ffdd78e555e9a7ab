//! Deferred, typed collections and their element-wise transforms.

use crate::node::{DynOp, Node, Partition, vec_ops_for};
use crate::pipeline::{NodeId, Pipeline};
use crate::runner::{ExecMode, Runner};
use anyhow::{Result, anyhow};
use std::marker::PhantomData;
use std::sync::Arc;

/// Bound shared by every element type a pipeline can carry.
pub trait RFBound: 'static + Send + Sync + Clone {}
impl<T> RFBound for T where T: 'static + Send + Sync + Clone {}

/// A lazily evaluated collection of `T` attached to a [`Pipeline`].
#[derive(Clone)]
pub struct PCollection<T> {
    pub(crate) pipeline: Pipeline,
    pub(crate) id: NodeId,
    _t: PhantomData<fn() -> T>,
}

/// Create a source collection from an in-memory vector.
pub fn from_vec<T: RFBound>(p: &Pipeline, data: Vec<T>) -> PCollection<T> {
    let id = p.insert_node(Node::Source {
        payload: Arc::new(data),
        vec_ops: vec_ops_for::<T>(),
    });
    PCollection {
        pipeline: p.clone(),
        id,
        _t: PhantomData,
    }
}

fn downcast_input<T: 'static>(input: Partition, op: &'static str) -> Result<Vec<T>> {
    input
        .downcast::<Vec<T>>()
        .map(|v| *v)
        .map_err(|_| anyhow!("{op}: input partition is not Vec<{}>", std::any::type_name::<T>()))
}

struct MapOp<I, O, F>(F, PhantomData<fn(I) -> O>);

impl<I, O, F> DynOp for MapOp<I, O, F>
where
    I: RFBound,
    O: RFBound,
    F: Send + Sync + Fn(&I) -> O + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = downcast_input::<I>(input, self.name())?;
        Ok(Box::new(v.iter().map(&self.0).collect::<Vec<O>>()))
    }

    fn name(&self) -> &'static str {
        "map"
    }
}

struct FilterOp<T, P>(P, PhantomData<fn(T)>);

impl<T, P> DynOp for FilterOp<T, P>
where
    T: RFBound,
    P: Send + Sync + Fn(&T) -> bool + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = downcast_input::<T>(input, self.name())?;
        Ok(Box::new(v.into_iter().filter(|t| self.0(t)).collect::<Vec<T>>()))
    }

    fn name(&self) -> &'static str {
        "filter"
    }
}

struct FlatMapOp<I, O, F>(F, PhantomData<fn(I) -> O>);

impl<I, O, F> DynOp for FlatMapOp<I, O, F>
where
    I: RFBound,
    O: RFBound,
    F: Send + Sync + Fn(&I) -> Vec<O> + 'static,
{
    fn apply(&self, input: Partition) -> Result<Partition> {
        let v = downcast_input::<I>(input, self.name())?;
        Ok(Box::new(v.iter().flat_map(&self.0).collect::<Vec<O>>()))
    }

    fn name(&self) -> &'static str {
        "flat_map"
    }
}

impl<T: RFBound> PCollection<T> {
    fn then<O: RFBound>(self, op: Arc<dyn DynOp>) -> PCollection<O> {
        let id = self.pipeline.insert_node(Node::Stateless(vec![op]));
        self.pipeline.connect(self.id, id);
        PCollection {
            pipeline: self.pipeline,
            id,
            _t: PhantomData,
        }
    }

    /// Transform each element.
    pub fn map<O, F>(self, f: F) -> PCollection<O>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&T) -> O,
    {
        self.then(Arc::new(MapOp::<T, O, F>(f, PhantomData)))
    }

    /// Keep elements matching `pred`.
    pub fn filter<F>(self, pred: F) -> PCollection<T>
    where
        F: 'static + Send + Sync + Fn(&T) -> bool,
    {
        self.then(Arc::new(FilterOp::<T, F>(pred, PhantomData)))
    }

    /// Transform each element into zero or more outputs.
    pub fn flat_map<O, F>(self, f: F) -> PCollection<O>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&T) -> Vec<O>,
    {
        self.then(Arc::new(FlatMapOp::<T, O, F>(f, PhantomData)))
    }

    /// Transform each element with a fallible function, keeping failures as values.
    ///
    /// A failing element never stops the pipeline; split the outcome with
    /// [`collect_split`](PCollection::collect_split).
    pub fn try_map<O, E, F>(self, f: F) -> PCollection<Result<O, E>>
    where
        O: RFBound,
        E: RFBound,
        F: 'static + Send + Sync + Fn(&T) -> Result<O, E>,
    {
        self.map(f)
    }

    /// Execute single-threaded, preserving source order.
    pub fn collect_seq(self) -> Result<Vec<T>> {
        self.collect_with(&Runner::new(ExecMode::Sequential))
    }

    /// Execute across rayon workers. `None` picks the runner defaults.
    pub fn collect_par(self, threads: Option<usize>, partitions: Option<usize>) -> Result<Vec<T>> {
        self.collect_with(&Runner::new(ExecMode::Parallel {
            threads,
            partitions,
        }))
    }

    /// Execute with an explicit runner.
    pub fn collect_with(self, runner: &Runner) -> Result<Vec<T>> {
        runner.run_collect::<T>(&self.pipeline, self.id)
    }
}

impl<T: RFBound, E: RFBound> PCollection<Result<T, E>> {
    /// Execute and separate successes from per-element failures.
    pub fn collect_split(self, runner: &Runner) -> Result<(Vec<T>, Vec<E>)> {
        let mut ok = Vec::new();
        let mut failed = Vec::new();
        for r in self.collect_with(runner)? {
            match r {
                Ok(v) => ok.push(v),
                Err(e) => failed.push(e),
            }
        }
        Ok((ok, failed))
    }
}
