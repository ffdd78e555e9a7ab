//! Type-erased graph nodes and partition helpers.
//!
//! The runner moves data between nodes as opaque [`Partition`]s. A source node
//! carries its payload together with a [`VecOps`] that knows the concrete
//! `Vec<T>` behind it, so the runner can count, split and clone the source
//! without a generic parameter. Stateless nodes hold [`DynOp`]s that downcast
//! their input, transform it, and box the output again.

use anyhow::Result;
use std::any::{Any, type_name};
use std::marker::PhantomData;
use std::sync::Arc;

/// A partition buffer carried between nodes at runtime. Always a boxed `Vec<T>`.
pub type Partition = Box<dyn Any + Send + Sync>;

/// An element-wise operation over one partition.
pub trait DynOp: Send + Sync {
    /// Transform one partition. Fails when the partition is not the expected `Vec<T>`.
    fn apply(&self, input: Partition) -> Result<Partition>;

    /// Short label used in diagnostics.
    fn name(&self) -> &'static str;
}

/// Type-erased helpers for the `Vec<T>` behind a source payload.
///
/// Every method returns `None` when `data` is not the `Vec<T>` the implementor expects.
pub trait VecOps: Send + Sync {
    fn len(&self, data: &dyn Any) -> Option<usize>;

    /// Split into at most `n` contiguous, order-preserving chunks.
    fn split(&self, data: &dyn Any, n: usize) -> Option<Vec<Partition>>;

    fn clone_any(&self, data: &dyn Any) -> Option<Partition>;

    /// Element type name, for error messages.
    fn elem_name(&self) -> &'static str;
}

struct VecOpsImpl<T>(PhantomData<fn() -> T>);

impl<T: Clone + Send + Sync + 'static> VecOps for VecOpsImpl<T> {
    fn len(&self, data: &dyn Any) -> Option<usize> {
        data.downcast_ref::<Vec<T>>().map(Vec::len)
    }

    fn split(&self, data: &dyn Any, n: usize) -> Option<Vec<Partition>> {
        let v = data.downcast_ref::<Vec<T>>()?;
        if n <= 1 || v.len() <= 1 {
            return Some(vec![Box::new(v.clone()) as Partition]);
        }
        let chunk = v.len().div_ceil(n);
        Some(
            v.chunks(chunk)
                .map(|c| Box::new(c.to_vec()) as Partition)
                .collect(),
        )
    }

    fn clone_any(&self, data: &dyn Any) -> Option<Partition> {
        data.downcast_ref::<Vec<T>>()
            .map(|v| Box::new(v.clone()) as Partition)
    }

    fn elem_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Build the [`VecOps`] for `Vec<T>`.
pub fn vec_ops_for<T: Clone + Send + Sync + 'static>() -> Arc<dyn VecOps> {
    Arc::new(VecOpsImpl::<T>(PhantomData))
}

#[derive(Clone)]
pub enum Node {
    /// In-memory source payload (`Vec<T>`, type-erased).
    Source {
        payload: Arc<dyn Any + Send + Sync>,
        vec_ops: Arc<dyn VecOps>,
    },
    /// A run of element-wise operations, fused by the runner.
    Stateless(Vec<Arc<dyn DynOp>>),
}
