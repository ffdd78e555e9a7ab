//! Pipeline sources backed by a warehouse query.

use crate::collection::{PCollection, RFBound, from_vec};
use crate::io::cloud::traits::WarehouseIO;
use crate::pipeline::Pipeline;
use crate::record::Record;
use anyhow::{Context, Result};
use tracing::info;

/// Run `query` and expose its rows as a collection of [`Record`]s.
///
/// The query runs eagerly; only the downstream transforms are deferred.
/// Every record shares the result set's schema.
///
/// # Errors
/// Propagates the warehouse error with the query as context.
pub fn read_query<W>(p: &Pipeline, warehouse: &W, query: &str) -> Result<PCollection<Record>>
where
    W: WarehouseIO + ?Sized,
{
    let result = warehouse
        .query(query)
        .with_context(|| format!("run warehouse query `{query}`"))?;
    info!(
        rows = result.row_count(),
        fields = result.schema.len(),
        "warehouse query returned"
    );
    Ok(from_vec(p, result.into_records()))
}

/// [`read_query`] followed by `parse` applied to every record.
///
/// # Errors
/// See [`read_query`].
pub fn read_query_with<W, T, F>(
    p: &Pipeline,
    warehouse: &W,
    query: &str,
    parse: F,
) -> Result<PCollection<T>>
where
    W: WarehouseIO + ?Sized,
    T: RFBound,
    F: 'static + Send + Sync + Fn(&Record) -> T,
{
    Ok(read_query(p, warehouse, query)?.map(parse))
}
