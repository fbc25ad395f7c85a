//! Search pipeline: parameter validation, query translation, containment
//! filtering, and response assembly.
//!
//! Each stage returns its typed output or a typed error; the pipeline
//! short-circuits on the first failure. The engine call is the only await
//! point per request.

mod params;
mod query;
mod results;

pub use params::SearchParams;
pub use query::EngineQuery;
pub use results::{ApiResponse, Meta, PageMeta, ResultSet};

use std::collections::HashMap;

use tracing::debug;

use crate::config::Config;
use crate::elasticsearch::EsClient;
use crate::error::ApiError;

/// Everything a request handler needs to run the pipeline.
///
/// Constructed once at startup and shared immutably across requests; each
/// request owns its own `SearchParams`/`EngineQuery`/`ResultSet`.
pub struct SearchContext {
    pub es: EsClient,
    pub config: Config,
}

/// Run one request through the full pipeline.
pub async fn execute(
    ctx: &SearchContext,
    raw_params: &HashMap<String, String>,
) -> Result<ApiResponse, ApiError> {
    let params = SearchParams::from_raw(raw_params, &ctx.config)?;
    let engine_query = EngineQuery::build(&params)?;
    debug!("engine query: {}", engine_query.body());

    let raw = ctx.es.search(engine_query.into_body()).await?;
    let result_set = ResultSet::parse(raw, &params)?;

    results::assemble(result_set, &params, &ctx.config)
}
