use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    errors::AggregateError,
    models::{AggregateOutput, AggregateRequest},
};

/// Port for the aggregation use case
#[async_trait]
pub trait AggregationService: Send + Sync + 'static {
    /// Concatenate every object under the request's prefixes, store the
    /// result at the destination key and return it.
    ///
    /// `cancel` aborts the run at the next I/O boundary.
    async fn aggregate(
        &self,
        request: AggregateRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutput, AggregateError>;
}
