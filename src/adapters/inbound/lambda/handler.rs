use serde_json::Value;
use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    adapters::inbound::lambda::dto::InvocationPayloadDto,
    domain::{errors::AggregateError, models::AggregateRequest},
    ports::services::AggregationService,
};

/// Default time reserved before the invocation deadline
pub const DEFAULT_DEADLINE_MARGIN: Duration = Duration::from_millis(500);

/// Turns one invocation event into one aggregation run
#[derive(Clone)]
pub struct InvocationHandler {
    service: Arc<dyn AggregationService>,
    deadline_margin: Duration,
}

impl InvocationHandler {
    pub fn new(service: Arc<dyn AggregationService>) -> Self {
        Self {
            service,
            deadline_margin: DEFAULT_DEADLINE_MARGIN,
        }
    }

    pub fn with_deadline_margin(mut self, margin: Duration) -> Self {
        self.deadline_margin = margin;
        self
    }

    /// Handle a raw event. The run is cancelled `deadline_margin` before
    /// `deadline` so the failure is reported instead of the platform killing
    /// the invocation.
    pub async fn handle(
        &self,
        event: Value,
        deadline: Option<SystemTime>,
    ) -> Result<String, AggregateError> {
        let request = AggregateRequest::try_from(InvocationPayloadDto::from_event(event)?)?;

        let cancel = CancellationToken::new();
        let _timer = deadline.map(|deadline| {
            DeadlineTimer::start(deadline, self.deadline_margin, cancel.clone())
        });

        match self.service.aggregate(request, &cancel).await {
            Ok(output) => {
                if !output.is_complete() {
                    warn!(
                        truncated = output.copy_failures.len(),
                        "Aggregation finished with partially read objects"
                    );
                }
                Ok(output.content)
            }
            Err(err) => {
                error!(error = %err, "Aggregation failed");
                Err(err)
            }
        }
    }
}

/// Cancels a token at `deadline - margin`; stops when dropped
struct DeadlineTimer(Option<JoinHandle<()>>);

impl DeadlineTimer {
    fn start(deadline: SystemTime, margin: Duration, cancel: CancellationToken) -> Self {
        let remaining = deadline
            .checked_sub(margin)
            .and_then(|at| at.duration_since(SystemTime::now()).ok())
            .unwrap_or(Duration::ZERO);

        if remaining.is_zero() {
            debug!("Invocation deadline already passed");
            cancel.cancel();
            return Self(None);
        }

        Self(Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            warn!("Invocation deadline reached, cancelling aggregation");
            cancel.cancel();
        })))
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}
