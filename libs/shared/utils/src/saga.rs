//! Ordered multi-step writes with reverse-order compensation.
//!
//! The hosted backend offers no transaction spanning the auth service and
//! several tables, so flows like hospital onboarding register an undo action
//! after every step. When a later step fails, every registered compensation
//! runs newest-first before the error is returned.

use std::future::Future;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum SagaError {
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: anyhow::Error,
        compensation_failures: Vec<String>,
    },
}

struct Compensation {
    step: String,
    undo: BoxFuture<'static, anyhow::Result<()>>,
}

pub struct Saga {
    name: String,
    completed: Vec<Compensation>,
}

impl Saga {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            completed: Vec::new(),
        }
    }

    /// Run one step. On success its compensation is registered; on failure all
    /// previously registered compensations are executed in reverse order.
    pub async fn step<T, A, C, CF>(
        &mut self,
        step: &str,
        action: A,
        compensate: C,
    ) -> Result<T, SagaError>
    where
        A: Future<Output = anyhow::Result<T>>,
        C: FnOnce(&T) -> CF,
        CF: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        debug!("Saga {}: running step {}", self.name, step);

        match action.await {
            Ok(value) => {
                let undo = Box::pin(compensate(&value));
                self.completed.push(Compensation {
                    step: step.to_string(),
                    undo,
                });
                Ok(value)
            }
            Err(source) => {
                warn!("Saga {}: step {} failed: {}", self.name, step, source);
                let compensation_failures = self.rollback().await;
                Err(SagaError::StepFailed {
                    step: step.to_string(),
                    source,
                    compensation_failures,
                })
            }
        }
    }

    /// All steps succeeded; registered compensations are dropped unexecuted.
    pub fn commit(self) {
        info!("Saga {} committed after {} steps", self.name, self.completed.len());
    }

    async fn rollback(&mut self) -> Vec<String> {
        let mut failures = Vec::new();

        while let Some(compensation) = self.completed.pop() {
            debug!("Saga {}: compensating {}", self.name, compensation.step);
            if let Err(e) = compensation.undo.await {
                error!(
                    "Saga {}: compensation for {} failed: {}",
                    self.name, compensation.step, e
                );
                failures.push(compensation.step);
            }
        }

        failures
    }
}
