//! Units of work measured by the sampler
//!
//! A [`Task`] performs one external operation per call. The sampler only
//! cares whether the call returned normally; the outcome detail is carried
//! into debug logs.

pub mod db;
pub mod http;

pub use db::DbLookupTask;
pub use http::HttpGetTask;

use crate::error::Result;
use crate::models::Config;
use crate::types::TargetKind;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// What a successful invocation reports back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Short human-readable description (status line, looked-up value)
    pub detail: Option<String>,
}

impl TaskOutcome {
    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
        }
    }
}

/// One measurable operation, invoked concurrently by many workers
#[async_trait]
pub trait Task: Send + Sync {
    /// Name used in logs, snapshots and the chart title
    fn name(&self) -> &str;

    /// Perform the operation once
    async fn invoke(&self) -> Result<TaskOutcome>;
}

/// Adapter turning an async closure into a [`Task`]
pub struct FnTask<F> {
    name: String,
    f: F,
}

impl<F> FnTask<F> {
    pub fn new<Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<TaskOutcome>> + Send,
    {
        Self { name: name.into(), f }
    }
}

#[async_trait]
impl<F, Fut> Task for FnTask<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<TaskOutcome>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self) -> Result<TaskOutcome> {
        (self.f)().await
    }
}

/// Builds the configured task
pub struct TaskFactory;

impl TaskFactory {
    /// Create the task selected by `config.target`.
    ///
    /// For the DB target this opens the connection pool and, when
    /// `db_init` is set, creates the default lookup fixture.
    pub async fn create(config: &Config) -> Result<Arc<dyn Task>> {
        match config.target {
            TargetKind::Http => {
                let url = config.url.as_deref().unwrap_or_default();
                let task = HttpGetTask::new(url, config.request_timeout(), config.concurrency as usize)?;
                Ok(Arc::new(task))
            }
            TargetKind::Db => {
                let database_url = config.database_url.as_deref().unwrap_or_default();
                let task = DbLookupTask::connect(
                    database_url,
                    &config.lookup_query,
                    &config.lookup_key,
                    config.effective_pool_size(),
                    config.request_timeout(),
                )
                .await?;

                if config.db_init {
                    task.ensure_fixture().await?;
                }

                Ok(Arc::new(task))
            }
        }
    }
}
