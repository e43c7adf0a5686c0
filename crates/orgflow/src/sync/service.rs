//! Sync orchestration: the fixed pipeline every connector run goes through.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::backend::{AnalyticsBackend, InteractionsStream};
use crate::model::Group;
use crate::source::{DataSource, short_error_message};
use crate::sync::context::{PROP_SYNC_CHANNEL_GROUPS, SyncContext};
use crate::sync::filter::create_interactions_filter;
use crate::sync::history::{SyncHistoryEntry, SyncHistoryService};
use crate::sync::status::{TaskStatus, TasksStatusCache};
use crate::sync::stream::FilteredInteractionsStream;
use crate::sync::types::{SyncError, SyncOutcome, SyncResult};

/// Drives one data source through a full sync run against the backend.
///
/// The pipeline is fixed: report start, resolve employees, push groups,
/// open the stream, drive the source, then report success or failure. The
/// stream is closed exactly once on every path; failure reporting is
/// best-effort and never masks the original error.
pub struct SyncService {
    backend: Arc<dyn AnalyticsBackend>,
    history: Arc<SyncHistoryService>,
    status_cache: Arc<TasksStatusCache>,
}

impl SyncService {
    pub fn new(
        backend: Arc<dyn AnalyticsBackend>,
        history: Arc<SyncHistoryService>,
        status_cache: Arc<TasksStatusCache>,
    ) -> Self {
        Self {
            backend,
            history,
            status_cache,
        }
    }

    /// Run a full sync for one connector.
    #[tracing::instrument(
        skip_all,
        fields(connector_id = %ctx.connector_id(), source = source.source_id())
    )]
    pub async fn sync(
        &self,
        source: &dyn DataSource,
        ctx: &SyncContext,
    ) -> Result<SyncOutcome, SyncError> {
        tracing::debug!(period = %ctx.time_range(), "starting sync");

        self.backend
            .report_sync_start(ctx.token(), ctx.time_range())
            .await
            .map_err(SyncError::Start)?;

        match self.run_pipeline(source, ctx).await {
            Ok(outcome) => {
                self.set_status(ctx.connector_id(), "Synchronizing", "Completed", Some(100.0));
                self.log_status(ctx, false, &format!(
                    "Sync completed: {} interactions, {} tasks, {:.1}% success",
                    outcome.result.interactions_count,
                    outcome.result.tasks_count,
                    outcome.result.success_rate(),
                ))
                .await;
                tracing::debug!(
                    interactions = outcome.result.interactions_count,
                    tasks = outcome.result.tasks_count,
                    errors = outcome.result.errors.len(),
                    "sync completed"
                );
                Ok(outcome)
            }
            Err(err) => {
                let reason = short_error_message(&err);
                tracing::warn!(error = %err, "sync failed");
                if let Err(report_err) = self
                    .backend
                    .try_report_sync_failed(ctx.token(), ctx.time_range(), &reason)
                    .await
                {
                    tracing::warn!(error = %report_err, "failed to report sync failure");
                }
                self.set_status(ctx.connector_id(), "Synchronizing", "Failed", None);
                self.log_status(ctx, true, &format!("Sync failed: {reason}")).await;
                Err(err)
            }
        }
    }

    /// Scheduler entry point: one connector's failure is logged and
    /// swallowed so sibling connectors keep running.
    pub async fn sync_and_log(
        &self,
        source: &dyn DataSource,
        ctx: &SyncContext,
    ) -> Option<SyncOutcome> {
        match self.sync(source, ctx).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::error!(
                    connector_id = %ctx.connector_id(),
                    error = %err,
                    "sync failed, continuing with remaining connectors"
                );
                None
            }
        }
    }

    /// Steps between the start report and the success report. Any error
    /// here lands in the failure branch of [`sync`](Self::sync).
    async fn run_pipeline(
        &self,
        source: &dyn DataSource,
        ctx: &SyncContext,
    ) -> Result<SyncOutcome, SyncError> {
        self.set_status(ctx.connector_id(), "Synchronizing", "Resolving employees", None);
        let employees = source
            .get_hashed_employees(ctx)
            .await
            .map_err(SyncError::Employees)?;
        tracing::debug!(employees = employees.len(), "resolved employee directory");

        let groups = self.groups_to_push(ctx, employees.groups());
        self.backend
            .push_groups(ctx.token(), groups)
            .await
            .map_err(SyncError::Groups)?;

        let inner = self
            .backend
            .open_interactions_stream(ctx.token(), source.source_id())
            .await
            .map_err(SyncError::OpenStream)?;
        let stream = Arc::new(FilteredInteractionsStream::new(
            inner,
            create_interactions_filter(*ctx.time_range()),
        ));

        self.set_status(
            ctx.connector_id(),
            "Synchronizing",
            "Fetching interactions",
            Some(0.0),
        );
        let run = source
            .sync_interactions(Arc::clone(&stream) as Arc<dyn InteractionsStream>, ctx)
            .await;

        // The stream must settle on every path; the decorator guarantees
        // the inner close happens at most once.
        if let Err(close_err) = stream.close().await {
            tracing::warn!(error = %close_err, "failed to close interactions stream");
        }

        let result = run.map_err(SyncError::Interactions)?;

        self.backend
            .report_sync_success(ctx.token(), ctx.time_range())
            .await
            .map_err(SyncError::SuccessReport)?;

        self.persist_history(ctx, &result).await;

        Ok(SyncOutcome {
            connector_id: ctx.connector_id(),
            period: *ctx.time_range(),
            result,
        })
    }

    /// Channel groups stay behind unless the connector opts in.
    fn groups_to_push(&self, ctx: &SyncContext, mut groups: Vec<Group>) -> Vec<Group> {
        if !ctx.bool_property(PROP_SYNC_CHANNEL_GROUPS, false) {
            groups.retain(|g| !g.is_channel());
        }
        groups
    }

    /// History persistence is a side output; storage trouble is logged,
    /// never turned into a failed sync.
    async fn persist_history(&self, ctx: &SyncContext, result: &SyncResult) {
        let entry =
            SyncHistoryEntry::new(ctx.connector_id(), Utc::now(), *ctx.time_range(), result);
        if let Err(err) = self.history.save_log(entry).await {
            tracing::warn!(error = %err, "failed to persist sync history entry");
        }
    }

    fn set_status(&self, connector_id: Uuid, caption: &str, description: &str, progress: Option<f64>) {
        let mut status = TaskStatus::new(caption, description);
        if let Some(p) = progress {
            status = status.with_progress(p);
        }
        self.status_cache.set_status(connector_id, status);
    }

    /// Operator-facing status log line, best-effort.
    async fn log_status(&self, ctx: &SyncContext, warning: bool, message: &str) {
        if let Some(logger) = ctx.status_logger() {
            if warning {
                logger.log_warning(message).await;
            } else {
                logger.log_info(message).await;
            }
        }
    }
}
