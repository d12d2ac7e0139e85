//! Event handlers wired into the host's file notifications.
//!
//! Two notifications are handled:
//!
//! - **File upserted** (metadata record created or updated, or a re-index):
//!   the file is reconciled and, for originals, every known derivative too.
//! - **Derivative processed** (e.g. a thumbnail was generated): the derivative
//!   is reconciled only if its remote object changed within the freshness
//!   window, since this notification also fires when nothing was rewritten.
//!
//! Handlers never fail. Outcomes are returned as reports and logged.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::reconcile::{ObjectReconciler, ReconcileOptions};
use crate::traits::{FileRegistry, StorageClient, StorageConfigProvider};
use crate::types::{
    FileRef, ReconcileOutcome, ReconcileResult, ReconcileStatistics, SkipReason,
};

/// Outcomes of handling one upsert notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// One entry per reconciled file: the file itself first, then derivatives.
    pub outcomes: Vec<ReconcileOutcome>,
    /// Counts per outcome.
    pub statistics: ReconcileStatistics,
}

impl UpsertReport {
    fn new(outcomes: Vec<ReconcileOutcome>) -> Self {
        let statistics: ReconcileStatistics = ReconcileStatistics::from_outcomes(&outcomes);
        Self {
            outcomes,
            statistics,
        }
    }

    /// Result for a given identifier, if it was reconciled.
    pub fn result_for(&self, identifier: &str) -> Option<&ReconcileResult> {
        self.outcomes
            .iter()
            .find(|o| o.identifier == identifier)
            .map(|o| &o.result)
    }

    /// Whether nothing was attempted.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Handlers for the host's file notifications.
pub struct CacheControlHooks<'a, C, P, R>
where
    C: StorageClient,
    P: StorageConfigProvider,
    R: FileRegistry,
{
    reconciler: ObjectReconciler<'a, C, P>,
    registry: &'a R,
}

impl<'a, C, P, R> CacheControlHooks<'a, C, P, R>
where
    C: StorageClient,
    P: StorageConfigProvider,
    R: FileRegistry,
{
    /// Create handlers.
    ///
    /// # Arguments
    /// * `client` - Storage client for S3 operations
    /// * `configs` - Storage configuration provider
    /// * `registry` - Host file registry
    pub fn new(client: &'a C, configs: &'a P, registry: &'a R) -> Self {
        Self {
            reconciler: ObjectReconciler::new(client, configs),
            registry,
        }
    }

    /// Set reconciliation options.
    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.reconciler = self.reconciler.with_options(options);
        self
    }

    /// Underlying reconciler.
    pub fn reconciler(&self) -> &ObjectReconciler<'a, C, P> {
        &self.reconciler
    }

    /// Handle a metadata record change for a file given by identifier.
    ///
    /// Unresolvable identifiers produce an empty report.
    ///
    /// # Arguments
    /// * `identifier` - File reference as carried by the notification
    pub async fn on_metadata_record_changed(&self, identifier: &str) -> UpsertReport {
        match self.registry.resolve(identifier) {
            Ok(file) => self.on_file_upserted(&file).await,
            Err(err) => {
                log::debug!("No file for metadata record {}: {}", identifier, err);
                UpsertReport::default()
            }
        }
    }

    /// Handle a created or updated file.
    ///
    /// Originals fan out to all their derivatives; each derivative is
    /// reconciled independently of the others' outcomes.
    ///
    /// # Arguments
    /// * `file` - The created or updated file
    pub async fn on_file_upserted(&self, file: &FileRef) -> UpsertReport {
        let primary: ReconcileResult = self.reconciler.reconcile(file).await;
        let unsupported: bool =
            matches!(primary, ReconcileResult::Skipped(SkipReason::UnsupportedDriver));

        let mut outcomes: Vec<ReconcileOutcome> = vec![ReconcileOutcome {
            identifier: file.identifier.clone(),
            result: primary,
        }];

        if !file.is_derived() && !unsupported {
            match self.registry.list_derivatives(file) {
                Ok(derivatives) => {
                    log::debug!(
                        "Reconciling {} derivative(s) of {}",
                        derivatives.len(),
                        file.identifier
                    );
                    outcomes.extend(self.reconciler.reconcile_all(derivatives).await);
                }
                Err(err) => {
                    log::warn!("Cannot list derivatives of {}: {}", file.identifier, err);
                }
            }
        }

        let report: UpsertReport = UpsertReport::new(outcomes);
        if report.statistics.failures() > 0 {
            log::warn!(
                "{} of {} Cache-Control update(s) for {} failed",
                report.statistics.failures(),
                report.statistics.total(),
                file.identifier
            );
        }
        report
    }

    /// Handle a processed derivative, using the system clock.
    ///
    /// # Arguments
    /// * `file` - The processed derivative
    /// * `remote_mtime` - Remote modification time (Unix epoch seconds)
    pub async fn on_derivative_processed(&self, file: &FileRef, remote_mtime: i64) -> ReconcileResult {
        self.on_derivative_processed_at(file, remote_mtime, current_epoch_seconds())
            .await
    }

    /// Handle a processed derivative at an explicit point in time.
    ///
    /// # Arguments
    /// * `file` - The processed derivative
    /// * `remote_mtime` - Remote modification time (Unix epoch seconds)
    /// * `now` - Current time (Unix epoch seconds)
    pub async fn on_derivative_processed_at(
        &self,
        file: &FileRef,
        remote_mtime: i64,
        now: i64,
    ) -> ReconcileResult {
        let window = self.reconciler.options().freshness_window;
        self.reconciler
            .reconcile_if_recently_modified(file, remote_mtime, now, window)
            .await
    }
}

/// Get current time as Unix epoch seconds.
fn current_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lookup() {
        let report = UpsertReport::new(vec![
            ReconcileOutcome {
                identifier: "/a.png".to_string(),
                result: ReconcileResult::Skipped(SkipReason::NotFound),
            },
            ReconcileOutcome {
                identifier: "/b.png".to_string(),
                result: ReconcileResult::Reconciled {
                    previous: None,
                    new: "public".to_string(),
                },
            },
        ]);
        assert!(!report.is_empty());
        assert_eq!(report.statistics.total(), 2);
        assert_eq!(report.statistics.not_found, 1);
        assert!(report.result_for("/b.png").unwrap().is_reconciled());
        assert!(report.result_for("/c.png").is_none());
    }

    #[test]
    fn test_current_epoch_seconds_is_positive() {
        assert!(current_epoch_seconds() > 1_600_000_000);
    }
}
