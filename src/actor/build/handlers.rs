use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;

use super::BuildActor;
use crate::actor::messages::{ChangeKind, WsMsg};
use crate::change::{ChangeOutcome, Session};
use crate::logger::{status_error, status_success, status_unchanged};
use crate::pack::PackError;
use crate::reload::{Drift, RedirectEvent};
use crate::utils::plural::plural_count;
use crate::{debug, log};

impl BuildActor {
    pub(super) async fn handle_change(&mut self, path: PathBuf, kind: ChangeKind) {
        log!("watch"; "{} {}", kind, path.display());

        let session = Arc::clone(&self.session);
        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || session.handle_change(&target)).await;

        match result {
            Ok(Ok(outcome)) => {
                if let ChangeOutcome::Dependents { failures, .. } = &outcome
                    && let Some(first) = failures.first()
                {
                    self.report_error(&first.error).await;
                } else {
                    self.clear_error().await;
                }

                let summary = outcome.summary();
                match &outcome {
                    ChangeOutcome::Skipped => debug!("build"; "{}", summary),
                    ChangeOutcome::Repacked(update) if !update.changed() => status_unchanged(&summary),
                    _ => status_success(&summary),
                }
                self.send_reload(outcome.stale_keys()).await;
            }
            Ok(Err(e)) => self.report_error(&e).await,
            Err(e) => log!("error"; "change task for {} failed: {}", path.display(), e),
        }
    }

    pub(super) async fn handle_redirect(&mut self, event: RedirectEvent) {
        let drifts = event.drifts();
        if drifts.is_empty() {
            debug!("build"; "redirect with identical key sets");
            return;
        }
        debug!("build"; "redirect: {}", plural_count(drifts.len(), "changed key"));

        let keys: Vec<String> = drifts.iter().map(|d| d.key.clone()).collect();
        let session = Arc::clone(&self.session);
        let result = tokio::task::spawn_blocking(move || rebuild_keys(&session, &keys)).await;

        let outcomes = match result {
            Ok(outcomes) => outcomes,
            Err(e) => {
                log!("error"; "redirect task failed: {}", e);
                return;
            }
        };

        // Keys the client holds that the server no longer lists are
        // reloaded too, even when nothing was re-packed for them.
        let mut reload: Vec<String> = drifts
            .iter()
            .filter(|d| d.drift == Drift::Stale)
            .map(|d| d.key.clone())
            .collect();

        let mut failed = false;
        for (key, outcome) in outcomes {
            match outcome {
                Ok(outcome) => reload.extend(outcome.stale_keys()),
                Err(e) => {
                    debug!("build"; "rebuild of {} failed", key);
                    self.report_error(&e).await;
                    failed = true;
                }
            }
        }
        if !failed {
            self.clear_error().await;
        }

        reload.sort();
        reload.dedup();
        self.send_reload(reload).await;
    }

    async fn send_reload(&self, keys: Vec<String>) {
        if keys.is_empty() {
            return;
        }
        let _ = self.ws_tx.send(WsMsg::Reload { keys }).await;
    }

    async fn report_error(&mut self, error: &PackError) {
        let report = error.report();
        status_error(&error.to_string(), &report);
        self.has_error = true;
        let _ = self
            .ws_tx
            .send(WsMsg::Error {
                path: error.path().display().to_string(),
                error: report,
            })
            .await;
    }

    async fn clear_error(&mut self) {
        if std::mem::take(&mut self.has_error) {
            let _ = self.ws_tx.send(WsMsg::ClearError).await;
        }
    }
}

/// Re-pack every key concurrently on the packer pool; returns after all
/// have finished.
fn rebuild_keys(
    session: &Session,
    keys: &[String],
) -> Vec<(String, Result<ChangeOutcome, PackError>)> {
    session.packer().install(|| {
        keys.par_iter()
            .map(|key| (key.clone(), session.handle_bundle_key(key)))
            .collect()
    })
}
