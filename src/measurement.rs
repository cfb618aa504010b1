//! A measurement round: probe every site at once and record each outcome.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    AppState,
    error::ApiError,
    probe::{Prober, Status},
    sites::Site,
    store::{NewPingRecord, Store},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResult {
    pub id: String,
    pub name: String,
    pub url: String,
    pub status: Status,
    pub response_time: i32,
    pub last_checked: DateTime<Utc>,
}

/// Per-site result of a round. A site whose task did not finish is handed
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SiteOutcome {
    Measured(SiteResult),
    Unmeasured(Site),
}

pub async fn run_measurement_round(state: &AppState) -> Result<Vec<SiteOutcome>, ApiError> {
    state
        .store
        .ensure_history_store()
        .await
        .map_err(ApiError::Bootstrap)?;

    let tasks = state.sites.iter().cloned().map(|site| {
        let store = state.store.clone();
        let prober = state.prober.clone();
        tokio::spawn(async move { measure_site(&store, &prober, site).await })
    });
    let joined = join_all(tasks).await;

    let outcomes: Vec<SiteOutcome> = joined
        .into_iter()
        .zip(state.sites.iter())
        .map(|(joined, site)| match joined {
            Ok(result) => SiteOutcome::Measured(result),
            Err(e) => {
                error!(site_id = %site.id, error = %e, "measurement task did not complete");
                SiteOutcome::Unmeasured(site.clone())
            }
        })
        .collect();

    info!(sites = outcomes.len(), "measurement round finished");
    Ok(outcomes)
}

async fn measure_site(store: &Store, prober: &Prober, site: Site) -> SiteResult {
    let outcome = prober.probe(&site.url).await;
    let last_checked = Utc::now();

    let record = NewPingRecord {
        site_id: site.id.clone(),
        site_name: site.name.clone(),
        site_url: site.url.clone(),
        response_time: Some(outcome.response_time_ms),
        status: outcome.status,
    };
    if let Err(e) = store.insert_record(&record).await {
        // the caller still sees the probe result, only the history row is lost
        warn!(site_id = %site.id, error = %e, "failed to record ping");
    }

    info!(
        site_id = %site.id,
        status = outcome.status.as_str(),
        response_time_ms = outcome.response_time_ms,
        "site probed"
    );

    SiteResult {
        id: site.id,
        name: site.name,
        url: site.url,
        status: outcome.status,
        response_time: outcome.response_time_ms,
        last_checked,
    }
}
