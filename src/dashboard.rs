use crate::client::{ApiError, DashboardApi, Endpoint};
use crate::models::{CfrCount, FilterState, Letter, LineageRecord, OfficeCount, TopCfrTrend};
use crate::query::QueryPlan;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The five result slices shown on the page. Each one is replaced wholesale by
/// its own fetch and never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardData {
    pub top_cfr: Vec<CfrCount>,
    pub issuing_offices: Vec<OfficeCount>,
    pub letters: Vec<Letter>,
    pub lineage: Vec<LineageRecord>,
    pub top_cfr_trend: TopCfrTrend,
}

impl DashboardData {
    pub fn set_top_cfr(&mut self, rows: Vec<CfrCount>) {
        self.top_cfr = rows;
    }

    pub fn set_issuing_offices(&mut self, rows: Vec<OfficeCount>) {
        self.issuing_offices = rows;
    }

    pub fn set_letters(&mut self, rows: Vec<Letter>) {
        self.letters = rows;
    }

    pub fn set_lineage(&mut self, rows: Vec<LineageRecord>) {
        self.lineage = rows;
    }

    pub fn set_top_cfr_trend(&mut self, trend: TopCfrTrend) {
        self.top_cfr_trend = trend;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointFailure {
    pub endpoint: Endpoint,
    pub message: String,
}

/// What happened during one load cycle. Failed slices keep their previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    pub failures: Vec<EndpointFailure>,
}

impl LoadOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything the page renders from: the filter, the five slices, and the
/// failures of the most recent load cycle.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub filter: FilterState,
    pub data: DashboardData,
    pub last_outcome: LoadOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub filter: FilterState,
    pub data: DashboardData,
    pub failures: Vec<EndpointFailure>,
}

impl Dashboard {
    pub fn new(filter: FilterState) -> Self {
        Self {
            filter,
            data: DashboardData::default(),
            last_outcome: LoadOutcome::default(),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            filter: self.filter.clone(),
            data: self.data.clone(),
            failures: self.last_outcome.failures.clone(),
        }
    }
}

/// Runs one load cycle for `filter`.
///
/// The five requests are issued together and each completion writes only its
/// own slice, in whatever order the responses arrive. In-flight requests from
/// an earlier cycle are not cancelled and may still overwrite a slice later.
pub async fn load<A: DashboardApi>(
    api: &A,
    dashboard: &Arc<Mutex<Dashboard>>,
    filter: &FilterState,
) -> LoadOutcome {
    let plan = QueryPlan::from_filter(filter);

    let (top_cfr, issuing_offices, letters, lineage, top_cfr_trend) = tokio::join!(
        async {
            let result = api.top_cfr(&plan.top_cfr).await;
            apply(dashboard, Endpoint::TopCfr, result, DashboardData::set_top_cfr).await
        },
        async {
            let result = api.issuing_offices(&plan.issuing_offices).await;
            apply(
                dashboard,
                Endpoint::IssuingOffices,
                result,
                DashboardData::set_issuing_offices,
            )
            .await
        },
        async {
            let result = api.letters(&plan.letters).await;
            apply(dashboard, Endpoint::Letters, result, DashboardData::set_letters).await
        },
        async {
            let result = api.lineage(&plan.lineage).await;
            apply(dashboard, Endpoint::Lineage, result, DashboardData::set_lineage).await
        },
        async {
            let result = api.top_cfr_trend(&plan.top_cfr_trend).await;
            apply(
                dashboard,
                Endpoint::TopCfrTrend,
                result,
                DashboardData::set_top_cfr_trend,
            )
            .await
        },
    );

    let outcome = LoadOutcome {
        failures: [top_cfr, issuing_offices, letters, lineage, top_cfr_trend]
            .into_iter()
            .flatten()
            .collect(),
    };

    let mut state = dashboard.lock().await;
    state.last_outcome = outcome.clone();
    info!(
        start = %filter.start,
        end = %filter.end,
        product_type = filter.product_type().unwrap_or("all"),
        top_cfr = state.data.top_cfr.len(),
        issuing_offices = state.data.issuing_offices.len(),
        letters = state.data.letters.len(),
        lineage = state.data.lineage.len(),
        trend_periods = state.data.top_cfr_trend.series.len(),
        failures = outcome.failures.len(),
        "load cycle finished"
    );

    outcome
}

/// Replaces the current filter and runs a load cycle for it.
pub async fn apply_filter<A: DashboardApi>(
    api: &A,
    dashboard: &Arc<Mutex<Dashboard>>,
    filter: FilterState,
) -> LoadOutcome {
    dashboard.lock().await.filter = filter.clone();
    load(api, dashboard, &filter).await
}

async fn apply<T>(
    dashboard: &Arc<Mutex<Dashboard>>,
    endpoint: Endpoint,
    result: Result<T, ApiError>,
    set: fn(&mut DashboardData, T),
) -> Option<EndpointFailure> {
    match result {
        Ok(value) => {
            let mut state = dashboard.lock().await;
            set(&mut state.data, value);
            None
        }
        Err(err) => {
            warn!(%endpoint, error = %err, "backend request failed; keeping previous data");
            Some(EndpointFailure {
                endpoint,
                message: err.to_string(),
            })
        }
    }
}
