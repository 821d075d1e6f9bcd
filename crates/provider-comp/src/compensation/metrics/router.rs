use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::super::domain::{
    AdjustmentId, AdjustmentSubmission, BenchmarkRow, CompensationChangeSubmission,
    PeriodPayouts, Provider, ProviderId, StatusChange, TierSchedule, TierScheduleId,
};
use super::repository::{BenchmarkCatalog, ProviderLedger, RepositoryError};
use super::service::{CompensationMetricsService, MetricsServiceError};
use super::views::PercentileRequest;

type SharedService<L, B> = Arc<CompensationMetricsService<L, B>>;

/// Router builder exposing provider, benchmark, and metrics endpoints.
pub fn metrics_router<L, B>(service: SharedService<L, B>) -> Router
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    Router::new()
        .route(
            "/api/v1/providers",
            get(list_providers_handler::<L, B>).post(upsert_provider_handler::<L, B>),
        )
        .route(
            "/api/v1/providers/:provider_id",
            get(provider_handler::<L, B>).delete(delete_provider_handler::<L, B>),
        )
        .route(
            "/api/v1/providers/:provider_id/status",
            post(status_handler::<L, B>),
        )
        .route(
            "/api/v1/providers/:provider_id/productivity",
            put(productivity_handler::<L, B>),
        )
        .route(
            "/api/v1/providers/:provider_id/adjustments",
            get(list_adjustments_handler::<L, B>).post(add_adjustment_handler::<L, B>),
        )
        .route(
            "/api/v1/adjustments/:adjustment_id",
            delete(delete_adjustment_handler::<L, B>),
        )
        .route(
            "/api/v1/providers/:provider_id/compensation-changes",
            get(list_changes_handler::<L, B>).post(add_change_handler::<L, B>),
        )
        .route(
            "/api/v1/providers/:provider_id/metrics/:year",
            get(period_metrics_handler::<L, B>),
        )
        .route(
            "/api/v1/providers/:provider_id/metrics/:year/summary",
            get(summary_handler::<L, B>),
        )
        .route(
            "/api/v1/providers/:provider_id/metrics/:year/recompute",
            post(recompute_year_handler::<L, B>),
        )
        .route(
            "/api/v1/providers/:provider_id/metrics/:year/:month/recompute",
            post(recompute_period_handler::<L, B>),
        )
        .route(
            "/api/v1/providers/:provider_id/metrics/:year/:month/payouts",
            put(payouts_handler::<L, B>),
        )
        .route(
            "/api/v1/metrics/:year/recompute",
            post(recompute_all_handler::<L, B>),
        )
        .route(
            "/api/v1/benchmarks",
            get(list_benchmarks_handler::<L, B>).put(upsert_benchmark_handler::<L, B>),
        )
        .route(
            "/api/v1/benchmarks/percentile",
            post(percentile_handler::<L, B>),
        )
        .route(
            "/api/v1/benchmarks/:specialty",
            get(benchmark_handler::<L, B>),
        )
        .route(
            "/api/v1/tier-schedules",
            get(list_tier_schedules_handler::<L, B>).put(upsert_tier_schedule_handler::<L, B>),
        )
        .route(
            "/api/v1/tier-schedules/:schedule_id",
            get(tier_schedule_handler::<L, B>),
        )
        .with_state(service)
}

/// Raw wRVUs for one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductivityEntry {
    pub year: i32,
    pub month: u8,
    pub wrvus: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct YearQuery {
    pub(crate) year: i32,
}

pub(crate) fn error_response(error: MetricsServiceError) -> Response {
    let status = match &error {
        MetricsServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        err if err.is_not_found() => StatusCode::NOT_FOUND,
        MetricsServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        MetricsServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, MetricsServiceError>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_providers_handler<L, B>(
    State(service): State<SharedService<L, B>>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.providers())
}

pub(crate) async fn upsert_provider_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Json(provider): Json<Provider>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.upsert_provider(provider))
}

pub(crate) async fn provider_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(provider_id): Path<String>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.provider(&ProviderId(provider_id)))
}

pub(crate) async fn delete_provider_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(provider_id): Path<String>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    match service.delete_provider(&ProviderId(provider_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(provider_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::OK,
        service.change_status(&ProviderId(provider_id), change),
    )
}

pub(crate) async fn productivity_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(provider_id): Path<String>,
    Json(entry): Json<ProductivityEntry>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::OK,
        service.record_productivity(
            &ProviderId(provider_id),
            entry.year,
            entry.month,
            entry.wrvus,
        ),
    )
}

pub(crate) async fn list_adjustments_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(provider_id): Path<String>,
    Query(query): Query<YearQuery>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::OK,
        service.adjustments(&ProviderId(provider_id), query.year),
    )
}

pub(crate) async fn add_adjustment_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(provider_id): Path<String>,
    Json(submission): Json<AdjustmentSubmission>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::CREATED,
        service.add_adjustment(&ProviderId(provider_id), submission),
    )
}

pub(crate) async fn delete_adjustment_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(adjustment_id): Path<String>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    match service.delete_adjustment(&AdjustmentId(adjustment_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_changes_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(provider_id): Path<String>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::OK,
        service.compensation_changes(&ProviderId(provider_id)),
    )
}

pub(crate) async fn add_change_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(provider_id): Path<String>,
    Json(submission): Json<CompensationChangeSubmission>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::CREATED,
        service.add_compensation_change(&ProviderId(provider_id), submission),
    )
}

pub(crate) async fn period_metrics_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path((provider_id, year)): Path<(String, i32)>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::OK,
        service.period_metrics(&ProviderId(provider_id), year),
    )
}

pub(crate) async fn summary_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path((provider_id, year)): Path<(String, i32)>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.summary(&ProviderId(provider_id), year))
}

pub(crate) async fn recompute_year_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path((provider_id, year)): Path<(String, i32)>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::OK,
        service.recompute_year(&ProviderId(provider_id), year),
    )
}

pub(crate) async fn recompute_period_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path((provider_id, year, month)): Path<(String, i32, u8)>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::OK,
        service.recompute_period(&ProviderId(provider_id), year, month),
    )
}

pub(crate) async fn payouts_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path((provider_id, year, month)): Path<(String, i32, u8)>,
    Json(payouts): Json<PeriodPayouts>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::OK,
        service.record_payouts(&ProviderId(provider_id), year, month, payouts),
    )
}

pub(crate) async fn recompute_all_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(year): Path<i32>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.recompute_all(year))
}

pub(crate) async fn list_benchmarks_handler<L, B>(
    State(service): State<SharedService<L, B>>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.benchmarks())
}

pub(crate) async fn upsert_benchmark_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Json(row): Json<BenchmarkRow>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.upsert_benchmark(row))
}

pub(crate) async fn benchmark_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(specialty): Path<String>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.benchmark(&specialty))
}

pub(crate) async fn percentile_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Json(request): Json<PercentileRequest>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.percentile(request))
}

pub(crate) async fn list_tier_schedules_handler<L, B>(
    State(service): State<SharedService<L, B>>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.tier_schedules())
}

pub(crate) async fn tier_schedule_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Path(schedule_id): Path<String>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(
        StatusCode::OK,
        service.tier_schedule(&TierScheduleId(schedule_id)),
    )
}

pub(crate) async fn upsert_tier_schedule_handler<L, B>(
    State(service): State<SharedService<L, B>>,
    Json(schedule): Json<TierSchedule>,
) -> Response
where
    L: ProviderLedger + 'static,
    B: BenchmarkCatalog + 'static,
{
    respond(StatusCode::OK, service.upsert_tier_schedule(schedule))
}
