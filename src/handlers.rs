use crate::client::DateRange;
use crate::errors::AppError;
use crate::models::{ClientRow, ClientSummary, ImportJob, NoSummary, Payment, Reservation, ReservationSummary};
use crate::reports::{AnalyticsReport, ReportsDashboard};
use crate::state::AppState;
use crate::view::{FilterKey, FilterState, PageSnapshot, PagedView, ViewConfig};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub instructor: Option<String>,
    pub client: Option<String>,
    pub discipline: Option<String>,
    pub payment: Option<String>,
    pub sort_field: Option<String>,
}

impl TableParams {
    fn filters(self, default: DateRange) -> FilterState {
        let range = DateRange::new(self.from.unwrap_or(default.from), self.to.unwrap_or(default.to));
        FilterState::new(range)
            .with(FilterKey::Instructor, self.instructor)
            .with(FilterKey::Client, self.client)
            .with(FilterKey::Discipline, self.discipline)
            .with(FilterKey::Payment, self.payment)
            .with(FilterKey::SortField, self.sort_field)
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_reports(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let default = DateRange::current_month(today());
    let range = DateRange::new(params.from.unwrap_or(default.from), params.to.unwrap_or(default.to));

    let dashboard = ReportsDashboard::new(state.client.clone());
    dashboard.fetch_reports(range).await?;
    let snapshot = dashboard.state().await;

    Ok(Json(AnalyticsReport::from_state(range, &snapshot)))
}

pub async fn get_reservations(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Result<Json<PageSnapshot<Reservation, ReservationSummary>>, AppError> {
    load_table(&state, ViewConfig::reservations(), params, DateRange::current_month).await
}

pub async fn get_clients(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Result<Json<PageSnapshot<ClientRow, ClientSummary>>, AppError> {
    load_table(&state, ViewConfig::clients(), params, DateRange::current_month).await
}

pub async fn get_client_reservations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<TableParams>,
) -> Result<Json<PageSnapshot<Reservation, NoSummary>>, AppError> {
    load_table(&state, ViewConfig::client_reservations(&id), params, DateRange::current_month).await
}

pub async fn get_client_payments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<TableParams>,
) -> Result<Json<PageSnapshot<Payment, NoSummary>>, AppError> {
    load_table(&state, ViewConfig::client_payments(&id), params, DateRange::current_month).await
}

pub async fn get_payments(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Result<Json<PageSnapshot<Payment, NoSummary>>, AppError> {
    load_table(&state, ViewConfig::payments(), params, DateRange::current_month).await
}

pub async fn get_import_jobs(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Result<Json<PageSnapshot<ImportJob, NoSummary>>, AppError> {
    load_table(&state, ViewConfig::import_jobs(), params, DateRange::last_three_months).await
}

async fn load_table<T, S>(
    state: &AppState,
    config: ViewConfig,
    params: TableParams,
    default_range: fn(NaiveDate) -> DateRange,
) -> Result<Json<PageSnapshot<T, S>>, AppError>
where
    T: DeserializeOwned + Serialize + Clone + Send,
    S: DeserializeOwned + Serialize + Clone + Send,
{
    if !config.enabled {
        return Err(AppError::bad_request("client id must be a number"));
    }
    let page_index = params.page.unwrap_or(0);
    let page_size = params.size.unwrap_or(config.page_size).max(1);
    let filters = params.filters(default_range(today()));

    let view = PagedView::<T, S>::new(state.client.clone(), config);
    view.try_fetch(filters, page_index, page_size).await?;
    Ok(Json(view.snapshot().await))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
