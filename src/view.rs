//! Stateful, paginated views over the reporting API's table endpoints.
//!
//! Every table in the console (reservations, clients, a client's history,
//! payments, import jobs) behaves the same way: fetch a page for a filter set,
//! remember that filter set, then move first/previous/next/last by replaying it
//! with a different page index. [`PagedView`] implements that once;
//! [`ViewConfig`] says which endpoint, sort order and filters a table uses.

use crate::client::{DateRange, ReportingClient};
use crate::errors::ReportError;
use crate::models::{
    ClientRow, ClientSummary, ImportJob, NoSummary, Page, Payment, Reservation, ReservationSummary,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: &'static str,
    pub direction: SortDirection,
}

/// Optional filters a table endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Instructor,
    Client,
    Discipline,
    Payment,
    SortField,
}

impl FilterKey {
    pub fn param(self) -> &'static str {
        match self {
            Self::Instructor => "instructor",
            Self::Client => "client",
            Self::Discipline => "discipline",
            Self::Payment => "payment",
            Self::SortField => "sortField",
        }
    }
}

/// Everything a fetch was issued with, except the page cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub range: DateRange,
    pub instructor: Option<String>,
    pub client: Option<String>,
    pub discipline: Option<String>,
    pub payment: Option<String>,
    pub sort_field: Option<String>,
}

impl FilterState {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            instructor: None,
            client: None,
            discipline: None,
            payment: None,
            sort_field: None,
        }
    }

    /// Sets a filter; blank values clear it.
    pub fn with(mut self, key: FilterKey, value: Option<impl Into<String>>) -> Self {
        let value = value
            .map(Into::into)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        match key {
            FilterKey::Instructor => self.instructor = value,
            FilterKey::Client => self.client = value,
            FilterKey::Discipline => self.discipline = value,
            FilterKey::Payment => self.payment = value,
            FilterKey::SortField => self.sort_field = value,
        }
        self
    }

    pub fn get(&self, key: FilterKey) -> Option<&str> {
        match key {
            FilterKey::Instructor => self.instructor.as_deref(),
            FilterKey::Client => self.client.as_deref(),
            FilterKey::Discipline => self.discipline.as_deref(),
            FilterKey::Payment => self.payment.as_deref(),
            FilterKey::SortField => self.sort_field.as_deref(),
        }
    }
}

/// Which endpoint a view reads and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub path: String,
    pub sort: Option<SortSpec>,
    pub filters: &'static [FilterKey],
    pub page_size: u32,
    /// False for client-scoped views built without a valid client id; fetches are skipped.
    pub enabled: bool,
}

impl ViewConfig {
    pub fn reservations() -> Self {
        Self {
            path: "/reports/reservations/table".to_string(),
            sort: Some(SortSpec {
                field: "RESERVATION_DATE",
                direction: SortDirection::Asc,
            }),
            filters: &[FilterKey::Instructor, FilterKey::Client, FilterKey::Discipline],
            page_size: 10,
            enabled: true,
        }
    }

    pub fn clients() -> Self {
        Self {
            path: "/reports/clients".to_string(),
            sort: None,
            filters: &[FilterKey::Client, FilterKey::SortField],
            page_size: 50,
            enabled: true,
        }
    }

    pub fn client_reservations(client_id: &str) -> Self {
        Self::client_scoped(client_id, "reservations", "RESERVATION_DATE")
    }

    pub fn client_payments(client_id: &str) -> Self {
        Self::client_scoped(client_id, "payments", "ACCREDITATION_DATE")
    }

    /// Client ids are numeric on the wire. Anything else leaves the view
    /// disabled and never reaches the upstream path.
    fn client_scoped(client_id: &str, resource: &str, sort_field: &'static str) -> Self {
        let client_id = client_id.trim().parse::<i64>().ok();
        Self {
            path: match client_id {
                Some(id) => format!("/reports/clients/{id}/{resource}"),
                None => format!("/reports/clients/{resource}"),
            },
            sort: Some(SortSpec {
                field: sort_field,
                direction: SortDirection::Desc,
            }),
            filters: &[],
            page_size: 10,
            enabled: client_id.is_some(),
        }
    }

    pub fn payments() -> Self {
        Self {
            path: "/reports/payments/table".to_string(),
            sort: Some(SortSpec {
                field: "ACCREDITATION_DATE",
                direction: SortDirection::Asc,
            }),
            filters: &[FilterKey::Client, FilterKey::Payment],
            page_size: 10,
            enabled: true,
        }
    }

    pub fn import_jobs() -> Self {
        Self {
            path: "/files/import-jobs".to_string(),
            sort: None,
            filters: &[],
            page_size: 50,
            enabled: true,
        }
    }

    /// Query string for one page. Filters the endpoint does not support are dropped.
    pub fn query(&self, filters: &FilterState, page_index: u32, page_size: u32) -> Vec<(String, String)> {
        let mut query = filters.range.query();
        query.push(("page".to_string(), page_index.to_string()));
        query.push(("size".to_string(), page_size.to_string()));
        if let Some(sort) = self.sort {
            query.push(("sortBy".to_string(), sort.field.to_string()));
            query.push(("sortDir".to_string(), sort.direction.as_str().to_string()));
        }
        for key in self.filters {
            if let Some(value) = filters.get(*key) {
                query.push((key.param().to_string(), value.to_string()));
            }
        }
        query
    }
}

pub type ReservationsView = PagedView<Reservation, ReservationSummary>;
pub type ClientsView = PagedView<ClientRow, ClientSummary>;
pub type ClientReservationsView = PagedView<Reservation>;
pub type ClientPaymentsView = PagedView<Payment>;
pub type PaymentsView = PagedView<Payment>;
pub type ImportJobsView = PagedView<ImportJob>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was applied.
    Loaded,
    /// A newer fetch was issued while this one was in flight; its result was dropped.
    Superseded,
    /// The request failed; the previous page is still shown.
    Failed,
    /// Nothing was requested (navigation out of bounds, no page yet, or no valid client id).
    Skipped,
}

/// What a table renders: the current rows plus "showing X to Y of Z".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot<T, S> {
    pub rows: Vec<T>,
    pub page_index: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub start_index: u64,
    pub end_index: u64,
    pub summary: Option<S>,
}

enum ViewState<T, S> {
    Empty,
    Loaded {
        page: Page<T, S>,
        filters: FilterState,
        page_size: u32,
    },
}

pub struct PagedView<T, S = NoSummary> {
    client: ReportingClient,
    config: ViewConfig,
    generation: AtomicU64,
    state: Mutex<ViewState<T, S>>,
}

impl<T, S> PagedView<T, S>
where
    T: DeserializeOwned + Clone + Send,
    S: DeserializeOwned + Clone + Send,
{
    pub fn new(client: ReportingClient, config: ViewConfig) -> Self {
        Self {
            client,
            config,
            generation: AtomicU64::new(0),
            state: Mutex::new(ViewState::Empty),
        }
    }

    /// Fetches a page and replaces the current one. Errors are logged, never returned.
    pub async fn fetch(&self, filters: FilterState, page_index: u32, page_size: u32) -> FetchOutcome {
        match self.try_fetch(filters, page_index, page_size).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(path = %self.config.path, page_index, error = %err, "table fetch failed, keeping previous page");
                FetchOutcome::Failed
            }
        }
    }

    pub async fn fetch_default(&self, filters: FilterState) -> FetchOutcome {
        self.fetch(filters, 0, self.config.page_size).await
    }

    /// Same transition as [`fetch`](Self::fetch) but hands the error back.
    pub async fn try_fetch(
        &self,
        filters: FilterState,
        page_index: u32,
        page_size: u32,
    ) -> Result<FetchOutcome, ReportError> {
        if !self.config.enabled {
            debug!(path = %self.config.path, "view has no scope, skipping fetch");
            return Ok(FetchOutcome::Skipped);
        }
        filters.range.validate()?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = self.config.query(&filters, page_index, page_size);
        let page: Page<T, S> = self.client.get_json(&self.config.path, &query).await?;

        let mut state = self.state.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(path = %self.config.path, generation, "dropping stale page");
            return Ok(FetchOutcome::Superseded);
        }
        *state = ViewState::Loaded {
            page,
            filters,
            page_size,
        };
        Ok(FetchOutcome::Loaded)
    }

    pub async fn go_first(&self) -> FetchOutcome {
        let Some(cursor) = self.cursor().await else {
            return FetchOutcome::Skipped;
        };
        if cursor.page_index == 0 {
            return FetchOutcome::Skipped;
        }
        self.fetch(cursor.filters, 0, cursor.page_size).await
    }

    pub async fn go_previous(&self) -> FetchOutcome {
        let Some(cursor) = self.cursor().await else {
            return FetchOutcome::Skipped;
        };
        if cursor.page_index == 0 {
            return FetchOutcome::Skipped;
        }
        self.fetch(cursor.filters, cursor.page_index - 1, cursor.page_size).await
    }

    pub async fn go_next(&self) -> FetchOutcome {
        let Some(cursor) = self.cursor().await else {
            return FetchOutcome::Skipped;
        };
        if cursor.page_index + 1 >= cursor.total_pages {
            return FetchOutcome::Skipped;
        }
        self.fetch(cursor.filters, cursor.page_index + 1, cursor.page_size).await
    }

    pub async fn go_last(&self) -> FetchOutcome {
        let Some(cursor) = self.cursor().await else {
            return FetchOutcome::Skipped;
        };
        if cursor.total_elements == 0 || cursor.total_pages == 0 {
            return FetchOutcome::Skipped;
        }
        let last = cursor.total_pages - 1;
        if cursor.page_index == last {
            return FetchOutcome::Skipped;
        }
        self.fetch(cursor.filters, last, cursor.page_size).await
    }

    pub async fn rows(&self) -> Vec<T> {
        match &*self.state.lock().await {
            ViewState::Empty => Vec::new(),
            ViewState::Loaded { page, .. } => page.data.clone(),
        }
    }

    pub async fn start_index(&self) -> u64 {
        self.snapshot().await.start_index
    }

    pub async fn total_count(&self) -> u64 {
        self.snapshot().await.total_elements
    }

    pub async fn current_filters(&self) -> Option<FilterState> {
        match &*self.state.lock().await {
            ViewState::Empty => None,
            ViewState::Loaded { filters, .. } => Some(filters.clone()),
        }
    }

    pub async fn snapshot(&self) -> PageSnapshot<T, S> {
        match &*self.state.lock().await {
            ViewState::Empty => PageSnapshot {
                rows: Vec::new(),
                page_index: 0,
                page_size: self.config.page_size,
                total_elements: 0,
                total_pages: 0,
                start_index: 1,
                end_index: 0,
                summary: None,
            },
            ViewState::Loaded { page, .. } => {
                let start_index = start_index(page.page, page.size);
                PageSnapshot {
                    rows: page.data.clone(),
                    page_index: page.page,
                    page_size: page.size,
                    total_elements: page.total_elements,
                    total_pages: page.total_pages,
                    start_index,
                    end_index: start_index - 1 + page.data.len() as u64,
                    summary: page.summary.clone(),
                }
            }
        }
    }

    async fn cursor(&self) -> Option<Cursor> {
        match &*self.state.lock().await {
            ViewState::Empty => None,
            ViewState::Loaded {
                page,
                filters,
                page_size,
            } => Some(Cursor {
                filters: filters.clone(),
                page_index: page.page,
                page_size: *page_size,
                total_pages: page.total_pages,
                total_elements: page.total_elements,
            }),
        }
    }
}

struct Cursor {
    filters: FilterState,
    page_index: u32,
    page_size: u32,
    total_pages: u32,
    total_elements: u64,
}

/// 1-based position of a page's first row, for 0-based page indices.
pub fn start_index(page_index: u32, page_size: u32) -> u64 {
    u64::from(page_index) * u64::from(page_size) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StaticToken;
    use crate::test_support::{FakeApi, FakeResponse};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn july() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
        )
    }

    fn reservation(id: i64) -> serde_json::Value {
        json!({
            "reservationId": id,
            "classId": 100 + id,
            "reservationDate": "2025-07-02",
            "reservationTime": "07:00",
            "orderCreator": "web",
            "paymentMethod": "cash",
            "status": "ACCEPTED",
            "clientInfo": { "name": "Lu", "email": "lu@example.com", "phone": null },
            "locationInfo": { "studioName": "Norte", "roomName": "A", "country": "PE", "city": "Lima" },
            "disciplineName": "Spinning",
            "instructorName": "Ana"
        })
    }

    /// Serves `total` reservations split into pages of the requested size.
    fn paged_reservations(total: u64) -> impl Fn(&crate::test_support::RecordedRequest) -> FakeResponse {
        move |request: &crate::test_support::RecordedRequest| {
            let page: u64 = request.query.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
            let size: u64 = request.query.get("size").and_then(|s| s.parse().ok()).unwrap_or(10);
            let total_pages = total.div_ceil(size);
            let first = page * size;
            let rows: Vec<_> = (first..total.min(first + size)).map(|id| reservation(id as i64)).collect();
            FakeResponse::ok(json!({
                "data": rows,
                "page": page,
                "size": size,
                "totalElements": total,
                "totalPages": total_pages,
                "last": page + 1 >= total_pages,
                "summary": { "accepted": total, "pending": 0, "cancelled": 0, "totalClasses": total }
            }))
        }
    }

    fn client_for(api: &FakeApi) -> ReportingClient {
        ReportingClient::new(api.base_url.clone(), Arc::new(StaticToken::new("secret")))
    }

    #[tokio::test]
    async fn next_replays_the_last_filters() {
        let api = FakeApi::spawn(paged_reservations(25)).await;
        let view = ReservationsView::new(client_for(&api), ViewConfig::reservations());

        let filters = FilterState::new(july()).with(FilterKey::Instructor, Some("Ana"));
        assert_eq!(view.fetch(filters, 0, 10).await, FetchOutcome::Loaded);
        assert_eq!(view.go_next().await, FetchOutcome::Loaded);

        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        let next = &requests[1];
        assert_eq!(next.path, "/reports/reservations/table");
        assert_eq!(next.query["from"], "2025-07-01");
        assert_eq!(next.query["to"], "2025-07-31");
        assert_eq!(next.query["instructor"], "Ana");
        assert_eq!(next.query["page"], "1");
        assert_eq!(next.query["size"], "10");
        assert_eq!(next.query["sortBy"], "RESERVATION_DATE");
        assert_eq!(next.query["sortDir"], "ASC");
        assert_eq!(next.authorization.as_deref(), Some("Bearer secret"));

        let snapshot = view.snapshot().await;
        assert_eq!(snapshot.page_index, 1);
        assert_eq!(snapshot.start_index, 11);
        assert_eq!(snapshot.end_index, 20);
        assert_eq!(snapshot.total_elements, 25);
        assert_eq!(snapshot.summary.unwrap().total_classes, 25);
    }

    #[tokio::test]
    async fn navigation_respects_bounds() {
        let api = FakeApi::spawn(paged_reservations(25)).await;
        let view = ReservationsView::new(client_for(&api), ViewConfig::reservations());

        assert_eq!(view.go_next().await, FetchOutcome::Skipped);
        assert!(api.requests().is_empty());
        assert_eq!(view.start_index().await, 1);
        assert_eq!(view.total_count().await, 0);

        view.fetch(FilterState::new(july()), 0, 10).await;
        assert_eq!(view.go_previous().await, FetchOutcome::Skipped);
        assert_eq!(view.go_first().await, FetchOutcome::Skipped);

        assert_eq!(view.go_last().await, FetchOutcome::Loaded);
        let snapshot = view.snapshot().await;
        assert_eq!(snapshot.page_index, 2);
        assert_eq!(snapshot.start_index, 21);
        assert_eq!(snapshot.end_index, 25);
        assert_eq!(view.start_index().await, 21);
        assert_eq!(view.total_count().await, 25);

        assert_eq!(view.go_next().await, FetchOutcome::Skipped);
        assert_eq!(view.go_last().await, FetchOutcome::Skipped);
        assert_eq!(view.snapshot().await.page_index, 2);

        assert_eq!(view.go_previous().await, FetchOutcome::Loaded);
        assert_eq!(view.snapshot().await.page_index, 1);
        assert_eq!(view.go_first().await, FetchOutcome::Loaded);
        assert_eq!(view.snapshot().await.page_index, 0);
        assert_eq!(api.requests().len(), 4);
    }

    #[tokio::test]
    async fn empty_result_disables_go_last() {
        let api = FakeApi::spawn(paged_reservations(0)).await;
        let view = ReservationsView::new(client_for(&api), ViewConfig::reservations());
        view.fetch(FilterState::new(july()), 0, 10).await;

        assert_eq!(view.go_last().await, FetchOutcome::Skipped);
        assert_eq!(view.go_next().await, FetchOutcome::Skipped);
        let snapshot = view.snapshot().await;
        assert!(snapshot.rows.is_empty());
        assert_eq!(snapshot.start_index, 1);
        assert_eq!(snapshot.end_index, 0);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_page() {
        let api = FakeApi::spawn(|request: &crate::test_support::RecordedRequest| {
            if request.query.get("page").map(String::as_str) == Some("1") {
                FakeResponse::status(500)
            } else {
                paged_reservations(25)(request)
            }
        })
        .await;
        let view = ReservationsView::new(client_for(&api), ViewConfig::reservations());

        view.fetch(FilterState::new(july()), 0, 10).await;
        assert_eq!(view.go_next().await, FetchOutcome::Failed);
        assert_eq!(view.snapshot().await.page_index, 0);
        assert_eq!(view.rows().await.len(), 10);
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_failure() {
        let api = FakeApi::spawn(|_: &crate::test_support::RecordedRequest| FakeResponse::ok(json!({ "rows": 3 }))).await;
        let view = PaymentsView::new(client_for(&api), ViewConfig::payments());
        let result = view.try_fetch(FilterState::new(july()), 0, 10).await;
        assert!(matches!(result, Err(ReportError::DecodeFailed { .. })));
        assert_eq!(view.fetch(FilterState::new(july()), 0, 10).await, FetchOutcome::Failed);
        assert!(view.current_filters().await.is_none());
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let api = FakeApi::spawn(|request: &crate::test_support::RecordedRequest| {
            let response = paged_reservations(25)(request);
            if request.query.get("page").map(String::as_str) == Some("0") {
                response.delayed(Duration::from_millis(300))
            } else {
                response
            }
        })
        .await;
        let view = ReservationsView::new(client_for(&api), ViewConfig::reservations());

        let (slow, fast) = tokio::join!(view.fetch(FilterState::new(july()), 0, 10), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            view.fetch(FilterState::new(july()), 1, 10).await
        });

        assert_eq!(slow, FetchOutcome::Superseded);
        assert_eq!(fast, FetchOutcome::Loaded);
        assert_eq!(view.snapshot().await.page_index, 1);
    }

    #[tokio::test]
    async fn unsupported_filters_are_not_sent() {
        let api = FakeApi::spawn(|_: &crate::test_support::RecordedRequest| {
            FakeResponse::ok(json!({ "data": [], "page": 0, "size": 10, "totalElements": 0, "totalPages": 0, "last": true }))
        })
        .await;
        let view = PaymentsView::new(client_for(&api), ViewConfig::payments());
        let filters = FilterState::new(july())
            .with(FilterKey::Instructor, Some("Ana"))
            .with(FilterKey::Client, Some("  lu@example.com "))
            .with(FilterKey::Payment, Some(""));
        view.fetch(filters, 0, 10).await;

        let request = &api.requests()[0];
        assert_eq!(request.query["client"], "lu@example.com");
        assert!(!request.query.contains_key("instructor"));
        assert!(!request.query.contains_key("payment"));
        assert_eq!(request.query["sortBy"], "ACCREDITATION_DATE");
    }

    #[tokio::test]
    async fn client_scoped_view_without_id_does_nothing() {
        let api = FakeApi::spawn(paged_reservations(5)).await;
        let view = ClientReservationsView::new(client_for(&api), ViewConfig::client_reservations(" "));
        assert_eq!(view.fetch_default(FilterState::new(july())).await, FetchOutcome::Skipped);
        assert!(api.requests().is_empty());

        let view = ClientReservationsView::new(client_for(&api), ViewConfig::client_reservations("42"));
        assert_eq!(view.fetch_default(FilterState::new(july())).await, FetchOutcome::Loaded);
        let request = &api.requests()[0];
        assert_eq!(request.path, "/reports/clients/42/reservations");
        assert_eq!(request.query["sortDir"], "DESC");
    }

    #[tokio::test]
    async fn client_id_cannot_rewrite_the_upstream_path() {
        let api = FakeApi::spawn(paged_reservations(5)).await;
        for id in ["../../payments/table?", "42/../../payments", "abc"] {
            let view = ClientReservationsView::new(client_for(&api), ViewConfig::client_reservations(id));
            assert!(!view.config.enabled);
            assert_eq!(view.fetch_default(FilterState::new(july())).await, FetchOutcome::Skipped);
        }
        assert!(api.requests().is_empty());

        let config = ViewConfig::client_payments(" 42 ");
        assert!(config.enabled);
        assert_eq!(config.path, "/reports/clients/42/payments");
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_before_the_request() {
        let api = FakeApi::spawn(paged_reservations(5)).await;
        let view = ImportJobsView::new(client_for(&api), ViewConfig::import_jobs());
        let range = DateRange::new(july().to, july().from);
        let result = view.try_fetch(FilterState::new(range), 0, 50).await;
        assert!(matches!(result, Err(ReportError::ValidationFailed(_))));
        assert!(api.requests().is_empty());
    }

    #[test]
    fn start_index_is_one_based() {
        assert_eq!(start_index(2, 10), 21);
        assert_eq!(start_index(0, 50), 1);
    }
}
