use crate::client::{decode, DateRange, ReportingClient};
use crate::errors::ReportError;
use crate::legend::{ChartLegend, LegendItem, INSTRUCTOR_PALETTE, SERIES_PALETTE};
use crate::models::{PaymentMethodSummary, TopDiscipline};
use crate::transform::{series_keys, transform, ChartPoint, RawSeriesResponse};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};

pub const SERIES_PATH: &str = "/reports/reservations/series";
pub const TOP_DISCIPLINES_PATH: &str = "/reports/reservations/top-disciplines";
pub const PAYMENT_METHODS_PATH: &str = "/reports/payments/payment-methods/summary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesGrouping {
    Studio,
    Instructor,
    Discipline,
    StudioDiscipline,
}

impl SeriesGrouping {
    pub fn param(self) -> &'static str {
        match self {
            Self::Studio => "studio",
            Self::Instructor => "instructor",
            Self::Discipline => "discipline",
            Self::StudioDiscipline => "studio,discipline",
        }
    }
}

/// Everything the analytics page shows for one date range.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsState {
    pub data_studio: Option<RawSeriesResponse>,
    pub data_instructor: Option<RawSeriesResponse>,
    pub data_discipline: Option<RawSeriesResponse>,
    pub data_studio_discipline: Option<RawSeriesResponse>,
    pub top_disciplines: Option<Vec<TopDiscipline>>,
    pub payment_methods: Option<Vec<PaymentMethodSummary>>,
    pub loading: bool,
    pub error: Option<String>,
}

struct ReportBatch {
    studio: RawSeriesResponse,
    instructor: RawSeriesResponse,
    discipline: RawSeriesResponse,
    studio_discipline: RawSeriesResponse,
    top_disciplines: Vec<TopDiscipline>,
    payment_methods: Vec<PaymentMethodSummary>,
}

/// Loads the six analytics reports together. A batch is published whole or not at all.
pub struct ReportsDashboard {
    client: ReportingClient,
    state: Mutex<ReportsState>,
}

impl ReportsDashboard {
    pub fn new(client: ReportingClient) -> Self {
        Self {
            client,
            state: Mutex::new(ReportsState::default()),
        }
    }

    pub async fn state(&self) -> ReportsState {
        self.state.lock().await.clone()
    }

    /// Loads all six reports for `range`. The error is recorded in the state
    /// and also handed back so callers can tell its kind.
    pub async fn fetch_reports(&self, range: DateRange) -> Result<(), ReportError> {
        {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.error = None;
        }

        let result = self.load(range).await;

        let mut state = self.state.lock().await;
        state.loading = false;
        match result {
            Ok(batch) => {
                info!(from = %range.from, to = %range.to, "analytics reports loaded");
                state.data_studio = Some(batch.studio);
                state.data_instructor = Some(batch.instructor);
                state.data_discipline = Some(batch.discipline);
                state.data_studio_discipline = Some(batch.studio_discipline);
                state.top_disciplines = Some(batch.top_disciplines);
                state.payment_methods = Some(batch.payment_methods);
                Ok(())
            }
            Err(err) => {
                error!(from = %range.from, to = %range.to, error = %err, "analytics reports failed");
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn load(&self, range: DateRange) -> Result<ReportBatch, ReportError> {
        range.validate()?;
        let series_query = |grouping: SeriesGrouping| {
            let mut query = range.query();
            query.push(("groupBy".to_string(), grouping.param().to_string()));
            query
        };
        let studio_query = series_query(SeriesGrouping::Studio);
        let instructor_query = series_query(SeriesGrouping::Instructor);
        let discipline_query = series_query(SeriesGrouping::Discipline);
        let studio_discipline_query = series_query(SeriesGrouping::StudioDiscipline);
        let range_query = range.query();

        let (studio, instructor, discipline, studio_discipline, top_disciplines, payment_methods) = tokio::join!(
            self.client.send(SERIES_PATH, &studio_query),
            self.client.send(SERIES_PATH, &instructor_query),
            self.client.send(SERIES_PATH, &discipline_query),
            self.client.send(SERIES_PATH, &studio_discipline_query),
            self.client.send(TOP_DISCIPLINES_PATH, &range_query),
            self.client.send(PAYMENT_METHODS_PATH, &range_query),
        );

        // Every request has settled; any failure voids the whole batch.
        let studio = studio?;
        let instructor = instructor?;
        let discipline = discipline?;
        let studio_discipline = studio_discipline?;
        let top_disciplines = top_disciplines?;
        let payment_methods = payment_methods?;

        Ok(ReportBatch {
            studio: decode(SERIES_PATH, studio).await?,
            instructor: decode(SERIES_PATH, instructor).await?,
            discipline: decode(SERIES_PATH, discipline).await?,
            studio_discipline: decode(SERIES_PATH, studio_discipline).await?,
            top_disciplines: decode(TOP_DISCIPLINES_PATH, top_disciplines).await?,
            payment_methods: decode(PAYMENT_METHODS_PATH, payment_methods).await?,
        })
    }

    pub async fn charts(&self) -> ReportCharts {
        ReportCharts::from_state(&*self.state.lock().await)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesChart {
    pub points: Vec<ChartPoint>,
    pub keys: Vec<String>,
    pub legend: Vec<LegendItem>,
}

impl SeriesChart {
    pub fn build(raw: Option<&RawSeriesResponse>, palette: &[&str], collapse: bool) -> Self {
        let points = raw.map(transform).unwrap_or_default();
        let legend = ChartLegend::new(&points, palette, collapse).legend_items();
        Self {
            keys: series_keys(&points),
            points,
            legend,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCharts {
    pub studio: SeriesChart,
    pub discipline: SeriesChart,
    pub instructor: SeriesChart,
    pub studio_discipline: SeriesChart,
}

impl ReportCharts {
    pub fn from_state(state: &ReportsState) -> Self {
        Self {
            studio: SeriesChart::build(state.data_studio.as_ref(), &SERIES_PALETTE, false),
            discipline: SeriesChart::build(state.data_discipline.as_ref(), &SERIES_PALETTE, false),
            instructor: SeriesChart::build(state.data_instructor.as_ref(), &INSTRUCTOR_PALETTE, true),
            studio_discipline: SeriesChart::build(
                state.data_studio_discipline.as_ref(),
                &INSTRUCTOR_PALETTE,
                true,
            ),
        }
    }
}

/// The analytics page payload: chart-ready series plus the two ranking panels.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub range: DateRange,
    pub charts: ReportCharts,
    pub top_disciplines: Vec<TopDiscipline>,
    pub payment_methods: Vec<PaymentMethodShare>,
}

impl AnalyticsReport {
    pub fn from_state(range: DateRange, state: &ReportsState) -> Self {
        Self {
            range,
            charts: ReportCharts::from_state(state),
            top_disciplines: state.top_disciplines.clone().unwrap_or_default(),
            payment_methods: payment_method_shares(state.payment_methods.as_deref().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodShare {
    pub payment_method: String,
    pub label: String,
    pub total_amount: f64,
    pub transaction_count: u64,
    pub percentage: u32,
}

pub fn payment_method_label(method: &str) -> &str {
    match method {
        "credit_card" => "Credit card",
        "debit_card" => "Debit card",
        "bank_transfer" | "transfer" => "Bank transfer",
        "cash" => "Cash",
        other => other,
    }
}

/// Each method's share of the total amount, as a rounded percentage.
pub fn payment_method_shares(methods: &[PaymentMethodSummary]) -> Vec<PaymentMethodShare> {
    let total: f64 = methods.iter().map(|m| m.total_amount).sum();
    methods
        .iter()
        .map(|method| PaymentMethodShare {
            payment_method: method.payment_method.clone(),
            label: payment_method_label(&method.payment_method).to_string(),
            total_amount: method.total_amount,
            transaction_count: method.transaction_count,
            percentage: if total > 0.0 {
                (method.total_amount / total * 100.0).round() as u32
            } else {
                0
            },
        })
        .collect()
}
