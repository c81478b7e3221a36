use serde::{Deserialize, Serialize};

/// Envelope shared by every paginated list endpoint of the reporting API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T, S = NoSummary> {
    pub data: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    #[serde(default)]
    pub last: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<S>,
}

/// Summary slot for endpoints without aggregate counts. Any object decodes into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoSummary {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    pub studio_name: String,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
}

/// One booked spot in a class. Also the row type of a client's reservation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub reservation_id: i64,
    pub class_id: i64,
    pub reservation_date: String,
    #[serde(default)]
    pub reservation_time: String,
    #[serde(default)]
    pub order_creator: String,
    #[serde(default)]
    pub payment_method: String,
    pub status: String,
    pub client_info: ContactInfo,
    pub location_info: LocationInfo,
    pub discipline_name: String,
    pub instructor_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSummary {
    pub accepted: u64,
    pub pending: u64,
    pub cancelled: u64,
    pub total_classes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentity {
    pub client_id: i64,
    pub client_name: Option<String>,
    pub client_email: String,
    #[serde(default)]
    pub client_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRow {
    pub client_info: ClientIdentity,
    pub total_reservations: u64,
    pub total_payments: u64,
    pub total_amount_received: f64,
    pub last_payment_date: Option<String>,
    pub last_reservation_date: Option<String>,
    pub top_discipline: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub total_clients: u64,
    pub active_clients: u64,
    pub vip_clients: u64,
    pub total_revenue: f64,
}

/// A package purchase, as listed by both the payments table and a client's payment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub operation_id: i64,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub week: u32,
    pub purchase_date: String,
    pub accreditation_date: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub operation_type: String,
    pub product_value: f64,
    #[serde(default)]
    pub transaction_fee: f64,
    pub amount_received: f64,
    #[serde(default)]
    pub installments: u32,
    pub payment_method: String,
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub class_count: u32,
    pub client_info: ContactInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportFileType {
    Reservation,
    Payment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportJobStatus {
    Success,
    Error,
    Pending,
    Processing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub success: bool,
    pub total_processed: u64,
    pub success_count: u64,
    pub failure_count: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// One spreadsheet import run recorded by the reporting API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub job_id: i64,
    pub file_name: String,
    pub file_type: ImportFileType,
    pub status: ImportJobStatus,
    pub error_message: Option<String>,
    pub created_at: String,
    pub finished_at: Option<String>,
    pub processing_result: Option<ProcessingResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopDiscipline {
    pub discipline_name: String,
    pub total_reservations: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodSummary {
    pub payment_method: String,
    pub total_amount: f64,
    #[serde(default)]
    pub transaction_count: u64,
}
