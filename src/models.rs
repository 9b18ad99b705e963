use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_START: &str = "2024-01-01";

/// Product types offered by the filter form. An empty selection means "all".
pub const PRODUCT_TYPES: [&str; 4] = ["Drugs", "Biologics", "Devices", "Foods"];

/// User-controlled filter. Dates are kept as the strings the user typed and are
/// forwarded to the backend unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
}

impl FilterState {
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        product_type: Option<String>,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            product_type,
        }
    }

    /// The product type, if one is selected. An empty string counts as no selection.
    pub fn product_type(&self) -> Option<&str> {
        self.product_type.as_deref().filter(|value| !value.is_empty())
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_START, Local::now().date_naive().to_string(), None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfrCount {
    pub cfr_code: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeCount {
    pub issuing_office: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub firm: String,
    pub product_type: String,
    pub issuing_office: String,
    pub issue_date: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRecord {
    pub letter_id: i64,
    pub source_url: String,
    pub fetched_at: String,
    pub sha256_raw: String,
}

/// One time bucket of the trend chart: the period label plus a count per CFR
/// code, in the order the backend sent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    #[serde(flatten)]
    pub counts: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopCfrTrend {
    pub codes: Vec<String>,
    pub series: Vec<TrendPoint>,
}

/// Form body posted by the filter form. Every field arrives as text.
#[derive(Debug, Deserialize)]
pub struct ApplyForm {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub product_type: String,
}

impl From<ApplyForm> for FilterState {
    fn from(form: ApplyForm) -> Self {
        let product_type = (!form.product_type.is_empty()).then_some(form.product_type);
        FilterState::new(form.start, form.end, product_type)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub now: String,
}
