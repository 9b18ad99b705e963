use crate::models::FilterState;

/// Fixed row cap sent with every lineage request.
pub const LINEAGE_LIMIT: u32 = 20;

/// Ordered query-string parameters for one backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(&'static str, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.push((key, value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(name, _)| *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (*name, value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `start` and `end`, passed through exactly as entered.
pub fn base_params(filter: &FilterState) -> QueryParams {
    QueryParams::new()
        .with("start", filter.start.clone())
        .with("end", filter.end.clone())
}

/// Base parameters plus `product_type`, which is left out entirely when no
/// product type is selected.
pub fn product_params(filter: &FilterState) -> QueryParams {
    let params = base_params(filter);
    match filter.product_type() {
        Some(product_type) => params.with("product_type", product_type),
        None => params,
    }
}

pub fn lineage_params() -> QueryParams {
    QueryParams::new().with("limit", LINEAGE_LIMIT.to_string())
}

/// Parameter sets for the five requests of one load cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub top_cfr: QueryParams,
    pub issuing_offices: QueryParams,
    pub letters: QueryParams,
    pub lineage: QueryParams,
    pub top_cfr_trend: QueryParams,
}

impl QueryPlan {
    pub fn from_filter(filter: &FilterState) -> Self {
        Self {
            top_cfr: product_params(filter),
            issuing_offices: base_params(filter),
            letters: product_params(filter),
            lineage: lineage_params(),
            top_cfr_trend: product_params(filter),
        }
    }
}
