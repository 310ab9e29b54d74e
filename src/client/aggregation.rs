use serde::{Deserialize, Serialize};

/// Aggregation options for `query_aggregation`.
///
/// Rendered as a query string in a fixed order: groupBy, count, avg, min,
/// max, sum, orderBy, limit, offset. The order shows up in request logs, so
/// it must stay stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl AggregationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    pub fn count(mut self, alias: impl Into<String>) -> Self {
        self.count = Some(alias.into());
        self
    }

    pub fn avg(mut self, spec: impl Into<String>) -> Self {
        self.avg = Some(spec.into());
        self
    }

    pub fn min(mut self, spec: impl Into<String>) -> Self {
        self.min = Some(spec.into());
        self
    }

    pub fn max(mut self, spec: impl Into<String>) -> Self {
        self.max = Some(spec.into());
        self
    }

    pub fn sum(mut self, spec: impl Into<String>) -> Self {
        self.sum = Some(spec.into());
        self
    }

    pub fn order_by(mut self, spec: impl Into<String>) -> Self {
        self.order_by = Some(spec.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Present parameters as `key=value` pairs, in wire order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let text = [
            ("groupBy", &self.group_by),
            ("count", &self.count),
            ("avg", &self.avg),
            ("min", &self.min),
            ("max", &self.max),
            ("sum", &self.sum),
            ("orderBy", &self.order_by),
        ];
        let numeric = [("limit", self.limit), ("offset", self.offset)];

        text.into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key, v.clone())))
            .chain(
                numeric
                    .into_iter()
                    .filter_map(|(key, value)| value.map(|v| (key, v.to_string()))),
            )
            .collect()
    }

    /// Query string without the leading `?`; empty when nothing is set.
    pub fn to_query_string(&self) -> String {
        self.pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }
}
