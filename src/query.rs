/// URL state for list pages: the page number, the filter set and an optional
/// search query, parsed leniently and rendered canonically.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use url::form_urlencoded;

/// Query parameters that are owned by the list state and never taken from filters
const RESERVED_PARAMS: [&str; 3] = ["page", "query", "filters"];

/// Filter set applied to a list endpoint
///
/// Keys are kept sorted so the JSON form is canonical: two filter sets with the
/// same entries always render to the same string, whatever order they were
/// built in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<String, Value>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the `filters` URL value; anything that is not a JSON object yields
    /// an empty set
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(serde_json::from_str::<Value>) {
            Some(Ok(Value::Object(map))) => Self(map.into_iter().collect()),
            Some(Ok(other)) => {
                tracing::debug!(value = %other, "Ignoring non-object filters");
                Self::default()
            }
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Ignoring malformed filters");
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Sorted-key JSON rendering
    pub fn canonical_json(&self) -> String {
        // Object keys nested inside values are sorted too: serde_json's map is
        // a BTreeMap unless `preserve_order` is enabled.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// Flattens the filters into request query parameters
    ///
    /// Strings are sent verbatim, numbers and booleans as their JSON text and
    /// arrays joined with commas. Nulls, empty strings and reserved names are
    /// dropped.
    pub fn to_params(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
            .filter_map(|(key, value)| param_value(value).map(|v| (key.clone(), v)))
            .collect()
    }
}

impl Display for Filters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_json())
    }
}

fn param_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(param_value).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(","))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Page, filters and search text of a list view
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub filters: Filters,
    pub query: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            filters: Filters::default(),
            query: None,
        }
    }
}

impl ListQuery {
    /// Parses a URL query string (with or without the leading `?`)
    ///
    /// Never fails: a missing, non-numeric or non-positive `page` becomes 1 and
    /// malformed `filters` become the empty set.
    pub fn parse(query_string: &str) -> Self {
        let raw = query_string.trim().trim_start_matches('?');
        let mut parsed = Self::default();
        let mut filters_raw: Option<String> = None;

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "page" => parsed.page = parse_page(&value),
                "filters" => filters_raw = Some(value.into_owned()),
                "query" => parsed.query = normalize_search(&value),
                _ => {}
            }
        }

        parsed.filters = Filters::parse(filters_raw.as_deref());
        parsed
    }

    /// Canonical query string: `page`, then `filters`, then `query` if set
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("page", &self.page.to_string());
        serializer.append_pair("filters", &self.filters.canonical_json());
        if let Some(query) = &self.query {
            serializer.append_pair("query", query);
        }
        serializer.finish()
    }

    /// Same filters and search text on another page (clamped to at least 1)
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// New filters always restart at page 1
    pub fn with_filters(&self, filters: Filters) -> Self {
        Self {
            page: 1,
            filters,
            query: self.query.clone(),
        }
    }

    /// New search text restarts at page 1 and keeps the filters
    pub fn with_search(&self, text: &str) -> Self {
        Self {
            page: 1,
            filters: self.filters.clone(),
            query: normalize_search(text),
        }
    }

    /// Request parameters sent to the list endpoint
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("page".to_string(), self.page.to_string())];
        params.extend(self.filters.to_params());
        if let Some(query) = &self.query {
            params.push(("query".to_string(), query.clone()));
        }
        params
    }
}

fn parse_page(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(page) if page >= 1 => u32::try_from(page).unwrap_or(u32::MAX),
        _ => 1,
    }
}

fn normalize_search(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_pages_normalize_to_one() {
        for raw in ["page=0", "page=-5", "page=abc", "page=", "", "?filters=%7B%7D"] {
            assert_eq!(ListQuery::parse(raw).page, 1, "input {:?}", raw);
        }
        assert_eq!(ListQuery::parse("?page=7").page, 7);
        assert_eq!(ListQuery::parse("page=%2012%20").page, 12);
    }

    #[test]
    fn test_malformed_filters_fall_back_to_empty() {
        for raw in [
            "filters=%7B%22sort_by%22%3A",
            "filters=not-json",
            "filters=%5B1%2C2%5D",
            "filters=null",
        ] {
            let query = ListQuery::parse(raw);
            assert!(query.filters.is_empty(), "input {:?}", raw);
            assert_eq!(query.page, 1);
        }
    }

    #[test]
    fn test_filter_key_order_does_not_change_canonical_form() {
        let a = Filters::new()
            .with("sort_by", "popularity.desc")
            .with("language", "en-US");
        let b = Filters::new()
            .with("language", "en-US")
            .with("sort_by", "popularity.desc");
        assert_eq!(a.canonical_json(), b.canonical_json());
        assert_eq!(
            a.canonical_json(),
            r#"{"language":"en-US","sort_by":"popularity.desc"}"#
        );

        let parsed = Filters::parse(Some(r#"{"sort_by":"popularity.desc","language":"en-US"}"#));
        assert_eq!(parsed, a);
    }

    #[test]
    fn test_query_string_round_trips_through_parse() {
        let query = ListQuery {
            page: 3,
            filters: Filters::new().with("with_genres", json!([18, 35])),
            query: Some("star wars".to_string()),
        };
        let rendered = query.to_query_string();
        assert!(rendered.starts_with("page=3&filters="));
        assert_eq!(ListQuery::parse(&rendered), query);
    }

    #[test]
    fn test_filters_flatten_to_request_params() {
        let filters = Filters::new()
            .with("with_genres", json!([18, 35]))
            .with("include_adult", false)
            .with("primary_release_year", 1999)
            .with("language", "en-US")
            .with("release_date_gte", "")
            .with("vote_count_gte", Value::Null)
            .with("page", 9);

        assert_eq!(
            filters.to_params(),
            vec![
                ("include_adult".to_string(), "false".to_string()),
                ("language".to_string(), "en-US".to_string()),
                ("primary_release_year".to_string(), "1999".to_string()),
                ("with_genres".to_string(), "18,35".to_string()),
            ]
        );
    }

    #[test]
    fn test_changing_filters_resets_page() {
        let query = ListQuery::parse("page=4&query=dune");
        let refiltered = query.with_filters(Filters::new().with("sort_by", "vote_average.desc"));
        assert_eq!(refiltered.page, 1);
        assert_eq!(refiltered.query.as_deref(), Some("dune"));
    }

    #[test]
    fn test_blank_search_is_none() {
        assert_eq!(ListQuery::parse("query=%20%20").query, None);
        assert_eq!(ListQuery::default().with_search("  arrival ").query.as_deref(), Some("arrival"));
    }

    #[test]
    fn test_request_params_order() {
        let query = ListQuery {
            page: 2,
            filters: Filters::new().with("sort_by", "popularity.asc"),
            query: Some("heat".to_string()),
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("sort_by".to_string(), "popularity.asc".to_string()),
                ("query".to_string(), "heat".to_string()),
            ]
        );
    }
}
