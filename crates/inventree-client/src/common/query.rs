//! Query string helpers for the InvenTree API
//!
//! Filters are passed around as `(&str, &str)` pairs and encoded here.

/// Owned query parameters
pub type Params = Vec<(String, String)>;

/// Build a query string from parameters (without the leading `?`)
pub fn build_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append encoded parameters to a URL
pub fn append_query(url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, build_query_string(params))
}

/// Convert borrowed filter pairs into owned parameters
pub fn to_params(filters: &[(&str, &str)]) -> Params {
    filters
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Combine fixed filters with caller supplied ones
///
/// Caller filters are appended after the fixed ones; a caller filter with
/// the same key replaces the fixed value.
pub fn merge_filters(fixed: &[(&str, &str)], extra: &[(&str, &str)]) -> Params {
    let mut params: Params = fixed
        .iter()
        .filter(|(k, _)| !extra.iter().any(|(ek, _)| ek == k))
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    params.extend(to_params(extra));
    params
}

/// Borrow owned parameters as `(&str, &str)` pairs
pub fn as_pairs(params: &[(String, String)]) -> Vec<(&str, &str)> {
    params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_is_encoded() {
        let params = vec![
            ("search".to_string(), "10k resistor".to_string()),
            ("parts[]".to_string(), "4".to_string()),
        ];
        assert_eq!(build_query_string(&params), "search=10k%20resistor&parts%5B%5D=4");
    }

    #[test]
    fn test_append_query_respects_existing_query() {
        let params = vec![("limit".to_string(), "1".to_string())];
        assert_eq!(append_query("http://x/api/part/", &params), "http://x/api/part/?limit=1");
        assert_eq!(append_query("http://x/api/part/?a=b", &params), "http://x/api/part/?a=b&limit=1");
        assert_eq!(append_query("http://x/api/part/", &[]), "http://x/api/part/");
    }

    #[test]
    fn test_merge_filters_caller_wins() {
        let merged = merge_filters(&[("part", "5"), ("active", "true")], &[("active", "false")]);
        assert_eq!(
            merged,
            vec![
                ("part".to_string(), "5".to_string()),
                ("active".to_string(), "false".to_string()),
            ]
        );
    }
}
