//! Dot-path field access into untyped upstream JSON.

use serde_json::Value;

/// Walk `path` ("response.body.items") one segment at a time.
///
/// Returns `None` when any intermediate field is missing, so a bad path
/// degrades the result set instead of aborting the request. An empty path
/// yields the document itself.
pub fn resolve_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = current.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_nested_fields() {
        let doc = json!({"response": {"body": {"items": [1, 2]}}});
        let found = resolve_path(&doc, "response.body.items").unwrap();
        assert_eq!(found, &json!([1, 2]));
    }

    #[test]
    fn missing_intermediate_field_is_none() {
        let doc = json!({"response": {}});
        assert!(resolve_path(&doc, "response.body.items").is_none());
    }

    #[test]
    fn empty_path_yields_document() {
        let doc = json!([{"a": 1}]);
        assert_eq!(resolve_path(&doc, "").unwrap(), &doc);
    }
}
