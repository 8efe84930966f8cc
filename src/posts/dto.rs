use serde::Deserialize;
use serde_json::Value;

/// Request body for publishing. `hashtags` is kept raw so a non-array value
/// gets its own error message instead of a generic body rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub contenido: Option<String>,
    #[serde(default)]
    pub hashtags: Option<Value>,
    pub user_id: Option<String>,
}

impl CreatePostRequest {
    /// Raw hashtag names; empty when none were sent, `None` when the value
    /// is not an array of strings.
    pub fn hashtag_names(&self) -> Option<Vec<String>> {
        match &self.hashtags {
            None | Some(Value::Null) => Some(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(_) => None,
        }
    }
}
