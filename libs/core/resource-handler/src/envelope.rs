use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Success body: `{status, token?, results?, data?}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Envelope {
    /// Always `success`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            token: None,
            results: None,
            data: None,
        }
    }

    /// `{status, data: {<name>: value}}`
    pub fn one(name: &str, value: Value) -> Self {
        let mut data = Map::new();
        data.insert(name.to_string(), value);
        Self {
            data: Some(Value::Object(data)),
            ..Self::success()
        }
    }

    /// `{status, results, data: {<name>: [..]}}`
    pub fn many(name: &str, values: Vec<Value>) -> Self {
        let results = values.len();
        Self {
            results: Some(results),
            ..Self::one(name, Value::Array(values))
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
