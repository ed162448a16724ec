//! Inbound JSON-RPC response container
//!
//! Decodes a reply body, checks that its `id` matches the request that produced
//! it, and keeps the whole decoded body as the return value.

use std::{fmt, str::FromStr};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::JsonRpcError;
use crate::rpc::DEFAULT_ENCODING;

/// Structural shape a reply body is decoded into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultType {
    /// The body must be a JSON object.
    #[default]
    Object,
    /// The body may be a JSON object or a JSON array.
    Array,
}

impl ResultType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_object() || value.is_array(),
        }
    }
}

impl FromStr for ResultType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            other => Err(format!("unknown result type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    id: String,
    return_value: Option<Value>,
    encoding: String,
}

impl Response {
    pub fn new(id: impl Into<String>, return_value: Option<Value>) -> Self {
        Self {
            id: id.into(),
            return_value,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn set_encoding(&mut self, encoding: impl Into<String>) -> &mut Self {
        self.encoding = encoding.into();
        self
    }

    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    pub fn set_return_value(&mut self, value: Option<Value>) {
        self.return_value = value;
    }

    pub fn into_return_value(self) -> Option<Value> {
        self.return_value
    }

    /// Decodes the stored body into `T`; an absent body decodes as `null`.
    pub fn return_value_as<T: DeserializeOwned>(&self) -> Result<T, JsonRpcError> {
        let value = self.return_value.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|err| {
            JsonRpcError::malformed_response(format!("return value has unexpected shape: {err}"))
        })
    }

    /// Parses `raw` and accepts it only when its `id` equals this response's id.
    pub fn load_json(&mut self, raw: &str, result_type: ResultType) -> Result<(), JsonRpcError> {
        let parsed: Value = serde_json::from_str(raw).map_err(|_| {
            JsonRpcError::malformed_response(format!("Failed to parse response: {raw}"))
        })?;

        if !result_type.accepts(&parsed) {
            return Err(JsonRpcError::malformed_response(format!(
                "Failed to parse response: {raw}"
            )));
        }

        let response_id = parsed.get("id");
        if !id_matches(&self.id, response_id) {
            return Err(JsonRpcError::ResponseIdMismatch {
                expected: self.id.clone(),
                actual: response_id.map_or_else(|| "null".to_string(), Value::to_string),
            });
        }

        self.return_value = Some(parsed);
        Ok(())
    }

    /// An absent or `null` return value encodes as `[]`.
    pub fn save_json(&self) -> String {
        match &self.return_value {
            None | Some(Value::Null) => "[]".to_string(),
            Some(value) => value.to_string(),
        }
    }
}

fn id_matches(expected: &str, actual: Option<&Value>) -> bool {
    match actual {
        Some(Value::String(id)) => id == expected,
        Some(Value::Number(id)) => id.to_string() == expected,
        _ => false,
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.save_json())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[test]
    fn mismatched_id_is_rejected() {
        let mut response = Response::new("abc", None);
        let err = response
            .load_json(r#"{"jsonrpc":"2.0","id":"xyz","result":1}"#, ResultType::Object)
            .expect_err("expected id mismatch");

        match err {
            JsonRpcError::ResponseIdMismatch { expected, actual } => {
                assert_eq!(expected, "abc");
                assert_eq!(actual, "\"xyz\"");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(response.return_value().is_none());
    }

    #[test]
    fn matching_id_keeps_whole_body() {
        let mut response = Response::new("abc", None);
        response
            .load_json(r#"{"jsonrpc":"2.0","id":"abc","result":[1,2]}"#, ResultType::Object)
            .expect("loads");

        assert_eq!(
            response.return_value(),
            Some(&json!({"jsonrpc": "2.0", "id": "abc", "result": [1, 2]}))
        );
    }

    #[test]
    fn numeric_id_matches_its_text() {
        let mut response = Response::new("17", None);
        response
            .load_json(r#"{"id":17}"#, ResultType::Object)
            .expect("loads");
    }

    #[test]
    fn missing_id_is_a_mismatch() {
        let mut response = Response::new("abc", None);
        let err = response
            .load_json(r#"{"result":true}"#, ResultType::Object)
            .expect_err("expected mismatch");
        assert!(matches!(err, JsonRpcError::ResponseIdMismatch { .. }));
    }

    #[test]
    fn unparseable_body_is_malformed() {
        let mut response = Response::new("abc", None);
        let err = response
            .load_json("<html>oops</html>", ResultType::Object)
            .expect_err("expected parse failure");
        assert!(matches!(err, JsonRpcError::MalformedResponse(_)));
    }

    #[test]
    fn object_mode_rejects_top_level_array() {
        let mut response = Response::new("abc", None);
        let err = response
            .load_json(r#"[{"id":"abc"}]"#, ResultType::Object)
            .expect_err("expected shape failure");
        assert!(matches!(err, JsonRpcError::MalformedResponse(_)));
    }

    #[test]
    fn array_mode_still_correlates_by_id() {
        let mut response = Response::new("abc", None);
        response
            .load_json(r#"{"id":"abc","result":"ok"}"#, ResultType::Array)
            .expect("loads");
        let body: Value = response.return_value_as().expect("value");
        assert_eq!(body["result"], "ok");

        let mut response = Response::new("abc", None);
        let err = response
            .load_json(r#"["abc"]"#, ResultType::Array)
            .expect_err("arrays carry no id");
        assert!(matches!(err, JsonRpcError::ResponseIdMismatch { .. }));
    }

    #[test]
    fn empty_return_value_encodes_as_empty_array() {
        assert_eq!(Response::new("abc", None).save_json(), "[]");
        assert_eq!(Response::new("abc", Some(Value::Null)).to_string(), "[]");
        assert_eq!(
            Response::new("abc", Some(json!({"ok": true}))).save_json(),
            r#"{"ok":true}"#
        );
    }

    #[test]
    fn typed_return_value_decodes_body() {
        #[derive(Debug, Deserialize)]
        struct Reply {
            id: String,
            result: Vec<u32>,
        }

        let mut response = Response::new("abc", None);
        response
            .load_json(r#"{"id":"abc","result":[3,4]}"#, ResultType::Object)
            .expect("loads");
        let reply: Reply = response.return_value_as().expect("typed decode");
        assert_eq!(reply.id, "abc");
        assert_eq!(reply.result, vec![3, 4]);
    }

    #[test]
    fn result_type_parses_from_text() {
        assert_eq!(" Array ".parse::<ResultType>(), Ok(ResultType::Array));
        assert_eq!("object".parse::<ResultType>(), Ok(ResultType::Object));
        assert!("list".parse::<ResultType>().is_err());
    }
}
