use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::transport::{Transport, TransportError, TransportReply};

pub(crate) enum Behaviour {
    /// Replies with the request id and echoes method and params under `result`.
    Echo,
    Status(u16, &'static str, &'static str),
    Fixed(String),
    Refuse,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedPost {
    pub body: String,
    pub endpoint: Option<String>,
    pub headers: HashMap<String, String>,
}

impl RecordedPost {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Clone, Default)]
pub(crate) struct Recorder {
    posts: Arc<Mutex<Vec<RecordedPost>>>,
}

impl Recorder {
    pub fn posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().expect("recorder lock").clone()
    }

    pub fn sent_json(&self) -> Vec<Value> {
        self.posts()
            .iter()
            .map(|post| serde_json::from_str(&post.body).expect("valid request json"))
            .collect()
    }
}

pub(crate) struct MockTransport {
    behaviour: Behaviour,
    endpoint: Option<String>,
    headers: HashMap<String, String>,
    recorder: Recorder,
}

impl MockTransport {
    pub fn new(behaviour: Behaviour) -> (Self, Recorder) {
        let recorder = Recorder::default();
        let transport = Self {
            behaviour,
            endpoint: None,
            headers: HashMap::new(),
            recorder: recorder.clone(),
        };
        (transport, recorder)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn set_endpoint(&mut self, endpoint: &str) {
        self.endpoint = Some(endpoint.to_string());
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn set_headers(&mut self, headers: &[(&str, &str)]) -> Result<(), TransportError> {
        for (name, value) in headers {
            self.headers
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
        Ok(())
    }

    async fn post(&mut self, body: String) -> Result<TransportReply, TransportError> {
        self.recorder
            .posts
            .lock()
            .expect("recorder lock")
            .push(RecordedPost {
                body: body.clone(),
                endpoint: self.endpoint.clone(),
                headers: self.headers.clone(),
            });

        match &self.behaviour {
            Behaviour::Echo => {
                let request: Value = serde_json::from_str(&body).expect("valid request json");
                let reply = json!({
                    "jsonrpc": "2.0",
                    "id": request["id"],
                    "result": {
                        "method": request["method"],
                        "params": request.get("params").cloned().unwrap_or(Value::Null)
                    }
                });
                Ok(TransportReply::new(200, "OK", reply.to_string()))
            }
            Behaviour::Status(status, message, body) => {
                Ok(TransportReply::new(*status, *message, *body))
            }
            Behaviour::Fixed(body) => Ok(TransportReply::new(200, "OK", body.clone())),
            Behaviour::Refuse => Err(TransportError::Connect("connection refused".to_string())),
        }
    }
}
