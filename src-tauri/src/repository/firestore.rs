//! Firestore Document Store
//!
//! Client for the Cloud Firestore REST API (v1). Documents travel as typed
//! Firestore values (`{"stringValue": ..}`, `{"integerValue": "3"}`, ...),
//! which are converted to and from plain JSON at this boundary.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::domain::{Document, Fields, RemoteError, RemoteResult};
use super::traits::DocumentStore;

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";
const PAGE_SIZE: &str = "300";

/// Everything except RFC 3986 unreserved characters, so an id can never
/// add path segments, a query or a fragment
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::new(format!("http: {}", e))
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl WireDocument {
    /// Last segment of `projects/../documents/<collection>/<id>`
    fn id(&self) -> Option<&str> {
        self.name.rsplit('/').next().filter(|id| !id.is_empty())
    }
}

/// Firestore REST implementation of the document store
pub struct FirestoreStore {
    client: Client,
    documents_url: String,
    api_key: Option<String>,
}

impl FirestoreStore {
    pub fn new(
        project_id: &str,
        api_key: Option<String>,
        database: Option<&str>,
        timeout: Duration,
    ) -> RemoteResult<Self> {
        Self::with_base_url(FIRESTORE_BASE_URL, project_id, api_key, database, timeout)
    }

    /// Point the client at a different API root (emulator, tests)
    pub fn with_base_url(
        base_url: &str,
        project_id: &str,
        api_key: Option<String>,
        database: Option<&str>,
        timeout: Duration,
    ) -> RemoteResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            base_url.trim_end_matches('/'),
            project_id,
            database.unwrap_or(DEFAULT_DATABASE),
        );
        Ok(Self {
            client,
            documents_url,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.documents_url, segment(collection))
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), segment(id))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }
}

fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT_ENCODE_SET).to_string()
}

/// Turn a non-2xx response into a `RemoteError` carrying the body
async fn check_status(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::new(format!("HTTP {}: {}", status, body.trim())))
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list_all(&self, collection: &str) -> RemoteResult<Vec<Document>> {
        let url = self.collection_url(collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .authorize(self.client.get(&url))
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = check_status(request.send().await?).await?;
            let page: ListResponse = response.json().await?;

            for wire in page.documents {
                let id = wire
                    .id()
                    .ok_or_else(|| RemoteError::new("document without a name"))?
                    .to_string();
                documents.push(Document::new(id, decode_fields(&wire.fields)));
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn create(&self, collection: &str, fields: Fields) -> RemoteResult<String> {
        let body = WireDocument {
            name: String::new(),
            fields: encode_fields(&fields),
        };
        let request = self
            .authorize(self.client.post(self.collection_url(collection)))
            .json(&body);

        let response = check_status(request.send().await?).await?;
        let created: WireDocument = response.json().await?;
        created
            .id()
            .map(str::to_string)
            .ok_or_else(|| RemoteError::new("create returned no document name"))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> RemoteResult<()> {
        let request = self.authorize(self.client.delete(self.document_url(collection, id)));
        check_status(request.send().await?).await?;
        Ok(())
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()> {
        let mut request = self
            .authorize(self.client.patch(self.document_url(collection, id)))
            .query(&[("currentDocument.exists", "true")]);
        for path in fields.keys() {
            request = request.query(&[("updateMask.fieldPaths", path.as_str())]);
        }

        let body = WireDocument {
            name: String::new(),
            fields: encode_fields(&fields),
        };
        check_status(request.json(&body).send().await?).await?;
        Ok(())
    }
}

// ========================
// Value conversion
// ========================

/// Plain JSON fields -> Firestore typed fields
pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// Firestore typed fields -> plain JSON fields
pub fn decode_fields(fields: &Map<String, Value>) -> Fields {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            let values: Vec<Value> = values.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Unknown value kinds decode to `null`
pub fn decode_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return Value::Null;
    };

    if let Some(v) = typed.get("stringValue") {
        return v.clone();
    }
    if let Some(v) = typed.get("integerValue") {
        // int64 travels as a decimal string
        return match v {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            Value::Number(_) => v.clone(),
            _ => Value::Null,
        };
    }
    if let Some(v) = typed.get("doubleValue") {
        return v.clone();
    }
    if let Some(v) = typed.get("booleanValue") {
        return v.clone();
    }
    if typed.contains_key("nullValue") {
        return Value::Null;
    }
    for key in ["timestampValue", "referenceValue", "bytesValue"] {
        if let Some(v) = typed.get(key) {
            return v.clone();
        }
    }
    if let Some(v) = typed.get("geoPointValue") {
        return v.clone();
    }
    if let Some(array) = typed.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(map) = typed.get("mapValue") {
        let fields = map
            .get("fields")
            .and_then(Value::as_object)
            .map(decode_fields)
            .unwrap_or_default();
        return Value::Object(fields);
    }
    Value::Null
}
