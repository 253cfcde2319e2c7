//! CouchDB-compatible HTTP document store (CouchDB, Cloudant).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::store::{doc_id, Document, DocumentStore, Selector, StoreError, ID_FIELD, REV_FIELD};

pub struct CouchStore {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct WriteResponse {
    id: String,
    rev: String,
}

#[derive(Deserialize)]
struct FindResponse {
    docs: Vec<Document>,
}

impl CouchStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::new(),
            base_url: Url::parse(base_url)?,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status { status: status.as_u16(), body })
    }
}

#[async_trait]
impl DocumentStore for CouchStore {
    async fn get(&self, db: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.url(&[db, id])?;
        let response = self.authorize(self.client.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::check(response).await?.json().await?))
    }

    async fn put(&self, db: &str, mut doc: Document) -> Result<Document, StoreError> {
        let request = match doc_id(&doc) {
            Some(id) => self.client.put(self.url(&[db, id])?),
            None => self.client.post(self.url(&[db])?),
        };
        let response = self.authorize(request).json(&doc).send().await?;
        if response.status() == StatusCode::CONFLICT {
            let id = doc_id(&doc).unwrap_or_default().to_string();
            return Err(StoreError::Conflict { id });
        }
        let written: WriteResponse = Self::check(response).await?.json().await?;
        doc.insert(ID_FIELD.to_string(), Value::String(written.id));
        doc.insert(REV_FIELD.to_string(), Value::String(written.rev));
        Ok(doc)
    }

    async fn delete(&self, db: &str, id: &str, rev: &str) -> Result<bool, StoreError> {
        let mut url = self.url(&[db, id])?;
        url.query_pairs_mut().append_pair("rev", rev);
        let response = self.authorize(self.client.delete(url)).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::CONFLICT => Err(StoreError::Conflict { id: id.to_string() }),
            _ => {
                Self::check(response).await?;
                Ok(true)
            }
        }
    }

    async fn find(&self, db: &str, selector: &Selector, limit: Option<usize>) -> Result<Vec<Document>, StoreError> {
        let mut body = serde_json::json!({ "selector": selector.to_mango() });
        if let Some(limit) = limit {
            body["limit"] = Value::from(limit);
        }
        let url = self.url(&[db, "_find"])?;
        let response = self.authorize(self.client.post(url)).json(&body).send().await?;
        let found: FindResponse = Self::check(response).await?.json().await?;
        Ok(found.docs)
    }
}
