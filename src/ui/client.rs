use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::db::query::ListParams;
use crate::models::{ApiResponse, CreateTodoRequest, PageMeta, Todo, UpdateTodoRequest};
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        errors: Option<ValidationErrors>,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// One page of the list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoPage {
    pub items: Vec<Todo>,
    pub meta: PageMeta,
}

#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list(&self, params: &ListParams) -> Result<TodoPage, ClientError>;
    async fn get(&self, id: i64) -> Result<Todo, ClientError>;
    async fn create(&self, req: &CreateTodoRequest) -> Result<Todo, ClientError>;
    async fn update(&self, id: i64, req: &UpdateTodoRequest) -> Result<Todo, ClientError>;
    async fn delete(&self, id: i64) -> Result<(), ClientError>;
}

/// Talks to the proxy (or the API directly) over HTTP.
pub struct HttpTodoApi {
    client: Client,
    base_url: String,
}

impl HttpTodoApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ClientError> {
        let response = request.header(ACCEPT, "application/json").send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let envelope: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message: format!("Request failed ({})", status.as_u16()),
                    errors: None,
                });
            }
            Err(e) => return Err(ClientError::Decode(e.to_string())),
        };

        if !status.is_success() || !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("Request failed ({})", status.as_u16())),
                errors: envelope.errors,
            });
        }

        Ok(envelope)
    }
}

fn require_data<T>(envelope: ApiResponse<T>) -> Result<T, ClientError> {
    envelope
        .data
        .ok_or_else(|| ClientError::Decode("response carries no data".to_string()))
}

#[async_trait]
impl TodoApi for HttpTodoApi {
    async fn list(&self, params: &ListParams) -> Result<TodoPage, ClientError> {
        let mut url = self.url("/todos")?;
        {
            let mut pairs = url.query_pairs_mut();
            let fields = [
                ("status", &params.status),
                ("priority", &params.priority),
                ("search", &params.search),
                ("sort", &params.sort),
                ("page", &params.page),
                ("per_page", &params.per_page),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    pairs.append_pair(key, value);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let envelope = self.send::<Vec<Todo>>(self.client.get(url)).await?;
        let meta = envelope
            .meta
            .ok_or_else(|| ClientError::Decode("list response carries no meta".to_string()))?;

        Ok(TodoPage {
            items: envelope.data.unwrap_or_default(),
            meta,
        })
    }

    async fn get(&self, id: i64) -> Result<Todo, ClientError> {
        let url = self.url(&format!("/todos/{}", id))?;
        require_data(self.send(self.client.get(url)).await?)
    }

    async fn create(&self, req: &CreateTodoRequest) -> Result<Todo, ClientError> {
        let url = self.url("/todos")?;
        require_data(self.send(self.client.post(url).json(req)).await?)
    }

    async fn update(&self, id: i64, req: &UpdateTodoRequest) -> Result<Todo, ClientError> {
        let url = self.url(&format!("/todos/{}", id))?;
        require_data(self.send(self.client.patch(url).json(req)).await?)
    }

    async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let url = self.url(&format!("/todos/{}", id))?;
        self.send::<serde_json::Value>(self.client.delete(url)).await?;
        Ok(())
    }
}
