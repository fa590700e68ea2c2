// src/clients/common.rs
// HTTP utilities shared between client applications

use std::error::Error;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::defs::USER_ID_HEADER;
use crate::error::ActionState;

/// Connection to a bingo server on behalf of one user
#[derive(Debug, Clone)]
pub struct Connection {
    client: Client,
    base_url: String,
    user_id: String,
}

impl Connection {
    pub fn new(base_url: &str, user_id: &str, timeout_secs: u64) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(USER_ID_HEADER, &self.user_id)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ActionState<T>, Box<dyn Error>> {
        send(self.request(Method::GET, path)).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ActionState<T>, Box<dyn Error>> {
        send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ActionState<T>, Box<dyn Error>> {
        send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ActionState<T>, Box<dyn Error>> {
        send(self.request(Method::PATCH, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ActionState<serde_json::Value>, Box<dyn Error>> {
        send(self.request(Method::DELETE, path)).await
    }

    /// Raw /health document; the only route that is not wrapped in the envelope.
    pub async fn health(&self) -> Result<serde_json::Value, Box<dyn Error>> {
        let response = self.client.get(self.url("/health")).send().await?;
        if !response.status().is_success() {
            return Err(format!("HTTP request failed with status: {}", response.status()).into());
        }
        Ok(response.json().await?)
    }
}

// Every route answers with the envelope, error statuses included. Anything
// else (proxy pages, empty bodies) is reported with the HTTP status.
async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<ActionState<T>, Box<dyn Error>> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<ActionState<T>>(&body) {
        Ok(state) => Ok(state),
        Err(e) if status.is_success() => Err(format!("Malformed response from server: {e}").into()),
        Err(_) => Err(format!("HTTP request failed with status: {status}").into()),
    }
}

/// Unwraps a payload-carrying envelope into its data or its failure message.
pub fn expect_data<T>(state: ActionState<T>) -> Result<T, Box<dyn Error>> {
    state.into_result().map_err(|message| message.into())
}

/// Unwraps an envelope whose payload is irrelevant, keeping the message.
pub fn expect_success<T>(state: ActionState<T>) -> Result<String, Box<dyn Error>> {
    if state.is_success {
        Ok(state.message)
    } else {
        Err(state.message.into())
    }
}
