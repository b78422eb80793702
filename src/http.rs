//! Plain HTTP access to a device's REST API.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Body of a successful device reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The body parsed as JSON.
    Json(Value),
    /// Anything else, including an empty body.
    Text(String),
}

impl Reply {
    fn from_body(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => Reply::Json(value),
            Err(_) => Reply::Text(body),
        }
    }

    pub(crate) fn decode<T: DeserializeOwned>(self, status: u16) -> Result<T> {
        match self {
            Reply::Json(value) => {
                serde_json::from_value(value.clone()).map_err(|e| {
                    Error::communication(status, format!("{value} ({e})"))
                })
            }
            Reply::Text(body) => Err(Error::communication(status, body)),
        }
    }
}

/// Issues requests against `http://<ip>:<port>/<path>`.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    port: u16,
}

impl HttpClient {
    pub const DEFAULT_PORT: u16 = 80;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(port: u16, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpClient { client, port })
    }

    pub async fn get(&self, ip: IpAddr, path: &str) -> Result<Reply> {
        let url = self.url(ip, path);
        debug!("GET {}", url);
        self.send(self.client.get(url)).await.map(|(_, reply)| reply)
    }

    /// Like [`get`](Self::get), but keeps the status of the successful reply.
    pub(crate) async fn get_with_status(&self, ip: IpAddr, path: &str) -> Result<(u16, Reply)> {
        let url = self.url(ip, path);
        debug!("GET {}", url);
        self.send(self.client.get(url)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, ip: IpAddr, path: &str) -> Result<T> {
        let (status, reply) = self.get_with_status(ip, path).await?;
        reply.decode(status)
    }

    /// `POST` without a body; parameters travel in the query string.
    pub async fn post(&self, ip: IpAddr, path: &str) -> Result<Reply> {
        let url = self.url(ip, path);
        debug!("POST {}", url);
        self.send(self.client.post(url)).await.map(|(_, reply)| reply)
    }

    pub async fn post_form<F>(&self, ip: IpAddr, path: &str, form: &F) -> Result<Reply>
    where
        F: Serialize + ?Sized,
    {
        let url = self.url(ip, path);
        debug!("POST {}", url);
        self.send(self.client.post(url).form(form))
            .await
            .map(|(_, reply)| reply)
    }

    /// Like [`post_form`](Self::post_form), but keeps the status of the successful reply.
    pub(crate) async fn post_form_with_status<F>(
        &self,
        ip: IpAddr,
        path: &str,
        form: &F,
    ) -> Result<(u16, Reply)>
    where
        F: Serialize + ?Sized,
    {
        let url = self.url(ip, path);
        debug!("POST {}", url);
        self.send(self.client.post(url).form(form)).await
    }

    pub async fn post_json<B>(&self, ip: IpAddr, path: &str, body: &B) -> Result<Reply>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(ip, path);
        debug!("POST {}", url);
        self.send(self.client.post(url).json(body))
            .await
            .map(|(_, reply)| reply)
    }

    fn url(&self, ip: IpAddr, path: &str) -> String {
        let addr = SocketAddr::new(ip, self.port);
        format!("http://{}/{}", addr, path.trim_start_matches('/'))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, Reply)> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::communication(status.as_u16(), body));
        }
        Ok((status.as_u16(), Reply::from_body(body)))
    }
}
