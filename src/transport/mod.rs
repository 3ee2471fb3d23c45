//! How requests reach the platform.
//!
//! The search pipeline only ever issues GETs and needs the status, the
//! content type and the body back, so that is all [Transport] exposes.

use async_trait::async_trait;
use hyper::{body, client::HttpConnector, header::CONTENT_TYPE, Body, Client, Uri};
use hyper_tls::HttpsConnector;

use crate::{Error, Stage};

/// A response, fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
/// Something that can perform a GET. Type signatures may be imposing, but
/// this is an [async_trait].
pub trait Transport: Send + Sync {
    /// GET `uri`. Only failures to get *any* response are errors here;
    /// non-success statuses come back as a [Reply].
    async fn get(&self, uri: &str, stage: Stage) -> Result<Reply, Error>;
}

/// [Transport] over a pooled hyper client with TLS.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let https = HttpsConnector::new();
        Self {
            client: Client::builder().build::<_, Body>(https),
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn get(&self, uri: &str, stage: Stage) -> Result<Reply, Error> {
        let unreachable = |reason: String| Error::Upstream {
            stage,
            status: None,
            reason,
        };

        let uri: Uri = uri.parse().map_err(|e| unreachable(format!("bad request URI: {}", e)))?;
        let mut res = self
            .client
            .get(uri)
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = body::to_bytes(res.body_mut())
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        Ok(Reply {
            status: res.status().as_u16(),
            content_type,
            body: body.to_vec(),
        })
    }
}
