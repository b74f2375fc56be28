//! JSON-RPC over HTTP/1.1 — the default transport.
//!
//! One [`HttpConnection`] is one keep-alive HTTP/1.1 connection driven by
//! hyper. Requests on it are issued one at a time, which matches how the
//! dispatch engine walks a shard sequentially.

use std::sync::Arc;

use alloy_primitives::U64;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;
use url::{Position, Url};

use crate::error::{RpcError, RpcResult};
use crate::transport::{Connection, Dialer};
use crate::types::{B256, Block, Transaction, TransactionReceipt};

const CLIENT_AGENT: &str = "rpcfan/0.1";

/// Dials `http://` and `https://` endpoints.
#[derive(Clone)]
pub struct HttpDialer {
    tls: Arc<rustls::ClientConfig>,
}

impl HttpDialer {
    /// Create a dialer trusting the Mozilla root certificate store.
    pub fn new() -> RpcResult<Self> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = rustls::ClientConfig::builder_with_provider(
            rustls::crypto::ring::default_provider().into(),
        )
        .with_safe_default_protocol_versions()
        .map_err(|e| RpcError::Tls(format!("tls protocol version error: {e}")))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

        Ok(Self::with_tls_config(Arc::new(config)))
    }

    /// Create a dialer with a caller-built TLS configuration.
    pub fn with_tls_config(tls: Arc<rustls::ClientConfig>) -> Self {
        Self { tls }
    }
}

#[async_trait]
impl Dialer for HttpDialer {
    type Conn = HttpConnection;

    async fn dial(&self, endpoint: &str) -> RpcResult<HttpConnection> {
        let url = Url::parse(endpoint).map_err(|_| RpcError::InvalidEndpoint(endpoint.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| RpcError::InvalidEndpoint(endpoint.to_string()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| RpcError::InvalidEndpoint(endpoint.to_string()))?;

        let use_tls = match url.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(RpcError::InvalidEndpoint(format!(
                    "{endpoint}: unsupported scheme {other}"
                )));
            }
        };

        let tcp = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|e| RpcError::Connect {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        if let Err(e) = tcp.set_nodelay(true) {
            debug!(%endpoint, error = %e, "failed to set TCP_NODELAY");
        }

        let sender = if use_tls {
            let server_name = ServerName::try_from(host.clone())
                .map_err(|e| RpcError::Tls(format!("{host}: {e}")))?;
            let stream = TlsConnector::from(self.tls.clone())
                .connect(server_name, tcp)
                .await
                .map_err(|e| RpcError::Tls(format!("{endpoint}: {e}")))?;
            handshake(stream, endpoint).await?
        } else {
            handshake(tcp, endpoint).await?
        };

        let path = match &url[Position::BeforePath..] {
            "" => "/".to_string(),
            p => p.to_string(),
        };

        Ok(HttpConnection {
            endpoint: endpoint.to_string(),
            authority: url[Position::BeforeHost..Position::AfterPort].to_string(),
            path,
            sender,
            next_id: 0,
        })
    }
}

async fn handshake<I>(io: I, endpoint: &str) -> RpcResult<SendRequest<Full<Bytes>>>
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sender, conn) = http1::handshake(TokioIo::new(io))
        .await
        .map_err(|e| RpcError::Connect {
            endpoint: endpoint.to_string(),
            reason: format!("handshake failed: {e}"),
        })?;

    // Drive the connection in the background.
    let endpoint = endpoint.to_string();
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(%endpoint, error = %e, "rpc connection closed with error");
        }
    });

    Ok(sender)
}

#[derive(Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

/// An open HTTP/1.1 connection to one node.
pub struct HttpConnection {
    endpoint: String,
    authority: String,
    path: String,
    sender: SendRequest<Full<Bytes>>,
    next_id: u64,
}

impl HttpConnection {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue one JSON-RPC call. A `null` result is returned as `None`.
    async fn call<T: DeserializeOwned>(&mut self, method: &str, params: Value) -> RpcResult<Option<T>> {
        self.next_id += 1;
        let body = serde_json::to_vec(&json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": method,
            "params": params,
        }))?;

        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri(self.path.as_str())
            .header(HOST, self.authority.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, CLIENT_AGENT)
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| RpcError::Http(e.to_string()))?;

        self.sender.ready().await?;
        let resp = self.sender.send_request(req).await?;
        let status = resp.status();
        let bytes = resp.into_body().collect().await?.to_bytes();

        if !status.is_success() {
            debug!(endpoint = %self.endpoint, %method, %status, "rpc call non-2xx");
            return Err(RpcError::Status(status.as_u16()));
        }

        let envelope: ResponseEnvelope = serde_json::from_slice(&bytes)?;
        if let Some(err) = envelope.error {
            return Err(RpcError::Node {
                code: err.code,
                message: err.message,
            });
        }
        match envelope.result {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn chain_id(&mut self) -> RpcResult<u64> {
        let id: U64 = self
            .call("eth_chainId", json!([]))
            .await?
            .ok_or_else(|| RpcError::Decode("eth_chainId returned null".to_string()))?;
        Ok(id.to::<u64>())
    }

    async fn block_by_number(&mut self, number: u64) -> RpcResult<Block> {
        self.call("eth_getBlockByNumber", json!([format!("{number:#x}"), true]))
            .await?
            .ok_or_else(|| RpcError::NotFound(format!("block {number}")))
    }

    async fn transaction_by_hash(&mut self, hash: B256) -> RpcResult<Transaction> {
        self.call("eth_getTransactionByHash", json!([hash]))
            .await?
            .ok_or_else(|| RpcError::NotFound(format!("transaction {hash}")))
    }

    async fn transaction_receipt(&mut self, hash: B256) -> RpcResult<TransactionReceipt> {
        self.call("eth_getTransactionReceipt", json!([hash]))
            .await?
            .ok_or_else(|| RpcError::NotFound(format!("receipt {hash}")))
    }
}
