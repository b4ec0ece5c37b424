//! Shared utilities for integration testing.
//!
//! The mock server answers both origin-form requests (direct connections) and
//! absolute-form requests (sent through it as an HTTP forward proxy), so one
//! listener can stand in for the node, the name API and a working proxy.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use aptos_name_minter::blockchain::{AccountClient, ChainGateway, SigningIdentity};
use aptos_name_minter::config::NodeConfig;
use aptos_name_minter::proxy::{Proxy, ProxyPool};

pub const TEST_KEY: &str = "9bf49a6a0755f953811fce125f2683d50429c3bb49e074147e0089a52eae155f";
pub const OTHER_KEY: &str = "0101010101010101010101010101010101010101010101010101010101010101";

/// A request as seen by the mock, with the path percent-decoded.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MockRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let _ = serve(socket, f.as_ref()).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn serve<F>(mut socket: TcpStream, f: &F) -> std::io::Result<()>
where
    F: Fn(MockRequest) -> (u16, String),
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    let request = MockRequest {
        method,
        path: percent_decode(origin_path(target)),
        headers,
        body,
    };
    let (status, body) = f(request);

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason(status),
        body.len(),
        body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    Ok(())
}

/// Strip scheme and authority from an absolute-form request target.
fn origin_path(target: &str) -> &str {
    match target.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => target,
    }
}

fn percent_decode(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(v) = path.get(i + 1..i + 3).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 | 202 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        407 => "Proxy Authentication Required",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

/// A proxy on a port nothing listens on.
pub fn dead_proxy() -> Proxy {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Proxy::new("127.0.0.1", port)
}

/// Use a running mock as an HTTP forward proxy.
pub fn proxy_at(addr: SocketAddr) -> Proxy {
    Proxy::new("127.0.0.1", addr.port())
}

/// Node settings pointing at `addr` with a fast, small polling budget.
pub fn node_config(addr: SocketAddr) -> NodeConfig {
    NodeConfig {
        url: format!("http://{}/v1", addr),
        chain_id: Some(1),
        request_timeout_secs: 5,
        poll_interval_ms: 10,
        max_poll_attempts: 5,
        ..NodeConfig::default()
    }
}

pub fn gateway() -> ChainGateway {
    ChainGateway::new(Duration::from_secs(5)).unwrap()
}

pub fn identity() -> SigningIdentity {
    SigningIdentity::from_private_key(TEST_KEY).unwrap()
}

/// Direct (unproxied) client for the test identity.
pub fn direct_account(config: &NodeConfig) -> AccountClient {
    AccountClient::new(identity(), None, &ProxyPool::default(), gateway(), config)
}

pub fn coin_info_body(decimals: u8) -> String {
    format!(
        r#"{{"type":"0x1::coin::CoinInfo<0x1::aptos_coin::AptosCoin>","data":{{"decimals":{},"name":"Aptos Coin","symbol":"APT"}}}}"#,
        decimals
    )
}

pub fn coin_store_body(value: u64) -> String {
    format!(
        r#"{{"type":"0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>","data":{{"coin":{{"value":"{}"}}}}}}"#,
        value
    )
}

pub fn pending_body(hash: &str) -> String {
    format!(r#"{{"type":"pending_transaction","hash":"{}"}}"#, hash)
}

pub fn success_body(hash: &str, version: u64) -> String {
    format!(
        r#"{{"type":"user_transaction","hash":"{}","success":true,"vm_status":"Executed successfully","version":"{}"}}"#,
        hash, version
    )
}
