use colored::*;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::assets::{INDEX_HTML, SCRIPT_JS, STYLE_CSS};
use crate::completion::{AnthropicClient, Completer};
use crate::config::ServerConfig;
use crate::error::{ChatError, ChatResult};
use crate::service::ChatService;
use crate::store::{InMemoryStore, MessageStore};

/// Largest request head (request line plus headers) we accept.
pub const MAX_HEAD_BYTES: usize = 16 * 1024;
const MAX_HEADERS: usize = 64;

/// Per-connection bounds on what a client may send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub max_body_bytes: usize,
    /// Time allowed for the whole request, head and body.
    pub read_timeout: Duration,
}

impl Limits {
    pub fn from_config(config: &ServerConfig) -> Self {
        Limits {
            max_body_bytes: config.max_body_bytes,
            read_timeout: config.read_timeout(),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits::from_config(&ServerConfig::default())
    }
}

/// Body of `POST /messages`. Absent or null fields count as missing.
#[derive(Debug, Deserialize)]
pub struct NewMessage {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A parsed request with its full body.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Response {
            status,
            content_type,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Response::new(status, "application/json", value.to_string())
    }

    pub fn error(status: u16, message: &str) -> Self {
        Response::json(status, &json!({ "error": message }))
    }

    pub fn empty(status: u16) -> Self {
        Response::new(status, "text/plain; charset=utf-8", Vec::new())
    }

    /// Serialize as an HTTP/1.1 response that closes the connection.
    pub fn to_bytes(&self) -> Vec<u8> {
        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nAccess-Control-Allow-Methods: GET, POST, OPTIONS\r\nAccess-Control-Allow-Headers: Content-Type\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len(),
        );
        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        408 => "Request Timeout",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Unknown",
    }
}

/// Bind the configured address and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> ChatResult<()> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;

    eprintln!(
        "{}",
        format!("  Chat running at http://localhost:{}", addr.port()).bright_green()
    );
    eprintln!("{}", "  Press Ctrl+C to stop.".bright_blue());
    if config.has_placeholder_key() {
        warn!("no API key configured; every reply will be the fallback message");
    }
    info!(
        %addr,
        model = %config.model,
        remember_conversation = config.remember_conversation,
        enable_tools = config.enable_tools,
        "server started"
    );

    let completer = AnthropicClient::new(&config)?;
    let service = ChatService::new(InMemoryStore::new(), completer)
        .remember_conversation(config.remember_conversation);

    run(listener, Arc::new(service), Limits::from_config(&config)).await
}

/// Accept loop. Each connection is handled on its own task; a failing
/// connection is logged and never stops the loop.
pub async fn run<S, C>(
    listener: TcpListener,
    service: Arc<ChatService<S, C>>,
    limits: Limits,
) -> ChatResult<()>
where
    S: MessageStore + 'static,
    C: Completer + 'static,
{
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, &*service, limits).await {
                error!(%peer, error = %e, "connection error");
            }
        });
    }
}

async fn handle_connection<S: MessageStore, C: Completer>(
    mut stream: TcpStream,
    peer: SocketAddr,
    service: &ChatService<S, C>,
    limits: Limits,
) -> ChatResult<()> {
    let read = tokio::time::timeout(
        limits.read_timeout,
        read_request(&mut stream, limits.max_body_bytes),
    )
    .await
    .unwrap_or_else(|_| {
        Err(ChatError::RequestTimeout {
            secs: limits.read_timeout.as_secs_f64(),
        })
    });

    let response = match read {
        Ok(Some(request)) => {
            debug!(%peer, method = %request.method, path = %request.path, "request");
            route(&request, service).await
        }
        // Client hung up before sending a full request.
        Ok(None) => return Ok(()),
        Err(ChatError::Io(e)) => return Err(ChatError::Io(e)),
        Err(e) => {
            if e.is_client_error() {
                debug!(%peer, error = %e, "rejecting request");
            } else {
                warn!(%peer, error = %e, "request failed");
            }
            Response::error(e.status_code(), &e.to_string())
        }
    };
    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Owned copy of the parts of a request head we need.
#[derive(Debug, PartialEq)]
struct Head {
    method: String,
    path: String,
    content_length: usize,
    len: usize,
}

/// Parse a request head; `Ok(None)` means more bytes are needed.
fn parse_head(buf: &[u8]) -> ChatResult<Option<Head>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let len = match req.parse(buf) {
        Ok(httparse::Status::Complete(n)) => n,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(ChatError::BadRequest(format!("malformed request: {}", e))),
    };

    let content_length = req
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-length"))
        .map(|h| {
            std::str::from_utf8(h.value)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .ok_or_else(|| ChatError::BadRequest("bad Content-Length".into()))
        })
        .transpose()?
        .unwrap_or(0);

    Ok(Some(Head {
        method: req.method.unwrap_or("GET").to_string(),
        path: req.path.unwrap_or("/").to_string(),
        content_length,
        len,
    }))
}

/// Read one request, body included.
pub async fn read_request(
    stream: &mut TcpStream,
    max_body_bytes: usize,
) -> ChatResult<Option<Request>> {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let head = loop {
        if let Some(head) = parse_head(&buf)? {
            break head;
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(ChatError::BadRequest("request head too large".into()));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    if head.content_length > max_body_bytes {
        return Err(ChatError::PayloadTooLarge { limit: max_body_bytes });
    }

    let mut body = buf.split_off(head.len);
    while body.len() < head.content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(head.content_length);

    Ok(Some(Request {
        method: head.method,
        path: head.path,
        body,
    }))
}

const KNOWN_PATHS: &[&str] = &["/", "/index.html", "/script.js", "/style.css", "/messages"];

/// Dispatch a request to its handler.
pub async fn route<S: MessageStore, C: Completer>(
    request: &Request,
    service: &ChatService<S, C>,
) -> Response {
    let path = request.path.split('?').next().unwrap_or("/");

    match (request.method.as_str(), path) {
        ("GET", "/") | ("GET", "/index.html") => {
            Response::new(200, "text/html; charset=utf-8", INDEX_HTML)
        }
        ("GET", "/script.js") => {
            Response::new(200, "application/javascript; charset=utf-8", SCRIPT_JS)
        }
        ("GET", "/style.css") => Response::new(200, "text/css; charset=utf-8", STYLE_CSS),
        ("GET", "/messages") => list_messages(service),
        ("POST", "/messages") => post_message(&request.body, service).await,
        ("OPTIONS", _) => Response::empty(204),
        (_, p) if KNOWN_PATHS.contains(&p) => Response::error(405, "Method not allowed"),
        _ => Response::error(404, "Not found"),
    }
}

fn list_messages<S: MessageStore, C: Completer>(service: &ChatService<S, C>) -> Response {
    match serde_json::to_vec(&service.list()) {
        Ok(body) => Response::new(200, "application/json", body),
        Err(e) => Response::error(500, &e.to_string()),
    }
}

async fn post_message<S: MessageStore, C: Completer>(
    body: &[u8],
    service: &ChatService<S, C>,
) -> Response {
    let new: NewMessage = match serde_json::from_slice(body) {
        Ok(n) => n,
        Err(e) => {
            debug!(error = %e, "rejecting unparseable body");
            let err = ChatError::InvalidBody(e.to_string());
            return Response::error(err.status_code(), &err.to_string());
        }
    };

    let username = new.username.unwrap_or_default();
    let message = new.message.unwrap_or_default();
    match service.submit(&username, &message).await {
        Ok(stored) => match serde_json::to_vec(&stored) {
            Ok(body) => Response::new(200, "application/json", body),
            Err(e) => Response::error(500, &e.to_string()),
        },
        Err(e) => Response::error(e.status_code(), &e.to_string()),
    }
}
