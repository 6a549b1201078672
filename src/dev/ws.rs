//! WebSocket tunnel
//!
//! The upstream connection is opened before the client upgrade is accepted,
//! so an unreachable backend answers 502/504 instead of an accepted socket
//! that closes immediately.

use axum::{
    extract::{
        ws::{self, WebSocket, WebSocketUpgrade},
        FromRequestParts,
    },
    http::{header, request::Parts},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self, client::IntoClientRequest, http::HeaderValue, protocol::frame::coding::CloseCode,
    },
    MaybeTlsStream, WebSocketStream,
};

use super::proxy::ProxyTarget;
use crate::server::{HostError, HostResult};

type Upstream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Headers copied onto the upstream handshake
const FORWARDED: [&str; 3] = ["cookie", "authorization", "sec-websocket-protocol"];

/// Whether a request asks for a WebSocket upgrade
pub fn is_upgrade(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Connect upstream, then accept the client upgrade and relay frames
pub async fn tunnel(
    target: &ProxyTarget,
    mut parts: Parts,
    timeout: Duration,
) -> HostResult<Response> {
    let upgrade = WebSocketUpgrade::from_request_parts(&mut parts, &())
        .await
        .map_err(|rejection| HostError::BadRequest(rejection.body_text()))?;

    let url = target.ws_url(&parts.uri);
    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| HostError::BadGateway(format!("{}: {}", url, e)))?;

    for name in FORWARDED {
        if let Some(value) = parts.headers.get(name) {
            if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                request.headers_mut().insert(name, value);
            }
        }
    }
    let origin = if target.changes_origin() {
        Some(target.origin())
    } else {
        parts
            .headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    if let Some(origin) = origin {
        let value = HeaderValue::from_str(&origin)
            .map_err(|e| HostError::Internal(format!("Invalid proxy origin: {}", e)))?;
        request.headers_mut().insert("origin", value);
    }

    let (upstream, handshake) = match tokio::time::timeout(timeout, connect_async(request)).await {
        Ok(Ok(connected)) => connected,
        Ok(Err(e)) => return Err(HostError::BadGateway(format!("{}: {}", url, e))),
        Err(_) => return Err(HostError::GatewayTimeout(url)),
    };

    let protocol = handshake
        .headers()
        .get("sec-websocket-protocol")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let upgrade = match protocol {
        Some(protocol) => upgrade.protocols([protocol]),
        None => upgrade,
    };

    tracing::debug!(path = %parts.uri.path(), upstream = %url, "WebSocket tunnel opened");

    let path = parts.uri.path().to_string();
    Ok(upgrade.on_upgrade(move |socket| relay(socket, upstream, path)))
}

/// Pump frames both ways until either side closes
async fn relay(client: WebSocket, upstream: Upstream, path: String) {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let mut to_upstream = tokio::spawn(async move {
        while let Some(Ok(msg)) = client_rx.next().await {
            let closing = matches!(msg, ws::Message::Close(_));
            if upstream_tx.send(into_upstream(msg)).await.is_err() || closing {
                break;
            }
        }
    });

    let mut to_client = tokio::spawn(async move {
        while let Some(Ok(msg)) = upstream_rx.next().await {
            let Some(msg) = into_client(msg) else {
                continue;
            };
            let closing = matches!(msg, ws::Message::Close(_));
            if client_tx.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut to_upstream => to_client.abort(),
        _ = &mut to_client => to_upstream.abort(),
    }

    tracing::debug!(path = %path, "WebSocket tunnel closed");
}

fn into_upstream(msg: ws::Message) -> tungstenite::Message {
    match msg {
        ws::Message::Text(text) => tungstenite::Message::Text(text),
        ws::Message::Binary(data) => tungstenite::Message::Binary(data),
        ws::Message::Ping(data) => tungstenite::Message::Ping(data),
        ws::Message::Pong(data) => tungstenite::Message::Pong(data),
        ws::Message::Close(frame) => tungstenite::Message::Close(frame.map(|f| {
            tungstenite::protocol::CloseFrame {
                code: CloseCode::from(f.code),
                reason: f.reason,
            }
        })),
    }
}

/// Raw frames never surface from a read; they are dropped
fn into_client(msg: tungstenite::Message) -> Option<ws::Message> {
    Some(match msg {
        tungstenite::Message::Text(text) => ws::Message::Text(text),
        tungstenite::Message::Binary(data) => ws::Message::Binary(data),
        tungstenite::Message::Ping(data) => ws::Message::Ping(data),
        tungstenite::Message::Pong(data) => ws::Message::Pong(data),
        tungstenite::Message::Close(frame) => ws::Message::Close(frame.map(|f| ws::CloseFrame {
            code: u16::from(f.code),
            reason: f.reason,
        })),
        tungstenite::Message::Frame(_) => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_frames_keep_code_and_reason() {
        let msg = into_upstream(ws::Message::Close(Some(ws::CloseFrame {
            code: 1001,
            reason: "going away".into(),
        })));
        match msg {
            tungstenite::Message::Close(Some(frame)) => {
                assert_eq!(u16::from(frame.code), 1001);
                assert_eq!(frame.reason, "going away");
            }
            other => panic!("unexpected message: {:?}", other),
        }

        let back = into_client(tungstenite::Message::Close(None)).unwrap();
        assert!(matches!(back, ws::Message::Close(None)));
    }

    #[test]
    fn test_data_frames_pass_through() {
        assert!(matches!(
            into_client(tungstenite::Message::Text("hi".into())),
            Some(ws::Message::Text(t)) if t == "hi"
        ));
        assert!(matches!(
            into_upstream(ws::Message::Binary(vec![1, 2])),
            tungstenite::Message::Binary(b) if b == vec![1, 2]
        ));
    }
}
