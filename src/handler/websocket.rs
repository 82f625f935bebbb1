//! WebSocket echo module
//!
//! Completes the upgrade handshake on `/ws`, then runs a connection-scoped
//! loop that answers every message with `"Echo: " + message`.

use crate::http;
use crate::logger;
use futures_util::{SinkExt, StreamExt};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONNECTION, SEC_WEBSOCKET_ACCEPT, SEC_WEBSOCKET_KEY, UPGRADE};
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

const ECHO_PREFIX: &str = "Echo: ";

/// Handle `/ws`: answer the handshake and spawn the echo loop
pub fn handle_websocket(mut req: Request<hyper::body::Incoming>) -> Response<Full<Bytes>> {
    let Some(accept) = accept_key(&req) else {
        logger::log_warning("Rejected /ws request without a WebSocket upgrade");
        return http::build_text_response(StatusCode::BAD_REQUEST, "Bad Request", None);
    };

    tokio::spawn(async move {
        match hyper::upgrade::on(&mut req).await {
            Ok(upgraded) => {
                let ws =
                    WebSocketStream::from_raw_socket(TokioIo::new(upgraded), Role::Server, None)
                        .await;
                logger::log_websocket_opened();
                echo_messages(ws).await;
            }
            Err(e) => logger::log_error(&format!("WebSocket upgrade failed: {e}")),
        }
    });

    let builder = Response::builder()
        .status(StatusCode::SWITCHING_PROTOCOLS)
        .header(UPGRADE, HeaderValue::from_static("websocket"))
        .header(CONNECTION, HeaderValue::from_static("Upgrade"))
        .header(SEC_WEBSOCKET_ACCEPT, accept)
        .header("Access-Control-Allow-Origin", "*");
    http::response::finish(builder, StatusCode::SWITCHING_PROTOCOLS, Bytes::new())
}

/// `Sec-WebSocket-Accept` for a valid upgrade request, `None` otherwise
fn accept_key<B>(req: &Request<B>) -> Option<String> {
    let headers = req.headers();
    let wants_websocket = headers
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"));
    if !wants_websocket {
        return None;
    }
    let key = headers.get(SEC_WEBSOCKET_KEY)?;
    Some(derive_accept_key(key.as_bytes()))
}

/// Echo loop over an established WebSocket
///
/// Ends on close, on a read error, or when a reply cannot be sent.
pub async fn echo_messages<S>(mut ws: WebSocketStream<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(incoming) = ws.next().await {
        let text = match incoming {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Binary(data)) => String::from_utf8_lossy(&data).into_owned(),
            Ok(Message::Close(_)) => {
                logger::log_websocket_closed("closed by peer");
                return;
            }
            // Ping/pong are answered by the protocol layer
            Ok(_) => continue,
            Err(e) => {
                logger::log_websocket_closed(&format!("error receiving message: {e}"));
                return;
            }
        };

        logger::log_websocket_message(&text);
        if let Err(e) = ws.send(Message::text(format!("{ECHO_PREFIX}{text}"))).await {
            logger::log_websocket_closed(&format!("error sending message: {e}"));
            return;
        }
    }
    logger::log_websocket_closed("stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pair() -> (
        WebSocketStream<tokio::io::DuplexStream>,
        WebSocketStream<tokio::io::DuplexStream>,
    ) {
        let (client_io, server_io) = tokio::io::duplex(4096);
        let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        let server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        (client, server)
    }

    #[tokio::test]
    async fn test_echo_text_messages() {
        let (mut client, server) = pair().await;
        let echo = tokio::spawn(echo_messages(server));

        for msg in ["hello", "", "second message"] {
            client.send(Message::text(msg)).await.unwrap();
            let reply = client.next().await.unwrap().unwrap();
            assert_eq!(reply, Message::text(format!("Echo: {msg}")));
        }

        client.close(None).await.unwrap();
        echo.await.unwrap();
    }

    #[tokio::test]
    async fn test_echo_binary_as_text() {
        let (mut client, server) = pair().await;
        let echo = tokio::spawn(echo_messages(server));

        client
            .send(Message::binary(b"raw bytes".to_vec()))
            .await
            .unwrap();
        let reply = client.next().await.unwrap().unwrap();
        assert_eq!(reply, Message::text("Echo: raw bytes"));

        drop(client);
        echo.await.unwrap();
    }

    #[test]
    fn test_accept_key() {
        // RFC 6455 section 1.3 sample handshake
        let req = Request::get("/ws")
            .header(UPGRADE, "websocket")
            .header(CONNECTION, "Upgrade")
            .header(SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
            .body(())
            .unwrap();
        assert_eq!(
            accept_key(&req).as_deref(),
            Some("s3pPLMBiTxaQ9kYGzzhZRbK+xOo=")
        );
    }

    #[test]
    fn test_plain_request_has_no_accept_key() {
        let req = Request::get("/ws").body(()).unwrap();
        assert_eq!(accept_key(&req), None);

        let req = Request::get("/ws")
            .header(UPGRADE, "h2c")
            .header(SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
            .body(())
            .unwrap();
        assert_eq!(accept_key(&req), None);
    }
}
