//! Gateway - WebSocket listener that runs the admission gate per connection.
//!
//! The Gateway binds a socket (optionally TLS), upgrades each client to a
//! WebSocket, waits for its auth frame, asks the [`ConnectionGate`] for a
//! decision and either hands the session off or refuses it.

use super::handoff::{AdmittedSession, SessionHandoff};
use super::handshake::HandshakeParts;
use super::protocol::{ClientFrame, ServerFrame};
use crate::config::{ListenConfig, TlsConfig};
use crate::error::Rejection;
use crate::gate::{ConnectionGate, ConnectionRequest, LiveConnection};
use crate::telemetry::spans;
use futures_util::{SinkExt, Stream, StreamExt};
use rustls_pemfile::{certs, pkcs8_private_keys};
use std::io::{BufReader, Cursor};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{Instrument, debug, error, info, instrument, trace, warn};

/// Capacity of the per-session frame channels.
const SESSION_CHANNEL_SIZE: usize = 64;

/// Most frames buffered while the gate is deciding.
const MAX_PENDING_FRAMES: usize = 256;
/// Most bytes buffered while the gate is deciding.
const MAX_PENDING_BYTES: usize = 1024 * 1024;

/// State shared by every connection task.
struct Shared {
    listen: ListenConfig,
    gate: ConnectionGate,
    handoff: Arc<dyn SessionHandoff>,
}

/// The Gateway accepts incoming connections and spawns a task per client.
pub struct Gateway {
    listener: TcpListener,
    tls_acceptor: Option<TlsAcceptor>,
    shared: Arc<Shared>,
}

impl Gateway {
    /// Bind the gateway to the configured address.
    pub async fn bind(
        listen: ListenConfig,
        tls_config: Option<TlsConfig>,
        gate: ConnectionGate,
        handoff: Arc<dyn SessionHandoff>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(listen.address).await?;
        let tls_acceptor = match tls_config {
            Some(tls_cfg) => Some(Self::load_tls(&tls_cfg)?),
            None => None,
        };
        info!(
            address = %listener.local_addr()?,
            tls = tls_acceptor.is_some(),
            "WebSocket listener bound"
        );

        Ok(Self {
            listener,
            tls_acceptor,
            shared: Arc::new(Shared {
                listen,
                gate,
                handoff,
            }),
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Load TLS certificates and create TlsAcceptor.
    fn load_tls(config: &TlsConfig) -> anyhow::Result<TlsAcceptor> {
        let cert_file = std::fs::read(&config.cert_path)?;
        let cert_reader = &mut BufReader::new(Cursor::new(cert_file));
        let certs: Vec<CertificateDer> = certs(cert_reader).collect::<Result<Vec<_>, _>>()?;

        if certs.is_empty() {
            anyhow::bail!("No certificates found in {}", config.cert_path);
        }

        let key_file = std::fs::read(&config.key_path)?;
        let key_reader = &mut BufReader::new(Cursor::new(key_file));
        let mut keys: Vec<PrivateKeyDer> = pkcs8_private_keys(key_reader)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(PrivateKeyDer::from)
            .collect();

        if keys.is_empty() {
            anyhow::bail!("No private keys found in {}", config.key_path);
        }

        let key = keys.remove(0);

        let tls_config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)?;

        Ok(TlsAcceptor::from(Arc::new(tls_config)))
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let shared = Arc::clone(&self.shared);
                    let acceptor = self.tls_acceptor.clone();
                    let connection = Arc::new(LiveConnection::new());
                    let span = spans::connection(connection.id(), addr);

                    tokio::spawn(
                        async move {
                            crate::metrics::connection_opened();
                            let result = match acceptor {
                                Some(acceptor) => match acceptor.accept(stream).await {
                                    Ok(tls_stream) => {
                                        serve(tls_stream, connection.clone(), shared).await
                                    }
                                    Err(e) => {
                                        warn!(error = %e, "TLS handshake failed");
                                        Ok(())
                                    }
                                },
                                None => serve(stream, connection.clone(), shared).await,
                            };
                            connection.close();
                            crate::metrics::connection_closed();
                            if let Err(e) = result {
                                debug!(error = %e, "Connection ended with error");
                            }
                            debug!("Connection closed");
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

/// Result of waiting for the client's auth frame.
enum AuthFrame {
    Token(String),
    Invalid,
    Closed,
}

/// Why the early-frame watcher stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EarlyStop {
    ClientLeft,
    Overflow,
}

/// Frames that arrived before the decision, bounded by count and size.
#[derive(Debug, Default)]
struct PendingFrames {
    frames: Vec<Vec<u8>>,
    bytes: usize,
}

impl PendingFrames {
    /// Buffer `frame`; false when it would exceed either bound.
    fn push(&mut self, frame: Vec<u8>) -> bool {
        if self.frames.len() >= MAX_PENDING_FRAMES
            || self.bytes + frame.len() > MAX_PENDING_BYTES
        {
            return false;
        }
        self.bytes += frame.len();
        self.frames.push(frame);
        true
    }
}

/// Drive one client from upgrade to hand-off or refusal.
async fn serve<S>(
    stream: S,
    connection: Arc<LiveConnection>,
    shared: Arc<Shared>,
) -> Result<(), WsError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let listen = &shared.listen;
    let mut parts = None;
    let callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let origin = req
            .headers()
            .get(http::header::ORIGIN)
            .and_then(|o| o.to_str().ok());
        if !listen.origin_allowed(origin) {
            warn!(origin = ?origin, "WebSocket CORS rejected");
            let mut denied = ErrorResponse::new(Some("CORS origin not allowed".to_string()));
            *denied.status_mut() = http::StatusCode::FORBIDDEN;
            return Err(denied);
        }
        parts = Some(HandshakeParts::from_request(req));
        Ok(response)
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let HandshakeParts { cookie, params } = parts.unwrap_or_default();
    let (mut sink, mut source) = ws_stream.split();

    let token = match tokio::time::timeout(listen.auth_timeout(), read_auth(&mut source)).await {
        Ok(AuthFrame::Token(token)) => Some(token),
        Ok(AuthFrame::Invalid) => None,
        Ok(AuthFrame::Closed) => {
            debug!("Client left before authenticating");
            return Ok(());
        }
        Err(_) => {
            debug!("Auth frame timed out");
            None
        }
    };

    let request = ConnectionRequest::new(cookie, token, params);
    let mut pending = PendingFrames::default();
    let decision = tokio::select! {
        decision = shared.gate.authorize_until_closed(&request, &connection) => decision,
        stop = watch_for_close(&mut source, &connection, &mut pending) => {
            if stop == EarlyStop::Overflow {
                return refuse(&mut sink).await;
            }
            None
        }
    };

    let user = match decision {
        None => return Ok(()),
        Some(Err(_)) => return refuse(&mut sink).await,
        Some(Ok(user)) => user,
    };

    let scope = connection.capability();
    sink.send(Message::Text(ServerFrame::Authenticated { scope }.to_json()))
        .await?;

    // The receiver is handed over only after the replay, so it must all fit.
    let (inbound_tx, inbound_rx) = mpsc::channel(SESSION_CHANNEL_SIZE.max(pending.frames.len()));
    let (outbound_tx, mut outbound_rx) = mpsc::channel(SESSION_CHANNEL_SIZE);
    for frame in pending.frames {
        if inbound_tx.try_send(frame).is_err() {
            break;
        }
    }
    shared
        .handoff
        .admit(AdmittedSession {
            connection: connection.clone(),
            user,
            request,
            inbound: inbound_rx,
            outbound: outbound_tx,
        })
        .await;

    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Binary(data))) => {
                    if inbound_tx.send(data).await.is_err() {
                        debug!("Sync engine released the session");
                        break;
                    }
                }
                Some(Ok(Message::Text(_))) => trace!("Ignoring text frame after admission"),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket read failed");
                    break;
                }
            },
            outgoing = outbound_rx.recv() => match outgoing {
                Some(data) => sink.send(Message::Binary(data)).await?,
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }
    Ok(())
}

/// Wait for the first meaningful client frame.
async fn read_auth<St>(source: &mut St) -> AuthFrame
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                return match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(ClientFrame::Auth { token }) => AuthFrame::Token(token),
                    Err(e) => {
                        debug!(error = %e, "Undecodable auth frame");
                        AuthFrame::Invalid
                    }
                };
            }
            Ok(Message::Binary(_)) => return AuthFrame::Invalid,
            Ok(Message::Close(_)) | Err(_) => return AuthFrame::Closed,
            Ok(_) => {}
        }
    }
    AuthFrame::Closed
}

/// Buffer frames while the gate runs.
///
/// Closes the connection when the client leaves or the buffer overflows,
/// which abandons the pending decision.
async fn watch_for_close<St>(
    source: &mut St,
    connection: &LiveConnection,
    pending: &mut PendingFrames,
) -> EarlyStop
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let mut stop = EarlyStop::ClientLeft;
    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Binary(data)) => {
                if !pending.push(data) {
                    warn!(
                        frames = pending.frames.len(),
                        bytes = pending.bytes,
                        "Too many frames before admission"
                    );
                    stop = EarlyStop::Overflow;
                    break;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
    connection.close();
    stop
}

/// Tell the client it was refused, without the reason, and close.
async fn refuse<Si>(sink: &mut Si) -> Result<(), WsError>
where
    Si: futures_util::Sink<Message, Error = WsError> + Unpin,
{
    let denied = ServerFrame::PermissionDenied {
        reason: Rejection::CLIENT_MESSAGE,
    };
    sink.send(Message::Text(denied.to_json())).await?;
    sink.send(Message::Close(Some(CloseFrame {
        code: CloseCode::Policy,
        reason: Rejection::CLIENT_MESSAGE.into(),
    })))
    .await
}
