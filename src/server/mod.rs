//! Line-oriented query server
//!
//! Each line a client sends is one query; the answer is written back as one
//! line followed by the prompt. The safeword ends the session. Every
//! connection runs in its own task, so a slow query only holds up its own
//! client.

use crate::config::ServerConfig;
use crate::evaluator::Evaluator;
use crate::lisp::LispType;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Per-session settings
#[derive(Debug, Clone)]
pub struct Session {
    pub safeword: String,
    pub prompt: String,
}

impl From<&ServerConfig> for Session {
    fn from(config: &ServerConfig) -> Self {
        Self {
            safeword: config.safeword.clone(),
            prompt: config.prompt.clone(),
        }
    }
}

pub struct Server {
    listener: TcpListener,
    evaluator: Evaluator,
    session: Session,
}

impl Server {
    /// Binds the configured address; failure here is a startup error
    pub async fn bind(config: &ServerConfig, evaluator: Evaluator) -> io::Result<Self> {
        let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
        Ok(Self {
            listener,
            evaluator,
            session: Session::from(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Listening on {}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!("Accept failed: {}", e);
                            continue;
                        }
                    };
                    tracing::info!("Client {} connected", peer);

                    let evaluator = self.evaluator.clone();
                    let session = self.session.clone();
                    tokio::spawn(async move {
                        match serve(stream, &evaluator, &session).await {
                            Ok(()) => tracing::info!("Client {} disconnected", peer),
                            Err(e) => tracing::warn!("Client {} dropped: {}", peer, e),
                        }
                    });
                }
            }
        }
    }

    /// Accepts connections forever
    pub async fn run(self) -> io::Result<()> {
        self.run_until(std::future::pending()).await
    }
}

/// Runs one session over any byte stream
///
/// If the client hangs up while a query is running, the query is dropped
/// at its next suspension point and nothing is written.
pub async fn serve<S>(stream: S, evaluator: &Evaluator, session: &Session) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        let Ok(text) = std::str::from_utf8(&line) else {
            tracing::debug!("Rejecting {} bytes of non-UTF-8 input", line.len());
            let answer = LispType::error_reply("syntax-error", "Query is not valid UTF-8");
            let response = format!("{}\n{}", answer, session.prompt);
            writer.write_all(response.as_bytes()).await?;
            writer.flush().await?;
            continue;
        };
        let query = text.trim();

        if query == session.safeword {
            tracing::debug!("Safeword received");
            return Ok(());
        }
        if query.is_empty() {
            writer.write_all(session.prompt.as_bytes()).await?;
            writer.flush().await?;
            continue;
        }

        let evaluation = evaluator.eval_str(query);
        tokio::pin!(evaluation);
        let mut watching = true;

        let answer = loop {
            tokio::select! {
                biased;
                answer = &mut evaluation => break Some(answer),
                buffered = reader.fill_buf(), if watching => match buffered {
                    Ok(bytes) if !bytes.is_empty() => watching = false,
                    _ => break None,
                },
            }
        };

        let Some(answer) = answer else {
            tracing::debug!("Client left during {:?}; query cancelled", query);
            return Ok(());
        };

        let response = format!("{}\n{}", answer, session.prompt);
        writer.write_all(response.as_bytes()).await?;
        writer.flush().await?;
    }
}
