//! Integration tests for the query server
//!
//! A server is bound to an ephemeral port and driven over real TCP
//! connections.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wikipediabase::config::{Config, ServerConfig};
use wikipediabase::evaluator::Evaluator;
use wikipediabase::fetcher::MemoryFetcher;
use wikipediabase::server::Server;
use wikipediabase::Knowledgebase;

const PROMPT: &str = "\n> ";

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

/// Starts a server over the fixture pages on an ephemeral port
async fn start_server() -> Running {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let fetcher = MemoryFetcher::from_dir("https://en.wikipedia.org/w/", &fixtures)
        .expect("Failed to load fixtures");
    let kb = Knowledgebase::new(&Config::default(), Arc::new(fetcher));

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    };
    let server = Server::bind(&config, Evaluator::new(Arc::new(kb)))
        .await
        .expect("Failed to bind");
    let addr = server.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_until(async {
        let _ = stopped.await;
    }));
    Running { addr, stop, handle }
}

/// Reads until the prompt arrives and returns what came before it
async fn read_answer(stream: &mut TcpStream) -> String {
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    while !received.ends_with(PROMPT.as_bytes()) {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before the prompt");
        received.extend_from_slice(&buf[..n]);
    }
    let text = String::from_utf8(received).unwrap();
    text[..text.len() - PROMPT.len()].to_string()
}

#[tokio::test]
async fn test_query_round_trip() {
    let running = start_server().await;
    let mut stream = TcpStream::connect(running.addr).await.unwrap();

    stream
        .write_all(b"(get \"wikipedia-mountain\" \"Mount Everest\" (:code \"ELEVATION_M\"))\n")
        .await
        .unwrap();
    assert_eq!(read_answer(&mut stream).await, "((:html \"8848\"))\n");

    stream
        .write_all(b"(sort-symbols \"Mary Shakespeare\" \"Batman\")\n")
        .await
        .unwrap();
    assert_eq!(
        read_answer(&mut stream).await,
        "(\"Batman\" \"Mary Shakespeare\")\n"
    );

    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_safeword_closes_session() {
    let running = start_server().await;
    let mut stream = TcpStream::connect(running.addr).await.unwrap();

    stream.write_all(b"quit\n").await.unwrap();
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());

    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_clients_are_independent() {
    let running = start_server().await;
    let mut first = TcpStream::connect(running.addr).await.unwrap();
    let mut second = TcpStream::connect(running.addr).await.unwrap();

    second
        .write_all(b"(get \"wikibase-term\" \"Black Sea\" \"COORDINATES\")\n")
        .await
        .unwrap();
    first.write_all(b"(frobnicate)\n").await.unwrap();

    assert_eq!(
        read_answer(&mut first).await,
        "(:error unknown-op :reply \"Unknown operation: frobnicate\")\n"
    );
    assert_eq!(read_answer(&mut second).await, "((:coordinates 44 35))\n");

    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_port_in_use_fails_to_bind() {
    let running = start_server().await;
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: running.addr.port(),
        ..ServerConfig::default()
    };
    let kb = Knowledgebase::new(
        &Config::default(),
        Arc::new(MemoryFetcher::new("https://en.wikipedia.org/w/")),
    );

    let result = Server::bind(&config, Evaluator::new(Arc::new(kb))).await;
    assert!(result.is_err());

    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

/// Reads until `count` prompts have arrived and returns the answers before each
async fn read_answers(stream: &mut TcpStream, count: usize) -> Vec<String> {
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    let prompts = |bytes: &[u8]| bytes.windows(PROMPT.len()).filter(|w| *w == PROMPT.as_bytes()).count();
    while prompts(&received) < count {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before {} prompts", count);
        received.extend_from_slice(&buf[..n]);
    }
    let text = String::from_utf8(received).unwrap();
    text.split_terminator(PROMPT).map(str::to_string).collect()
}

#[tokio::test]
async fn test_invalid_utf8_line_keeps_connection() {
    let running = start_server().await;
    let mut stream = TcpStream::connect(running.addr).await.unwrap();

    stream
        .write_all(b"\xff\xfe\n(get-classes \"Batman\")\n")
        .await
        .unwrap();
    let answers = read_answers(&mut stream, 2).await;
    assert_eq!(
        answers[0],
        "(:error syntax-error :reply \"Query is not valid UTF-8\")\n"
    );
    assert!(answers[1].contains("\"wikipedia-comics-character\""), "{}", answers[1]);

    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_hostile_lines_are_answered() {
    let running = start_server().await;
    let mut stream = TcpStream::connect(running.addr).await.unwrap();

    stream.write_all(b"(get \"Batman\n").await.unwrap();
    assert!(read_answer(&mut stream).await.starts_with("(:error syntax-error"));

    stream
        .write_all(b"(:yyyymmdd -9223372036854775808)\n")
        .await
        .unwrap();
    assert!(read_answer(&mut stream).await.starts_with("(:error no-date-found"));

    stream
        .write_all(b"(get \"wikibase-term\" \"Black Sea\" 99999999999999999999)\n")
        .await
        .unwrap();
    assert!(read_answer(&mut stream).await.starts_with("(:error"));

    // Still serving after all of the above.
    stream
        .write_all(b"(get \"wikibase-term\" \"Black Sea\" \"COORDINATES\")\n")
        .await
        .unwrap();
    assert_eq!(read_answer(&mut stream).await, "((:coordinates 44 35))\n");

    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}
