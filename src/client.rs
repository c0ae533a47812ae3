//! Request-file driver
//!
//! Reads human-authored command files (`READ <key>`, `GET <key>`,
//! `PUT <key> <value>`), sends each command to the server and prints the
//! response. Every file gets its own connection.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use thiserror::Error;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::connection::Connection;
use crate::protocol::Command;
use crate::protocol::frame::MAX_TUPLE_LEN;

/// Reasons a request line is skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("missing key")]
    MissingKey,
    #[error("missing value for PUT")]
    MissingValue,
    #[error("unexpected value for {0}")]
    UnexpectedValue(&'static str),
    #[error("tuple of {0} bytes exceeds {} bytes", MAX_TUPLE_LEN)]
    TooLarge(usize),
}

/// Parse one request line.
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<Command>, LineError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let mut parts = line.splitn(3, ' ');
    let name = parts.next().unwrap_or_default();
    let key = match parts.next() {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => return Err(LineError::MissingKey),
    };
    let rest = parts.next();

    let size = key.len() + rest.map_or(0, str::len);
    if size > MAX_TUPLE_LEN {
        return Err(LineError::TooLarge(size));
    }

    let command = match (name, rest) {
        ("READ", None) => Command::Read { key },
        ("GET", None) => Command::Get { key },
        ("READ", Some(_)) => return Err(LineError::UnexpectedValue("READ")),
        ("GET", Some(_)) => return Err(LineError::UnexpectedValue("GET")),
        ("PUT", Some(value)) => Command::Put {
            key,
            value: value.to_string(),
        },
        ("PUT", None) => return Err(LineError::MissingValue),
        (other, _) => return Err(LineError::UnknownCommand(other.to_string())),
    };

    Ok(Some(command))
}

/// Connection to a tuple space server
pub struct Client {
    connection: Connection,
}

impl Client {
    pub async fn connect<A>(addr: A) -> Result<Client>
    where
        A: ToSocketAddrs + fmt::Display,
    {
        let target = addr.to_string();
        let socket = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to {}", target))?;
        Ok(Client {
            connection: Connection::new(socket),
        })
    }

    /// Send one command and wait for its response frame
    pub async fn send(&mut self, command: &Command) -> Result<String> {
        let frame = command.to_frame()?;
        self.connection.write_frame(&frame).await?;

        self.connection
            .read_frame()
            .await?
            .ok_or_else(|| anyhow!("server closed the connection"))
    }
}

/// Replay every request in `path` over a fresh connection
pub async fn run_file(addr: &str, path: &Path) -> Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read request file '{}'", path.display()))?;

    let mut client = Client::connect(addr).await?;
    info!("Processing {} against {}", path.display(), addr);

    for (lineno, line) in contents.lines().enumerate() {
        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!("{}:{}: skipping '{}': {}", path.display(), lineno + 1, line, e);
                continue;
            }
        };

        let response = client.send(&command).await?;
        println!("{}: {}", line, response);
    }

    Ok(())
}

/// Process all files concurrently, one connection each
pub async fn run(addr: &str, files: Vec<PathBuf>) -> Result<()> {
    let mut tasks = JoinSet::new();
    for path in files {
        let addr = addr.to_string();
        tasks.spawn(async move {
            let result = run_file(&addr, &path).await;
            (path, result)
        });
    }

    let mut failed = 0;
    while let Some(joined) = tasks.join_next().await {
        let (path, result) = joined?;
        if let Err(e) = result {
            warn!("{}: {:#}", path.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} request file(s) failed", failed));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("READ a").unwrap(),
            Some(Command::Read { key: "a".to_string() })
        );
        assert_eq!(
            parse_line("GET a\r\n").unwrap(),
            Some(Command::Get { key: "a".to_string() })
        );
        assert_eq!(
            parse_line("PUT a hello world").unwrap(),
            Some(Command::Put {
                key: "a".to_string(),
                value: "hello world".to_string()
            })
        );
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_line_errors() {
        assert_eq!(parse_line("READ"), Err(LineError::MissingKey));
        assert_eq!(parse_line("PUT a"), Err(LineError::MissingValue));
        assert_eq!(parse_line("GET a b"), Err(LineError::UnexpectedValue("GET")));
        assert_eq!(
            parse_line("DELETE a"),
            Err(LineError::UnknownCommand("DELETE".to_string()))
        );
    }

    #[test]
    fn test_parse_line_size_limit() {
        let value = "v".repeat(MAX_TUPLE_LEN - 1);
        let line = format!("PUT k {}", value);
        let command = parse_line(&line).unwrap().unwrap();
        assert_eq!(command.to_frame().unwrap().len(), 7 + MAX_TUPLE_LEN);

        let line = format!("PUT kk {}", value);
        assert_eq!(parse_line(&line), Err(LineError::TooLarge(MAX_TUPLE_LEN + 1)));
    }

    #[test]
    fn test_parse_line_key_size_limit() {
        let key = "k".repeat(MAX_TUPLE_LEN + 10);
        for name in ["READ", "GET"] {
            let line = format!("{} {}", name, key);
            assert_eq!(parse_line(&line), Err(LineError::TooLarge(MAX_TUPLE_LEN + 10)));
        }

        let key = "k".repeat(MAX_TUPLE_LEN);
        assert!(parse_line(&format!("GET {}", key)).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_connect_resolves_host_names() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });
        Client::connect(format!("localhost:{}", port)).await.unwrap();
        accept.await.unwrap().unwrap();
    }

    #[test]
    fn test_parsed_lines_decode_on_the_server() {
        for line in ["READ k", "GET k", "PUT k some value"] {
            let command = parse_line(line).unwrap().unwrap();
            let frame = command.to_frame().unwrap();
            assert_eq!(Command::from_frame(&frame).unwrap(), command);
        }
    }
}
