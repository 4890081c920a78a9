//! Connection handling
//!
//! One request per connection: read the head, run it through the middleware
//! pipeline on the blocking pool (existence checks and file reads are
//! synchronous), write the response and close.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::handlers::error_response;
use crate::error::{ProtocolError, ServerError};
use crate::middleware::Pipeline;
use crate::middleware::logging::{log_connection, log_rejected, log_request, log_response};
use crate::protocol::{Response, parse_request_head};

/// Read lines up to the blank line ending the request head.
///
/// `Ok(None)` if the client closed the connection before sending anything.
pub async fn read_request_head<R>(
    reader: &mut BufReader<R>,
    max_bytes: usize,
) -> Result<Option<String>, ServerError>
where
    R: AsyncRead + Unpin,
{
    let mut head = String::new();
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            if head.is_empty() {
                return Ok(None);
            }
            break;
        }

        if head.len() + line.len() > max_bytes {
            return Err(ProtocolError::HeadTooLarge(max_bytes).into());
        }

        if line == "\r\n" || line == "\n" {
            if head.is_empty() {
                // tolerate stray blank lines before the request line
                continue;
            }
            break;
        }
        head.push_str(&line);
    }

    Ok(Some(head))
}

pub async fn handle_connection(
    stream: TcpStream,
    client_addr: SocketAddr,
    pipeline: Arc<Pipeline>,
    max_request_bytes: usize,
) -> Result<(), ServerError> {
    log_connection(&client_addr);
    let mut reader = BufReader::new(stream);

    let head = match read_request_head(&mut reader, max_request_bytes).await {
        Ok(Some(head)) => head,
        Ok(None) => return Ok(()),
        Err(ServerError::Protocol(e)) => {
            return reject(reader.into_inner(), &client_addr, &e).await;
        }
        Err(e) => return Err(e),
    };

    let mut request = match parse_request_head(&head) {
        Ok(request) => request,
        Err(e) => return reject(reader.into_inner(), &client_addr, &e).await,
    };
    log_request(&client_addr, &request);

    let head_only = request.is_head();
    let (request, response) = tokio::task::spawn_blocking(move || {
        let response = pipeline.dispatch(&mut request);
        (request, response)
    })
    .await?;
    log_response(&client_addr, &request, response.status());

    write_response(reader.into_inner(), &response, head_only).await
}

async fn reject(
    stream: TcpStream,
    client_addr: &SocketAddr,
    err: &ProtocolError,
) -> Result<(), ServerError> {
    let response = error_response(err);
    log_rejected(client_addr, response.status(), &err.to_string());
    write_response(stream, &response, false).await
}

async fn write_response(
    mut stream: TcpStream,
    response: &Response,
    head_only: bool,
) -> Result<(), ServerError> {
    stream.write_all(&response.to_bytes(head_only)).await?;
    stream.flush().await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_until_blank_line() {
        let input: &[u8] = b"\r\nGET /a.js HTTP/1.1\r\nHost: x\r\n\r\nignored body";
        let mut reader = BufReader::new(input);
        let head = read_request_head(&mut reader, 1024).await.unwrap().unwrap();
        assert_eq!(head, "GET /a.js HTTP/1.1\r\nHost: x\r\n");
    }

    #[tokio::test]
    async fn test_closed_before_request() {
        let input: &[u8] = b"";
        let mut reader = BufReader::new(input);
        assert!(read_request_head(&mut reader, 1024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_head_rejected() {
        let input = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(100));
        let mut reader = BufReader::new(input.as_bytes());
        let err = read_request_head(&mut reader, 32).await.unwrap_err();
        assert!(matches!(err, ServerError::Protocol(ProtocolError::HeadTooLarge(32))));
    }
}
