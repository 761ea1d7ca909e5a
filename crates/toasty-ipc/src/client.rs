//! IPC client implementation

use std::path::Path;
use toasty_api::{Command, Request, Response};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::{IpcError, IpcResult};

/// IPC Client for connecting to toastyd
pub struct IpcClient {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    writer: tokio::net::unix::OwnedWriteHalf,
    next_request_id: u64,
}

impl IpcClient {
    /// Connect to toastyd
    pub async fn connect(socket_path: impl AsRef<Path>) -> IpcResult<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            next_request_id: 1,
        })
    }

    /// Send a command and wait for response
    pub async fn send(&mut self, command: Command) -> IpcResult<Response> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let request = Request::new(request_id, command);
        let mut json = serde_json::to_string(&request)?;
        json.push('\n');
        self.send_raw(&json).await?;

        let response = self.read_response().await?;
        if response.request_id != request_id {
            return Err(IpcError::InvalidMessage(format!(
                "response for request {} while waiting for {}",
                response.request_id, request_id
            )));
        }

        Ok(response)
    }

    /// Write an already-encoded line, for tools that build requests by hand
    pub async fn send_raw(&mut self, line: &str) -> IpcResult<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with('\n') {
            self.writer.write_all(b"\n").await?;
        }
        Ok(())
    }

    /// Read the next response line
    pub async fn read_response(&mut self) -> IpcResult<Response> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(IpcError::ConnectionClosed);
        }

        Ok(serde_json::from_str(line.trim())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IpcServer, ServerMessage};
    use std::sync::Arc;
    use toasty_api::{ErrorCode, ResponsePayload};

    /// Answers every ping with pong
    async fn spawn_echo_server(socket_path: &Path) -> Arc<IpcServer> {
        let mut server = IpcServer::new(socket_path);
        server.start().await.unwrap();
        let server = Arc::new(server);

        let mut messages = server.take_message_receiver().await.unwrap();
        let accept = server.clone();
        tokio::spawn(async move {
            let _ = accept.run().await;
        });

        let responder = server.clone();
        tokio::spawn(async move {
            while let Some(msg) = messages.recv().await {
                if let ServerMessage::Request { client_id, request } = msg {
                    let response = match request.command {
                        Command::Ping => Response::success(request.request_id, ResponsePayload::Pong),
                        _ => Response::empty(request.request_id),
                    };
                    let _ = responder.send_response(&client_id, response).await;
                }
            }
        });

        server
    }

    #[tokio::test]
    async fn ping_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("toastyd.sock");
        let _server = spawn_echo_server(&socket_path).await;

        let mut client = IpcClient::connect(&socket_path).await.unwrap();
        let response = client.send(Command::Ping).await.unwrap();
        assert_eq!(response.request_id, 1);
        assert!(response.is_success());
        assert_eq!(response.payload, Some(ResponsePayload::Pong));

        let response = client.send(Command::GetHealth).await.unwrap();
        assert_eq!(response.request_id, 2);
    }

    #[tokio::test]
    async fn malformed_line_gets_indeterminate_error() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("toastyd.sock");
        let _server = spawn_echo_server(&socket_path).await;

        let mut client = IpcClient::connect(&socket_path).await.unwrap();
        client
            .send_raw(r#"{"request_id": 9, "api_version": 1, "command": {"type": "customer_login"}}"#)
            .await
            .unwrap();

        let response = client.read_response().await.unwrap();
        assert_eq!(response.request_id, 9);
        assert_eq!(response.error_code, ErrorCode::Indeterminate);
        assert!(!response.error_message.is_empty());
    }

    #[tokio::test]
    async fn invalid_field_is_rejected_before_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("toastyd.sock");
        let _server = spawn_echo_server(&socket_path).await;

        let mut client = IpcClient::connect(&socket_path).await.unwrap();
        client
            .send_raw(
                r#"{"request_id": 4, "api_version": 1, "command": {"type": "start_bed", "bed_num": 1, "minutes": 0, "customer_id": 3}}"#,
            )
            .await
            .unwrap();

        let response = client.read_response().await.unwrap();
        assert_eq!(response.request_id, 4);
        assert_eq!(response.error_code, ErrorCode::Indeterminate);
    }
}
