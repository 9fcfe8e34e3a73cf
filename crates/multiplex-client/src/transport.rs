//! Async transport for the client.
//!
//! Thin layer over any `AsyncRead + AsyncWrite` stream — a real serial port,
//! or a [`tokio::io::duplex`] half in tests — that just sends/receives
//! frames. Protocol logic (what a register read/write/tunnel push looks
//! like) stays in the sans-IO [`crate::builder`] functions, the same split
//! `lockframe-client` draws between its QUIC transport and its sans-IO
//! `Client`.

use multiplex::{Frame, ProtocolError, Subframe, Value};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{builder, error::ClientError};

const READ_CHUNK: usize = 256;

/// A connected Multiplex client driving `stream`.
pub struct Client<S> {
    stream: S,
    source_id: u8,
    read_buf: Vec<u8>,
    max_payload: usize,
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap `stream`, identifying outgoing frames as coming from
    /// `source_id` and rejecting incoming frames whose payload exceeds
    /// `max_payload`.
    pub fn new(stream: S, source_id: u8, max_payload: usize) -> Self {
        Client { stream, source_id, read_buf: Vec::new(), max_payload }
    }

    /// Read one register and block until the server replies.
    pub async fn read(&mut self, dest: u8, register: u32, type_index: u8) -> crate::error::Result<Value> {
        let request = builder::build_read(self.source_id, dest, register, type_index);
        self.send(&request).await?;
        let reply = self.recv().await?;

        match Subframe::decode(&reply.payload).map_err(|_| ClientError::UnexpectedReply)?.0 {
            Subframe::ReplySingle { value, .. } => Ok(value),
            Subframe::ReadError { error_code, .. } => Err(ClientError::Remote(error_code)),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// Write one register. If `confirm` is set, waits for an acknowledgment
    /// (an `Ok` means the server reported no error).
    pub async fn write(
        &mut self,
        dest: u8,
        register: u32,
        value: Value,
        confirm: bool,
    ) -> crate::error::Result<()> {
        let request = builder::build_write(self.source_id, dest, register, value, confirm);
        self.send(&request).await?;
        if !confirm {
            return Ok(());
        }

        let reply = self.recv().await?;
        if reply.payload.is_empty() {
            return Ok(());
        }
        match Subframe::decode(&reply.payload).map_err(|_| ClientError::UnexpectedReply)?.0 {
            Subframe::WriteError { error_code, .. } => Err(ClientError::Remote(error_code)),
            _ => Err(ClientError::UnexpectedReply),
        }
    }

    /// Push bytes into a tunnel channel. Does not wait for the server's
    /// `0x41` acknowledgment frame — callers that need to observe it should
    /// use [`Self::recv_any`].
    pub async fn push_tunnel(&mut self, dest: u8, channel: u32, data: Vec<u8>) -> crate::error::Result<()> {
        let request = builder::build_tunnel_push(self.source_id, dest, channel, data);
        self.send(&request).await
    }

    /// Wait for the next frame addressed to this client, regardless of
    /// what kind of subframe it carries (useful for draining proactive
    /// `TunnelToClient` pushes).
    pub async fn recv_any(&mut self) -> crate::error::Result<Frame> {
        self.recv().await
    }

    async fn send(&mut self, frame: &Frame) -> crate::error::Result<()> {
        self.stream.write_all(&frame.encode()).await?;
        Ok(())
    }

    async fn recv(&mut self) -> crate::error::Result<Frame> {
        loop {
            match Frame::decode(&self.read_buf, self.max_payload) {
                Ok((frame, consumed)) => {
                    self.read_buf.drain(..consumed);
                    return Ok(frame);
                }
                Err(ProtocolError::FrameTooShort { .. }) => {}
                Err(other) => return Err(ClientError::Protocol(other)),
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(ClientError::ConnectionClosed);
            }
            self.read_buf.extend_from_slice(&chunk[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::duplex;

    use super::*;

    #[tokio::test]
    async fn read_round_trips_over_a_duplex_stream() {
        let (client_half, mut server_half) = duplex(4096);
        let mut client = Client::new(client_half, 0x01, 4096);

        let server_task = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let n = server_half.read(&mut buf).await.unwrap();
            let (request, _) = Frame::decode(&buf[..n], 4096).unwrap();
            assert!(request.response_requested());

            let mut payload = Vec::new();
            Subframe::ReplySingle { register: 0, value: Value::I8(-7) }.encode(&mut payload);
            let response = Frame::new(0x02, request.source & 0x7F, payload);
            server_half.write_all(&response.encode()).await.unwrap();
        });

        let value = client.read(0x02, 0, 0).await.unwrap();
        assert_eq!(value, Value::I8(-7));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn unconfirmed_write_does_not_wait_for_a_reply() {
        let (client_half, mut server_half) = duplex(4096);
        let mut client = Client::new(client_half, 0x01, 4096);

        client.write(0x02, 0, Value::I8(5), false).await.unwrap();

        let mut buf = vec![0u8; 4096];
        let n = server_half.read(&mut buf).await.unwrap();
        let (frame, _) = Frame::decode(&buf[..n], 4096).unwrap();
        assert!(!frame.response_requested());
    }

    #[tokio::test]
    async fn confirmed_write_succeeds_on_an_empty_acknowledgment() {
        let (client_half, mut server_half) = duplex(4096);
        let mut client = Client::new(client_half, 0x01, 4096);

        let server_task = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let n = server_half.read(&mut buf).await.unwrap();
            let (request, _) = Frame::decode(&buf[..n], 4096).unwrap();
            assert!(request.response_requested());

            // Success carries no subframe at all -- just the bare ack frame.
            let response = Frame::new(0x02, request.source & 0x7F, Vec::new());
            server_half.write_all(&response.encode()).await.unwrap();
        });

        client.write(0x02, 0, Value::I8(5), true).await.unwrap();
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn remote_write_error_surfaces_as_remote() {
        let (client_half, mut server_half) = duplex(4096);
        let mut client = Client::new(client_half, 0x01, 4096);

        let server_task = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let n = server_half.read(&mut buf).await.unwrap();
            let (request, _) = Frame::decode(&buf[..n], 4096).unwrap();

            let mut payload = Vec::new();
            Subframe::WriteError { register: 0, error_code: 3 }.encode(&mut payload);
            let response = Frame::new(0x02, request.source & 0x7F, payload);
            server_half.write_all(&response.encode()).await.unwrap();
        });

        let result = client.write(0x02, 0, Value::I8(5), true).await;
        assert!(matches!(result, Err(ClientError::Remote(3))));
        server_task.await.unwrap();
    }
}
