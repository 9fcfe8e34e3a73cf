//! End-to-end: a real [`Client`] driving a real [`MultiplexServer`] over a
//! [`tokio::io::duplex`] pair, with the server side pumped by hand since
//! `MultiplexServer` is synchronous and sans-transport.

use std::sync::Mutex;

use multiplex_client::Client;
use multiplex_server::{MemoryNodeIdStore, MultiplexServer, Server, ServerOptions};
use multiplex::{Subframe, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

struct Registers {
    values: Mutex<[i8; 8]>,
}

impl Registers {
    fn new() -> Self {
        Self { values: Mutex::new([0; 8]) }
    }
}

impl Server for Registers {
    fn write(&self, register: u32, value: Value) -> u32 {
        let Value::I8(v) = value else { return 1 };
        match self.values.lock().unwrap().get_mut(register as usize) {
            Some(slot) => {
                *slot = v;
                0
            }
            None => 2,
        }
    }

    fn read(&self, register: u32, type_index: u8) -> Result<Value, u32> {
        if type_index != 0 {
            return Err(1);
        }
        self.values.lock().unwrap().get(register as usize).copied().map(Value::I8).ok_or(2)
    }
}

/// Pump one request/response cycle: read whatever bytes the client wrote,
/// feed them to the server, write back whatever it produced.
async fn pump(
    server_half: &mut tokio::io::DuplexStream,
    server: &mut MultiplexServer,
    backend: &Registers,
) {
    let mut buf = vec![0u8; 4096];
    let n = server_half.read(&mut buf).await.unwrap();
    let responses = server.feed(&buf[..n], backend);
    for response in responses {
        server_half.write_all(&response.encode()).await.unwrap();
    }
}

#[tokio::test]
async fn write_then_read_round_trips_across_the_real_protocol() {
    let node_id_store = MemoryNodeIdStore::new();
    let mut server = MultiplexServer::new(&node_id_store, ServerOptions::new(256, 4, 2)).unwrap();
    let backend = Registers::new();

    let (client_half, mut server_half) = duplex(4096);
    let mut client = Client::new(client_half, 0x01, 4096);

    let write_task = tokio::spawn(async move {
        client.write(2, 0, Value::I8(-7), false).await.unwrap();
        client
    });
    pump(&mut server_half, &mut server, &backend).await;
    let mut client = write_task.await.unwrap();

    let read_task = tokio::spawn(async move {
        let value = client.read(2, 0, 0).await.unwrap();
        (client, value)
    });
    pump(&mut server_half, &mut server, &backend).await;
    let (_client, value) = read_task.await.unwrap();

    assert_eq!(value, Value::I8(-7));
    assert_eq!(server.stats().checksum_mismatch, 0);
    assert_eq!(server.stats().wrong_id, 0);
}

#[tokio::test]
async fn tunnel_push_is_observable_on_the_server_side() {
    let node_id_store = MemoryNodeIdStore::new();
    let mut server = MultiplexServer::new(&node_id_store, ServerOptions::new(256, 4, 2)).unwrap();
    let backend = Registers::new();

    let (client_half, mut server_half) = duplex(4096);
    let mut client = Client::new(client_half, 0x01, 4096);

    let push_task =
        tokio::spawn(async move { client.push_tunnel(2, 7, b"hello".to_vec()).await.unwrap() });

    let mut buf = vec![0u8; 4096];
    let n = server_half.read(&mut buf).await.unwrap();
    let responses = server.feed(&buf[..n], &backend);

    // A tunnel poll always gets an 0x41 back, even with nothing queued for
    // the client yet.
    assert_eq!(responses.len(), 1);
    let (subframe, _) = Subframe::decode(&responses[0].payload).unwrap();
    assert_eq!(subframe, Subframe::TunnelToClient { channel: 7, data: Vec::new() });
    push_task.await.unwrap();

    assert_eq!(server.drain_tunnel_inbound(7), b"hello");
}
