//! Appliance transport.
//!
//! The appliance speaks miIO: JSON-RPC calls carried in encrypted UDP
//! packets. Before the first call (and after any failure) a handshake packet
//! is sent to learn the device ID and the device clock.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::UdpSocket;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::miio::{hello_packet, MiioCipher, RpcRequest, RpcResponse, MIIO_PORT};

/// Largest datagram accepted from the appliance.
const MAX_PACKET_LEN: usize = 4096;

/// Sends RPC calls to the appliance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplianceTransport: Send + Sync {
    /// Call `method` with positional `params` and return the result values.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, timeout, or an RPC error reply.
    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Vec<Value>>;
}

/// Device clock learned from the last packet received.
#[derive(Debug, Clone, Copy)]
struct Session {
    device_id: u32,
    stamp: u32,
    received_at: Instant,
}

impl Session {
    fn stamp_now(&self) -> u32 {
        let elapsed = self.received_at.elapsed().as_secs() as u32;
        self.stamp.wrapping_add(elapsed).wrapping_add(1)
    }
}

/// miIO transport over UDP.
pub struct MiioTransport {
    /// Appliance address.
    addr: SocketAddr,
    /// Token-derived cipher.
    cipher: MiioCipher,
    /// Per-request timeout.
    timeout: Duration,
    /// Handshake state, `None` until the first successful handshake.
    session: Mutex<Option<Session>>,
    /// Next request ID.
    next_id: AtomicU32,
    /// Serializes requests so replies are not interleaved.
    in_flight: tokio::sync::Mutex<()>,
}

impl MiioTransport {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a transport for the appliance at `ip` with a 32-character hex token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the token is malformed.
    pub fn new(ip: IpAddr, token_hex: &str) -> Result<Self> {
        Ok(Self {
            addr: SocketAddr::new(ip, MIIO_PORT),
            cipher: MiioCipher::from_hex(token_hex)?,
            timeout: Self::DEFAULT_TIMEOUT,
            session: Mutex::new(None),
            next_id: AtomicU32::new(1),
            in_flight: tokio::sync::Mutex::new(()),
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The appliance address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn connect(&self) -> Result<UdpSocket> {
        let bind_addr: SocketAddr = if self.addr.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(self.addr).await?;
        Ok(socket)
    }

    async fn receive(&self, socket: &UdpSocket) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; MAX_PACKET_LEN];
        let len = tokio::time::timeout(self.timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| Error::Timeout)??;
        buf.truncate(len);
        Ok(buf)
    }

    async fn handshake(&self, socket: &UdpSocket) -> Result<Session> {
        debug!("Sending miIO handshake to {}", self.addr);
        socket.send(&hello_packet()).await?;

        let reply = self.receive(socket).await?;
        let (header, _) = self.cipher.decode(&reply)?;

        let session = Session {
            device_id: header.device_id,
            stamp: header.stamp,
            received_at: Instant::now(),
        };
        debug!(
            "Handshake complete: device {:#010x}, stamp {}",
            session.device_id, session.stamp
        );

        *self.session.lock() = Some(session);
        Ok(session)
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Vec<Value>> {
        let socket = self.connect().await?;

        let cached = *self.session.lock();
        let session = match cached {
            Some(session) => session,
            None => self.handshake(&socket).await?,
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest {
            id,
            method,
            params: &params,
        };
        let mut body = serde_json::to_vec(&request)?;
        body.push(0);
        trace!("miIO request: {}", String::from_utf8_lossy(&body));

        let packet = self
            .cipher
            .encode(session.device_id, session.stamp_now(), &body)?;
        socket.send(&packet).await?;

        let reply = self.receive(&socket).await?;
        let (header, body) = self.cipher.decode(&reply)?;
        *self.session.lock() = Some(Session {
            device_id: header.device_id,
            stamp: header.stamp,
            received_at: Instant::now(),
        });
        trace!("miIO response: {}", String::from_utf8_lossy(&body));

        let response = RpcResponse::parse(&body)?;
        if response.id != Some(id) {
            warn!(
                "Response ID {:?} does not match request ID {} ({})",
                response.id, id, method
            );
        }

        response.into_result()
    }
}

#[async_trait]
impl ApplianceTransport for MiioTransport {
    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Vec<Value>> {
        let _guard = self.in_flight.lock().await;

        let result = self.request(method, params).await;
        if let Err(e) = &result {
            debug!("miIO call {} failed: {}", method, e);
            // Re-handshake on the next call.
            *self.session.lock() = None;
        }
        result
    }
}

impl std::fmt::Debug for MiioTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiioTransport")
            .field("addr", &self.addr)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOKEN_HEX: &str = "00112233445566778899aabbccddeeff";

    /// A one-shot fake appliance answering a handshake and one RPC call.
    async fn fake_appliance(reply: Value) -> (SocketAddr, tokio::task::JoinHandle<Value>) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let cipher = MiioCipher::from_hex(TOKEN_HEX).unwrap();

        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_PACKET_LEN];

            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..len], &hello_packet()[..]);
            let mut hello = hello_packet().to_vec();
            hello[4..8].copy_from_slice(&[0; 4]);
            hello[8..12].copy_from_slice(&0x1234_5678u32.to_be_bytes());
            hello[12..16].copy_from_slice(&500u32.to_be_bytes());
            socket.send_to(&hello, peer).await.unwrap();

            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            let (header, body) = cipher.decode(&buf[..len]).unwrap();
            assert_eq!(header.device_id, 0x1234_5678);
            assert!(header.stamp > 500);

            let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
            let request: Value = serde_json::from_slice(&body[..end]).unwrap();

            let mut response = json!({ "id": request["id"] });
            response
                .as_object_mut()
                .unwrap()
                .extend(reply.as_object().unwrap().clone());
            let packet = cipher
                .encode(0x1234_5678, 501, response.to_string().as_bytes())
                .unwrap();
            socket.send_to(&packet, peer).await.unwrap();

            request
        });

        (addr, handle)
    }

    fn transport_for(addr: SocketAddr) -> MiioTransport {
        let mut transport = MiioTransport::new(addr.ip(), TOKEN_HEX)
            .unwrap()
            .with_timeout(Duration::from_secs(2));
        transport.addr = addr;
        transport
    }

    #[tokio::test]
    async fn test_send_round_trip() {
        let (addr, appliance) = fake_appliance(json!({ "result": [3] })).await;
        let transport = transport_for(addr);

        let result = transport.send("get_prop", vec![json!("status")]).await.unwrap();
        assert_eq!(result, vec![json!(3)]);

        let request = appliance.await.unwrap();
        assert_eq!(request["method"], "get_prop");
        assert_eq!(request["params"], json!(["status"]));
    }

    #[tokio::test]
    async fn test_send_device_error() {
        let (addr, appliance) =
            fake_appliance(json!({ "error": { "code": -9999, "message": "user ack timeout" } }))
                .await;
        let transport = transport_for(addr);

        let result = transport.send("set_start", vec![json!("00")]).await;
        assert!(matches!(result, Err(Error::DeviceError { code: -9999, .. })));
        assert!(transport.session.lock().is_none());
        appliance.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_timeout() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let transport = transport_for(silent.local_addr().unwrap())
            .with_timeout(Duration::from_millis(50));

        let result = transport.send("get_prop", vec![json!("status")]).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[test]
    fn test_invalid_token() {
        let result = MiioTransport::new([127, 0, 0, 1].into(), "abc");
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }
}
