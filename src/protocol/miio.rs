//! miIO packet format.
//!
//! Every packet starts with a 32-byte big-endian header:
//! - Bytes 0-1: Magic (0x2131)
//! - Bytes 2-3: Packet length, header included
//! - Bytes 4-7: Reserved (0xFFFFFFFF in the handshake, 0 otherwise)
//! - Bytes 8-11: Device ID
//! - Bytes 12-15: Stamp (seconds, device clock)
//! - Bytes 16-31: MD5 checksum of header (with the token in place of the
//!   checksum) followed by the encrypted payload
//!
//! Payloads are JSON-RPC bodies encrypted with AES-128-CBC and PKCS#7
//! padding. The key is `MD5(token)` and the IV is `MD5(key || token)`.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// UDP port miIO devices listen on.
pub const MIIO_PORT: u16 = 54321;

/// Header size in bytes.
pub const HEADER_LEN: usize = 32;

/// Packet magic.
pub const MAGIC: u16 = 0x2131;

/// Device token length in bytes.
pub const TOKEN_LEN: usize = 16;

/// Parsed miIO packet header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiioHeader {
    /// Total packet length.
    pub length: u16,
    /// Reserved word.
    pub reserved: u32,
    /// Device ID.
    pub device_id: u32,
    /// Device stamp.
    pub stamp: u32,
    /// Checksum field.
    pub checksum: [u8; 16],
}

impl MiioHeader {
    /// Parse a header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::InvalidData {
                context: format!("miIO packet too short: {} bytes", data.len()),
            });
        }

        let mut buf = &data[..HEADER_LEN];
        let magic = buf.get_u16();
        if magic != MAGIC {
            return Err(Error::InvalidData {
                context: format!("Invalid miIO magic: {magic:#06x}"),
            });
        }

        let length = buf.get_u16();
        let reserved = buf.get_u32();
        let device_id = buf.get_u32();
        let stamp = buf.get_u32();
        let mut checksum = [0u8; 16];
        buf.copy_to_slice(&mut checksum);

        Ok(Self {
            length,
            reserved,
            device_id,
            stamp,
            checksum,
        })
    }

    /// Whether this header carries no payload (handshake).
    pub fn is_hello(&self) -> bool {
        self.length as usize == HEADER_LEN
    }
}

/// The handshake packet: a bare header with every field set to 0xFF.
pub fn hello_packet() -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN);
    buf.put_u16(MAGIC);
    buf.put_u16(HEADER_LEN as u16);
    buf.put_bytes(0xFF, HEADER_LEN - 4);
    buf.freeze()
}

/// JSON-RPC request body.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    /// Request ID, echoed by the device.
    pub id: u32,
    /// Method name.
    pub method: &'a str,
    /// Positional parameters.
    pub params: &'a [Value],
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RpcError {
    /// Error code.
    pub code: i64,
    /// Error message.
    #[serde(default)]
    pub message: String,
}

/// JSON-RPC response body.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RpcResponse {
    /// Request ID this response answers.
    #[serde(default)]
    pub id: Option<u32>,
    /// Result on success.
    #[serde(default)]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Parse a decrypted response body, ignoring trailing NUL padding.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let end = body
            .iter()
            .rposition(|&b| b != 0 && !b.is_ascii_whitespace())
            .map_or(0, |i| i + 1);
        Ok(serde_json::from_slice(&body[..end])?)
    }

    /// Turn the response into its result values.
    ///
    /// An array result is returned as-is, a scalar result becomes a single
    /// element list.
    pub fn into_result(self) -> Result<Vec<Value>> {
        if let Some(error) = self.error {
            return Err(Error::DeviceError {
                code: error.code,
                message: error.message,
            });
        }

        match self.result {
            Some(Value::Array(values)) => Ok(values),
            Some(value) => Ok(vec![value]),
            None => Ok(Vec::new()),
        }
    }
}

/// Token-derived payload cipher and packet codec.
#[derive(Clone)]
pub struct MiioCipher {
    token: [u8; TOKEN_LEN],
    key: [u8; 16],
    iv: [u8; 16],
}

impl MiioCipher {
    /// Create a cipher from the raw device token.
    pub fn new(token: [u8; TOKEN_LEN]) -> Self {
        let key: [u8; 16] = Md5::digest(token).into();

        let mut hasher = Md5::new();
        hasher.update(key);
        hasher.update(token);
        let iv: [u8; 16] = hasher.finalize().into();

        Self { token, key, iv }
    }

    /// Create a cipher from a 32-character hex token.
    pub fn from_hex(token_hex: &str) -> Result<Self> {
        let bytes = hex::decode(token_hex.trim()).map_err(|e| Error::InvalidConfig {
            context: format!("device token is not hex: {e}"),
        })?;
        let token: [u8; TOKEN_LEN] = bytes.try_into().map_err(|b: Vec<u8>| Error::InvalidConfig {
            context: format!("device token is {} bytes (need {TOKEN_LEN})", b.len()),
        })?;
        Ok(Self::new(token))
    }

    /// Encrypt a plaintext payload.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        Aes128CbcEnc::new(&self.key.into(), &self.iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    /// Decrypt a payload.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        Aes128CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| Error::Crypto {
                context: format!("payload decryption failed: {e}"),
            })
    }

    /// Build a complete packet carrying `plaintext`.
    pub fn encode(&self, device_id: u32, stamp: u32, plaintext: &[u8]) -> Result<Bytes> {
        let payload = self.encrypt(plaintext);
        let length = u16::try_from(HEADER_LEN + payload.len()).map_err(|_| Error::InvalidData {
            context: format!("payload too large: {} bytes", payload.len()),
        })?;

        let mut buf = BytesMut::with_capacity(length as usize);
        buf.put_u16(MAGIC);
        buf.put_u16(length);
        buf.put_u32(0);
        buf.put_u32(device_id);
        buf.put_u32(stamp);
        let checksum = self.checksum(&buf[..16], &payload);
        buf.put_slice(&checksum);
        buf.put_slice(&payload);

        Ok(buf.freeze())
    }

    /// Parse a packet, verify its checksum and decrypt its payload.
    ///
    /// Handshake replies carry no payload and are returned with an empty body.
    pub fn decode(&self, packet: &[u8]) -> Result<(MiioHeader, Vec<u8>)> {
        let header = MiioHeader::parse(packet)?;
        let length = header.length as usize;
        if length < HEADER_LEN || packet.len() < length {
            return Err(Error::InvalidData {
                context: format!(
                    "miIO length field {} does not fit packet of {} bytes",
                    length,
                    packet.len()
                ),
            });
        }

        if header.is_hello() {
            return Ok((header, Vec::new()));
        }

        let payload = &packet[HEADER_LEN..length];
        let expected = self.checksum(&packet[..16], payload);
        if expected != header.checksum {
            return Err(Error::InvalidData {
                context: "miIO checksum mismatch".to_string(),
            });
        }

        let body = self.decrypt(payload)?;
        Ok((header, body))
    }

    fn checksum(&self, header_start: &[u8], payload: &[u8]) -> [u8; 16] {
        let mut hasher = Md5::new();
        hasher.update(header_start);
        hasher.update(self.token);
        hasher.update(payload);
        hasher.finalize().into()
    }
}

impl std::fmt::Debug for MiioCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiioCipher").finish_non_exhaustive()
    }
}
