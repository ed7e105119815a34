use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::protocol::{HEADER_LEN, MAX_PAYLOAD_LEN, reply};
use super::{Value, Xmms2Error};

/// One framed IPC message
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Addressed object
    pub object: u32,
    /// Command on that object, or the reply kind for daemon messages
    pub command: u32,
    /// Correlates replies with requests
    pub cookie: u32,
    /// Serialized value
    pub payload: Bytes,
}

impl Message {
    /// Build a request whose arguments travel as one list value
    pub fn request(object: u32, command: u32, cookie: u32, args: Vec<Value>) -> Self {
        let mut payload = BytesMut::new();
        Value::List(args).encode(&mut payload);

        Self {
            object,
            command,
            cookie,
            payload: payload.freeze(),
        }
    }

    /// Decode the reply value.
    ///
    /// # Errors
    /// Error replies become `Xmms2Error::Server`; malformed payloads become
    /// `Xmms2Error::Protocol`.
    pub fn value(&self) -> Result<Value, Xmms2Error> {
        let value = Value::decode(&mut self.payload.clone())?;

        match (self.command, value) {
            (reply::ERROR, Value::Error(message) | Value::String(message)) => {
                Err(Xmms2Error::Server(message))
            }
            (reply::ERROR, other) => Err(Xmms2Error::Server(format!(
                "error reply carrying {}",
                other.type_name()
            ))),
            (_, Value::Error(message)) => Err(Xmms2Error::Server(message)),
            (_, value) => Ok(value),
        }
    }
}

/// Length-prefixed framing of [`Message`]s
#[derive(Debug, Default)]
pub struct MessageCodec;

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = Xmms2Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, Xmms2Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let mut header = &src[..HEADER_LEN];
        let object = header.get_u32();
        let command = header.get_u32();
        let cookie = header.get_u32();
        let len = header.get_u32() as usize;

        if len > MAX_PAYLOAD_LEN {
            return Err(Xmms2Error::protocol(format!(
                "payload of {len} bytes exceeds the {MAX_PAYLOAD_LEN} byte limit"
            )));
        }

        if src.len() < HEADER_LEN + len {
            src.reserve(HEADER_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(len).freeze();

        Ok(Some(Message {
            object,
            command,
            cookie,
            payload,
        }))
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = Xmms2Error;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), Xmms2Error> {
        let len = u32::try_from(message.payload.len())
            .map_err(|_| Xmms2Error::protocol("request payload too large"))?;

        dst.reserve(HEADER_LEN + message.payload.len());
        dst.put_u32(message.object);
        dst.put_u32(message.command);
        dst.put_u32(message.cookie);
        dst.put_u32(len);
        dst.put_slice(&message.payload);
        Ok(())
    }
}
