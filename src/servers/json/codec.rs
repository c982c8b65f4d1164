use bytes::BytesMut;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder, LinesCodec};

use crate::api::json::message;

#[derive(Debug, Error)]
pub enum JsonCodecError {
    #[error("i/o error: {0}")]
    Io(#[from] futures_io::Error),
    #[error("lines codec error: {0}")]
    Lines(#[from] tokio_util::codec::LinesCodecError),
    #[error("error decoding JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// JSON tokio codec: one panel message per line
pub struct JsonCodec {
    /// Line parsing codec
    lines: LinesCodec,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self {
            lines: LinesCodec::new(),
        }
    }
}

impl Decoder for JsonCodec {
    type Item = message::PanelMessage;
    type Error = JsonCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.lines.decode(src) {
            Ok(lines_result) => Ok(match lines_result {
                Some(ref line) => Some(serde_json::from_str(line)?),
                None => None,
            }),
            Err(error) => Err(error.into()),
        }
    }
}

impl Encoder<message::PanelResponse> for JsonCodec {
    type Error = JsonCodecError;

    fn encode(
        &mut self,
        item: message::PanelResponse,
        dst: &mut BytesMut,
    ) -> Result<(), Self::Error> {
        Ok(self.lines.encode(serde_json::to_string(&item)?, dst)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_one_message_per_line() {
        let mut codec = JsonCodec::new();
        let mut buffer =
            BytesMut::from(&b"{ \"command\": \"sysinfo\" }\n{ \"command\": \"serverinfo\" }\n"[..]);

        assert!(matches!(
            codec.decode(&mut buffer).unwrap(),
            Some(message::PanelMessage {
                command: message::PanelCommand::SysInfo,
                ..
            })
        ));
        assert!(matches!(
            codec.decode(&mut buffer).unwrap(),
            Some(message::PanelMessage {
                command: message::PanelCommand::ServerInfo(_),
                ..
            })
        ));
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let mut codec = JsonCodec::new();
        let mut buffer = BytesMut::from(&b"not json\n"[..]);

        assert!(matches!(
            codec.decode(&mut buffer),
            Err(JsonCodecError::Decode(_))
        ));
    }
}
