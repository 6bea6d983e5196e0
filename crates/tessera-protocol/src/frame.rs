//! Length-prefixed message framing for byte streams.
//!
//! Every frame starts with a u16 little-endian total length (counting the three header bytes
//! themselves) and a message type byte, followed by the payload.

use crate::context::CodecContext;
use crate::packet::{Packet, PacketBuffer, PacketReader};
use crate::section::Section;
use crate::tile_edit::TileEdit;
use crate::tile_square::TileSquare;
use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use tessera_common::{Result, TesseraError};
use tokio_util::codec::{Decoder, Encoder};

pub const FRAME_HEADER_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Section(Section),
    TileSquare(TileSquare),
    TileEdit(TileEdit),
    /// A message type this codec does not interpret. The payload is passed through as is.
    Other { message_type: u8, payload: Bytes },
}

impl Message {
    pub fn message_type(&self) -> u8 {
        match self {
            Message::Section(_) => Section::packet_id(),
            Message::TileSquare(_) => TileSquare::packet_id(),
            Message::TileEdit(_) => TileEdit::packet_id(),
            Message::Other { message_type, .. } => *message_type,
        }
    }

    fn encode_payload(&self, context: &CodecContext) -> Result<Vec<u8>> {
        match self {
            Message::Section(section) => section.encode(context),
            Message::TileSquare(square) => square.encode(context),
            Message::TileEdit(edit) => edit.encode(context),
            Message::Other { payload, .. } => Ok(payload.to_vec()),
        }
    }

    fn decode_payload(message_type: u8, payload: Bytes, context: &CodecContext) -> Result<Self> {
        let message = match message_type {
            id if id == Section::packet_id() => Message::Section(decode_exact(&payload, context)?),
            id if id == TileSquare::packet_id() => {
                Message::TileSquare(decode_exact(&payload, context)?)
            }
            id if id == TileEdit::packet_id() => Message::TileEdit(decode_exact(&payload, context)?),
            _ => Message::Other {
                message_type,
                payload,
            },
        };
        Ok(message)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Message::Section(section) => write!(
                f,
                "Section at ({}, {}): {}x{} tiles, {} chests, {} signs, {} tile entities",
                section.x,
                section.y,
                section.grid.width(),
                section.grid.height(),
                section.chests.len(),
                section.signs.len(),
                section.tile_entities.len()
            ),
            Message::TileSquare(square) => write!(
                f,
                "Tile square at ({}, {}): side {}",
                square.x,
                square.y,
                square.size()
            ),
            Message::TileEdit(edit) => {
                write!(f, "Tile edit {} at ({}, {})", edit.kind(), edit.x, edit.y)
            }
            Message::Other {
                message_type,
                payload,
            } => write!(f, "Message {} ({} bytes)", message_type, payload.len()),
        }
    }
}

/// Decodes a packet that must use the whole payload.
fn decode_exact<P: Packet>(payload: &[u8], context: &CodecContext) -> Result<P> {
    let mut reader = PacketReader::new(payload);
    let packet = P::read_from_buffer(&mut reader, context)?;
    if !reader.is_empty() {
        return Err(TesseraError::FramingError(format!(
            "{} trailing bytes after message {}",
            reader.remaining(),
            P::packet_id()
        )));
    }
    Ok(packet)
}

/// Splits a byte stream into [`Message`]s and back.
#[derive(Debug, Clone, Default)]
pub struct MessageCodec {
    context: CodecContext,
}

impl MessageCodec {
    pub fn new(context: CodecContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &CodecContext {
        &self.context
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = TesseraError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        if src.len() < 2 {
            return Ok(None);
        }

        let length = LittleEndian::read_u16(&src[..2]) as usize;
        let max_length = self.context.config().max_frame_length;
        if length < FRAME_HEADER_LEN || length > max_length {
            return Err(TesseraError::FramingError(format!(
                "Frame length {} outside {}..={}",
                length, FRAME_HEADER_LEN, max_length
            )));
        }

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(length).freeze();
        let header = frame.split_to(FRAME_HEADER_LEN);
        Message::decode_payload(header[2], frame, &self.context).map(Some)
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = TesseraError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        let payload = item.encode_payload(&self.context)?;
        let length = payload.len() + FRAME_HEADER_LEN;
        let max_length = self.context.config().max_frame_length;
        if length > max_length {
            return Err(TesseraError::PreconditionError(format!(
                "Message {} needs a {} byte frame, limit is {}",
                item.message_type(),
                length,
                max_length
            )));
        }

        let mut header = PacketBuffer::with_capacity(FRAME_HEADER_LEN);
        header.write_u16(length as u16);
        header.write_u8(item.message_type());

        dst.reserve(length);
        dst.put_slice(header.get_buffer());
        dst.put_slice(&payload);
        Ok(())
    }
}
