use crate::context::CodecContext;
use byteorder::{ByteOrder, LittleEndian};
use tessera_common::{Result, TesseraError};

/// Packet trait. Contains the message type and the functions to write and read the packet
/// payload. The length and type header around the payload belongs to the framing layer.
pub trait Packet {
    /// Message type byte
    fn packet_id() -> u8
    where
        Self: Sized;

    /// Reads the packet payload from the reader.
    fn read_from_buffer(reader: &mut PacketReader<'_>, context: &CodecContext) -> Result<Self>
    where
        Self: Sized;

    /// Writes the packet payload to the buffer. Implementations validate their input first
    /// and leave the buffer untouched when they reject it.
    fn write_to_buffer(&self, buffer: &mut PacketBuffer, context: &CodecContext) -> Result<()>;

    /// Encodes the payload into a fresh byte vector.
    fn encode(&self, context: &CodecContext) -> Result<Vec<u8>> {
        let mut buffer = PacketBuffer::new();
        self.write_to_buffer(&mut buffer, context)?;
        Ok(buffer.into_inner())
    }

    /// Decodes a payload from a byte slice.
    fn decode(bytes: &[u8], context: &CodecContext) -> Result<Self>
    where
        Self: Sized,
    {
        let mut reader = PacketReader::new(bytes);
        Self::read_from_buffer(&mut reader, context)
    }
}

/// Growable output buffer. All multi-byte integers are written little-endian.
#[derive(Debug, Default)]
pub struct PacketBuffer {
    pub buffer: Vec<u8>,
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn get_buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        LittleEndian::write_u16(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn write_i16(&mut self, value: i16) {
        let mut bytes = [0u8; 2];
        LittleEndian::write_i16(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_i32(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn write_bytes_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes an unsigned integer 7 bits at a time, least significant group first, with the
    /// high bit of each byte set when another byte follows.
    pub fn write_7bit_int(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.buffer.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buffer.push(value as u8);
    }

    /// Writes a string as a 7-bit encoded byte length followed by its UTF-8 bytes.
    pub fn write_string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        self.write_7bit_int(bytes.len() as u32);
        self.buffer.extend_from_slice(bytes);
    }
}

/// Cursor over a borrowed byte slice. Every read is bounds-checked and reports truncation
/// as a framing error without moving the cursor.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.cursor).copied()
    }

    /// Returns the next `count` bytes and advances past them.
    pub fn take(&mut self, count: usize, what: &str) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(TesseraError::truncated(what, count, self.remaining()));
        }
        let bytes = &self.bytes[self.cursor..self.cursor + count];
        self.cursor += count;
        Ok(bytes)
    }

    /// Consumes everything left in the reader.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let bytes = &self.bytes[self.cursor..];
        self.cursor = self.bytes.len();
        bytes
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1, "u8")?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take(1, "bool")?[0] != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2, "u16")?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2, "i16")?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4, "i32")?))
    }

    /// Reads an integer written by [`PacketBuffer::write_7bit_int`]. At most five bytes.
    pub fn read_7bit_int(&mut self) -> Result<u32> {
        let mut result: u32 = 0;
        let mut shift = 0;

        loop {
            let byte = self.read_u8()?;
            result |= ((byte & 0x7F) as u32) << shift;
            if (byte & 0x80) == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift >= 35 {
                return Err(TesseraError::FramingError(
                    "7-bit encoded integer too big".to_string(),
                ));
            }
        }
    }

    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_7bit_int()? as usize;
        let bytes = self.take(length, "string")?;
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            TesseraError::FramingError("Failed to convert bytes to UTF-8 string".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_packet_buffer_new() {
        let buffer = PacketBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buffer = PacketBuffer::new();
        buffer.write_u16(0x1234);
        buffer.write_i32(-2);
        assert_eq!(buffer.get_buffer(), &[0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF]);

        let mut reader = PacketReader::new(buffer.get_buffer());
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_i32().unwrap(), -2);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_7bit_int() {
        let test_cases = vec![0u32, 1, 127, 128, 255, 16_384, u32::MAX];

        for value in test_cases {
            let mut buffer = PacketBuffer::new();
            buffer.write_7bit_int(value);

            let mut reader = PacketReader::new(buffer.get_buffer());
            assert_eq!(reader.read_7bit_int().unwrap(), value);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_7bit_int_known_bytes() {
        let mut buffer = PacketBuffer::new();
        buffer.write_7bit_int(300);
        assert_eq!(buffer.get_buffer(), &[0xAC, 0x02]);
    }

    #[test]
    fn test_7bit_int_error_handling() {
        // Five continuation bytes never terminate
        let bytes = [0xFF; 6];
        let mut reader = PacketReader::new(&bytes);
        assert_matches!(reader.read_7bit_int(), Err(TesseraError::FramingError(_)));

        // Continuation bit set but no more bytes
        let bytes = [0x80];
        let mut reader = PacketReader::new(&bytes);
        assert_matches!(reader.read_7bit_int(), Err(TesseraError::FramingError(_)));
    }

    #[test]
    fn test_string() {
        let test_strings = vec!["", "Chest", "Hello, World!", "🦀", "こんにちは"];

        for string in test_strings {
            let mut buffer = PacketBuffer::new();
            buffer.write_string(string);

            let mut reader = PacketReader::new(buffer.get_buffer());
            assert_eq!(reader.read_string().unwrap(), string);
        }
    }

    #[test]
    fn test_string_error_handling() {
        // Invalid UTF-8
        let bytes = [0x01, 0xFF];
        let mut reader = PacketReader::new(&bytes);
        assert_matches!(reader.read_string(), Err(TesseraError::FramingError(_)));

        // Claims 100 bytes but only one follows
        let bytes = [100, 0x41];
        let mut reader = PacketReader::new(&bytes);
        assert_matches!(reader.read_string(), Err(TesseraError::FramingError(_)));
    }

    #[test]
    fn test_truncated_read_keeps_cursor() {
        let bytes = [0x01];
        let mut reader = PacketReader::new(&bytes);
        assert_matches!(reader.read_u16(), Err(TesseraError::FramingError(_)));
        assert_eq!(reader.get_cursor(), 0);
        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.peek_byte(), None);
    }

    #[test]
    fn test_take_rest() {
        let bytes = [1, 2, 3, 4];
        let mut reader = PacketReader::new(&bytes);
        reader.read_u8().unwrap();
        assert_eq!(reader.take_rest(), &[2, 3, 4]);
        assert!(reader.is_empty());
    }
}
