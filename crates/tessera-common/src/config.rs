use crate::error::TesseraError;
use crate::types::Result;
use serde::{Deserialize, Serialize};

/// Default bound on a decompressed section payload.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 512 * 1024;

/// Default bound on the cell count of a decoded section grid.
pub const DEFAULT_MAX_SECTION_CELLS: usize = 1 << 20;

/// Codec tunables. None of these change the wire format; they only bound resources
/// and pick a compression level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Whether outgoing sections are deflated.
    pub compress_sections: bool,
    /// DEFLATE level, 0 (store) to 9 (best).
    pub compression_level: u32,
    /// Upper bound on a decompressed section payload.
    pub scratch_capacity: usize,
    /// Upper bound on `width * height` of a decoded section grid.
    pub max_section_cells: usize,
    /// Upper bound on one framed message, header included.
    pub max_frame_length: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compress_sections: true,
            compression_level: 6,
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            max_section_cells: DEFAULT_MAX_SECTION_CELLS,
            max_frame_length: u16::MAX as usize,
        }
    }
}

impl CodecConfig {
    /// Parses a config from JSON. Missing fields fall back to their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: CodecConfig = serde_json::from_str(text).map_err(|e| {
            TesseraError::PreconditionError(format!("Invalid codec config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(TesseraError::PreconditionError(format!(
                "Compression level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }
        if self.scratch_capacity == 0 {
            return Err(TesseraError::PreconditionError(
                "Scratch capacity must be non-zero".to_string(),
            ));
        }
        if self.max_section_cells == 0 {
            return Err(TesseraError::PreconditionError(
                "Max section cells must be non-zero".to_string(),
            ));
        }
        // Three bytes of length and type header.
        if self.max_frame_length < 3 || self.max_frame_length > u16::MAX as usize {
            return Err(TesseraError::PreconditionError(format!(
                "Max frame length must be between 3 and 65535, got {}",
                self.max_frame_length
            )));
        }
        Ok(())
    }

    pub fn uncompressed() -> Self {
        Self {
            compress_sections: false,
            ..Self::default()
        }
    }
}
