use futures::StreamExt;
use std::path::Path;
use tessera_common::Result;
use tessera_logger::log;
use tessera_logger::LogSeverity::{Debug, Info};
use tessera_protocol::{CodecContext, Message, MessageCodec};
use tokio::fs::File;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

/// Message counts gathered while reading a capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub sections: usize,
    pub tile_squares: usize,
    pub tile_edits: usize,
    pub other: usize,
    /// Tiles carried by sections and squares together
    pub tiles: usize,
}

impl CaptureSummary {
    pub fn messages(&self) -> usize {
        self.sections + self.tile_squares + self.tile_edits + self.other
    }

    fn record(&mut self, message: &Message) {
        match message {
            Message::Section(section) => {
                self.sections += 1;
                self.tiles += section.grid.len();
            }
            Message::TileSquare(square) => {
                self.tile_squares += 1;
                self.tiles += square.grid.len();
            }
            Message::TileEdit(_) => self.tile_edits += 1,
            Message::Other { .. } => self.other += 1,
        }
    }
}

/// Reads framed messages until the stream ends, logging one line per message.
/// Stops at the first malformed frame.
pub async fn inspect_stream<R>(reader: R, context: CodecContext) -> Result<CaptureSummary>
where
    R: AsyncRead + Unpin,
{
    let mut frames = FramedRead::new(reader, MessageCodec::new(context));
    let mut summary = CaptureSummary::default();

    while let Some(message) = frames.next().await {
        let message = message?;
        log(format!("#{} {}", summary.messages(), message), Info);
        summary.record(&message);
    }

    log(format!("Capture summary: {:?}", summary), Debug);
    Ok(summary)
}

/// Opens a capture file and inspects it.
pub async fn inspect_file(path: impl AsRef<Path>, context: CodecContext) -> Result<CaptureSummary> {
    let path = path.as_ref();
    let file = File::open(path).await?;
    log(format!("Reading capture {}", path.display()), Info);
    inspect_stream(file, context).await
}
