//! Artwork images: decoding plus terminal rendering through `ratatui-image`,
//! which picks kitty, sixel, iTerm2 or half blocks to suit the terminal.

use image::DynamicImage;
use ratatui::{layout::Rect, Frame};
use ratatui_image::{picker::Picker, protocol::StatefulProtocol, Resize, StatefulImage};
use tracing::{debug, warn};

use easel_proto::error::{FetchError, FetchResult};

/// Cell size assumed when the terminal cannot be queried.
const FALLBACK_FONT_SIZE: (u16, u16) = (8, 16);

/// A decoded artwork image.
#[derive(Debug, Clone)]
pub struct Picture {
    image: DynamicImage,
}

impl Picture {
    pub fn decode(bytes: &[u8]) -> FetchResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| FetchError::Decode(format!("image: {}", e)))?;
        Ok(Self { image })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Half-block picker; works everywhere, needs no terminal query.
pub fn halfblocks_picker() -> Picker {
    Picker::from_fontsize(FALLBACK_FONT_SIZE)
}

/// Ask the terminal for its graphics protocol and cell size. Must run after
/// the alternate screen is entered and before the event reader starts.
pub fn query_picker() -> Picker {
    match Picker::from_query_stdio() {
        Ok(picker) => {
            debug!("[art] terminal image query succeeded");
            picker
        }
        Err(e) => {
            warn!("[art] terminal image query failed ({}); using half blocks", e);
            halfblocks_picker()
        }
    }
}

/// The render state of the artwork on screen. Rebuilt only when the artwork
/// changes; `ratatui-image` re-encodes on resize by itself.
pub struct ArtImage {
    picker: Picker,
    current: Option<(u64, StatefulProtocol)>,
}

impl ArtImage {
    pub fn new(picker: Picker) -> Self {
        Self {
            picker,
            current: None,
        }
    }

    /// Swap the picker (after the terminal query). Drops the encoded image.
    pub fn set_picker(&mut self, picker: Picker) {
        self.picker = picker;
        self.current = None;
    }

    pub fn artwork_id(&self) -> Option<u64> {
        self.current.as_ref().map(|(id, _)| *id)
    }

    fn protocol_for(&mut self, artwork_id: u64, picture: &Picture) -> &mut StatefulProtocol {
        if self.artwork_id() != Some(artwork_id) {
            self.current = None;
        }
        let picker = &self.picker;
        let (_, protocol) = self
            .current
            .get_or_insert_with(|| (artwork_id, picker.new_resize_protocol(picture.image.clone())));
        protocol
    }

    /// Draw `picture` letterboxed into `area`.
    pub fn render(&mut self, frame: &mut Frame, area: Rect, artwork_id: u64, picture: &Picture) {
        let protocol = self.protocol_for(artwork_id, picture);
        let image = StatefulImage::default().resize(Resize::Fit(None));
        frame.render_stateful_widget(image, area, protocol);
        if let Some(Err(e)) = protocol.last_encoding_result() {
            warn!("[art] image encoding for #{} failed: {}", artwork_id, e);
        }
    }

    /// Forget the encoded image (no artwork to show).
    pub fn clear(&mut self) {
        self.current = None;
    }
}
