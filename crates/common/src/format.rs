//! Track metadata and frame layout helpers.

/// Format of one track as reported by a media source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFormat {
    /// Mime type, e.g. "video/avc" or "audio/mp4a-latm".
    pub mime: String,
    /// Decoded frame width in pixels (0 for non-video tracks).
    pub width: u32,
    /// Decoded frame height in pixels (0 for non-video tracks).
    pub height: u32,
}

impl TrackFormat {
    pub fn video(mime: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            mime: mime.into(),
            width,
            height,
        }
    }

    pub fn audio(mime: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            width: 0,
            height: 0,
        }
    }

    /// Whether this track carries video samples.
    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }
}

/// Byte length of one planar 4:2:0 frame: a full luma plane followed by
/// interleaved chroma at quarter resolution per component.
pub fn nv12_frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3 / 2
}
