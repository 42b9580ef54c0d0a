//! Shared observable state fed by a link.
//!
//! The manager task is the only writer. UI code reads snapshots or
//! subscribes for changes. Every write replaces the whole value, so readers
//! never see a partial update.
//!
//! | Field | Type | Semantics |
//! |-------|------|-----------|
//! | detection | `Option<bool>` | `None` until the first status message |
//! | latest frame | `Option<Frame>` | Latest wins, no queueing |
//! | frames received | `u64` | Running count |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use tokio::sync::watch;

use crate::error::Result;

// ============================================================================
// Frame
// ============================================================================

/// One camera frame as received.
#[derive(Clone)]
pub struct Frame {
    seq: u64,
    data: Bytes,
    received_at: Instant,
}

impl Frame {
    /// Creates a frame.
    #[must_use]
    pub fn new(seq: u64, data: Bytes) -> Self {
        Self {
            seq,
            data,
            received_at: Instant::now(),
        }
    }

    /// Sequence number within the link, starting at 1.
    #[inline]
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Raw frame bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// When the frame arrived.
    #[inline]
    #[must_use]
    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Frame size in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the frame carries no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sniffs the image format from the leading bytes.
    #[must_use]
    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.data).ok()
    }

    /// Decodes the frame into pixels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`](crate::Error::Image) if the bytes are not a
    /// supported image.
    pub fn decode(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory(&self.data)?)
    }

    /// Renders the frame as a base64 `data:` URL.
    ///
    /// Unknown formats use `application/octet-stream`.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        let mime = self
            .format()
            .map_or("application/octet-stream", |format| format.to_mime_type());
        format!("data:{mime};base64,{}", Base64Standard.encode(&self.data))
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("seq", &self.seq)
            .field("len", &self.data.len())
            .field("format", &self.format())
            .finish()
    }
}

// ============================================================================
// LinkStore
// ============================================================================

struct StoreInner {
    detection: watch::Sender<Option<bool>>,
    frame: watch::Sender<Option<Frame>>,
    frames_received: AtomicU64,
}

/// Detection flag and latest frame for one link.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct LinkStore {
    inner: Arc<StoreInner>,
}

impl Default for LinkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                detection: watch::Sender::new(None),
                frame: watch::Sender::new(None),
                frames_received: AtomicU64::new(0),
            }),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Face detection flag, or `None` before the first status message.
    #[inline]
    #[must_use]
    pub fn detection_enabled(&self) -> Option<bool> {
        *self.inner.detection.borrow()
    }

    /// Subscribes to detection flag changes.
    #[must_use]
    pub fn subscribe_detection(&self) -> watch::Receiver<Option<bool>> {
        self.inner.detection.subscribe()
    }

    /// Latest frame, if any.
    #[must_use]
    pub fn latest_frame(&self) -> Option<Frame> {
        self.inner.frame.borrow().clone()
    }

    /// Subscribes to frame updates.
    #[must_use]
    pub fn subscribe_frames(&self) -> watch::Receiver<Option<Frame>> {
        self.inner.frame.subscribe()
    }

    /// Frames received since the store was created.
    #[inline]
    #[must_use]
    pub fn frames_received(&self) -> u64 {
        self.inner.frames_received.load(Ordering::Relaxed)
    }

    /// Clears the latest frame.
    pub fn reset(&self) {
        self.inner.frame.send_replace(None);
    }

    // ========================================================================
    // Writes
    // ========================================================================

    pub(crate) fn set_detection_enabled(&self, enabled: bool) {
        self.inner.detection.send_if_modified(|current| {
            if *current == Some(enabled) {
                return false;
            }
            *current = Some(enabled);
            true
        });
    }

    /// Replaces the latest frame. Returns its sequence number.
    pub(crate) fn publish_frame(&self, data: Bytes) -> u64 {
        let seq = self.inner.frames_received.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.frame.send_replace(Some(Frame::new(seq, data)));
        seq
    }
}

impl fmt::Debug for LinkStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkStore")
            .field("detection_enabled", &self.detection_enabled())
            .field("frames_received", &self.frames_received())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    fn tiny_png() -> Bytes {
        let pixels = image::RgbImage::from_pixel(3, 2, image::Rgb([200, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(pixels)
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode png");
        Bytes::from(out.into_inner())
    }

    #[test]
    fn test_empty_store() {
        let store = LinkStore::new();
        assert_eq!(store.detection_enabled(), None);
        assert!(store.latest_frame().is_none());
        assert_eq!(store.frames_received(), 0);
    }

    #[test]
    fn test_detection_flag_updates() {
        let store = LinkStore::new();
        let mut rx = store.subscribe_detection();

        store.set_detection_enabled(true);
        assert_eq!(store.detection_enabled(), Some(true));
        assert!(rx.has_changed().expect("sender alive"));
        rx.mark_unchanged();

        // Same value is not a change
        store.set_detection_enabled(true);
        assert!(!rx.has_changed().expect("sender alive"));

        store.set_detection_enabled(false);
        assert_eq!(*rx.borrow_and_update(), Some(false));
    }

    #[test]
    fn test_latest_frame_wins() {
        let store = LinkStore::new();

        assert_eq!(store.publish_frame(Bytes::from_static(b"one")), 1);
        assert_eq!(store.publish_frame(Bytes::from_static(b"two")), 2);

        let frame = store.latest_frame().expect("frame");
        assert_eq!(frame.seq(), 2);
        assert_eq!(frame.data().as_ref(), b"two");
        assert_eq!(store.frames_received(), 2);
    }

    #[test]
    fn test_reset_clears_frame_only() {
        let store = LinkStore::new();
        store.set_detection_enabled(true);
        store.publish_frame(Bytes::from_static(b"frame"));

        store.reset();

        assert!(store.latest_frame().is_none());
        assert_eq!(store.detection_enabled(), Some(true));
        assert_eq!(store.frames_received(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let store = LinkStore::new();
        let reader = store.clone();
        store.publish_frame(Bytes::from_static(b"x"));
        assert_eq!(reader.frames_received(), 1);
    }

    #[test]
    fn test_frame_format_sniffing() {
        let png = Frame::new(1, Bytes::from_static(PNG_MAGIC));
        let jpeg = Frame::new(2, Bytes::from_static(JPEG_MAGIC));
        let junk = Frame::new(3, Bytes::from_static(b"not an image"));

        assert_eq!(png.format(), Some(ImageFormat::Png));
        assert_eq!(jpeg.format(), Some(ImageFormat::Jpeg));
        assert_eq!(junk.format(), None);
    }

    #[test]
    fn test_frame_decode() {
        let frame = Frame::new(1, tiny_png());
        let decoded = frame.decode().expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (3, 2));

        let junk = Frame::new(2, Bytes::from_static(b"garbage"));
        assert!(matches!(junk.decode(), Err(crate::Error::Image(_))));
    }

    #[test]
    fn test_data_url() {
        let frame = Frame::new(1, Bytes::from_static(JPEG_MAGIC));
        let url = frame.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert!(url.ends_with("/9j/4AAQ"));

        let raw = Frame::new(2, Bytes::from_static(b"abc"));
        assert_eq!(raw.to_data_url(), "data:application/octet-stream;base64,YWJj");
    }
}
