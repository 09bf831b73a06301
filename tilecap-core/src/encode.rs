//! Payload extraction for merged regions.
//!
//! - **Content**: the rectangle's pixels, packed row by row with no stride
//!   padding, `width * height * 4` bytes of RGBA8.
//! - **Transparent**: an empty payload. The bounds alone tell the consumer
//!   to clear that area.

use bytes::{BufMut, Bytes, BytesMut};

use crate::frame::{BYTES_PER_PIXEL, FrameBuffer};
use crate::grid::{TileClass, TileRect};

/// Stateless region payload encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaEncoder;

impl DeltaEncoder {
    /// Extract the payload for `rect` of class `class` from `frame`.
    ///
    /// `rect` must lie inside the frame; the merger guarantees this by
    /// clipping to the frame edges.
    pub fn encode(frame: &FrameBuffer<'_>, rect: TileRect, class: TileClass) -> Bytes {
        match class {
            TileClass::Content => Self::pack(frame, rect),
            TileClass::Transparent | TileClass::Clean => Bytes::new(),
        }
    }

    /// Number of payload bytes a `Content` region of this size carries.
    pub fn packed_len(rect: TileRect) -> usize {
        rect.width as usize * rect.height as usize * BYTES_PER_PIXEL
    }

    fn pack(frame: &FrameBuffer<'_>, rect: TileRect) -> Bytes {
        let mut out = BytesMut::with_capacity(Self::packed_len(rect));
        for y in rect.y..rect.bottom() {
            out.put_slice(frame.span(y, rect.x, rect.right()));
        }
        out.freeze()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x3 frame where each pixel is `[x, y, 0, 255]`, rows padded to `stride`.
    fn make_frame_data(stride: usize) -> Vec<u8> {
        let mut data = vec![0xEE; stride * 3];
        for y in 0..3 {
            for x in 0..4 {
                let off = y * stride + x * 4;
                data[off..off + 4].copy_from_slice(&[x as u8, y as u8, 0, 255]);
            }
        }
        data
    }

    #[test]
    fn content_is_tightly_packed() {
        let data = make_frame_data(16);
        let frame = FrameBuffer::new(&data, 4, 3).unwrap();
        let rect = TileRect { x: 1, y: 1, width: 2, height: 2 };
        let payload = DeltaEncoder::encode(&frame, rect, TileClass::Content);
        assert_eq!(payload.len(), DeltaEncoder::packed_len(rect));
        assert_eq!(
            &payload[..],
            &[1, 1, 0, 255, 2, 1, 0, 255, 1, 2, 0, 255, 2, 2, 0, 255]
        );
    }

    #[test]
    fn padded_source_rows_are_skipped() {
        let data = make_frame_data(24);
        let frame = FrameBuffer::with_stride(&data, 4, 3, 24).unwrap();
        let rect = TileRect { x: 0, y: 0, width: 4, height: 3 };
        let payload = DeltaEncoder::encode(&frame, rect, TileClass::Content);
        assert_eq!(payload.len(), 48);
        assert!(!payload.contains(&0xEE));
    }

    #[test]
    fn transparent_payload_is_empty() {
        let data = make_frame_data(16);
        let frame = FrameBuffer::new(&data, 4, 3).unwrap();
        let rect = TileRect { x: 0, y: 0, width: 4, height: 3 };
        assert!(DeltaEncoder::encode(&frame, rect, TileClass::Transparent).is_empty());
    }
}
