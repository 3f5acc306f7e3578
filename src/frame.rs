//! Frame wire format and decoding.
//!
//! The camera side sends stills over one persistent TCP connection as a
//! 4-byte little-endian unsigned length followed by that many bytes of
//! encoded image data. A declared length of zero is a "no frame this
//! cycle" sentinel: nothing further is read and the caller retries on
//! the next iteration.
//!
//! There is deliberately no timeout and no backpressure here; the
//! sender and receiver are a single-producer, single-consumer pair. A
//! timeout, when configured, is applied to the socket itself before the
//! loop starts.

use std::io::Read;

use anyhow::{anyhow, Context, Result};
use image::GenericImageView;

/// Size of the length prefix preceding every frame payload.
pub const LENGTH_PREFIX_BYTES: usize = 4;

/// Outcome of one wire read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameRead {
    /// A complete frame payload of the declared length.
    Frame(Vec<u8>),
    /// Declared length was zero: skip this cycle, read again.
    Skip,
    /// The sender closed the connection cleanly at a frame boundary.
    EndOfStream,
}

/// Read one length-prefixed frame from the connection.
///
/// A clean close at the prefix boundary is a normal `EndOfStream`; a
/// close once the prefix or payload has begun is truncation and fails.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<FrameRead> {
    let mut prefix = [0u8; LENGTH_PREFIX_BYTES];
    let mut filled = 0;
    while filled < prefix.len() {
        let n = reader
            .read(&mut prefix[filled..])
            .context("read frame length prefix")?;
        if n == 0 {
            if filled == 0 {
                return Ok(FrameRead::EndOfStream);
            }
            return Err(anyhow!(
                "stream truncated inside length prefix ({} of {} bytes)",
                filled,
                LENGTH_PREFIX_BYTES
            ));
        }
        filled += n;
    }

    let declared = u32::from_le_bytes(prefix);
    if declared == 0 {
        return Ok(FrameRead::Skip);
    }

    let mut payload = Vec::new();
    let read = reader
        .take(declared as u64)
        .read_to_end(&mut payload)
        .context("read frame payload")?;
    if read != declared as usize {
        return Err(anyhow!(
            "stream truncated: expected {} payload bytes, got {}",
            declared,
            read
        ));
    }
    Ok(FrameRead::Frame(payload))
}

/// A frame payload decoded into pixels.
///
/// Decoding is delegated entirely to the `image` codec; the payload
/// format is whatever the sender encoded (JPEG in practice). Frames are
/// allocated per iteration and dropped after processing.
pub struct DecodedFrame {
    image: image::DynamicImage,
}

impl DecodedFrame {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).context("decode frame image")?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.image.dimensions().1
    }

    /// Grayscale plane, row-major. The classical detectors work on this.
    pub fn luma(&self) -> Vec<u8> {
        self.image.to_luma8().into_raw()
    }

    /// Interleaved RGB8 copy.
    pub fn rgb(&self) -> Vec<u8> {
        self.image.to_rgb8().into_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wire(frames: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for frame in frames {
            out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
            out.extend_from_slice(frame);
        }
        out
    }

    #[test]
    fn round_trips_payload_bytes() {
        let payload = b"not really a jpeg".as_slice();
        let mut cursor = Cursor::new(wire(&[payload]));
        assert_eq!(
            read_frame(&mut cursor).unwrap(),
            FrameRead::Frame(payload.to_vec())
        );
        assert_eq!(read_frame(&mut cursor).unwrap(), FrameRead::EndOfStream);
    }

    #[test]
    fn zero_length_is_skip_and_consumes_no_payload() {
        let mut bytes = wire(&[b""]);
        bytes.extend_from_slice(&wire(&[b"after"]));
        let mut cursor = Cursor::new(bytes);
        assert_eq!(read_frame(&mut cursor).unwrap(), FrameRead::Skip);
        // The frame after the sentinel is still intact.
        assert_eq!(
            read_frame(&mut cursor).unwrap(),
            FrameRead::Frame(b"after".to_vec())
        );
    }

    #[test]
    fn clean_close_at_boundary_is_end_of_stream() {
        let mut cursor = Cursor::new(Vec::new());
        assert_eq!(read_frame(&mut cursor).unwrap(), FrameRead::EndOfStream);
    }

    #[test]
    fn close_inside_prefix_is_truncation() {
        let mut cursor = Cursor::new(vec![0x05, 0x00]);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("truncated"), "{}", err);
    }

    #[test]
    fn close_inside_payload_is_truncation() {
        let mut bytes = (100u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 10]);
        let mut cursor = Cursor::new(bytes);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("truncated"), "{}", err);
    }

    #[test]
    fn decodes_encoded_still() {
        let rgb = image::RgbImage::from_pixel(8, 6, image::Rgb([10, 200, 30]));
        let mut encoded = Cursor::new(Vec::new());
        rgb.write_to(&mut encoded, image::ImageFormat::Png)
            .expect("encode test image");

        let frame = DecodedFrame::decode(encoded.get_ref()).expect("decode");
        assert_eq!(frame.width(), 8);
        assert_eq!(frame.height(), 6);
        assert_eq!(frame.luma().len(), 8 * 6);
        assert_eq!(frame.rgb().len(), 8 * 6 * 3);
    }

    #[test]
    fn garbage_payload_fails_decode() {
        assert!(DecodedFrame::decode(b"not an image").is_err());
    }
}
