use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;
use thiserror::Error;

pub const MAGIC: &[u8; 4] = b"SpA1";
pub const HEADER_SIZE: usize = 40;
pub const DEFAULT_VERSION: u16 = 31;
const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpriteError {
    #[error("not a SpA1 sprite")]
    BadMagic,
    #[error("sprite truncated: need {needed} bytes, have {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("frame {index} out of range ({count} frames)")]
    FrameOutOfRange { index: u32, count: u32 },
    #[error("frame {index} is {actual} bytes, expected {expected}")]
    FrameSizeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("sprite has no frames")]
    Empty,
    #[error("sprite dimensions {width}x{height} are too large")]
    TooLarge { width: u32, height: u32 },
}

/// One decoded frame, row-major RGBA.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaFrame {
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// Copy into a `width` x `height` canvas anchored top-left. Extra rows
    /// and columns are transparent; anything beyond the canvas is cropped.
    pub fn padded(&self, width: u32, height: u32) -> RgbaFrame {
        if self.width == width && self.height == height {
            return self.clone();
        }
        let mut out = RgbaFrame::transparent(width, height);
        let copy_bytes = self.width.min(width) as usize * BYTES_PER_PIXEL;
        for y in 0..self.height.min(height) as usize {
            let src = y * self.width as usize * BYTES_PER_PIXEL;
            let dst = y * width as usize * BYTES_PER_PIXEL;
            out.pixels[dst..dst + copy_bytes].copy_from_slice(&self.pixels[src..src + copy_bytes]);
        }
        out
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpriteHeader {
    pub version: u16,
    pub frame_width: u16,
    pub total_width: u32,
    pub height: u32,
    pub frame_count: u32,
}

impl SpriteHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, SpriteError> {
        if buf.len() < HEADER_SIZE {
            return Err(SpriteError::Truncated {
                needed: HEADER_SIZE,
                actual: buf.len(),
            });
        }
        if &buf[..4] != MAGIC {
            return Err(SpriteError::BadMagic);
        }

        let mut cur = Cursor::new(&buf[4..24]);
        let truncated = |_| SpriteError::Truncated {
            needed: HEADER_SIZE,
            actual: buf.len(),
        };
        let version = cur.read_u16::<LittleEndian>().map_err(truncated)?;
        let frame_width = cur.read_u16::<LittleEndian>().map_err(truncated)?;
        let total_width = cur.read_u32::<LittleEndian>().map_err(truncated)?;
        let height = cur.read_u32::<LittleEndian>().map_err(truncated)?;
        let _reserved = cur.read_u32::<LittleEndian>().map_err(truncated)?;
        let frame_count = cur.read_u32::<LittleEndian>().map_err(truncated)?;

        Ok(Self {
            version,
            frame_width,
            total_width,
            height,
            frame_count,
        })
    }

    fn stride(&self) -> Result<usize, SpriteError> {
        (self.total_width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or_else(|| self.too_large())
    }

    fn data_len(&self) -> Result<usize, SpriteError> {
        self.stride()?
            .checked_mul(self.height as usize)
            .ok_or_else(|| self.too_large())
    }

    fn too_large(&self) -> SpriteError {
        SpriteError::TooLarge {
            width: self.total_width,
            height: self.height,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.frame_width.to_le_bytes());
        out.extend_from_slice(&self.total_width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&self.frame_count.to_le_bytes());
        out.resize(out.len() + (HEADER_SIZE - 24), 0);
    }
}

/// A parsed sprite borrowing the source buffer.
pub struct Sprite<'a> {
    pub header: SpriteHeader,
    data: &'a [u8],
}

impl<'a> Sprite<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<Self, SpriteError> {
        let header = SpriteHeader::parse(buf)?;
        let needed = header
            .data_len()?
            .checked_add(HEADER_SIZE)
            .ok_or_else(|| header.too_large())?;
        if buf.len() < needed {
            return Err(SpriteError::Truncated {
                needed,
                actual: buf.len(),
            });
        }
        Ok(Self {
            header,
            data: &buf[HEADER_SIZE..needed],
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.header.frame_count
    }

    /// Copy frame `index`'s column slice out of every row.
    pub fn frame(&self, index: u32) -> Result<RgbaFrame, SpriteError> {
        let h = &self.header;
        if index >= h.frame_count {
            return Err(SpriteError::FrameOutOfRange {
                index,
                count: h.frame_count,
            });
        }
        let out_of_range = || SpriteError::FrameOutOfRange {
            index,
            count: h.frame_count,
        };
        let row_bytes = h.frame_width as usize * BYTES_PER_PIXEL;
        let stride = h.stride()?;
        let end = (index as usize)
            .checked_mul(row_bytes)
            .and_then(|start| start.checked_add(row_bytes))
            .ok_or_else(out_of_range)?;
        if end > stride {
            return Err(out_of_range());
        }
        let start = end - row_bytes;
        let data_len = h.data_len()?;
        if data_len > self.data.len() {
            return Err(SpriteError::Truncated {
                needed: HEADER_SIZE + data_len,
                actual: HEADER_SIZE + self.data.len(),
            });
        }

        let mut pixels = Vec::with_capacity(row_bytes * h.height as usize);
        for y in 0..h.height as usize {
            let src = y * stride + start;
            pixels.extend_from_slice(&self.data[src..src + row_bytes]);
        }
        Ok(RgbaFrame {
            width: h.frame_width as u32,
            height: h.height,
            pixels,
        })
    }
}

/// Encode equally sized frames into one sprite, rows interleaved.
pub fn encode(frames: &[RgbaFrame], version: u16) -> Result<Vec<u8>, SpriteError> {
    let first = frames.first().ok_or(SpriteError::Empty)?;
    let (width, height) = (first.width, first.height);
    let expected = width as usize * height as usize * BYTES_PER_PIXEL;
    for (index, frame) in frames.iter().enumerate() {
        if frame.width != width || frame.height != height || frame.pixels.len() != expected {
            return Err(SpriteError::FrameSizeMismatch {
                index,
                expected,
                actual: frame.pixels.len(),
            });
        }
    }
    let frame_width = u16::try_from(width).map_err(|_| SpriteError::FrameSizeMismatch {
        index: 0,
        expected: u16::MAX as usize,
        actual: width as usize,
    })?;

    let total_width = u32::try_from(frames.len())
        .ok()
        .and_then(|n| width.checked_mul(n))
        .ok_or(SpriteError::TooLarge { width, height })?;
    let header = SpriteHeader {
        version,
        frame_width,
        total_width,
        height,
        frame_count: frames.len() as u32,
    };

    let row_bytes = width as usize * BYTES_PER_PIXEL;
    let mut out = Vec::with_capacity(HEADER_SIZE + header.data_len()?);
    header.write_to(&mut out);
    for y in 0..height as usize {
        for frame in frames {
            out.extend_from_slice(&frame.pixels[y * row_bytes..(y + 1) * row_bytes]);
        }
    }
    Ok(out)
}

/// Encode frames of differing sizes, padding each to the widest and tallest.
pub fn encode_padded(frames: &[RgbaFrame], version: u16) -> Result<Vec<u8>, SpriteError> {
    let width = frames.iter().map(|f| f.width).max().ok_or(SpriteError::Empty)?;
    let height = frames.iter().map(|f| f.height).max().unwrap_or(0);
    let padded: Vec<RgbaFrame> = frames.iter().map(|f| f.padded(width, height)).collect();
    encode(&padded, version)
}
