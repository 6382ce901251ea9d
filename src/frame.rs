use crate::error::{SwingsyncError, SwingsyncResult};

/// Bytes per pixel for the fixed BGR24 frame layout.
pub const BYTES_PER_PIXEL: usize = 3;

/// Solid color in BGR byte order, matching the frame layout.
pub type Bgr = [u8; 3];

pub const TINT_YELLOW: Bgr = [0, 255, 255];
pub const TINT_GREEN: Bgr = [0, 255, 0];

/// A decoded video frame: BGR24, row-major, origin top-left.
///
/// Frames are treated as values once placed into a sequence; the only
/// in-place mutation is [`RasterFrame::tint`], which is why freeze-frame
/// copies must be real buffers rather than aliases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterFrame {
    /// All-black frame of the given size.
    pub fn black(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// Wrap an existing BGR24 buffer, validating its length.
    pub fn from_bgr(width: u32, height: u32, data: Vec<u8>) -> SwingsyncResult<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(SwingsyncError::validation(format!(
                "frame buffer length {} does not match {width}x{height}x{BYTES_PER_PIXEL}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Bgr {
        let off = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [self.data[off], self.data[off + 1], self.data[off + 2]]
    }

    /// In-place highlight tint: `0.8 * original + 0.2 * color`, rounded.
    ///
    /// Deliberately not idempotent; tinting twice compounds the blend.
    pub fn tint(&mut self, color: Bgr) {
        for px in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            for c in 0..BYTES_PER_PIXEL {
                px[c] = blend_204_51(px[c], color[c]);
            }
        }
    }

    /// Copy a frame into this one at the given top-left offset.
    ///
    /// The source must fit entirely inside the destination.
    pub fn blit(&mut self, src: &RasterFrame, x: u32, y: u32) -> SwingsyncResult<()> {
        if x + src.width > self.width || y + src.height > self.height {
            return Err(SwingsyncError::validation(format!(
                "blit of {}x{} at ({x},{y}) exceeds {}x{} canvas",
                src.width, src.height, self.width, self.height
            )));
        }
        let dst_stride = self.width as usize * BYTES_PER_PIXEL;
        let src_stride = src.width as usize * BYTES_PER_PIXEL;
        for row in 0..src.height as usize {
            let d = (y as usize + row) * dst_stride + x as usize * BYTES_PER_PIXEL;
            let s = row * src_stride;
            self.data[d..d + src_stride].copy_from_slice(&src.data[s..s + src_stride]);
        }
        Ok(())
    }
}

/// Place two frames side by side, left half first.
pub fn hstack(left: &RasterFrame, right: &RasterFrame) -> SwingsyncResult<RasterFrame> {
    if left.height != right.height {
        return Err(SwingsyncError::validation(format!(
            "hstack height mismatch: {} vs {}",
            left.height, right.height
        )));
    }
    let mut out = RasterFrame::black(left.width + right.width, left.height);
    out.blit(left, 0, 0)?;
    out.blit(right, left.width, 0)?;
    Ok(out)
}

// 0.8/0.2 blend in integer arithmetic: 204 + 51 = 255, rounded.
fn blend_204_51(orig: u8, color: u8) -> u8 {
    ((u32::from(orig) * 204 + u32::from(color) * 51 + 127) / 255) as u8
}
