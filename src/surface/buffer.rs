//! Layer buffers and their ping-pong pairs

use image::RgbaImage;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::brush::Color;
use crate::core::errors::CoreError;

/// Straight-alpha RGBA pixels, `f32` per channel
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl PixelBuffer {
    /// Allocate a transparent buffer, reporting allocation failure instead of aborting
    pub fn try_new(width: u32, height: u32) -> Result<Self, CoreError> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(CoreError::Allocation { width, height })?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| CoreError::Allocation { width, height })?;
        pixels.resize(len, [0.0; 4]);

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|i| Color::from_array(self.pixels[i]))
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> Option<&mut [f32; 4]> {
        self.index(x, y).map(move |i| &mut self.pixels[i])
    }

    /// Fill the buffer from a background texture, stretched with nearest sampling
    pub fn stamp_background(&mut self, background: &RgbaImage) {
        let (bw, bh) = background.dimensions();
        let width = self.width as usize;
        if bw == 0 || bh == 0 || width == 0 {
            self.pixels.fill([0.0; 4]);
            return;
        }

        let (w, h) = (self.width, self.height);
        self.pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let sy = ((y as u64 * bh as u64) / h as u64) as u32;
                for (x, px) in row.iter_mut().enumerate() {
                    let sx = ((x as u64 * bw as u64) / w as u64) as u32;
                    *px = Color::from_rgba8(background.get_pixel(sx, sy).0).to_array();
                }
            });
    }

    /// Copy every pixel from a buffer of the same size
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        debug_assert_eq!(self.pixels.len(), other.pixels.len());
        self.pixels.copy_from_slice(&other.pixels);
    }

    /// SHA-256 of the dimensions and raw channel bits, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        for px in &self.pixels {
            for c in px {
                hasher.update(c.to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// Two equally sized buffers; `active` holds the latest composited result
#[derive(Debug, Clone)]
pub struct PingPong {
    slots: [PixelBuffer; 2],
    active: usize,
}

impl PingPong {
    pub fn try_new(width: u32, height: u32, background: &RgbaImage) -> Result<Self, CoreError> {
        let mut pair = Self {
            slots: [
                PixelBuffer::try_new(width, height)?,
                PixelBuffer::try_new(width, height)?,
            ],
            active: 0,
        };
        pair.reset(background);
        Ok(pair)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &PixelBuffer {
        &self.slots[self.active]
    }

    pub fn active_mut(&mut self) -> &mut PixelBuffer {
        &mut self.slots[self.active]
    }

    pub fn inactive(&self) -> &PixelBuffer {
        &self.slots[1 - self.active]
    }

    pub(crate) fn flip(&mut self) {
        self.active = 1 - self.active;
    }

    /// Bring the active slot up to date with the inactive one
    pub(crate) fn carry_forward(&mut self) {
        let [a, b] = &mut self.slots;
        if self.active == 0 {
            a.copy_from(b);
        } else {
            b.copy_from(a);
        }
    }

    /// Stamp the background into both slots, leaving `active` alone
    pub(crate) fn reset(&mut self, background: &RgbaImage) {
        for slot in &mut self.slots {
            slot.stamp_background(background);
        }
    }
}
