//! 64x32 monochrome framebuffer, one byte (0 or 1) per pixel, row-major.

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
pub const SCREEN_PIXELS: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// sprites are always one byte wide
const SPRITE_WIDTH: usize = 8;

#[derive(Clone)]
pub struct Framebuffer {
    pixels: Box<[u8; SCREEN_PIXELS]>,
    redraw_pending: bool,
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            pixels: Box::new([0; SCREEN_PIXELS]),
            redraw_pending: false,
        }
    }

    /// blank every pixel
    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.redraw_pending = true;
    }

    /// XOR a sprite onto the screen at (x, y), one row per byte, MSB leftmost.
    /// Coordinates wrap per pixel at the screen edges. Returns true if any lit
    /// pixel was switched off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let mut collision = false;
        for (dy, &row) in rows.iter().enumerate() {
            for dx in 0..SPRITE_WIDTH {
                if row & (0x80u8 >> dx) == 0 {
                    continue;
                }
                let px = (x as usize + dx) % SCREEN_WIDTH;
                let py = (y as usize + dy) % SCREEN_HEIGHT;
                let pix = &mut self.pixels[px + py * SCREEN_WIDTH];
                if *pix == 1 {
                    collision = true;
                }
                *pix ^= 1;
            }
        }
        self.redraw_pending = true;
        collision
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
            Some(self.pixels[x + y * SCREEN_WIDTH])
        } else {
            None
        }
    }

    /// read-only row-major view, index = x + y*64
    pub fn pixels(&self) -> &[u8] {
        &self.pixels[..]
    }

    pub fn redraw_pending(&self) -> bool {
        self.redraw_pending
    }

    /// called by whoever consumed the frame
    pub fn clear_redraw(&mut self) {
        self.redraw_pending = false;
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}
