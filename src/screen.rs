// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Stores and displays the Chip-8's screen memory
//!
//! The interpreter is the only writer. Renderers hold a [ScreenView], which
//! reads the same pixels without locking; each pixel is an atomic boolean, so
//! a reader sees every pixel as either its old or new state, never torn.

use std::{
    fmt::{Debug, Display, Formatter},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

/// Width of the screen, in pixels
pub const WIDTH: usize = 64;
/// Height of the screen, in pixels
pub const HEIGHT: usize = 32;

struct Pixels {
    cells: Box<[AtomicBool]>,
    /// Bumped after every draw or clear
    generation: AtomicU64,
}

impl Pixels {
    fn get(&self, x: usize, y: usize) -> bool {
        self.cells[(y % HEIGHT) * WIDTH + x % WIDTH].load(Ordering::Relaxed)
    }

    fn snapshot(&self) -> Vec<bool> {
        self.cells.iter().map(|p| p.load(Ordering::Relaxed)).collect()
    }

    fn fmt_rows(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for y in 0..HEIGHT {
            let row: String = (0..WIDTH)
                .map(|x| if self.get(x, y) { '█' } else { ' ' })
                .collect();
            writeln!(f, "|{row}|")?;
        }
        Ok(())
    }
}

/// The 64x32 monochrome framebuffer
pub struct Screen {
    pixels: Arc<Pixels>,
}

impl Default for Screen {
    fn default() -> Self {
        Screen::new()
    }
}

impl Screen {
    /// Constructs a new, blank screen
    pub fn new() -> Self {
        Screen {
            pixels: Arc::new(Pixels {
                cells: (0..WIDTH * HEIGHT).map(|_| AtomicBool::new(false)).collect(),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Gets a read-only handle which can be sent to a renderer
    pub fn view(&self) -> ScreenView {
        ScreenView {
            pixels: Arc::clone(&self.pixels),
        }
    }

    /// Gets the pixel at (x, y), wrapping both coordinates
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels.get(x, y)
    }

    /// Toggles the pixel at (x, y), wrapping both coordinates.
    ///
    /// Returns true if the pixel was set before the toggle (a collision).
    pub fn toggle(&mut self, x: usize, y: usize) -> bool {
        self.pixels.cells[(y % HEIGHT) * WIDTH + x % WIDTH].fetch_xor(true, Ordering::Relaxed)
    }

    /// Turns every set pixel off, one toggle at a time
    pub fn clear(&mut self) {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                if self.get(x, y) {
                    self.toggle(x, y);
                }
            }
        }
        self.bump();
    }

    /// XORs an 8-pixel-wide sprite onto the screen with its top-left corner at (x, y).
    ///
    /// Each byte of `rows` is one row, most significant bit leftmost. Pixels
    /// which fall off an edge wrap around to the opposite edge.
    ///
    /// Returns true if any set pixel was turned off.
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// let mut screen = Screen::new();
    /// assert!(!screen.draw_sprite(63, 31, &[0b1100_0000]));
    /// assert!(screen.get(63, 31) && screen.get(0, 31));
    /// // drawing it again erases it, and reports the collision
    /// assert!(screen.draw_sprite(63, 31, &[0b1100_0000]));
    /// assert!(!screen.get(63, 31) && !screen.get(0, 31));
    /// ```
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let mut collision = false;
        for (line, &row) in rows.iter().enumerate() {
            for bit in (0..8).filter(|bit| row & (0x80 >> bit) != 0) {
                collision |= self.toggle(x as usize + bit, y as usize + line);
            }
        }
        self.bump();
        collision
    }

    /// Copies the current pixel states, row-major
    pub fn snapshot(&self) -> Vec<bool> {
        self.pixels.snapshot()
    }

    /// Gets the number of draws and clears performed so far
    pub fn generation(&self) -> u64 {
        self.pixels.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.pixels.generation.fetch_add(1, Ordering::Release);
    }
}

impl Debug for Screen {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl Display for Screen {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.pixels.fmt_rows(f)
    }
}

/// A read-only view of a [Screen], for renderers on other threads
#[derive(Clone)]
pub struct ScreenView {
    pixels: Arc<Pixels>,
}

impl ScreenView {
    /// Gets the pixel at (x, y), wrapping both coordinates
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels.get(x, y)
    }

    /// Copies the current pixel states, row-major
    pub fn snapshot(&self) -> Vec<bool> {
        self.pixels.snapshot()
    }

    /// Gets the number of draws and clears performed so far.
    ///
    /// A renderer can skip redrawing while this is unchanged.
    pub fn generation(&self) -> u64 {
        self.pixels.generation.load(Ordering::Acquire)
    }

    /// Prints the screen to stdout, using braille characters if available
    pub fn print_screen(&self) {
        // draw with the drawille library, if available
        #[cfg(feature = "drawille")]
        {
            use drawille::Canvas;
            let mut canvas = Canvas::new(WIDTH as u32, HEIGHT as u32);
            for (index, _) in self.snapshot().iter().enumerate().filter(|&(_, &p)| p) {
                canvas.set((index % WIDTH) as u32, (index / WIDTH) as u32);
            }
            println!("{}", canvas.frame());
        }
        #[cfg(not(feature = "drawille"))]
        print!("{self}");
    }
}

impl Debug for ScreenView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenView")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl Display for ScreenView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.pixels.fmt_rows(f)
    }
}
