use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is used by the environment to put the framebuffer on a screen. It
/// should abstract the implementation details, so a variety of kinds of
/// screen would work.
pub trait Display {
    /// draw one frame: row-major pixels, one byte each, non-zero is lit
    fn draw(&mut self, pixels: &[u8]) -> Result<(), io::Error>;

    /// how many pixels a frame must have
    fn pixel_count(&self) -> usize;
}

// store useful metadata about the screen
#[derive(Debug, Clone, Copy)]
struct Resolution(usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every lit pixel. y grows downward on the
    /// machine and upward on the canvas, hence the negation
    fn lit_points<'a>(&self, pixels: &'a [u8]) -> impl Iterator<Item = (f64, f64)> + 'a {
        let w = self.0;
        pixels
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p != 0)
            .map(move |(n, _)| ((n % w) as f64, -1.0 * (n / w) as f64))
    }

    fn check_frame(&self, pixels: &[u8]) -> Result<(), io::Error> {
        if pixels.len() == self.pixel_count() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "frame has {} pixels, display needs {}",
                    pixels.len(),
                    self.pixel_count()
                ),
            ))
        }
    }
}

/// monochrome display in a terminal, rendered using TUI and Crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new(x: usize, y: usize) -> Result<MonoTermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(x, y),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, pixels: &[u8]) -> Result<(), io::Error> {
        self.resolution.check_frame(pixels)?;
        let lit: Vec<(f64, f64)> = self.resolution.lit_points(pixels).collect();
        let resolution = self.resolution;

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }

    fn pixel_count(&self) -> usize {
        self.resolution.pixel_count()
    }
}

/// useful for testing non-display routines; keeps every frame it is given
pub struct DummyDisplay {
    resolution: Resolution,
    pub frames: Vec<Vec<u8>>,
}

impl DummyDisplay {
    pub fn new(x: usize, y: usize) -> DummyDisplay {
        DummyDisplay {
            resolution: Resolution(x, y),
            frames: Vec::new(),
        }
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, pixels: &[u8]) -> Result<(), io::Error> {
        self.resolution.check_frame(pixels)?;
        self.frames.push(pixels.to_vec());
        Ok(())
    }

    fn pixel_count(&self) -> usize {
        self.resolution.pixel_count()
    }
}
