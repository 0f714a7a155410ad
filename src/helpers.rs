use std::thread::sleep;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

pub fn centered_rect(width: u16, height: u16, cols: u16, rows: u16) -> Rect {
    let actual_width = std::cmp::min(width, cols);
    let actual_height = std::cmp::min(height, rows);
    let x = (cols - actual_width) / 2;
    let y = (rows - actual_height) / 2;
    Rect::new(x, y, actual_width, actual_height)
}

/// Caps the frame loop at a fixed rate: `wait` blocks until the next tick
/// boundary. If the loop fell behind, it resynchronizes instead of trying to
/// catch up with a burst of short frames.
pub struct FramePacer {
    period: Duration,
    next: Instant,
}

impl FramePacer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            sleep(self.next - now);
            self.next += self.period;
        } else {
            self.next = now + self.period;
        }
    }
}

/// Horizontally scrolling text line. The text enters from the right edge,
/// crosses the window, leaves on the left, and comes around again, moving one
/// column every `ticks_per_step` frames.
pub struct Marquee {
    text: String,
    ticks_per_step: u32,
    tick: u32,
    offset: usize,
}

impl Marquee {
    pub fn new(text: &str, ticks_per_step: u32) -> Self {
        Self {
            text: text.to_string(),
            ticks_per_step: ticks_per_step.max(1),
            tick: 0,
            offset: 0,
        }
    }

    /// Advance the scroll clock by one frame.
    pub fn advance(&mut self) {
        self.tick += 1;
        if self.tick >= self.ticks_per_step {
            self.tick = 0;
            self.offset += 1;
        }
    }

    /// The currently visible window, `width` characters wide.
    pub fn window(&self, width: usize) -> String {
        let chars: Vec<char> = self.text.chars().collect();
        let cycle = chars.len() + width;
        let scroll = self.offset % cycle;
        (0..width)
            .map(|col| {
                // character index that has scrolled into this column, if any
                let pos = scroll + col;
                if pos < width || pos - width >= chars.len() {
                    ' '
                } else {
                    chars[pos - width]
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marquee_scrolls_in_from_the_right() {
        let mut marquee = Marquee::new("HI", 1);
        assert_eq!(marquee.window(4), "    ");
        marquee.advance();
        assert_eq!(marquee.window(4), "   H");
        marquee.advance();
        assert_eq!(marquee.window(4), "  HI");
    }

    #[test]
    fn marquee_leaves_on_the_left_and_wraps() {
        let mut marquee = Marquee::new("HI", 1);
        for _ in 0..5 {
            marquee.advance();
        }
        assert_eq!(marquee.window(4), "I   ");
        // a full cycle is text length + window width
        marquee.advance();
        assert_eq!(marquee.window(4), "    ");
        marquee.advance();
        assert_eq!(marquee.window(4), "   H");
    }

    #[test]
    fn marquee_steps_only_every_n_frames() {
        let mut slow = Marquee::new("HI", 10);
        let before = slow.window(4);
        for _ in 0..9 {
            slow.advance();
        }
        assert_eq!(slow.window(4), before);
        slow.advance();
        assert_ne!(slow.window(4), before);
    }
}
