//! Title card synthesis: a fixed 5-second intro block with centered,
//! auto-scaled, word-wrapped text on a black canvas.
//!
//! Layout (wrapping, autoscale, vertical placement) is pure arithmetic
//! over a text-measuring closure, so it is testable without a font on
//! the machine; only rasterization needs real glyphs.

use std::path::PathBuf;

use fontdue::{
    Font, FontSettings,
    layout::{CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign, WrapStyle},
};

use crate::{
    error::{SwingsyncError, SwingsyncResult},
    frame::RasterFrame,
};

/// Seconds the title card is held before the clips start.
pub const TITLE_HOLD_SECS: f64 = 5.0;

/// Pixel budget the wrapped description must fit inside.
pub const WRAP_BUDGET_PX: f32 = 900.0;

/// Combined left+right horizontal margin for the autoscale bound.
pub const CANVAS_MARGIN_PX: f32 = 100.0;

const TITLE_PX: f32 = 64.0;
const DESCRIPTION_PX: f32 = 44.0;
const VERSUS_PX: f32 = 42.0;
const DURATION_PX: f32 = 38.0;
const DATE_PX: f32 = 42.0;

/// Everything the card displays. `date` is injected by the caller so
/// rendering stays a pure function.
#[derive(Clone, Debug)]
pub struct TitleCard {
    pub pitcher_name: String,
    pub pitcher_team: String,
    pub hitter_name: String,
    pub hitter_team: String,
    pub description: String,
    pub swing_duration_sec: f64,
    pub date: String,
}

/// One laid-out line: text, font size after autoscale, baseline y.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub px: f32,
    pub y: u32,
}

impl TitleCard {
    /// Lay the card out against a measuring closure
    /// (`measure(text, px) -> width`).
    pub fn layout(
        &self,
        canvas_width: u32,
        measure: impl Fn(&str, f32) -> f32,
    ) -> Vec<PlacedLine> {
        let max_w = canvas_width as f32 - CANVAS_MARGIN_PX;
        let place = |text: &str, px: f32, y: u32| {
            let fitted = fit_px(measure(text, px), px, max_w);
            PlacedLine {
                text: text.to_string(),
                px: fitted,
                y,
            }
        };

        let mut lines = Vec::new();
        let mut y = 150u32;

        lines.push(place("MATCHUP", TITLE_PX, y));
        y += 100;

        let description = self.description.trim();
        if !description.is_empty() {
            for wrapped in wrap_text(description, WRAP_BUDGET_PX, |t| measure(t, DESCRIPTION_PX)) {
                lines.push(place(&wrapped, DESCRIPTION_PX, y));
                y += 70;
            }
            y += 20;
        }

        let versus = format!(
            "{} ({})  vs  {} ({})",
            self.pitcher_name, self.pitcher_team, self.hitter_name, self.hitter_team
        );
        lines.push(place(&versus, VERSUS_PX, y));
        y += 90;

        let duration = format!("Swing Duration: {:.2} sec", self.swing_duration_sec);
        lines.push(place(&duration, DURATION_PX, y));
        y += 70;

        lines.push(place(&self.date, DATE_PX, y));

        lines
    }

    /// Rasterize the card once.
    pub fn render(
        &self,
        painter: &TextPainter,
        canvas_width: u32,
        canvas_height: u32,
    ) -> SwingsyncResult<RasterFrame> {
        let mut canvas = RasterFrame::black(canvas_width, canvas_height);
        for line in self.layout(canvas_width, |t, px| painter.measure(t, px)) {
            painter.draw_centered(&mut canvas, &line.text, line.px, line.y);
        }
        Ok(canvas)
    }

    /// The full intro block: `round(fps * 5)` identical frames.
    pub fn frames(
        &self,
        painter: &TextPainter,
        canvas_width: u32,
        canvas_height: u32,
        fps: f64,
    ) -> SwingsyncResult<Vec<RasterFrame>> {
        let card = self.render(painter, canvas_width, canvas_height)?;
        let count = (fps * TITLE_HOLD_SECS).round() as usize;
        Ok(vec![card; count])
    }
}

/// Greedy word wrap against a pixel budget. A single word wider than
/// the budget still gets its own line.
pub fn wrap_text(text: &str, budget_px: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let candidate = if cur.is_empty() {
            word.to_string()
        } else {
            format!("{cur} {word}")
        };
        if measure(&candidate) > budget_px && !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
            cur = word.to_string();
        } else {
            cur = candidate;
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

// Shrink the font size proportionally when the measured width would
// overflow, so long names never clip off-canvas.
fn fit_px(measured: f32, px: f32, max_w: f32) -> f32 {
    if measured > max_w && measured > 0.0 {
        px * (max_w / measured)
    } else {
        px
    }
}

/// fontdue-backed measurement and white-on-black rasterization.
pub struct TextPainter {
    font: Font,
}

impl TextPainter {
    pub fn from_bytes(font_bytes: &[u8]) -> SwingsyncResult<Self> {
        let font = Font::from_bytes(font_bytes, FontSettings::default())
            .map_err(|e| SwingsyncError::validation(format!("failed to parse font: {e}")))?;
        Ok(Self { font })
    }

    /// Load the configured (`SWINGSYNC_FONT`) or a well-known system
    /// sans-serif font.
    pub fn from_system_font() -> SwingsyncResult<Self> {
        let path = find_system_font().ok_or_else(|| {
            SwingsyncError::validation(
                "no usable font found; set SWINGSYNC_FONT to a .ttf path",
            )
        })?;
        let bytes = std::fs::read(&path).map_err(|e| {
            SwingsyncError::validation(format!("failed to read font '{}': {e}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Advance width of a line at the given size, kerning ignored.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        text.chars()
            .map(|c| self.font.metrics(c, px).advance_width)
            .sum()
    }

    /// Draw one horizontally centered white line with its top edge at `y`.
    pub fn draw_centered(&self, canvas: &mut RasterFrame, text: &str, px: f32, y: u32) {
        let width = self.measure(text, px);
        let x = ((canvas.width as f32 - width) / 2.0).max(0.0);

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x,
            y: y as f32,
            max_width: None,
            max_height: None,
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_height: 1.0,
            wrap_style: WrapStyle::Letter,
            wrap_hard_breaks: false,
        });
        layout.append(&[&self.font], &TextStyle::new(text, px, 0));

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (_, coverage) = self.font.rasterize_config(glyph.key);
            blend_glyph(
                canvas,
                glyph.x.round() as i64,
                glyph.y.round() as i64,
                glyph.width,
                glyph.height,
                &coverage,
            );
        }
    }
}

// Coverage-weighted white over whatever is already on the canvas.
fn blend_glyph(canvas: &mut RasterFrame, x0: i64, y0: i64, w: usize, h: usize, coverage: &[u8]) {
    for gy in 0..h {
        let cy = y0 + gy as i64;
        if cy < 0 || cy >= i64::from(canvas.height) {
            continue;
        }
        for gx in 0..w {
            let cx = x0 + gx as i64;
            if cx < 0 || cx >= i64::from(canvas.width) {
                continue;
            }
            let a = u32::from(coverage[gy * w + gx]);
            if a == 0 {
                continue;
            }
            let off = (cy as usize * canvas.width as usize + cx as usize) * 3;
            for c in 0..3 {
                let d = u32::from(canvas.data[off + c]);
                canvas.data[off + c] = ((d * (255 - a) + 255 * a + 127) / 255) as u8;
            }
        }
    }
}

fn find_system_font() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("SWINGSYNC_FONT") {
        let p = PathBuf::from(p);
        if p.exists() {
            return Some(p);
        }
    }
    const CANDIDATES: [&str; 6] = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    CANDIDATES
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 10 px per character regardless of size, for deterministic layout.
    fn mono(text: &str) -> f32 {
        text.chars().count() as f32 * 10.0
    }

    fn card() -> TitleCard {
        TitleCard {
            pitcher_name: "Nola".into(),
            pitcher_team: "PHI".into(),
            hitter_name: "Betts".into(),
            hitter_team: "LAD".into(),
            description: String::new(),
            swing_duration_sec: 1.2345,
            date: "2026-08-29".into(),
        }
    }

    #[test]
    fn wrap_is_greedy_within_budget() {
        let lines = wrap_text("fastball up and in on the hands", 120.0, mono);
        // 12-char budget: "fastball up" fits, "and in on" fits, etc.
        assert_eq!(lines, vec!["fastball up", "and in on", "the hands"]);
    }

    #[test]
    fn oversized_word_gets_its_own_line() {
        let lines = wrap_text("a pneumonoultramicroscopic b", 100.0, mono);
        assert_eq!(lines, vec!["a", "pneumonoultramicroscopic", "b"]);
    }

    #[test]
    fn wrap_of_empty_text_is_empty() {
        assert!(wrap_text("   ", 100.0, mono).is_empty());
    }

    #[test]
    fn layout_without_description_stacks_four_lines() {
        let lines = card().layout(1280, |t, _| mono(t));
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].text, "MATCHUP");
        assert_eq!(lines[0].y, 150);
        assert_eq!(lines[1].text, "Nola (PHI)  vs  Betts (LAD)");
        assert_eq!(lines[1].y, 250);
        assert_eq!(lines[2].text, "Swing Duration: 1.23 sec");
        assert_eq!(lines[2].y, 340);
        assert_eq!(lines[3].text, "2026-08-29");
        assert_eq!(lines[3].y, 410);
    }

    #[test]
    fn layout_with_description_shifts_following_lines() {
        let mut c = card();
        c.description = "fastball up and in on the hands".into();
        // Monospace measure: the whole description fits in 900 px.
        let lines = c.layout(1280, |t, _| mono(t));
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1].text, "fastball up and in on the hands");
        assert_eq!(lines[1].y, 250);
        // One wrapped line: vs moves down by 70 + 20.
        assert_eq!(lines[2].y, 340);
    }

    #[test]
    fn long_line_is_scaled_down_to_fit() {
        let mut c = card();
        c.pitcher_name = "Extraordinarily Long Pitcher Name Jr.".into();
        let wide = |t: &str| t.chars().count() as f32 * 25.0;
        let lines = c.layout(1280, |t, _| wide(t));
        let versus = &lines[1];
        let measured = wide(&versus.text);
        assert!(measured > 1180.0);
        let expected = VERSUS_PX * (1180.0 / measured);
        assert!((versus.px - expected).abs() < 1e-4);
        // Unaffected lines keep their base size.
        assert_eq!(lines[0].px, TITLE_PX);
    }

    #[test]
    fn render_and_hold_when_a_font_is_available() {
        let Ok(painter) = TextPainter::from_system_font() else {
            eprintln!("skipping: no system font available");
            return;
        };
        let frames = card().frames(&painter, 1280, 720, 30.0).unwrap();
        assert_eq!(frames.len(), 150);
        let f = &frames[0];
        assert_eq!((f.width, f.height), (1280, 720));
        // Something non-black was drawn.
        assert!(f.data.iter().any(|&b| b > 0));
        // All frames in the hold are identical.
        assert!(frames.iter().all(|fr| fr == f));
    }

    #[test]
    fn title_hold_count_rounds_with_rate() {
        assert_eq!((29.97f64 * TITLE_HOLD_SECS).round() as usize, 150);
        assert_eq!((24.0f64 * TITLE_HOLD_SECS).round() as usize, 120);
    }
}
