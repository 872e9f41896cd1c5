//! Horizon-chart cell palettes.
//!
//! A scheme is four ANSI-256 shades from the terminal default (-1) to the
//! darkest band. Each adjacent pair `(lighter, darker)` becomes one band:
//! glyphs drawn in the darker shade over the lighter background, so a value
//! that overflows one band keeps filling the next. The first band starts at
//! the blank glyph, later bands skip it, giving `9 + 8 + 8 = 25` cells.

use std::collections::HashMap;

use cubestat_core::{ColorTheme, GLYPHS, Group};
use ratatui::style::{Color, Style};

/// Shades of one scheme; `-1` is the terminal default.
type Shades = [i16; 4];

const GREEN: Shades = [-1, 150, 107, 22];
const RED: Shades = [-1, 224, 181, 138];
const BLUE: Shades = [-1, 189, 146, 103];
const PINK: Shades = [-1, 223, 180, 137];
const GRAY: Shades = [-1, 7, 8, 0];
const WHITE: Shades = [-1, 8, 7, 15];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Green,
    Red,
    Blue,
    Pink,
    Gray,
    White,
}

impl Scheme {
    const ALL: [Scheme; 6] = [
        Self::Green,
        Self::Red,
        Self::Blue,
        Self::Pink,
        Self::Gray,
        Self::White,
    ];

    fn shades(self) -> Shades {
        match self {
            Self::Green => GREEN,
            Self::Red => RED,
            Self::Blue => BLUE,
            Self::Pink => PINK,
            Self::Gray => GRAY,
            Self::White => WHITE,
        }
    }

    /// Scheme of `group` under `theme`.
    pub fn for_group(group: Group, theme: ColorTheme) -> Self {
        match theme {
            ColorTheme::Mono => Self::Gray,
            ColorTheme::Inv => Self::White,
            ColorTheme::Col => match group {
                Group::Cpu => Self::Green,
                Group::Memory | Group::Swap => Self::Pink,
                Group::Gpu | Group::Accel | Group::Power => Self::Red,
                Group::Disk | Group::Network => Self::Blue,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub style: Style,
}

fn color(shade: i16) -> Color {
    u8::try_from(shade).map_or(Color::Reset, Color::Indexed)
}

/// Banded cells of one scheme, lightest first.
pub fn banded(shades: Shades) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(GLYPHS.len() * 3);
    for (i, pair) in shades.windows(2).enumerate() {
        let style = Style::default().bg(color(pair[0])).fg(color(pair[1]));
        let skip = if i == 0 { 0 } else { 1 };
        cells.extend(GLYPHS[skip..].iter().map(|&glyph| Cell { glyph, style }));
    }
    cells
}

/// Plain glyphs in the terminal's own colors, for terminals without 256
/// colors.
pub fn mono() -> Vec<Cell> {
    GLYPHS
        .iter()
        .map(|&glyph| Cell {
            glyph,
            style: Style::default(),
        })
        .collect()
}

/// Every scheme's cells, built once.
pub struct Palettes {
    schemes: HashMap<Scheme, Vec<Cell>>,
}

impl Palettes {
    /// Banded palettes if the terminal has at least 256 colors, plain glyphs
    /// otherwise.
    pub fn new(color_count: u16) -> Self {
        let schemes = Scheme::ALL
            .into_iter()
            .map(|s| {
                let cells = if color_count >= 256 { banded(s.shades()) } else { mono() };
                (s, cells)
            })
            .collect();
        Self { schemes }
    }

    pub fn cells(&self, group: Group, theme: ColorTheme) -> &[Cell] {
        self.schemes
            .get(&Scheme::for_group(group, theme))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
