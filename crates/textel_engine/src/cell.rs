use serde::{Deserialize, Serialize};

use crate::{Color, BLACK, WHITE};

/// One grid position: a glyph plus foreground and background colors.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            fg: BLACK,
            bg: WHITE,
        }
    }
}

impl Cell {
    pub fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }

    pub fn is_blank(&self) -> bool {
        self.ch == ' '
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Cell) -> bool {
        self.ch == other.ch && self.fg == other.fg && self.bg == other.bg
    }
}

impl From<char> for Cell {
    fn from(value: char) -> Self {
        Cell {
            ch: value,
            ..Default::default()
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(Char: '{}', fg: {}, bg: {})", self.ch, self.fg, self.bg)
    }
}
