//! Colours: One Dark defaults, palette variants, hex → ratatui Color.

use crate::Palette;
use crate::piece;
use ratatui::style::Color;
use thiserror::Error;

/// Hex sources for the piece colours: red, blue, yellow, then green, magenta, cyan for any
/// other letter.
type PieceHex = [&'static str; 6];

const ONEDARK: PieceHex = ["#E06C75", "#61AFEF", "#E5C07B", "#98C379", "#C678DD", "#56B6C2"];
const HIGH_CONTRAST: PieceHex = ["#FF0000", "#0088FF", "#FFFF00", "#00FF00", "#FF00FF", "#00FFFF"];
// Avoid red/green alone.
const COLORBLIND: PieceHex = ["#CC3311", "#0077BB", "#EE7733", "#009988", "#EE3377", "#BBBB00"];

/// UI colours plus one colour per capsule/virus letter.
#[derive(Debug, Clone)]
pub struct Theme {
    pieces: [Color; 6],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text.
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Help text and the pause overlay.
    pub inactive_fg: Color,
    /// Background behind cells about to be cleared.
    pub matched_bg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Theme {
    /// One Dark UI colours with the palette's piece colours.
    pub fn for_palette(palette: Palette) -> Result<Self, ThemeError> {
        let hex = match palette {
            Palette::Normal => ONEDARK,
            Palette::HighContrast => HIGH_CONTRAST,
            Palette::Colorblind => COLORBLIND,
        };
        let mut pieces = [Color::Reset; 6];
        for (slot, h) in pieces.iter_mut().zip(hex) {
            *slot = parse_hex(h)?;
        }
        Ok(Self {
            pieces,
            bg: parse_hex("#31353F")?,
            div_line: parse_hex("#3F444F")?,
            main_fg: parse_hex("#ABB2BF")?,
            title: parse_hex("#E5C07B")?,
            inactive_fg: parse_hex("#5C6370")?,
            matched_bg: parse_hex("#5C6370")?,
        })
    }

    /// Colour for a capsule or virus letter.
    pub fn piece_color(&self, color: piece::Color) -> Color {
        let index = match color.as_char() {
            'R' => 0,
            'B' => 1,
            'Y' => 2,
            other => 3 + (other as usize) % 3,
        };
        self.pieces[index]
    }
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| invalid())
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
