//! Colours used by the scene builder.

use erd_core::TableColor;

/// 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Rgba,
    pub node_fill: Rgba,
    pub node_stroke: Rgba,
    pub selected_stroke: Rgba,
    pub separator: Rgba,
    pub title_text: Rgba,
    pub column_text: Rgba,
    pub editing_text: Rgba,
    pub handle_fill: Rgba,
    pub handle_dot: Rgba,
    pub edge: Rgba,
    header_white: Rgba,
    header_blue: Rgba,
    header_green: Rgba,
    header_red: Rgba,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn light() -> Self {
        Self {
            background: Rgba::rgb(0xfa, 0xfa, 0xfb),
            node_fill: Rgba::rgb(0xff, 0xff, 0xff),
            node_stroke: Rgba::rgb(0xcc, 0xcc, 0xcc),
            selected_stroke: Rgba::rgb(0x3b, 0x82, 0xf6),
            separator: Rgba::rgb(0xe4, 0xe4, 0xe8),
            title_text: Rgba::rgb(0x11, 0x18, 0x27),
            column_text: Rgba::rgb(0x37, 0x41, 0x51),
            editing_text: Rgba::rgb(0x25, 0x63, 0xeb),
            handle_fill: Rgba::rgb(0xf3, 0xf4, 0xf6),
            handle_dot: Rgba::rgb(0x6b, 0x72, 0x80),
            edge: Rgba::rgb(0x64, 0x74, 0x8b),
            header_white: Rgba::rgb(0xff, 0xff, 0xff),
            header_blue: Rgba::rgb(0x8e, 0xb3, 0xf0),
            header_green: Rgba::rgb(0xbb, 0xe5, 0xd1),
            header_red: Rgba::rgb(0xf8, 0xca, 0xca),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Rgba::rgb(0x18, 0x18, 0x1b),
            node_fill: Rgba::rgb(0x27, 0x27, 0x2a),
            node_stroke: Rgba::rgb(0x52, 0x52, 0x5b),
            selected_stroke: Rgba::rgb(0x60, 0xa5, 0xfa),
            separator: Rgba::rgb(0x3f, 0x3f, 0x46),
            title_text: Rgba::rgb(0xf4, 0xf4, 0xf5),
            column_text: Rgba::rgb(0xd4, 0xd4, 0xd8),
            editing_text: Rgba::rgb(0x93, 0xc5, 0xfd),
            handle_fill: Rgba::rgb(0x3f, 0x3f, 0x46),
            handle_dot: Rgba::rgb(0xa1, 0xa1, 0xaa),
            edge: Rgba::rgb(0x94, 0xa3, 0xb8),
            header_white: Rgba::rgb(0x3f, 0x3f, 0x46),
            header_blue: Rgba::rgb(0x1e, 0x3a, 0x8a),
            header_green: Rgba::rgb(0x14, 0x53, 0x2d),
            header_red: Rgba::rgb(0x7f, 0x1d, 0x1d),
        }
    }

    pub fn header_fill(&self, color: TableColor) -> Rgba {
        match color {
            TableColor::White => self.header_white,
            TableColor::Blue => self.header_blue,
            TableColor::Green => self.header_green,
            TableColor::Red => self.header_red,
        }
    }
}
