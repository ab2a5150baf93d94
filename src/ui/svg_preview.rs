/// Vector output preview
///
/// The pipeline paints lit pixels with `var(--foreground)`, a CSS variable
/// the SVG rasterizer knows nothing about. The document is recolored with
/// a concrete color from the active theme before it is handed to iced.
use iced::widget::{container, svg, text};
use iced::{Color, Element, Length};

use crate::assets::Asset;
use crate::Message;

const THEME_TOKENS: [&str; 2] = ["var(--foreground)", "currentColor"];

/// Cheap sniff for SVG content
pub fn is_svg(document: &str) -> bool {
    document.contains("<svg")
}

/// Replace theme color tokens with `color` as `#rrggbb`
pub fn recolor(document: &str, color: Color) -> String {
    let [r, g, b, _] = color.into_rgba8();
    let hex = format!("#{r:02x}{g:02x}{b:02x}");

    THEME_TOKENS
        .iter()
        .fold(document.to_string(), |doc, token| doc.replace(token, &hex))
}

pub fn view(asset: &Asset<svg::Handle>, width: f32) -> Element<'_, Message> {
    let content: Element<'_, Message> = match asset {
        Asset::Ready(handle) => svg(handle.clone()).width(Length::Fixed(width)).into(),
        Asset::Loading => text("Loading vector preview...").size(12).into(),
        Asset::Empty => text("No vector output yet").size(12).into(),
        Asset::Unavailable(_) => text("Vector preview unavailable").size(12).into(),
    };

    container(content).padding(8).into()
}
