//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Status;

/// Used for the To Start column
pub const SLATE: Color = Color::Rgb(90, 110, 140);
/// Used for the In Progress column
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Used for the Pending column
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);
/// Used for the Done column
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);

/// Background of a card that was just confirmed by the store.
pub const HIGHLIGHT: Color = Color::Rgb(0, 150, 90);
/// Status bar after a move was reverted.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);

/// Theme color of a status column.
pub fn status_color(status: Status) -> Color {
    match status {
        Status::ToStart => SLATE,
        Status::InProgress => GOLD,
        Status::Pending => DARK_PURPLE,
        Status::Done => DARK_GREEN,
    }
}

/// Readable foreground on top of `bg`.
pub fn text_on(bg: Color) -> Color {
    match bg {
        GOLD => Color::Rgb(20, 20, 20),
        _ => Color::White,
    }
}
