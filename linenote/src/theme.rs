//! Color themes for linenote.
//!
//! A `Theme` names one `Color` per UI surface. Two built-ins ship:
//!
//! - `dark` uses the ANSI 16 palette and works on any terminal.
//! - `catppuccin_mocha` uses the Catppuccin Mocha palette and needs truecolor.

use ratatui::style::Color;

/// All color values used across linenote's panels and overlays.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    /// Border color for the focused panel.
    pub border_active: Color,
    /// Border color for unfocused panels.
    pub border_inactive: Color,

    // Document view
    /// Line numbers in the gutter.
    pub gutter: Color,
    /// Gutter marker for lines anchoring an open thread.
    pub marker_open: Color,
    /// Gutter marker for lines anchoring only resolved threads.
    pub marker_resolved: Color,
    /// Background of the cursor line.
    pub cursor_line_bg: Color,
    /// Background of the line selection.
    pub selection_bg: Color,

    // Threads
    /// Author names in the thread panel and tree.
    pub author: Color,
    /// Timestamps and other secondary text.
    pub muted: Color,
    /// Thread header for open threads.
    pub thread_open: Color,
    /// Thread header for resolved threads.
    pub thread_resolved: Color,

    // Notices
    pub notice_info: Color,
    pub notice_warning: Color,
    pub notice_error: Color,

    // Status bar
    /// Status bar background.
    pub status_bar_bg: Color,
    /// Status bar foreground.
    pub status_bar_fg: Color,
    /// Mode indicator in NORMAL mode.
    pub status_mode_normal: Color,
    /// Mode indicator while a selection or prompt is active.
    pub status_mode_insert: Color,
}

impl Theme {
    /// Built-in dark theme on the ANSI 16 palette.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            gutter: Color::DarkGray,
            marker_open: Color::Yellow,
            marker_resolved: Color::Green,
            cursor_line_bg: Color::Indexed(236),
            selection_bg: Color::Indexed(238),

            author: Color::Cyan,
            muted: Color::DarkGray,
            thread_open: Color::Yellow,
            thread_resolved: Color::Green,

            notice_info: Color::Green,
            notice_warning: Color::Yellow,
            notice_error: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
        }
    }

    /// Catppuccin Mocha theme in RGB truecolor.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let sapphire = Color::Rgb(116, 199, 236); // #74c7ec
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface0 = Color::Rgb(49, 50, 68); // #313244
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            gutter: overlay1,
            marker_open: peach,
            marker_resolved: green,
            cursor_line_bg: surface0,
            selection_bg: surface1,

            author: sapphire,
            muted: overlay1,
            thread_open: peach,
            thread_resolved: green,

            notice_info: green,
            notice_warning: yellow,
            notice_error: red,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
        }
    }

    /// Resolves a configured theme name. Unknown names log a warning and fall
    /// back to `dark()`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_falls_back_to_dark() {
        assert_eq!(Theme::from_name("solarized").border_active, Theme::dark().border_active);
        assert_eq!(
            Theme::from_name("catppuccin_mocha").marker_open,
            Theme::catppuccin_mocha().marker_open
        );
    }
}
