use ratatui::style::{Color, Modifier, Style};

/// Colors used by the terminal front end
#[derive(Clone, Debug)]
pub struct Theme {
    /// Background color for the document pane
    pub background: Color,

    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color for the draft title in the status bar
    pub title_color: Color,

    /// Foreground color for error notices in the status bar
    pub notice_error_fg: Color,

    /// Foreground color for active selection
    pub selection_fg: Color,

    /// Background color for active selection
    pub selection_bg: Color,

    /// Foreground color for toolbar buttons
    pub toolbar_fg: Color,

    /// Background color for the toolbar row
    pub toolbar_bg: Color,

    /// Foreground color for pressed toolbar buttons
    pub toolbar_pressed_fg: Color,

    /// Background color for pressed toolbar buttons
    pub toolbar_pressed_bg: Color,

    /// Color for image placeholders
    pub image_color: Color,

    /// Color for the quote bar and list markers
    pub gutter_color: Color,

    /// Border color of the HTML preview pane
    pub preview_border: Color,

    pub menu_fg: Color,
    pub menu_bg: Color,
    pub menu_disabled_fg: Color,
    pub menu_selected_fg: Color,
    pub menu_selected_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            title_color: Color::LightYellow,
            notice_error_fg: Color::LightRed,
            selection_fg: Color::White,
            selection_bg: Color::LightBlue,
            toolbar_fg: Color::Gray,
            toolbar_bg: Color::Black,
            toolbar_pressed_fg: Color::Black,
            toolbar_pressed_bg: Color::LightCyan,
            image_color: Color::Magenta,
            gutter_color: Color::DarkGray,
            preview_border: Color::DarkGray,
            menu_fg: Color::White,
            menu_bg: Color::Black,
            menu_disabled_fg: Color::DarkGray,
            menu_selected_fg: Color::White,
            menu_selected_bg: Color::LightBlue,
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    pub fn title_style(&self) -> Style {
        Style::default().fg(self.title_color)
    }

    pub fn notice_error_style(&self) -> Style {
        Style::default()
            .fg(self.notice_error_fg)
            .bg(self.status_bar_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    pub fn toolbar_style(&self) -> Style {
        Style::default().fg(self.toolbar_fg).bg(self.toolbar_bg)
    }

    /// Pressed buttons reflect the is-active state at the caret.
    pub fn toolbar_pressed_style(&self) -> Style {
        Style::default()
            .fg(self.toolbar_pressed_fg)
            .bg(self.toolbar_pressed_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn image_style(&self) -> Style {
        Style::default().fg(self.image_color)
    }

    pub fn gutter_style(&self) -> Style {
        Style::default().fg(self.gutter_color)
    }

    pub fn preview_border_style(&self) -> Style {
        Style::default().fg(self.preview_border)
    }

    pub fn menu_style(&self) -> Style {
        Style::default().fg(self.menu_fg).bg(self.menu_bg)
    }

    pub fn menu_disabled_style(&self) -> Style {
        Style::default().fg(self.menu_disabled_fg)
    }

    pub fn menu_selected_style(&self) -> Style {
        Style::default()
            .fg(self.menu_selected_fg)
            .bg(self.menu_selected_bg)
    }
}
