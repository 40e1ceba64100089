use clap::builder::styling::{AnsiColor, Effects, Style, Styles};
use std::fmt::Write;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Whether stdout is a terminal that understands ANSI escape sequences.
static IS_ANSI_TERMINAL: std::sync::LazyLock<bool> =
    std::sync::LazyLock::new(freshutils::is_ansi_terminal);

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns a `Styles` object with the default styles for the CLI.
pub fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

/// Prints a progress line, `* message`, with a green star on capable terminals.
pub fn print_step(message: impl AsRef<str>) {
    println!("{} {}", "*".valid(), message.as_ref());
}

fn apply_style(text: String, style: &Style) -> String {
    render(text, style, *IS_ANSI_TERMINAL)
}

fn render(text: String, style: &Style, ansi: bool) -> String {
    if !ansi {
        return text;
    }

    let mut styled = String::with_capacity(text.len() + 20);
    let _ = write!(styled, "{}", style);
    styled.push_str(&text);
    let _ = write!(styled, "{}", style.render_reset());
    styled
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// A trait for applying Styles defined in [`styles`] to text.
pub trait AnsiStyles {
    /// Apply valid style to text
    fn valid(&self) -> String;

    /// Apply invalid style to text, used for destructive confirmations
    fn invalid(&self) -> String;
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl AnsiStyles for String {
    fn valid(&self) -> String {
        apply_style(self.clone(), styles().get_valid())
    }

    fn invalid(&self) -> String {
        apply_style(self.clone(), styles().get_invalid())
    }
}

impl AnsiStyles for &str {
    fn valid(&self) -> String {
        self.to_string().valid()
    }

    fn invalid(&self) -> String {
        self.to_string().invalid()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
