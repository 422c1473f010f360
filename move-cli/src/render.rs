//! Output formats for the `move-hl` commands.

use crossterm::style::{Attribute, Color, ContentStyle};
use move_config::{Rgb, Style, Theme};
use move_lexer::{LineDriver, Token};
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize)]
struct LineReport<'a> {
    line: usize,
    tokens: Vec<TokenReport<'a>>,
    end_state: String,
}

#[derive(Serialize)]
struct TokenReport<'a> {
    #[serde(flatten)]
    token: &'a Token,
    text: &'a str,
}

/// One `line:col len class "text"` row per token; positions are zero-based byte offsets.
pub fn token_listing(lines: &[&str], driver: &LineDriver) -> String {
    let mut out = String::new();
    for (index, line) in lines.iter().enumerate() {
        for token in driver.tokens(index).unwrap_or_default() {
            let _ = writeln!(
                out,
                "{}:{} {} {} {:?}",
                index,
                token.start,
                token.length,
                token.class(),
                token.text(line)
            );
        }
    }
    out
}

pub fn token_json(lines: &[&str], driver: &LineDriver) -> serde_json::Result<String> {
    let table = driver.tokenizer().table();
    let report: Vec<LineReport<'_>> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| LineReport {
            line: index,
            tokens: driver
                .tokens(index)
                .unwrap_or_default()
                .iter()
                .map(|token| TokenReport {
                    token,
                    text: token.text(line),
                })
                .collect(),
            end_state: driver
                .end_state(index)
                .map(|state| state.describe(table))
                .unwrap_or_default(),
        })
        .collect();
    serde_json::to_string_pretty(&report)
}

pub fn highlight(lines: &[&str], driver: &LineDriver, theme: &Theme) -> String {
    let mut out = String::new();
    for (index, line) in lines.iter().enumerate() {
        for token in driver.tokens(index).unwrap_or_default() {
            let style = content_style(&theme.resolve(token.class()));
            let _ = write!(out, "{}", style.apply(token.text(line)));
        }
        out.push('\n');
    }
    out
}

fn content_style(style: &Style) -> ContentStyle {
    let mut content = ContentStyle::new();
    content.foreground_color = style.foreground.map(terminal_color);
    content.background_color = style.background.map(terminal_color);
    if style.font_style.italic {
        content.attributes.set(Attribute::Italic);
    }
    if style.font_style.bold {
        content.attributes.set(Attribute::Bold);
    }
    if style.font_style.underline {
        content.attributes.set(Attribute::Underlined);
    }
    content
}

fn terminal_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}
