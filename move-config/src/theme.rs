//! Token-class themes
//!
//! A theme as configured ([`ThemeConfig`]) is plain data. [`ThemeConfig::compile`] validates
//! it into a [`Theme`], which answers one question: what style does a token class get?
//!
//! Resolution walks the class from most to least specific dot-prefix, so `keyword.module.x`
//! tries `keyword.module.x`, then `keyword.module`, then `keyword`. A class with no matching
//! rule gets the theme's default foreground (`editor.foreground`) and no font style.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_FOREGROUND_KEY: &str = "editor.foreground";
pub const DEFAULT_BACKGROUND_KEY: &str = "editor.background";

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeConfig {
    pub base: String,
    pub inherit: bool,
    #[serde(default)]
    pub rules: Vec<ThemeRuleConfig>,
    #[serde(default)]
    pub colors: Vec<ColorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeRuleConfig {
    pub token: String,
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub font_style: Option<String>,
}

/// A named editor colour, such as `editor.background`.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ThemeError {
    #[error("invalid colour {value:?} for {context}: expected six hex digits, optionally after '#'")]
    InvalidColor { context: String, value: String },
    #[error("unknown font style {style:?} for token {token:?}")]
    UnknownFontStyle { token: String, style: String },
    #[error("theme rule has an empty token class")]
    EmptyToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parses `RRGGBB` or `#RRGGBB`, in either case.
    pub fn parse(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |at: usize| u8::from_str_radix(&hex[at..at + 2], 16).ok();
        Some(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontStyle {
    pub italic: bool,
    pub bold: bool,
    pub underline: bool,
}

impl FontStyle {
    fn parse(token: &str, source: &str) -> Result<Self, ThemeError> {
        let mut style = FontStyle::default();
        for word in source.split_whitespace() {
            match word {
                "italic" => style.italic = true,
                "bold" => style.bold = true,
                "underline" => style.underline = true,
                other => {
                    return Err(ThemeError::UnknownFontStyle {
                        token: token.to_string(),
                        style: other.to_string(),
                    })
                }
            }
        }
        Ok(style)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub foreground: Option<Rgb>,
    pub background: Option<Rgb>,
    pub font_style: FontStyle,
}

/// A validated theme, ready for class lookups.
#[derive(Debug, Clone)]
pub struct Theme {
    base: String,
    inherit: bool,
    rules: HashMap<String, Style>,
    colors: HashMap<String, Rgb>,
}

impl ThemeConfig {
    pub fn compile(&self) -> Result<Theme, ThemeError> {
        let mut rules = HashMap::with_capacity(self.rules.len());
        for rule in &self.rules {
            if rule.token.is_empty() {
                return Err(ThemeError::EmptyToken);
            }
            let color = |value: &Option<String>| -> Result<Option<Rgb>, ThemeError> {
                value
                    .as_deref()
                    .map(|value| {
                        Rgb::parse(value).ok_or_else(|| ThemeError::InvalidColor {
                            context: format!("token {:?}", rule.token),
                            value: value.to_string(),
                        })
                    })
                    .transpose()
            };
            let style = Style {
                foreground: color(&rule.foreground)?,
                background: color(&rule.background)?,
                font_style: match &rule.font_style {
                    Some(source) => FontStyle::parse(&rule.token, source)?,
                    None => FontStyle::default(),
                },
            };
            // later rules for the same class win
            rules.insert(rule.token.clone(), style);
        }

        let mut colors = HashMap::with_capacity(self.colors.len());
        for entry in &self.colors {
            let rgb = Rgb::parse(&entry.value).ok_or_else(|| ThemeError::InvalidColor {
                context: format!("colour {:?}", entry.key),
                value: entry.value.clone(),
            })?;
            colors.insert(entry.key.clone(), rgb);
        }

        tracing::debug!(base = %self.base, rules = rules.len(), colors = colors.len(), "compiled theme");
        Ok(Theme {
            base: self.base.clone(),
            inherit: self.inherit,
            rules,
            colors,
        })
    }
}

impl Theme {
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn inherit(&self) -> bool {
        self.inherit
    }

    pub fn color(&self, key: &str) -> Option<Rgb> {
        self.colors.get(key).copied()
    }

    pub fn default_style(&self) -> Style {
        Style {
            foreground: self.color(DEFAULT_FOREGROUND_KEY),
            ..Style::default()
        }
    }

    /// The rule registered for the longest dot-prefix of `class`, if any.
    pub fn rule_for(&self, class: &str) -> Option<&Style> {
        let mut candidate = class;
        loop {
            if let Some(style) = self.rules.get(candidate) {
                return Some(style);
            }
            candidate = &candidate[..candidate.rfind('.')?];
        }
    }

    pub fn resolve(&self, class: &str) -> Style {
        match self.rule_for(class) {
            Some(style) => Style {
                foreground: style.foreground.or_else(|| self.color(DEFAULT_FOREGROUND_KEY)),
                ..*style
            },
            None => self.default_style(),
        }
    }
}
