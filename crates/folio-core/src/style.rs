use crate::tokenizer::TokenKind;

/// Display class for a token. Frontends map these onto concrete colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleClass {
    Yellow,
    Green,
    Cyan,
    Purple,
    Orange,
    Red,
    Blue,
    Gray,
}

impl StyleClass {
    pub fn label(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Cyan => "cyan",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Gray => "gray",
        }
    }
}

pub fn token_style(kind: TokenKind) -> StyleClass {
    match kind {
        TokenKind::Command => StyleClass::Yellow,
        TokenKind::String => StyleClass::Green,
        TokenKind::Flag => StyleClass::Cyan,
        TokenKind::Variable => StyleClass::Purple,
        TokenKind::Pipe => StyleClass::Orange,
        TokenKind::Operator => StyleClass::Red,
        TokenKind::Number => StyleClass::Blue,
        TokenKind::Text => StyleClass::Gray,
    }
}

/// Style lookup by token-type label; unknown labels get the text style.
pub fn style_for_label(label: &str) -> StyleClass {
    TokenKind::from_label(label)
        .map(token_style)
        .unwrap_or(StyleClass::Gray)
}
