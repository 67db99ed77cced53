use enum_as_inner::EnumAsInner;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct Tokens(pub Vec<Token>);

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Token {
    pub kind: TokenKind,
    pub span: std::ops::Range<usize>,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum TokenKind {
    Ident(String),
    Keyword(String),
    #[cfg_attr(
        feature = "serde_yaml",
        serde(with = "serde_yaml::with::singleton_map"),
        schemars(with = "Literal")
    )]
    Literal(Literal),

    /// single-char control tokens
    Control(char),

    PathSep, // ::
    Deref,   // .*
    Eq,      // ==
    Ne,      // !=
    Gte,     // >=
    Lte,     // <=
    And,     // &&
    Or,      // ||
    Shl,     // <<
    Shr,     // >>

    // Aesthetics only
    Comment(String),
}

#[derive(
    Debug,
    EnumAsInner,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Serialize,
    Deserialize,
    strum::AsRefStr,
    JsonSchema,
)]
pub enum Literal {
    Integer(IntegerLit),
    String(StringLit),
}

/// An integer literal, such as `42`, `0x2A` or `42'u8`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IntegerLit {
    pub radix: u32,
    /// The digits without the radix prefix, possibly containing `_`
    pub digits: String,
    /// Suffix after the `'`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tag: Option<String>,
}

impl IntegerLit {
    pub fn new(radix: u32, digits: impl Into<String>) -> Self {
        IntegerLit {
            radix,
            digits: digits.into(),
            tag: None,
        }
    }

    /// The numeric value, or `None` when it doesn't fit in a `u128` (or is
    /// only made of separators, such as `0b_`).
    pub fn value(&self) -> Option<u128> {
        let digits: String = self.digits.chars().filter(|c| *c != '_').collect();
        u128::from_str_radix(&digits, self.radix).ok()
    }

    fn prefix(&self) -> &'static str {
        match self.radix {
            2 => "0b",
            8 => "0o",
            16 => "0x",
            _ => "",
        }
    }
}

/// A string literal, such as `"a\n"` or `c"abc"`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StringLit {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tag: Option<String>,
    pub parts: Vec<StringPart>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize, EnumAsInner, JsonSchema)]
pub enum StringPart {
    /// Plain text between escapes
    Content(StringContent),
    Escape(EscapeSequence),
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StringContent {
    pub text: String,
    /// Char offsets of the content within the source
    pub span: std::ops::Range<usize>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EscapeSequence {
    /// The escape as written, including the backslash
    pub raw: String,
    pub value: char,
    /// Char offsets of the escape within the source
    pub span: std::ops::Range<usize>,
}

impl StringLit {
    /// The text of the string, with escapes decoded.
    pub fn value(&self) -> String {
        let mut res = String::new();
        for part in &self.parts {
            match part {
                StringPart::Content(c) => res.push_str(&c.text),
                StringPart::Escape(e) => res.push(e.value),
            }
        }
        res
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Integer(i) => {
                write!(f, "{}{}", i.prefix(), i.digits)?;
                if let Some(tag) = &i.tag {
                    write!(f, "'{tag}")?;
                }
            }
            Literal::String(s) => {
                if let Some(tag) = &s.tag {
                    f.write_str(tag)?;
                }
                f.write_str("\"")?;
                for part in &s.parts {
                    match part {
                        StringPart::Content(c) => f.write_str(&c.text)?,
                        StringPart::Escape(e) => f.write_str(&e.raw)?,
                    }
                }
                f.write_str("\"")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Ident(s) => {
                if s.is_empty() {
                    // FYI this shows up in errors
                    write!(f, "an identifier")
                } else {
                    write!(f, "{s}")
                }
            }
            TokenKind::Keyword(s) => write!(f, "keyword {s}"),
            TokenKind::Literal(lit) => write!(f, "{}", lit),
            TokenKind::Control(c) => write!(f, "{c}"),

            TokenKind::PathSep => f.write_str("::"),
            TokenKind::Deref => f.write_str(".*"),
            TokenKind::Eq => f.write_str("=="),
            TokenKind::Ne => f.write_str("!="),
            TokenKind::Gte => f.write_str(">="),
            TokenKind::Lte => f.write_str("<="),
            TokenKind::And => f.write_str("&&"),
            TokenKind::Or => f.write_str("||"),
            TokenKind::Shl => f.write_str("<<"),
            TokenKind::Shr => f.write_str(">>"),

            TokenKind::Comment(s) => f.write_str(s),
        }
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}..{}: {:?}", self.span.start, self.span.end, self.kind)
    }
}
