use std::fmt;

/// A filter value rendered for a Cypher property block.
///
/// Values are stored as text. A value that reads as a finite number or is
/// exactly `true`/`false` is emitted bare, everything else as a
/// single-quoted string. Boolean property values come back from the
/// database as `true`/`false`, and a quoted `'true'` would never match them.
///
/// Neither variant escapes anything: a `'` inside a text value closes the
/// literal early and a backtick inside an identifier closes the identifier.
/// Such values produce a malformed query rather than a safely escaped one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LiteralToken {
    Number(String),
    Bool(bool),
    Text(String),
}

impl LiteralToken {
    pub fn is_numeric(&self) -> bool { matches!(self, LiteralToken::Number(_)) }
    pub fn is_bare(&self) -> bool { !matches!(self, LiteralToken::Text(_)) }
}

impl fmt::Display for LiteralToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralToken::Number(n) => write!(f, "{}", n),
            LiteralToken::Bool(b) => write!(f, "{}", b),
            LiteralToken::Text(s) => write!(f, "'{}'", s),
        }
    }
}

fn looks_numeric(value: &str) -> bool {
    // f64 parsing also accepts "inf" and "NaN", which are not Cypher literals
    matches!(value.parse::<f64>(), Ok(n) if n.is_finite())
}

pub fn encode(value: &str) -> LiteralToken {
    if let Ok(b) = value.parse::<bool>() {
        LiteralToken::Bool(b)
    } else if looks_numeric(value) {
        LiteralToken::Number(value.to_string())
    } else {
        LiteralToken::Text(value.to_string())
    }
}

/// Wrap a label name in backticks so spaces and punctuation survive.
pub fn encode_identifier(name: &str) -> String {
    format!("`{}`", name)
}
