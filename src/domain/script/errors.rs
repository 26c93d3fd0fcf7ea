//! Script Context - Errors

use thiserror::Error;

/// 脚本解析错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("input is empty")]
    EmptyInput,

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unexpected character {found:?}, expected {expected}")]
    UnexpectedChar { found: char, expected: &'static str },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid escape sequence {0:?}")]
    InvalidEscape(String),

    #[error("expected a (speaker, line) pair, found {0} element(s)")]
    WrongArity(usize),

    #[error("unknown speaker label {0:?}")]
    UnknownSpeaker(String),

    #[error("unexpected content after the closing bracket")]
    TrailingContent,
}

/// 脚本解析错误
///
/// 携带出错位置（字节偏移）以及出错条目的序号（如果能定位到条目）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}{}", entry_suffix(.entry))]
pub struct ScriptParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
    pub entry: Option<usize>,
}

fn entry_suffix(entry: &Option<usize>) -> String {
    entry.map(|e| format!(" (entry {})", e)).unwrap_or_default()
}

impl ScriptParseError {
    pub fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self {
            kind,
            offset,
            entry: None,
        }
    }

    pub fn in_entry(mut self, entry: usize) -> Self {
        self.entry = Some(entry);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_with_entry() {
        let err = ScriptParseError::new(ParseErrorKind::WrongArity(3), 42).in_entry(1);
        assert_eq!(
            err.to_string(),
            "expected a (speaker, line) pair, found 3 element(s) at byte 42 (entry 1)"
        );
    }

    #[test]
    fn test_error_display_without_entry() {
        let err = ScriptParseError::new(ParseErrorKind::TrailingContent, 7);
        assert_eq!(
            err.to_string(),
            "unexpected content after the closing bracket at byte 7"
        );
    }
}
