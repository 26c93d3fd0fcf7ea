//! 对白列表字面量解析器
//!
//! 递归下降解析 `[("Host", "..."), ("Guest", "..."), ...]` 形式的文本，
//! 只接受字符串二元组，不执行任何生成的文本。
//!
//! 文法：
//! ```text
//! list    := '[' (pair (',' pair)* ','?)? ']'
//! pair    := ('(' | '[') string (',' string)* ','? (')' | ']')     -- 必须恰好两个元素
//! string  := literal+                                               -- 相邻字面量拼接
//! literal := '"' chars '"' | '\'' chars '\''
//! ```
//!
//! 空白和 `#` 行注释在记号之间被忽略。

use super::errors::{ParseErrorKind, ScriptParseError};

/// 解析字符串二元组列表
pub fn parse_pair_list(input: &str) -> Result<Vec<(String, String)>, ScriptParseError> {
    let mut parser = Parser::new(input);
    parser.skip_trivia();
    if parser.at_end() {
        return Err(parser.error(ParseErrorKind::EmptyInput));
    }

    let pairs = parser.list()?;

    parser.skip_trivia();
    if !parser.at_end() {
        return Err(parser.error(ParseErrorKind::TrailingContent));
    }

    Ok(pairs)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn error(&self, kind: ParseErrorKind) -> ScriptParseError {
        ScriptParseError::new(kind, self.pos)
    }

    fn unexpected(&self, expected: &'static str) -> ScriptParseError {
        match self.peek() {
            Some(found) => self.error(ParseErrorKind::UnexpectedChar { found, expected }),
            None => self.error(ParseErrorKind::UnexpectedEnd { expected }),
        }
    }

    fn expect(&mut self, ch: char, expected: &'static str) -> Result<(), ScriptParseError> {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// 跳过空白和 `#` 注释
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.pos += ch.len_utf8();
            } else if ch == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn list(&mut self) -> Result<Vec<(String, String)>, ScriptParseError> {
        self.expect('[', "'['")?;
        let mut pairs = Vec::new();

        loop {
            self.skip_trivia();
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(pairs);
            }

            let entry = pairs.len();
            let pair = self.pair().map_err(|e| e.in_entry(entry))?;
            pairs.push(pair);

            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some(']') => {
                    self.pos += 1;
                    return Ok(pairs);
                }
                _ => return Err(self.unexpected("',' or ']'").in_entry(entry)),
            }
        }
    }

    fn pair(&mut self) -> Result<(String, String), ScriptParseError> {
        let start = self.pos;
        let close = match self.peek() {
            Some('(') => ')',
            Some('[') => ']',
            _ => return Err(self.unexpected("'(' opening a pair")),
        };
        self.pos += 1;

        let mut elements: Vec<String> = Vec::with_capacity(2);
        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.pos += 1;
                break;
            }

            elements.push(self.string()?);

            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some(c) if c == close => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.unexpected("',' or the end of the pair")),
            }
        }

        if elements.len() != 2 {
            return Err(ScriptParseError::new(
                ParseErrorKind::WrongArity(elements.len()),
                start,
            ));
        }

        let text = elements.pop().unwrap_or_default();
        let label = elements.pop().unwrap_or_default();
        Ok((label, text))
    }

    /// 一个或多个相邻的字符串字面量
    fn string(&mut self) -> Result<String, ScriptParseError> {
        let mut value = self.literal()?;
        loop {
            let checkpoint = self.pos;
            self.skip_trivia();
            match self.peek() {
                Some('"') | Some('\'') => value.push_str(&self.literal()?),
                _ => {
                    self.pos = checkpoint;
                    return Ok(value);
                }
            }
        }
    }

    fn literal(&mut self) -> Result<String, ScriptParseError> {
        let start = self.pos;
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.unexpected("a quoted string")),
        };
        self.pos += 1;

        let mut value = String::new();
        loop {
            let ch = match self.bump() {
                Some(ch) => ch,
                None => {
                    return Err(ScriptParseError::new(
                        ParseErrorKind::UnterminatedString,
                        start,
                    ))
                }
            };

            match ch {
                c if c == quote => return Ok(value),
                '\n' => {
                    return Err(ScriptParseError::new(
                        ParseErrorKind::UnterminatedString,
                        start,
                    ))
                }
                '\\' => self.escape(&mut value)?,
                c => value.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), ScriptParseError> {
        let escape_start = self.pos - 1;
        let ch = match self.bump() {
            Some(ch) => ch,
            None => {
                return Err(ScriptParseError::new(
                    ParseErrorKind::UnterminatedString,
                    escape_start,
                ))
            }
        };

        match ch {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            // 行尾续行
            '\n' => {}
            'x' => out.push(self.hex_escape(2, escape_start)?),
            'u' => out.push(self.hex_escape(4, escape_start)?),
            'U' => out.push(self.hex_escape(8, escape_start)?),
            // 未知转义保留原样
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, digits: usize, escape_start: usize) -> Result<char, ScriptParseError> {
        let end = self.pos + digits;
        let invalid = |parser: &Self| {
            let stop = end.min(parser.src.len());
            let sequence = parser
                .src
                .get(escape_start..stop)
                .unwrap_or("\\")
                .to_string();
            ScriptParseError::new(ParseErrorKind::InvalidEscape(sequence), escape_start)
        };

        let hex = self.src.get(self.pos..end).ok_or_else(|| invalid(self))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| invalid(self))?;
        let ch = char::from_u32(code).ok_or_else(|| invalid(self))?;
        self.pos = end;
        Ok(ch)
    }
}
