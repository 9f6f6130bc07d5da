//! Template scanning
//!
//! Splits template source into literal text and `{{ ... }}` actions, applies
//! trim markers, drops comments, and tokenizes the inside of each action.

use super::SyntaxError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A token inside an action
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// `.` on its own
    Dot,
    /// `.Name`
    Field(String),
    /// `$` or `$name`, stored with the leading `$`
    Variable(String),
    /// Function name or keyword
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    Pipe,
    Declare,
    Comma,
}

/// A token plus whether whitespace preceded it (field chains must be unspaced)
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lexeme {
    pub token: Token,
    pub spaced: bool,
}

/// Top-level piece of a template
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Text(String),
    Action { tokens: Vec<Lexeme>, line: usize },
}

pub(crate) fn scan(source: &str) -> Result<Vec<Segment>, SyntaxError> {
    let mut segments = Vec::new();
    let mut rest = source;
    let mut line = 1;
    let mut trim_next = false;

    loop {
        let Some(start) = rest.find(OPEN) else {
            let text = if trim_next { rest.trim_start() } else { rest };
            if !text.is_empty() {
                segments.push(Segment::Text(text.to_string()));
            }
            break;
        };

        let after = &rest[start + OPEN.len()..];
        let trim_left = has_left_trim(after);

        let mut text = &rest[..start];
        if trim_next {
            text = text.trim_start();
        }
        if trim_left {
            text = text.trim_end();
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text.to_string()));
        }
        line += count_lines(&rest[..start]);

        let body_start = if trim_left { 1 } else { 0 };
        let action = scan_action(&after[body_start..], line)?;
        if let Some(body) = action.body {
            let tokens = tokenize(body, line)?;
            segments.push(Segment::Action { tokens, line });
        }
        line += count_lines(&after[..body_start + action.consumed]);

        trim_next = action.trim_right;
        rest = &after[body_start + action.consumed..];
    }

    Ok(segments)
}

fn count_lines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}

/// `{{- ` trims only when the dash is followed by whitespace
fn has_left_trim(after_open: &str) -> bool {
    let mut chars = after_open.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

struct ScannedAction<'a> {
    /// `None` for comments
    body: Option<&'a str>,
    /// Bytes consumed including the closing delimiter
    consumed: usize,
    trim_right: bool,
}

fn scan_action(s: &str, line: usize) -> Result<ScannedAction<'_>, SyntaxError> {
    let leading = s.len() - s.trim_start().len();
    if s[leading..].starts_with("/*") {
        return scan_comment(s, leading, line);
    }

    let bytes = s.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'`' => quote = Some(b),
            None if bytes[i..].starts_with(CLOSE.as_bytes()) => {
                let body = &s[..i];
                let trim_right = has_right_trim(body);
                let body = if trim_right { &body[..body.len() - 1] } else { body };
                return Ok(ScannedAction {
                    body: Some(body),
                    consumed: i + CLOSE.len(),
                    trim_right,
                });
            }
            None => {}
        }
        i += 1;
    }

    Err(SyntaxError::new(line, "unclosed action"))
}

/// ` -}}` trims only when whitespace precedes the dash
fn has_right_trim(body: &str) -> bool {
    body.strip_suffix('-')
        .is_some_and(|rest| rest.ends_with(char::is_whitespace))
}

fn scan_comment(s: &str, leading: usize, line: usize) -> Result<ScannedAction<'_>, SyntaxError> {
    let Some(end) = s[leading..].find("*/") else {
        return Err(SyntaxError::new(line, "unclosed comment"));
    };
    let after_comment = leading + end + 2;
    let tail = &s[after_comment..];
    let gap = tail.len() - tail.trim_start().len();
    let tail = &tail[gap..];

    let (trim_right, close_len) = if gap > 0 && tail.starts_with("-}}") {
        (true, 3)
    } else if tail.starts_with(CLOSE) {
        (false, CLOSE.len())
    } else {
        return Err(SyntaxError::new(line, "comment ends before closing delimiter"));
    };

    Ok(ScannedAction {
        body: None,
        consumed: after_comment + gap + close_len,
        trim_right,
    })
}

fn tokenize(body: &str, line: usize) -> Result<Vec<Lexeme>, SyntaxError> {
    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut spaced = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            spaced = true;
            i += 1;
            continue;
        }

        let token = match c {
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '|' => {
                i += 1;
                Token::Pipe
            }
            ',' => {
                i += 1;
                Token::Comma
            }
            ':' if chars.get(i + 1) == Some(&'=') => {
                i += 2;
                Token::Declare
            }
            '"' => {
                let (s, next) = read_quoted(&chars, i + 1, line)?;
                i = next;
                Token::Str(s)
            }
            '`' => {
                let Some(len) = chars[i + 1..].iter().position(|&ch| ch == '`') else {
                    return Err(SyntaxError::new(line, "unterminated raw string"));
                };
                let s: String = chars[i + 1..i + 1 + len].iter().collect();
                i += len + 2;
                Token::Str(s)
            }
            '.' => {
                if chars.get(i + 1).is_some_and(|&ch| is_ident_start(ch)) {
                    let (name, next) = read_ident(&chars, i + 1);
                    i = next;
                    Token::Field(name)
                } else {
                    i += 1;
                    Token::Dot
                }
            }
            '$' => {
                let (name, next) = read_ident(&chars, i + 1);
                i = next;
                Token::Variable(format!("${}", name))
            }
            '-' | '+' | '0'..='9' => {
                let (token, next) = read_number(&chars, i, line)?;
                i = next;
                token
            }
            c if is_ident_start(c) => {
                let (name, next) = read_ident(&chars, i);
                i = next;
                Token::Ident(name)
            }
            other => {
                return Err(SyntaxError::new(
                    line,
                    format!("unexpected {:?} in action", other),
                ))
            }
        };

        tokens.push(Lexeme { token, spaced });
        spaced = false;
    }

    Ok(tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn read_quoted(chars: &[char], start: usize, line: usize) -> Result<(String, usize), SyntaxError> {
    let mut out = String::new();
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '"' => return Ok((out, i + 1)),
            '\\' => {
                let escaped = match chars.get(i + 1) {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('\\') => '\\',
                    Some('"') => '"',
                    Some(other) => {
                        return Err(SyntaxError::new(
                            line,
                            format!("unknown escape sequence \\{}", other),
                        ))
                    }
                    None => break,
                };
                out.push(escaped);
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err(SyntaxError::new(line, "unterminated quoted string"))
}

fn read_number(chars: &[char], start: usize, line: usize) -> Result<(Token, usize), SyntaxError> {
    let mut end = start;
    if matches!(chars[end], '-' | '+') {
        end += 1;
    }
    let mut is_float = false;
    while end < chars.len() {
        match chars[end] {
            '0'..='9' => {}
            '.' | 'e' | 'E' => is_float = true,
            '-' | '+' if matches!(chars[end - 1], 'e' | 'E') => {}
            _ => break,
        }
        end += 1;
    }

    let text: String = chars[start..end].iter().collect();
    let token = if is_float {
        text.parse::<f64>().map(Token::Float).ok()
    } else {
        text.parse::<i64>().map(Token::Int).ok()
    };
    match token {
        Some(token) => Ok((token, end)),
        None => Err(SyntaxError::new(line, format!("bad number syntax: {:?}", text))),
    }
}
