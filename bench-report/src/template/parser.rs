//! Template parser
//!
//! Builds the node tree from scanned segments. Control actions (`if`, `range`,
//! `with`) own their bodies up to the matching `{{end}}`.

use super::funcs::{is_builtin, FuncMap};
use super::lexer::{Lexeme, Segment, Token};
use super::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Action {
        pipeline: Pipeline,
        line: usize,
    },
    If {
        pipeline: Pipeline,
        then: Vec<Node>,
        otherwise: Vec<Node>,
        line: usize,
    },
    Range {
        pipeline: Pipeline,
        then: Vec<Node>,
        otherwise: Vec<Node>,
        line: usize,
    },
    With {
        pipeline: Pipeline,
        then: Vec<Node>,
        otherwise: Vec<Node>,
        line: usize,
    },
}

/// `[$a[, $b] :=] command | command ...`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    pub decl: Vec<String>,
    pub commands: Vec<Command>,
}

/// A function call (`args[0]` is `Expr::Call`) or a single operand
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Command {
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Dot,
    Variable(String),
    Field(Box<Expr>, String),
    Call(String),
    Pipeline(Box<Pipeline>),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
}

/// How a list of nodes ended
enum Stop {
    Eof,
    End(usize),
    Else(Vec<Lexeme>, usize),
}

pub(crate) fn parse(segments: Vec<Segment>, funcs: &FuncMap) -> Result<Vec<Node>, SyntaxError> {
    let mut parser = Parser {
        segments: segments.into_iter(),
        funcs,
        vars: vec!["$".to_string()],
    };
    let (nodes, stop) = parser.parse_list()?;
    match stop {
        Stop::Eof => Ok(nodes),
        Stop::End(line) => Err(SyntaxError::new(line, "unexpected {{end}}")),
        Stop::Else(_, line) => Err(SyntaxError::new(line, "unexpected {{else}}")),
    }
}

struct Parser<'f> {
    segments: std::vec::IntoIter<Segment>,
    funcs: &'f FuncMap,
    /// Variables in scope; control structures truncate back on exit
    vars: Vec<String>,
}

impl<'f> Parser<'f> {
    fn parse_list(&mut self) -> Result<(Vec<Node>, Stop), SyntaxError> {
        let mut nodes = Vec::new();
        while let Some(segment) = self.segments.next() {
            let (tokens, line) = match segment {
                Segment::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Segment::Action { tokens, line } => (tokens, line),
            };

            let keyword = match tokens.first().map(|l| &l.token) {
                Some(Token::Ident(name)) => name.as_str(),
                _ => "",
            };
            match keyword {
                "end" => {
                    if tokens.len() > 1 {
                        return Err(SyntaxError::new(line, "unexpected tokens after end"));
                    }
                    return Ok((nodes, Stop::End(line)));
                }
                "else" => {
                    let rest = tokens[1..].to_vec();
                    return Ok((nodes, Stop::Else(rest, line)));
                }
                "if" | "range" | "with" => {
                    let mark = self.vars.len();
                    let node = match keyword {
                        "if" => self.parse_if(&tokens[1..], line)?,
                        "range" => self.parse_range(&tokens[1..], line)?,
                        _ => self.parse_with(&tokens[1..], line)?,
                    };
                    self.vars.truncate(mark);
                    nodes.push(node);
                }
                "define" | "template" | "block" | "break" | "continue" => {
                    return Err(SyntaxError::new(
                        line,
                        format!("{{{{{}}}}} is not supported", keyword),
                    ));
                }
                _ => {
                    let pipeline = self.parse_pipeline(&tokens, line, 1)?;
                    nodes.push(Node::Action { pipeline, line });
                }
            }
        }
        Ok((nodes, Stop::Eof))
    }

    fn parse_if(&mut self, tokens: &[Lexeme], line: usize) -> Result<Node, SyntaxError> {
        let pipeline = self.parse_pipeline(tokens, line, 1)?;
        let (then, stop) = self.parse_list()?;
        let otherwise = match stop {
            Stop::End(_) => Vec::new(),
            Stop::Else(rest, else_line) if rest.is_empty() => self.parse_else_body(else_line)?,
            Stop::Else(rest, else_line) if is_ident(&rest[0], "if") => {
                // `{{else if}}` shares the closing {{end}} of the outer if
                vec![self.parse_if(&rest[1..], else_line)?]
            }
            Stop::Else(_, else_line) => {
                return Err(SyntaxError::new(else_line, "unexpected tokens after else"))
            }
            Stop::Eof => return Err(missing_end(line, "if")),
        };
        Ok(Node::If {
            pipeline,
            then,
            otherwise,
            line,
        })
    }

    fn parse_range(&mut self, tokens: &[Lexeme], line: usize) -> Result<Node, SyntaxError> {
        let pipeline = self.parse_pipeline(tokens, line, 2)?;
        let (then, otherwise) = self.parse_block_bodies(line, "range")?;
        Ok(Node::Range {
            pipeline,
            then,
            otherwise,
            line,
        })
    }

    fn parse_with(&mut self, tokens: &[Lexeme], line: usize) -> Result<Node, SyntaxError> {
        let pipeline = self.parse_pipeline(tokens, line, 1)?;
        let (then, otherwise) = self.parse_block_bodies(line, "with")?;
        Ok(Node::With {
            pipeline,
            then,
            otherwise,
            line,
        })
    }

    fn parse_block_bodies(
        &mut self,
        line: usize,
        keyword: &str,
    ) -> Result<(Vec<Node>, Vec<Node>), SyntaxError> {
        let (then, stop) = self.parse_list()?;
        let otherwise = match stop {
            Stop::End(_) => Vec::new(),
            Stop::Else(rest, else_line) if rest.is_empty() => self.parse_else_body(else_line)?,
            Stop::Else(_, else_line) => {
                return Err(SyntaxError::new(else_line, "unexpected tokens after else"))
            }
            Stop::Eof => return Err(missing_end(line, keyword)),
        };
        Ok((then, otherwise))
    }

    fn parse_else_body(&mut self, line: usize) -> Result<Vec<Node>, SyntaxError> {
        let (nodes, stop) = self.parse_list()?;
        match stop {
            Stop::End(_) => Ok(nodes),
            Stop::Else(_, else_line) => Err(SyntaxError::new(else_line, "expected {{end}}, found {{else}}")),
            Stop::Eof => Err(missing_end(line, "else")),
        }
    }

    /// Parse `[decl :=] cmd | cmd ...`, allowing up to `max_decl` declared variables
    fn parse_pipeline(
        &mut self,
        tokens: &[Lexeme],
        line: usize,
        max_decl: usize,
    ) -> Result<Pipeline, SyntaxError> {
        let (decl, rest) = split_declaration(tokens);
        if decl.len() > max_decl {
            return Err(SyntaxError::new(line, "too many declarations in command"));
        }
        if rest.is_empty() {
            return Err(SyntaxError::new(line, "missing value for command"));
        }

        let mut commands = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;
        for (i, lexeme) in rest.iter().enumerate() {
            match lexeme.token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::Pipe if depth == 0 => {
                    commands.push(self.parse_command(&rest[start..i], line)?);
                    start = i + 1;
                }
                _ => {}
            }
        }
        commands.push(self.parse_command(&rest[start..], line)?);

        self.vars.extend(decl.iter().cloned());
        Ok(Pipeline { decl, commands })
    }

    fn parse_command(&mut self, tokens: &[Lexeme], line: usize) -> Result<Command, SyntaxError> {
        if tokens.is_empty() {
            return Err(SyntaxError::new(line, "missing command in pipeline"));
        }
        let mut args = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            args.push(self.parse_operand(tokens, &mut i, line)?);
        }
        Ok(Command { args })
    }

    fn parse_operand(
        &mut self,
        tokens: &[Lexeme],
        i: &mut usize,
        line: usize,
    ) -> Result<Expr, SyntaxError> {
        let lexeme = &tokens[*i];
        *i += 1;

        let mut expr = match &lexeme.token {
            Token::Dot => Expr::Dot,
            Token::Field(name) => Expr::Field(Box::new(Expr::Dot), name.clone()),
            Token::Variable(name) if self.vars.contains(name) => Expr::Variable(name.clone()),
            Token::Variable(name) => {
                return Err(SyntaxError::new(line, format!("undefined variable {:?}", name)))
            }
            Token::Int(v) => Expr::Int(*v),
            Token::Float(v) => Expr::Float(*v),
            Token::Str(s) => Expr::Str(s.clone()),
            Token::Ident(name) => match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "nil" => Expr::Nil,
                _ if self.funcs.contains(name) || is_builtin(name) => Expr::Call(name.clone()),
                _ => {
                    return Err(SyntaxError::new(
                        line,
                        format!("function {:?} not defined", name),
                    ))
                }
            },
            Token::LParen => {
                let close = matching_paren(tokens, *i - 1)
                    .ok_or_else(|| SyntaxError::new(line, "unclosed left paren"))?;
                let inner = self.parse_pipeline(&tokens[*i..close], line, 0)?;
                *i = close + 1;
                Expr::Pipeline(Box::new(inner))
            }
            Token::RParen => return Err(SyntaxError::new(line, "unexpected right paren")),
            Token::Pipe => return Err(SyntaxError::new(line, "missing command before |")),
            Token::Declare => return Err(SyntaxError::new(line, "unexpected :=")),
            Token::Comma => return Err(SyntaxError::new(line, "unexpected comma")),
        };

        // `.A.B`, `$x.A`, `(pipeline).A`: unspaced fields chain onto the operand
        let chains = matches!(
            expr,
            Expr::Field(..) | Expr::Variable(_) | Expr::Pipeline(_)
        );
        while chains && *i < tokens.len() && !tokens[*i].spaced {
            let Token::Field(name) = &tokens[*i].token else {
                break;
            };
            expr = Expr::Field(Box::new(expr), name.clone());
            *i += 1;
        }

        Ok(expr)
    }
}

fn is_ident(lexeme: &Lexeme, name: &str) -> bool {
    matches!(&lexeme.token, Token::Ident(ident) if ident == name)
}

fn missing_end(line: usize, keyword: &str) -> SyntaxError {
    SyntaxError::new(line, format!("unexpected EOF: {} is missing {{{{end}}}}", keyword))
}

/// Split off `$a :=` or `$a, $b :=`
fn split_declaration(tokens: &[Lexeme]) -> (Vec<String>, &[Lexeme]) {
    let var = |i: usize| match tokens.get(i).map(|l| &l.token) {
        Some(Token::Variable(name)) => Some(name.clone()),
        _ => None,
    };
    let is = |i: usize, token: Token| tokens.get(i).map(|l| &l.token) == Some(&token);

    if let (Some(a), true) = (var(0), is(1, Token::Declare)) {
        return (vec![a], &tokens[2..]);
    }
    if let (Some(a), true, Some(b), true) = (var(0), is(1, Token::Comma), var(2), is(3, Token::Declare)) {
        return (vec![a, b], &tokens[4..]);
    }
    (Vec::new(), tokens)
}

fn matching_paren(tokens: &[Lexeme], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, lexeme) in tokens.iter().enumerate().skip(open) {
        match lexeme.token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
