//! Template text → node tree.

use super::expr::{self, Expr};
use crate::engine::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Ref(Reference),
    If {
        branches: Vec<Branch>,
        otherwise: Vec<Node>,
    },
    Set {
        name: String,
        value: Expr,
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Reference {
    pub name: String,
    /// `$!name`: renders nothing instead of failing when undefined.
    pub quiet: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branch {
    pub condition: Expr,
    pub line: usize,
    pub body: Vec<Node>,
}

/// What stopped a block.
enum BlockEnd {
    Eof,
    ElseIf(Expr, usize),
    Else(usize),
    End(usize),
}

enum Directive {
    /// Consumed without output (comments).
    Skip,
    Verbatim(String),
    If(Expr, usize),
    ElseIf(Expr, usize),
    Else(usize),
    End(usize),
    Set(String, Expr, usize),
}

pub(crate) fn parse(src: &str) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser {
        src,
        pos: 0,
        line: 1,
        counted: 0,
    };
    let (nodes, end) = parser.block()?;
    match end {
        BlockEnd::Eof => Ok(nodes),
        BlockEnd::ElseIf(_, line) => Err(syntax(line, "#elseif without matching #if")),
        BlockEnd::Else(line) => Err(syntax(line, "#else without matching #if")),
        BlockEnd::End(line) => Err(syntax(line, "#end without matching #if")),
    }
}

fn syntax(line: usize, message: impl Into<String>) -> TemplateError {
    TemplateError::Syntax {
        line,
        message: message.into(),
    }
}

fn ident_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return 0,
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count()
}

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Line number at byte offset `counted`.
    line: usize,
    counted: usize,
}

impl<'a> Parser<'a> {
    fn byte(&self, at: usize) -> Option<u8> {
        self.src.as_bytes().get(at).copied()
    }

    /// Line of byte offset `at`. Offsets are queried in increasing order, so
    /// only the text since the previous query is scanned.
    fn line_at(&mut self, at: usize) -> usize {
        if at < self.counted {
            self.line = 1;
            self.counted = 0;
        }
        self.line += self.src[self.counted..at].matches('\n').count();
        self.counted = at;
        self.line
    }

    fn block(&mut self) -> Result<(Vec<Node>, BlockEnd), TemplateError> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        let src = self.src;
        let end = loop {
            let rest = &src[self.pos..];
            let Some(offset) = rest.find(['$', '#', '\\']) else {
                text.push_str(rest);
                self.pos = self.src.len();
                break BlockEnd::Eof;
            };
            text.push_str(&rest[..offset]);
            self.pos += offset;

            match self.byte(self.pos) {
                Some(b'\\') => match self.byte(self.pos + 1) {
                    Some(c @ (b'$' | b'#')) => {
                        text.push(char::from(c));
                        self.pos += 2;
                    }
                    _ => {
                        text.push('\\');
                        self.pos += 1;
                    }
                },
                Some(b'$') => match self.reference() {
                    Some(r) => {
                        flush(&mut text, &mut nodes);
                        nodes.push(Node::Ref(r));
                    }
                    None => {
                        text.push('$');
                        self.pos += 1;
                    }
                },
                _ => match self.directive(&mut text)? {
                    None => {
                        text.push('#');
                        self.pos += 1;
                    }
                    Some(Directive::Skip) => {}
                    Some(Directive::Verbatim(raw)) => text.push_str(&raw),
                    Some(Directive::Set(name, value, line)) => {
                        flush(&mut text, &mut nodes);
                        nodes.push(Node::Set { name, value, line });
                    }
                    Some(Directive::If(condition, line)) => {
                        flush(&mut text, &mut nodes);
                        nodes.push(self.if_chain(condition, line)?);
                    }
                    Some(Directive::ElseIf(condition, line)) => {
                        break BlockEnd::ElseIf(condition, line);
                    }
                    Some(Directive::Else(line)) => break BlockEnd::Else(line),
                    Some(Directive::End(line)) => break BlockEnd::End(line),
                },
            }
        };

        flush(&mut text, &mut nodes);
        Ok((nodes, end))
    }

    /// Parse the bodies following an `#if` up to and including its `#end`.
    fn if_chain(&mut self, condition: Expr, line: usize) -> Result<Node, TemplateError> {
        let mut branches = Vec::new();
        let mut condition = condition;
        let mut branch_line = line;
        loop {
            let (body, end) = self.block()?;
            branches.push(Branch {
                condition,
                line: branch_line,
                body,
            });
            match end {
                BlockEnd::ElseIf(next, next_line) => {
                    condition = next;
                    branch_line = next_line;
                }
                BlockEnd::End(_) => {
                    return Ok(Node::If {
                        branches,
                        otherwise: Vec::new(),
                    });
                }
                BlockEnd::Else(_) => {
                    let (otherwise, end) = self.block()?;
                    return match end {
                        BlockEnd::End(_) => Ok(Node::If {
                            branches,
                            otherwise,
                        }),
                        BlockEnd::Eof => Err(syntax(line, "#if without matching #end")),
                        BlockEnd::ElseIf(_, l) => Err(syntax(l, "#elseif after #else")),
                        BlockEnd::Else(l) => Err(syntax(l, "duplicate #else")),
                    };
                }
                BlockEnd::Eof => return Err(syntax(line, "#if without matching #end")),
            }
        }
    }

    /// `$name`, `${name}`, `$!name`, `$!{name}` at `self.pos`. Leaves the
    /// position untouched when the `$` does not start a reference.
    fn reference(&mut self) -> Option<Reference> {
        let start = self.pos;
        let mut i = start + 1;
        let quiet = self.byte(i) == Some(b'!');
        if quiet {
            i += 1;
        }
        let braced = self.byte(i) == Some(b'{');
        if braced {
            i += 1;
        }
        let len = ident_len(&self.src[i..]);
        if len == 0 {
            return None;
        }
        let name = self.src[i..i + len].to_string();
        i += len;
        if braced {
            if self.byte(i) != Some(b'}') {
                return None;
            }
            i += 1;
        }
        self.pos = i;
        Some(Reference {
            name,
            quiet,
            line: self.line_at(start),
        })
    }

    /// Directive or comment at `self.pos` (a `#`). `None` means the `#` is
    /// literal text and the position is unchanged.
    fn directive(&mut self, text: &mut String) -> Result<Option<Directive>, TemplateError> {
        let src = self.src;
        let start = self.pos;
        let line = self.line_at(start);
        let rest = &src[start + 1..];

        if rest.starts_with('#') {
            self.pos = match rest.find('\n') {
                Some(nl) => start + 1 + nl + 1,
                None => src.len(),
            };
            self.strip_indent(start, text);
            return Ok(Some(Directive::Skip));
        }
        if rest.starts_with('*') {
            let Some(close) = rest[1..].find("*#") else {
                return Err(syntax(line, "unterminated #* comment"));
            };
            self.pos = start + 2 + close + 2;
            self.gobble_line(start, text);
            return Ok(Some(Directive::Skip));
        }
        if let Some(body) = rest.strip_prefix("[[") {
            let Some(close) = body.find("]]#") else {
                return Err(syntax(line, "unterminated #[[ block"));
            };
            let raw = body[..close].to_string();
            self.pos = start + 3 + close + 3;
            return Ok(Some(Directive::Verbatim(raw)));
        }

        let braced = rest.starts_with('{');
        let name_start = start + 1 + usize::from(braced);
        let name_len = ident_len(&src[name_start..]);
        let name = &src[name_start..name_start + name_len];
        let mut end = name_start + name_len;
        if braced {
            if self.byte(end) != Some(b'}') {
                return Ok(None);
            }
            end += 1;
        }

        let directive = match name {
            "if" | "elseif" | "set" => {
                let (args, after) = self.arguments(name, end, line)?;
                self.pos = after;
                let args = &src[args];
                match name {
                    "if" => Directive::If(
                        expr::parse_condition(args).map_err(|m| syntax(line, m))?,
                        line,
                    ),
                    "elseif" => Directive::ElseIf(
                        expr::parse_condition(args).map_err(|m| syntax(line, m))?,
                        line,
                    ),
                    _ => {
                        let (var, value) =
                            expr::parse_assignment(args).map_err(|m| syntax(line, m))?;
                        Directive::Set(var, value, line)
                    }
                }
            }
            "else" => {
                self.pos = end;
                Directive::Else(line)
            }
            "end" => {
                self.pos = end;
                Directive::End(line)
            }
            _ => return Ok(None),
        };
        self.gobble_line(start, text);
        Ok(Some(directive))
    }

    /// Locate the parenthesised argument list of `#name` starting at `from`.
    /// Returns the byte range inside the parentheses and the position after
    /// the closing one.
    fn arguments(
        &self,
        name: &str,
        from: usize,
        line: usize,
    ) -> Result<(std::ops::Range<usize>, usize), TemplateError> {
        let bytes = self.src.as_bytes();
        let mut i = from;
        while i < bytes.len() && is_blank(bytes[i]) {
            i += 1;
        }
        if bytes.get(i) != Some(&b'(') {
            return Err(syntax(line, format!("expected `(` after #{name}")));
        }
        let open = i + 1;
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        i = open;
        while i < bytes.len() {
            let b = bytes[i];
            match quote {
                Some(_) if b == b'\\' => i += 1,
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'(' => depth += 1,
                    b')' if depth == 0 => return Ok((open..i, i + 1)),
                    b')' => depth -= 1,
                    _ => {}
                },
            }
            i += 1;
        }
        Err(syntax(line, format!("unterminated #{name}(...)")))
    }

    /// Drop whitespace preceding `start` on its line, if that is all there is.
    fn strip_indent(&self, start: usize, text: &mut String) {
        let line_start = self.src[..start].rfind('\n').map_or(0, |nl| nl + 1);
        let indent = &self.src[line_start..start];
        if indent.bytes().all(is_blank) && text.ends_with(indent) {
            text.truncate(text.len() - indent.len());
        }
    }

    /// A directive alone on its line takes the whole line with it,
    /// indentation and newline included.
    fn gobble_line(&mut self, start: usize, text: &mut String) {
        let src = self.src;
        let line_start = src[..start].rfind('\n').map_or(0, |nl| nl + 1);
        if !src[line_start..start].bytes().all(is_blank) {
            return;
        }
        let rest = &src.as_bytes()[self.pos..];
        let trailing = rest
            .iter()
            .take_while(|b| is_blank(**b) || **b == b'\r')
            .count();
        match rest.get(trailing) {
            Some(b'\n') => self.pos += trailing + 1,
            None => self.pos += trailing,
            Some(_) => return,
        }
        self.strip_indent(start, text);
    }
}

fn flush(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}
