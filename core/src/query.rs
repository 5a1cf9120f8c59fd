//! Query syntax for the single `content` field.
//!
//! Supported: bare words (optional), `+word` (required), `-word`
//! (prohibited), `AND` / `OR` / `NOT` (also `&&`, `||`), `"phrases"` and an
//! explicit `content:` qualifier. Everything else is rejected with the
//! fragment that caused it.

use crate::error::{DocSearchError, Result};

pub const DEFAULT_FIELD: &str = "content";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Should,
    Must,
    MustNot,
}

/// One unit of a query. The text is raw; it is normalized by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub occur: Occur,
    pub text: String,
    pub phrase: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub clauses: Vec<Clause>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
    Not,
}

#[derive(Debug)]
enum Lexeme {
    Op(Operator, String),
    Term { modifier: Option<char>, text: String, phrase: bool },
}

// Characters with meaning in classic query syntax that this parser does
// not implement.
const RESERVED: &[char] = &['(', ')', '*', '?', '~', '^', '[', ']', '{', '}', '\\', '!', ':'];

pub fn parse_query(input: &str) -> Result<ParsedQuery> {
    let lexemes = lex(input)?;

    let mut clauses: Vec<Clause> = Vec::new();
    let mut conjunction: Option<(Operator, String)> = None;
    let mut negate: Option<String> = None;

    for lexeme in lexemes {
        match lexeme {
            Lexeme::Op(Operator::Not, raw) => {
                if negate.is_some() {
                    return Err(DocSearchError::syntax(raw, "NOT cannot follow NOT"));
                }
                negate = Some(raw);
            }
            Lexeme::Op(op, raw) => {
                if clauses.is_empty() {
                    return Err(DocSearchError::syntax(raw, "operator needs a term on its left"));
                }
                if conjunction.is_some() || negate.is_some() {
                    return Err(DocSearchError::syntax(raw, "operator cannot follow another operator"));
                }
                conjunction = Some((op, raw));
            }
            Lexeme::Term { modifier, text, phrase } => {
                let mut occur = match modifier {
                    Some('+') => Occur::Must,
                    Some(_) => Occur::MustNot,
                    None => Occur::Should,
                };
                if let Some(raw) = negate.take() {
                    if modifier.is_some() {
                        return Err(DocSearchError::syntax(raw, "NOT cannot be combined with +/-"));
                    }
                    occur = Occur::MustNot;
                }
                if let Some((Operator::And, _)) = conjunction {
                    if let Some(prev) = clauses.last_mut() {
                        if prev.occur == Occur::Should {
                            prev.occur = Occur::Must;
                        }
                    }
                    if occur == Occur::Should {
                        occur = Occur::Must;
                    }
                }
                conjunction = None;
                clauses.push(Clause { occur, text, phrase });
            }
        }
    }

    if let Some((_, raw)) = conjunction {
        return Err(DocSearchError::syntax(raw, "operator needs a term on its right"));
    }
    if let Some(raw) = negate {
        return Err(DocSearchError::syntax(raw, "NOT needs a term on its right"));
    }

    let parsed = ParsedQuery { clauses };
    tracing::debug!(?parsed, "parsed query");
    Ok(parsed)
}

fn lex(input: &str) -> Result<Vec<Lexeme>> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let fragment = |end: usize| chars[start..end.min(chars.len())].iter().collect::<String>();

        let modifier = match chars[i] {
            c @ ('+' | '-') => {
                i += 1;
                Some(c)
            }
            _ => None,
        };
        if i >= chars.len() || chars[i].is_whitespace() {
            return Err(DocSearchError::syntax(fragment(i), "modifier needs a term"));
        }

        // Optional field qualifier: letters followed by ':'.
        let mut j = i;
        while j < chars.len() && (chars[j].is_ascii_alphabetic() || chars[j] == '_') {
            j += 1;
        }
        if j > i && j < chars.len() && chars[j] == ':' {
            let field: String = chars[i..j].iter().collect();
            if field != DEFAULT_FIELD {
                let end = scan_word(&chars, j + 1);
                return Err(DocSearchError::syntax(
                    fragment(end),
                    format!("unsupported field '{field}'; only '{DEFAULT_FIELD}' can be searched"),
                ));
            }
            i = j + 1;
            if i >= chars.len() || chars[i].is_whitespace() {
                return Err(DocSearchError::syntax(fragment(i), "field needs a term"));
            }
        }

        if chars[i] == '"' {
            let close = chars[i + 1..].iter().position(|&c| c == '"').map(|p| i + 1 + p);
            let Some(close) = close else {
                return Err(DocSearchError::syntax(fragment(chars.len()), "unterminated phrase"));
            };
            let text: String = chars[i + 1..close].iter().collect();
            i = close + 1;
            if i < chars.len() && !chars[i].is_whitespace() {
                let end = scan_word(&chars, i);
                return Err(DocSearchError::syntax(fragment(end), "unexpected text after phrase"));
            }
            out.push(Lexeme::Term { modifier, text, phrase: true });
            continue;
        }

        let end = scan_word(&chars, i);
        let text: String = chars[i..end].iter().collect();
        i = end;

        if let Some(bad) = text.chars().find(|c| RESERVED.contains(c) || *c == '"') {
            let message = match bad {
                '(' | ')' => "grouping with parentheses is not supported".to_string(),
                '*' | '?' => "wildcards are not supported".to_string(),
                '~' => "fuzzy and proximity search are not supported".to_string(),
                '^' => "boosting is not supported".to_string(),
                '[' | ']' | '{' | '}' => "range queries are not supported".to_string(),
                '"' => "quote inside a word".to_string(),
                other => format!("unexpected '{other}'"),
            };
            return Err(DocSearchError::syntax(fragment(end), message));
        }

        let operator = match text.as_str() {
            "AND" | "&&" => Some(Operator::And),
            "OR" | "||" => Some(Operator::Or),
            "NOT" => Some(Operator::Not),
            _ => None,
        };
        match operator {
            Some(op) if modifier.is_none() => out.push(Lexeme::Op(op, text)),
            _ => out.push(Lexeme::Term { modifier, text, phrase: false }),
        }
    }

    Ok(out)
}

fn scan_word(chars: &[char], from: usize) -> usize {
    let mut end = from;
    while end < chars.len() && !chars[end].is_whitespace() {
        end += 1;
    }
    end
}
