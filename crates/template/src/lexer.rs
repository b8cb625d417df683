//! Tokenizer for the placeholder micro-language.
//!
//! Recognized tags:
//! - `{{ name }}` scalar placeholder
//! - `{{# name }}` section open (iteration or conditional)
//! - `{{^ name }}` inverted section open
//! - `{{/ name }}` section close
//!
//! Whitespace inside the braces is optional.

use crate::TemplateRenderError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Kind of a `{{ ... }}` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Variable,
    Section,
    Inverted,
    Close,
}

/// A lexical token borrowed from the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Tag {
        kind: TagKind,
        name: &'a str,
        /// Byte offset of the opening `{{`
        offset: usize,
    },
}

/// Split `source` into text and tag tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, TemplateRenderError> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    while let Some(found) = source[cursor..].find(OPEN) {
        let start = cursor + found;
        if start > cursor {
            tokens.push(Token::Text(&source[cursor..start]));
        }

        let inner_start = start + OPEN.len();
        let Some(len) = source[inner_start..].find(CLOSE) else {
            return Err(TemplateRenderError::UnterminatedTag(start));
        };
        let inner = &source[inner_start..inner_start + len];
        tokens.push(parse_tag(inner, start)?);

        cursor = inner_start + len + CLOSE.len();
    }

    if cursor < source.len() {
        tokens.push(Token::Text(&source[cursor..]));
    }

    Ok(tokens)
}

fn parse_tag(inner: &str, offset: usize) -> Result<Token<'_>, TemplateRenderError> {
    let trimmed = inner.trim();
    let (kind, rest) = match trimmed.chars().next() {
        Some('#') => (TagKind::Section, &trimmed[1..]),
        Some('^') => (TagKind::Inverted, &trimmed[1..]),
        Some('/') => (TagKind::Close, &trimmed[1..]),
        Some('!' | '>' | '&' | '=' | '{') => {
            return Err(TemplateRenderError::UnsupportedTag {
                tag: trimmed.to_string(),
                offset,
            })
        }
        Some(_) => (TagKind::Variable, trimmed),
        None => return Err(TemplateRenderError::EmptyTag(offset)),
    };

    let name = rest.trim();
    if name.is_empty() {
        return Err(TemplateRenderError::EmptyTag(offset));
    }
    if name.contains(char::is_whitespace) {
        return Err(TemplateRenderError::UnsupportedTag {
            tag: trimmed.to_string(),
            offset,
        });
    }

    Ok(Token::Tag { kind, name, offset })
}
