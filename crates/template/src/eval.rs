//! Section-stack evaluator for the placeholder micro-language.
//!
//! A [`Template`] is parsed once into a node tree and can then be evaluated in two modes:
//! - [`Template::render`] performs partial evaluation. Names bound in the context are
//!   substituted, unbound names are emitted back as tags so a later consumer can resolve them.
//! - [`Template::render_complete`] treats unbound names as empty/falsy, the way the final
//!   consumer of a document evaluates it.
//!
//! Substituted values are inserted verbatim and never re-evaluated.

use crate::{
    lexer::{tokenize, TagKind, Token},
    TemplateRenderError,
};
use std::collections::{BTreeMap, BTreeSet};

/// A value bound to a name in a [`Context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Bool(bool),
    List(Vec<Context>),
    Map(Context),
}

impl Value {
    fn is_truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::List(items) => !items.is_empty(),
            Self::Map(_) => true,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<Context>> for Value {
    fn from(value: Vec<Context>) -> Self {
        Self::List(value)
    }
}

impl From<Context> for Value {
    fn from(value: Context) -> Self {
        Self::Map(value)
    }
}

/// Name-keyed bindings for one evaluation scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context(BTreeMap<String, Value>);

impl Context {
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Bind `name`, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Variable(String),
    Section {
        name: String,
        inverted: bool,
        children: Vec<Node>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Partial,
    Complete,
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

/// An open section waiting for its close tag.
struct Frame {
    name: String,
    inverted: bool,
    children: Vec<Node>,
}

impl Template {
    /// Parse `source`, checking that every section is closed in order.
    pub fn parse(source: &str) -> Result<Self, TemplateRenderError> {
        let mut root = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();

        for token in tokenize(source)? {
            let node = match token {
                Token::Text(text) => Node::Text(text.to_string()),
                Token::Tag {
                    kind: TagKind::Variable,
                    name,
                    ..
                } => Node::Variable(name.to_string()),
                Token::Tag {
                    kind: kind @ (TagKind::Section | TagKind::Inverted),
                    name,
                    ..
                } => {
                    stack.push(Frame {
                        name: name.to_string(),
                        inverted: kind == TagKind::Inverted,
                        children: Vec::new(),
                    });
                    continue;
                }
                Token::Tag {
                    kind: TagKind::Close,
                    name,
                    ..
                } => {
                    let Some(frame) = stack.pop() else {
                        return Err(TemplateRenderError::UnexpectedClose(name.to_string()));
                    };
                    if frame.name != name {
                        return Err(TemplateRenderError::MismatchedClose {
                            open: frame.name,
                            close: name.to_string(),
                        });
                    }
                    Node::Section {
                        name: frame.name,
                        inverted: frame.inverted,
                        children: frame.children,
                    }
                }
            };

            match stack.last_mut() {
                Some(frame) => frame.children.push(node),
                None => root.push(node),
            }
        }

        if let Some(frame) = stack.pop() {
            return Err(TemplateRenderError::UnclosedSection(frame.name));
        }

        Ok(Self { nodes: root })
    }

    /// Partially evaluate against `context`, re-emitting unbound names as tags.
    pub fn render(&self, context: &Context) -> Result<String, TemplateRenderError> {
        self.evaluate(context, Mode::Partial)
    }

    /// Fully evaluate against `context`; unbound names render empty and unbound sections are falsy.
    pub fn render_complete(&self, context: &Context) -> Result<String, TemplateRenderError> {
        self.evaluate(context, Mode::Complete)
    }

    /// Every name referenced by a placeholder or section, in sorted order.
    pub fn names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        collect_names(&self.nodes, &mut names);
        names
    }

    fn evaluate(&self, context: &Context, mode: Mode) -> Result<String, TemplateRenderError> {
        let mut out = String::new();
        let mut scopes = vec![context];
        eval_nodes(&self.nodes, &mut scopes, mode, &mut out)?;
        Ok(out)
    }
}

fn lookup<'c>(scopes: &[&'c Context], name: &str) -> Option<&'c Value> {
    scopes.iter().rev().find_map(|&scope| scope.get(name))
}

fn eval_nodes<'c>(
    nodes: &[Node],
    scopes: &mut Vec<&'c Context>,
    mode: Mode,
    out: &mut String,
) -> Result<(), TemplateRenderError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable(name) => match lookup(scopes, name) {
                Some(Value::Str(s)) => out.push_str(s),
                Some(Value::Bool(b)) => out.push_str(if *b { "true" } else { "false" }),
                Some(Value::List(_) | Value::Map(_)) => {
                    return Err(TemplateRenderError::NonScalarValue(name.clone()))
                }
                None if mode == Mode::Partial => {
                    out.push_str("{{ ");
                    out.push_str(name);
                    out.push_str(" }}");
                }
                None => {}
            },
            Node::Section {
                name,
                inverted,
                children,
            } => eval_section(name, *inverted, children, scopes, mode, out)?,
        }
    }
    Ok(())
}

fn eval_section<'c>(
    name: &str,
    inverted: bool,
    children: &[Node],
    scopes: &mut Vec<&'c Context>,
    mode: Mode,
    out: &mut String,
) -> Result<(), TemplateRenderError> {
    let Some(value) = lookup(scopes, name) else {
        return match mode {
            Mode::Partial => {
                out.push_str(if inverted { "{{^ " } else { "{{# " });
                out.push_str(name);
                out.push_str(" }}");
                eval_nodes(children, scopes, mode, out)?;
                out.push_str("{{/ ");
                out.push_str(name);
                out.push_str(" }}");
                Ok(())
            }
            Mode::Complete if inverted => eval_nodes(children, scopes, mode, out),
            Mode::Complete => Ok(()),
        };
    };

    if inverted {
        if !value.is_truthy() {
            eval_nodes(children, scopes, mode, out)?;
        }
        return Ok(());
    }

    match value {
        Value::List(items) => {
            for item in items {
                scopes.push(item);
                let result = eval_nodes(children, scopes, mode, out);
                scopes.pop();
                result?;
            }
        }
        Value::Map(map) => {
            scopes.push(map);
            let result = eval_nodes(children, scopes, mode, out);
            scopes.pop();
            result?;
        }
        scalar if scalar.is_truthy() => eval_nodes(children, scopes, mode, out)?,
        _ => {}
    }

    Ok(())
}

fn collect_names(nodes: &[Node], names: &mut BTreeSet<String>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Variable(name) => {
                names.insert(name.clone());
            }
            Node::Section { name, children, .. } => {
                names.insert(name.clone());
                collect_names(children, names);
            }
        }
    }
}
