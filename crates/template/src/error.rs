use thiserror::Error;

/// Errors raised while parsing, evaluating or synthesizing a template document.
///
/// No partial document is ever returned alongside one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateRenderError {
    /// A `{{` without a matching `}}`
    #[error("unterminated tag starting at byte {0}")]
    UnterminatedTag(usize),

    /// A tag with no name, e.g. `{{ }}` or `{{# }}`
    #[error("empty tag at byte {0}")]
    EmptyTag(usize),

    /// A tag kind outside the supported subset (comments, partials, raw, delimiters)
    #[error("unsupported tag `{tag}` at byte {offset}")]
    UnsupportedTag { tag: String, offset: usize },

    /// A close tag that does not match the innermost open section
    #[error("section `{open}` closed by `{close}`")]
    MismatchedClose { open: String, close: String },

    /// A close tag with no open section
    #[error("unexpected close tag `{0}`")]
    UnexpectedClose(String),

    /// A section still open at the end of input
    #[error("unclosed section `{0}`")]
    UnclosedSection(String),

    /// A list or map value used as a scalar placeholder
    #[error("placeholder `{0}` is bound to a non-scalar value")]
    NonScalarValue(String),

    #[error("dispute template has no answers")]
    EmptyAnswers,

    #[error("dispute template has no terminal answer")]
    NoTerminalAnswer,

    #[error("dispute template has {0} terminal answers, expected exactly one")]
    MultipleTerminalAnswers(usize),

    /// Settings text carrying template syntax other than a scalar placeholder
    #[error("`{field}` contains template syntax `{tag}`")]
    TemplateSyntaxInText { field: String, tag: String },

    #[error("mapping entry {index} value is not a JSON object")]
    MappingValueNotObject { index: usize },

    /// A `seek` or `populate` name that is not a field of the entry value
    #[error("mapping entry {index} lists `{field}` in {list} but its value has no such field")]
    UnknownMappingField {
        index: usize,
        field: String,
        list: &'static str,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for TemplateRenderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}
