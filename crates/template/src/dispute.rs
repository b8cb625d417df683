//! Dispute template synthesis.
//!
//! The dispute template is a JSON document handed to the arbitrator's template registry at
//! deployment time. Fields known at deployment (arbitrator, chain, policy) are filled in here;
//! question-specific fields stay as `{{ name }}` tokens for the arbitration frontend to resolve
//! when a dispute is raised.

use crate::{
    lexer::{tokenize, TagKind, Token},
    Context, Template, TemplateRenderError,
};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Sections driven by the consumer. Settings text may not reference them.
const CONSUMER_NAMES: [&str; 2] = ["answers", "last"];

/// Document skeleton. Every name used here is bound by [`DisputeTemplate::context`] except
/// `answers` and `last`, which pass through to the consumer.
const SKELETON: &str = r#"{
  "title": "{{ title }}",
  "description": "{{ description }}",
  "question": "{{ question }}",
  "type": "{{ type }}",
  "answers": [
{{# choices }}{{^ terminal }}    {
      "title": "{{ choiceTitle }}",
      "description": "{{ choiceDescription }}"{{# choiceId }},
      "id": "{{ choiceId }}"{{/ choiceId }}{{# reserved }},
      "reserved": true{{/ reserved }}
    },
{{/ terminal }}{{# terminal }}    {{# answers }}
    {
      "title": "{{ choiceTitle }}",
      "description": "{{ choiceDescription }}"{{# choiceId }},
      "id": "{{ choiceId }}"{{/ choiceId }}{{# reserved }},
      "reserved": true{{/ reserved }}
    }{{^ last }},{{/ last }}
    {{/ answers }}
{{/ terminal }}{{/ choices }}  ],
  "policyURI": "{{ policyUri }}",
  "frontendUrl": "{{ frontendUrl }}",
  "arbitratorChainID": "{{ arbitratorChainId }}",
  "arbitratorAddress": "{{ arbitratorAddress }}",
  "category": "{{ category }}",
  "lang": "{{ lang }}",
  "specification": "{{ specification }}",
  "version": "{{ version }}"
}"#;

/// One entry of the `answers` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub reserved: bool,
    /// The catch-all entry. It is rendered last, repeated once per question option
    /// by the consumer, and carries no trailing separator of its own.
    #[serde(default)]
    pub terminal: bool,
}

impl Answer {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            id: None,
            reserved: false,
            terminal: false,
        }
    }

    /// The per-option catch-all, whose fields are filled in by the consumer.
    pub fn per_option() -> Self {
        Self {
            terminal: true,
            ..Self::new("{{ title }}", "{{ description }}")
        }
    }
}

/// Deployment-independent template settings, overridable per profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    pub title: String,
    pub description: String,
    pub question: String,
    pub question_type: String,
    pub answers: Vec<Answer>,
    pub policy_uri: String,
    pub frontend_url: String,
    pub category: String,
    pub lang: String,
    pub specification: String,
    pub version: String,
}

impl Default for TemplateSettings {
    /// reality.eth question template.
    fn default() -> Self {
        Self {
            title: "A reality.eth question".to_string(),
            description: "A reality.eth question has been raised to arbitration.".to_string(),
            question: "{{ question }}".to_string(),
            question_type: "{{ type }}".to_string(),
            answers: vec![
                Answer::new("Answered Too Soon", "Answered Too Soon."),
                Answer::per_option(),
            ],
            policy_uri: "/ipfs/QmZ5XaV2RVgBADq5qMpbuEwgCuPZdRgCeu8rhGtJWLV6yz".to_string(),
            frontend_url:
                "https://reality.eth.limo/app/#!/question/{{ realityAddress }}-{{ questionId }}"
                    .to_string(),
            category: "Oracle".to_string(),
            lang: "en_US".to_string(),
            specification: "KIP99".to_string(),
            version: "1.0".to_string(),
        }
    }
}

/// A dispute template bound to a concrete arbitrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeTemplate {
    pub title: String,
    pub description: String,
    pub question: String,
    pub question_type: String,
    pub answers: Vec<Answer>,
    pub policy_uri: String,
    pub frontend_url: String,
    pub arbitrator_chain_id: u64,
    pub arbitrator_address: Address,
    pub category: String,
    pub lang: String,
    pub specification: String,
    pub version: String,
}

impl DisputeTemplate {
    pub fn new(settings: &TemplateSettings, chain_id: u64, arbitrator: Address) -> Self {
        Self {
            title: settings.title.clone(),
            description: settings.description.clone(),
            question: settings.question.clone(),
            question_type: settings.question_type.clone(),
            answers: settings.answers.clone(),
            policy_uri: settings.policy_uri.clone(),
            frontend_url: settings.frontend_url.clone(),
            arbitrator_chain_id: chain_id,
            arbitrator_address: arbitrator,
            category: settings.category.clone(),
            lang: settings.lang.clone(),
            specification: settings.specification.clone(),
            version: settings.version.clone(),
        }
    }

    /// Answers in render order: fixed entries in source order, then the terminal entry.
    ///
    /// Fails unless there is at least one answer and exactly one is terminal.
    pub fn ordered_answers(&self) -> Result<Vec<&Answer>, TemplateRenderError> {
        if self.answers.is_empty() {
            return Err(TemplateRenderError::EmptyAnswers);
        }

        let (terminal, mut ordered): (Vec<&Answer>, Vec<&Answer>) =
            self.answers.iter().partition(|a| a.terminal);
        match terminal.len() {
            0 => return Err(TemplateRenderError::NoTerminalAnswer),
            1 => {}
            n => return Err(TemplateRenderError::MultipleTerminalAnswers(n)),
        }

        ordered.extend(terminal);
        Ok(ordered)
    }

    /// Render the document.
    ///
    /// The result always parses as a template, so the consumer never sees a malformed document.
    pub fn render(&self) -> Result<String, TemplateRenderError> {
        let context = self.context()?;
        let rendered = Template::parse(SKELETON)?.render(&context)?;
        Template::parse(&rendered)?;
        Ok(rendered)
    }

    fn context(&self) -> Result<Context, TemplateRenderError> {
        let choices = self
            .ordered_answers()?
            .into_iter()
            .map(|answer| -> Result<Context, TemplateRenderError> {
                Ok(Context::new()
                    .with("choiceTitle", field_text("answers.title", &answer.title)?)
                    .with(
                        "choiceDescription",
                        field_text("answers.description", &answer.description)?,
                    )
                    .with(
                        "choiceId",
                        field_text("answers.id", answer.id.as_deref().unwrap_or_default())?,
                    )
                    .with("reserved", answer.reserved)
                    .with("terminal", answer.terminal))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Context::new()
            .with("title", field_text("title", &self.title)?)
            .with("description", field_text("description", &self.description)?)
            .with("question", field_text("question", &self.question)?)
            .with("type", field_text("question_type", &self.question_type)?)
            .with("choices", choices)
            .with("policyUri", field_text("policy_uri", &self.policy_uri)?)
            .with("frontendUrl", field_text("frontend_url", &self.frontend_url)?)
            .with("arbitratorChainId", self.arbitrator_chain_id.to_string())
            .with("arbitratorAddress", self.arbitrator_address.to_checksum(None))
            .with("category", field_text("category", &self.category)?)
            .with("lang", field_text("lang", &self.lang)?)
            .with("specification", field_text("specification", &self.specification)?)
            .with("version", field_text("version", &self.version)?))
    }
}

/// Render the dispute template for an arbitrator deployed on `chain_id`.
pub fn render_template(
    chain_id: u64,
    arbitrator: Address,
    settings: &TemplateSettings,
) -> Result<String, TemplateRenderError> {
    DisputeTemplate::new(settings, chain_id, arbitrator).render()
}

/// Check and escape the settings text of `field`.
///
/// Scalar placeholders are left for the consumer. Any other tag, or a brace pair that does not
/// tokenize, would change the structure of the rendered document and is rejected.
fn field_text(field: &str, value: &str) -> Result<String, TemplateRenderError> {
    let rejected = |tag: String| TemplateRenderError::TemplateSyntaxInText {
        field: field.to_string(),
        tag,
    };

    let tokens = tokenize(value).map_err(|err| rejected(err.to_string()))?;
    for token in tokens {
        let Token::Tag { kind, name, .. } = token else {
            continue;
        };
        let sigil = match kind {
            TagKind::Variable if !CONSUMER_NAMES.contains(&name) => continue,
            TagKind::Variable => " ",
            TagKind::Section => "# ",
            TagKind::Inverted => "^ ",
            TagKind::Close => "/ ",
        };
        return Err(rejected(format!("{{{{{sigil}{name} }}}}")));
    }

    escape(value)
}

/// Escape `value` for use inside a JSON string literal.
fn escape(value: &str) -> Result<String, TemplateRenderError> {
    let quoted = serde_json::to_string(value)?;
    Ok(quoted[1..quoted.len() - 1].to_string())
}
