//! Dispute template data mappings.
//!
//! A mapping tells the arbitration frontend where to fetch the values that populate the
//! placeholders left in a dispute template.

use crate::TemplateRenderError;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single mapping step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Mapping kind understood by the consumer, e.g. `json` or `abi/call`
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Partially populated source object
    pub value: Value,
    /// Fields read from `value`
    pub seek: Vec<String>,
    /// Template variables the sought fields are written to
    pub populate: Vec<String>,
}

/// Ordered list of mapping entries, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisputeTemplateMapping {
    pub entries: Vec<MappingEntry>,
}

impl DisputeTemplateMapping {
    /// Mapping for reality.eth questions relayed from `reality`.
    ///
    /// The question fields are left empty and filled from the question data at dispute time.
    pub fn reality(reality: Address) -> Self {
        let fields = ["question", "type", "realityAddress", "questionId"].map(String::from);

        Self {
            entries: vec![MappingEntry {
                entry_type: "json".to_string(),
                value: json!({
                    "question": "",
                    "type": "",
                    "realityAddress": reality.to_checksum(None),
                    "questionId": "",
                }),
                seek: fields.to_vec(),
                populate: fields.to_vec(),
            }],
        }
    }

    /// Check that every `seek` and `populate` name is a field of its entry's value.
    ///
    /// Dotted names address nested objects.
    pub fn validate(&self) -> Result<(), TemplateRenderError> {
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.value.is_object() {
                return Err(TemplateRenderError::MappingValueNotObject { index });
            }

            let lists = [("seek", &entry.seek), ("populate", &entry.populate)];
            for (list, fields) in lists {
                if let Some(field) = fields.iter().find(|f| !has_field(&entry.value, f)) {
                    return Err(TemplateRenderError::UnknownMappingField {
                        index,
                        field: field.clone(),
                        list,
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate and serialize the mapping.
    pub fn to_json(&self) -> Result<String, TemplateRenderError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }
}

fn has_field(value: &Value, path: &str) -> bool {
    path.split('.')
        .try_fold(value, |current, key| current.get(key))
        .is_some()
}

/// Render the reality.eth mapping document.
pub fn render_mapping(reality: Address) -> Result<String, TemplateRenderError> {
    DisputeTemplateMapping::reality(reality).to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render_template, Template, TemplateSettings};
    use alloy_primitives::address;

    const REALITY: Address = address!("0xaf33DcB6E8c5c4D9dDF579f53031b514d19449CA");

    #[test]
    fn test_reality_mapping_shape() {
        let rendered = render_mapping(REALITY).unwrap();
        let json: Value = serde_json::from_str(&rendered).unwrap();

        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["type"], "json");
        assert_eq!(entries[0]["value"]["realityAddress"], REALITY.to_checksum(None));
        assert_eq!(entries[0]["seek"].as_array().unwrap().len(), 4);
        assert_eq!(entries[0]["seek"], entries[0]["populate"]);
    }

    #[test]
    fn test_render_mapping_is_deterministic() {
        assert_eq!(render_mapping(REALITY).unwrap(), render_mapping(REALITY).unwrap());
    }

    #[test]
    fn test_mapping_populates_template_placeholders() {
        let template = render_template(1, Address::ZERO, &TemplateSettings::default()).unwrap();
        let names = Template::parse(&template).unwrap().names();
        let mapping = DisputeTemplateMapping::reality(REALITY);

        for field in &mapping.entries[0].populate {
            assert!(names.contains(field), "{field} is not a template placeholder");
        }
    }

    #[test]
    fn test_unknown_seek_field_rejected() {
        let mut mapping = DisputeTemplateMapping::reality(REALITY);
        mapping.entries[0].seek.push("answers".to_string());

        assert_eq!(
            mapping.validate().unwrap_err(),
            TemplateRenderError::UnknownMappingField {
                index: 0,
                field: "answers".to_string(),
                list: "seek",
            }
        );
    }

    #[test]
    fn test_unknown_populate_field_rejected() {
        let mut mapping = DisputeTemplateMapping::reality(REALITY);
        mapping.entries[0].populate = vec!["arbitrator".to_string()];

        assert!(matches!(
            mapping.to_json(),
            Err(TemplateRenderError::UnknownMappingField { list: "populate", .. })
        ));
    }

    #[test]
    fn test_nested_fields() {
        let mapping = DisputeTemplateMapping {
            entries: vec![MappingEntry {
                entry_type: "json".to_string(),
                value: json!({ "question": { "text": "", "id": "" } }),
                seek: vec!["question.text".to_string(), "question.id".to_string()],
                populate: vec!["question".to_string()],
            }],
        };
        assert!(mapping.validate().is_ok());
    }

    #[test]
    fn test_non_object_value_rejected() {
        let mapping = DisputeTemplateMapping {
            entries: vec![MappingEntry {
                entry_type: "json".to_string(),
                value: json!(["question"]),
                seek: vec![],
                populate: vec![],
            }],
        };
        assert_eq!(
            mapping.validate().unwrap_err(),
            TemplateRenderError::MappingValueNotObject { index: 0 }
        );
    }
}
