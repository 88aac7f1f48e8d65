use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub field_name: String,
    pub question_text: String,
    pub is_required: bool,
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl FieldConfig {
    pub fn new(
        field_name: impl Into<String>,
        question_text: impl Into<String>,
        is_required: bool,
        sort_order: i32,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            question_text: question_text.into(),
            is_required,
            sort_order,
            is_active: true,
        }
    }
}

/// Checklist used whenever the field-config provider is unavailable.
pub fn default_field_configs() -> Vec<FieldConfig> {
    vec![
        FieldConfig::new("name", "May I have your name?", true, 1),
        FieldConfig::new("phone", "What's the best phone number to reach you?", true, 2),
        FieldConfig::new("style", "What kind of style or vibe you want?", true, 3),
        FieldConfig::new("location", "Which area is the property located?", true, 4),
        FieldConfig::new("scope", "Which spaces are in scope?", false, 5),
    ]
}
