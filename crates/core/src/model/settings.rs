use serde::{Deserialize, Serialize};

/// User preferences, independent of any session.
///
/// Every field falls back to its default when absent from persisted JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub show_explanations: bool,
    pub randomize_questions: bool,
    pub randomize_options: bool,
    pub dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_explanations: true,
            randomize_questions: false,
            randomize_options: false,
            dark_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"darkMode":true}"#).unwrap();
        assert!(settings.dark_mode);
        assert!(settings.show_explanations);
        assert!(!settings.randomize_questions);
        assert!(!settings.randomize_options);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["showExplanations"], true);
        assert_eq!(json["randomizeOptions"], false);
    }
}
