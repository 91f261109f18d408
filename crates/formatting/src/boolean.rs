use crate::error::{FormatError, Result};

/// A `true/false` label pair such as `Yes/No`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolFormat {
    true_label: String,
    false_label: String,
}

impl Default for BoolFormat {
    fn default() -> Self {
        Self {
            true_label: "Yes".to_string(),
            false_label: "No".to_string(),
        }
    }
}

impl BoolFormat {
    /// Build from `"<true>/<false>"`. Both labels must be present.
    pub fn new(labels: &str) -> Result<Self> {
        match labels.split_once('/') {
            Some((t, f)) if !t.is_empty() && !f.is_empty() && !f.contains('/') => Ok(Self {
                true_label: t.to_string(),
                false_label: f.to_string(),
            }),
            _ => Err(FormatError::InvalidConfig(format!(
                "bool format must look like 'Yes/No', got '{labels}'"
            ))),
        }
    }

    pub fn true_label(&self) -> &str {
        &self.true_label
    }

    pub fn false_label(&self) -> &str {
        &self.false_label
    }

    pub fn format(&self, value: bool) -> &str {
        if value {
            &self.true_label
        } else {
            &self.false_label
        }
    }

    /// Text is true exactly when it equals the true label, ignoring case.
    pub fn parse_str(&self, text: &str) -> bool {
        text.trim().to_lowercase() == self.true_label.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let fmt = BoolFormat::default();
        assert_eq!(fmt.format(true), "Yes");
        assert_eq!(fmt.format(false), "No");
        assert!(fmt.parse_str("yes"));
        assert!(fmt.parse_str("YES"));
        assert!(!fmt.parse_str("No"));
        assert!(!fmt.parse_str("true"));
    }

    #[test]
    fn test_custom_labels() {
        let fmt = BoolFormat::new("On/Off").unwrap();
        assert_eq!(fmt.true_label(), "On");
        assert_eq!(fmt.format(false), "Off");
        assert!(fmt.parse_str("on"));
    }

    #[test]
    fn test_malformed_labels() {
        for bad in ["Yes", "Yes/", "/No", "a/b/c", ""] {
            assert!(
                matches!(BoolFormat::new(bad), Err(FormatError::InvalidConfig(_))),
                "{bad}"
            );
        }
    }
}
