//! Skill records
//!
//! A skill owns one forest of theories. Deleting a skill removes its theories.

use super::theory::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSkill {
    pub name: String,
    pub icon: String,
}

impl NewSkill {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("icon", &self.icon)
    }
}

/// Partial skill edit; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl SkillUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(icon) = &self.icon {
            require_text("icon", icon)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_skill_validation() {
        assert!(NewSkill::new("Rust", "crab.svg").validate().is_ok());
        assert_eq!(
            NewSkill::new("", "crab.svg").validate(),
            Err(ValidationError::BlankField("name".to_string()))
        );
        assert_eq!(
            NewSkill::new("Rust", " ").validate(),
            Err(ValidationError::BlankField("icon".to_string()))
        );
    }

    #[test]
    fn test_skill_update_only_checks_present_fields() {
        assert!(SkillUpdate::default().validate().is_ok());
        let update = SkillUpdate {
            icon: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
