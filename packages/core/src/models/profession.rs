//! Profession records
//!
//! A profession groups skills. The link is many-to-many: one skill can serve
//! several professions.

use super::theory::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profession {
    pub id: i64,
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfession {
    pub name: String,
    pub icon: String,
}

impl NewProfession {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_icon_is_rejected() {
        assert_eq!(
            NewProfession::new("Backend developer", " ").validate(),
            Err(ValidationError::BlankField("icon".to_string()))
        );
        assert!(NewProfession::new("Backend developer", "🛠").validate().is_ok());
    }
}
