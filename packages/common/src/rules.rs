use serde::Deserialize;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct RuleViolation {
    /// Name of the offending request field.
    pub field: &'static str,
    pub message: String,
}

impl RuleViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Tunable input rules shared by the policy engine and request validation.
///
/// Loaded from the `rules` configuration section; every field has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct Rules {
    /// Lowest accepted review score. Default: 1.
    #[serde(default = "default_min_score")]
    pub min_score: i32,
    /// Highest accepted review score. Default: 10.
    #[serde(default = "default_max_score")]
    pub max_score: i32,
    /// Usernames nobody may register, compared case-insensitively. Default: `["me"]`.
    #[serde(default = "default_forbidden_usernames")]
    pub forbidden_usernames: Vec<String>,
    /// Default: 150.
    #[serde(default = "default_username_max_length")]
    pub username_max_length: usize,
    /// Default: 254.
    #[serde(default = "default_email_max_length")]
    pub email_max_length: usize,
    /// Applies to first/last name. Default: 150.
    #[serde(default = "default_username_max_length")]
    pub profile_name_max_length: usize,
    /// Applies to title, category and genre names. Default: 256.
    #[serde(default = "default_name_max_length")]
    pub name_max_length: usize,
    /// Default: 50.
    #[serde(default = "default_slug_max_length")]
    pub slug_max_length: usize,
}

fn default_min_score() -> i32 {
    1
}
fn default_max_score() -> i32 {
    10
}
fn default_forbidden_usernames() -> Vec<String> {
    vec!["me".into()]
}
fn default_username_max_length() -> usize {
    150
}
fn default_email_max_length() -> usize {
    254
}
fn default_name_max_length() -> usize {
    256
}
fn default_slug_max_length() -> usize {
    50
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            max_score: default_max_score(),
            forbidden_usernames: default_forbidden_usernames(),
            username_max_length: default_username_max_length(),
            email_max_length: default_email_max_length(),
            profile_name_max_length: default_username_max_length(),
            name_max_length: default_name_max_length(),
            slug_max_length: default_slug_max_length(),
        }
    }
}

/// Characters allowed in a username besides Unicode letters and digits.
const USERNAME_SYMBOLS: &[char] = &['_', '.', '@', '+', '-'];

impl Rules {
    /// Username must match `[\w.@+-]+`, fit the length limit and not be reserved.
    pub fn check_username(&self, username: &str) -> Result<(), RuleViolation> {
        if username.is_empty() {
            return Err(RuleViolation::new("username", "Username must not be empty"));
        }
        if username.chars().count() > self.username_max_length {
            return Err(RuleViolation::new(
                "username",
                format!(
                    "Username must be at most {} characters",
                    self.username_max_length
                ),
            ));
        }
        let invalid: String = username
            .chars()
            .filter(|c| !(c.is_alphanumeric() || USERNAME_SYMBOLS.contains(c)))
            .collect();
        if !invalid.is_empty() {
            return Err(RuleViolation::new(
                "username",
                format!("Username contains invalid characters: {invalid}"),
            ));
        }
        if self
            .forbidden_usernames
            .iter()
            .any(|f| f.to_lowercase() == username.to_lowercase())
        {
            return Err(RuleViolation::new(
                "username",
                format!("Username '{username}' is reserved"),
            ));
        }
        Ok(())
    }

    pub fn check_email(&self, email: &str) -> Result<(), RuleViolation> {
        if email.is_empty() {
            return Err(RuleViolation::new("email", "Email must not be empty"));
        }
        if email.chars().count() > self.email_max_length {
            return Err(RuleViolation::new(
                "email",
                format!("Email must be at most {} characters", self.email_max_length),
            ));
        }
        let well_formed = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !well_formed {
            return Err(RuleViolation::new("email", "Enter a valid email address"));
        }
        Ok(())
    }

    /// First/last name: optional, bounded.
    pub fn check_profile_name(&self, field: &'static str, value: &str) -> Result<(), RuleViolation> {
        if value.chars().count() > self.profile_name_max_length {
            return Err(RuleViolation::new(
                field,
                format!(
                    "Must be at most {} characters",
                    self.profile_name_max_length
                ),
            ));
        }
        Ok(())
    }

    pub fn check_score(&self, score: i32) -> Result<(), RuleViolation> {
        if !(self.min_score..=self.max_score).contains(&score) {
            return Err(RuleViolation::new(
                "score",
                format!(
                    "Score must be between {} and {}",
                    self.min_score, self.max_score
                ),
            ));
        }
        Ok(())
    }

    /// `current_year` must come from the wall clock at call time.
    pub fn check_year(&self, year: i32, current_year: i32) -> Result<(), RuleViolation> {
        if year > current_year {
            return Err(RuleViolation::new(
                "year",
                format!("Year {year} is later than the current year {current_year}"),
            ));
        }
        Ok(())
    }

    /// Trimmed display name of a title, category or genre.
    pub fn check_name(&self, name: &str) -> Result<(), RuleViolation> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > self.name_max_length {
            return Err(RuleViolation::new(
                "name",
                format!("Name must be 1-{} characters", self.name_max_length),
            ));
        }
        Ok(())
    }

    pub fn check_slug(&self, slug: &str) -> Result<(), RuleViolation> {
        if slug.is_empty() || slug.len() > self.slug_max_length {
            return Err(RuleViolation::new(
                "slug",
                format!("Slug must be 1-{} characters", self.slug_max_length),
            ));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(RuleViolation::new(
                "slug",
                "Slug must contain only letters, digits, hyphens and underscores",
            ));
        }
        Ok(())
    }

    /// Review and comment bodies.
    pub fn check_text(&self, text: &str) -> Result<(), RuleViolation> {
        if text.trim().is_empty() {
            return Err(RuleViolation::new("text", "Text must not be empty"));
        }
        Ok(())
    }
}
