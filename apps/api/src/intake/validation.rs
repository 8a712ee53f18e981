use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_INTRO_LENGTH: usize = 30;

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern"));
static RESUME_URL_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").expect("resume url pattern"));

/// Intake form fields. Declaration order is the focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Name,
    Email,
    ResumeUrl,
    Intro,
}

/// In-progress application fields. Also the persisted draft shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub resume_url: String,
    #[serde(default)]
    pub intro: String,
}

pub type ApplicationDraft = ApplicationForm;

impl ApplicationForm {
    pub fn is_blank(&self) -> bool {
        [&self.name, &self.email, &self.resume_url, &self.intro]
            .iter()
            .all(|v| v.trim().is_empty())
    }

    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            resume_url: self.resume_url.trim().to_string(),
            intro: self.intro.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IntakeRules {
    pub min_intro_length: usize,
}

impl Default for IntakeRules {
    fn default() -> Self {
        Self {
            min_intro_length: DEFAULT_MIN_INTRO_LENGTH,
        }
    }
}

/// Field-keyed validation messages, iterated in focus order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FormField, String>);

impl FieldErrors {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// The first invalid field in `[name, email, resumeUrl, intro]` order.
    pub fn primary(&self) -> Option<FormField> {
        self.0.keys().next().copied()
    }

    fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }
}

pub fn email_looks_valid(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email.trim())
}

pub fn resume_looks_valid(resume_url: &str) -> bool {
    RESUME_URL_SHAPE.is_match(resume_url.trim())
}

pub fn intro_long_enough(intro: &str, min_length: usize) -> bool {
    intro.trim().chars().count() >= min_length
}

/// Validates every field, collecting all failures.
pub fn validate_application(form: &ApplicationForm, rules: &IntakeRules) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if form.name.trim().is_empty() {
        errors.insert(FormField::Name, "Name is required.");
    }

    if form.email.trim().is_empty() {
        errors.insert(FormField::Email, "Email is required.");
    } else if !email_looks_valid(&form.email) {
        errors.insert(FormField::Email, "Enter a valid email address.");
    }

    if form.resume_url.trim().is_empty() {
        errors.insert(FormField::ResumeUrl, "Resume link is required.");
    } else if !resume_looks_valid(&form.resume_url) {
        errors.insert(
            FormField::ResumeUrl,
            "Resume link should start with http:// or https://",
        );
    }

    if form.intro.trim().is_empty() {
        errors.insert(FormField::Intro, "Please write a short intro.");
    } else if !intro_long_enough(&form.intro, rules.min_intro_length) {
        errors.insert(
            FormField::Intro,
            format!(
                "Intro must be at least {} characters.",
                rules.min_intro_length
            ),
        );
    }

    errors
}
