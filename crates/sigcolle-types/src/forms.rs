//! Request DTOs bound from path parameters and form bodies.
//!
//! Every field is bound as text so binding itself never fails; the
//! `validate` functions are pure and report problems as a list of
//! field/message pairs.

use serde::{Deserialize, Serialize};

pub const NAME_MAX_LEN: usize = 50;
pub const COMMENT_MAX_LEN: usize = 255;
pub const TITLE_MAX_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn messages_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

// -- Field checks --

fn check_required(errors: &mut ValidationErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, "must not be blank");
        return false;
    }
    true
}

fn check_max_len(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("must be at most {} characters", max));
    }
}

fn check_digits(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        errors.add(field, "must be a number");
    }
}

fn check_campaign_id(errors: &mut ValidationErrors, value: &str) {
    if !check_required(errors, "campaign_id", value) {
        return;
    }
    if value.bytes().all(|b| b.is_ascii_digit()) && value.parse::<i64>().is_ok() {
        return;
    }
    errors.add("campaign_id", "must be a campaign number");
}

fn parse_campaign_id(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

// -- Campaign view parameters --

#[derive(Debug, Clone, Default)]
pub struct CampaignParams {
    pub campaign_id: String,
}

impl CampaignParams {
    pub fn new(campaign_id: impl Into<String>) -> Self {
        Self {
            campaign_id: campaign_id.into(),
        }
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_campaign_id(&mut errors, &self.campaign_id);
        errors
    }

    pub fn campaign_id(&self) -> Option<i64> {
        parse_campaign_id(&self.campaign_id)
    }
}

// -- Signature submission --

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureForm {
    pub campaign_id: String,
    pub name: String,
    pub signature_comment: String,
}

impl SignatureForm {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_campaign_id(&mut errors, &self.campaign_id);
        if check_required(&mut errors, "name", &self.name) {
            check_max_len(&mut errors, "name", &self.name, NAME_MAX_LEN);
        }
        check_max_len(
            &mut errors,
            "signature_comment",
            &self.signature_comment,
            COMMENT_MAX_LEN,
        );
        errors
    }

    pub fn campaign_id(&self) -> Option<i64> {
        parse_campaign_id(&self.campaign_id)
    }

    /// The comment as submitted, or `None` when left blank.
    pub fn comment(&self) -> Option<&str> {
        let comment = self.signature_comment.as_str();
        (!comment.trim().is_empty()).then_some(comment)
    }
}

// -- Campaign creation --

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignCreateForm {
    pub title: String,
    pub goal: String,
    pub statement: String,
}

impl CampaignCreateForm {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if check_required(&mut errors, "title", &self.title) {
            check_max_len(&mut errors, "title", &self.title, TITLE_MAX_LEN);
        }
        if check_required(&mut errors, "goal", &self.goal) {
            check_digits(&mut errors, "goal", &self.goal);
        }
        check_required(&mut errors, "statement", &self.statement);
        errors
    }
}
