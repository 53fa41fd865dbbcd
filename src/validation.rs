//! Form validation: pure, synchronous field checks.
//!
//! Every validator returns a [`FieldErrors`] map holding only the fields that
//! failed. An empty map means the form is valid. Nothing here panics on bad
//! input.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::jobs::model::{JobType, NewJob, PaymentStatus, ShiftType, clock};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,6}$").expect("valid email regex"));

static PASSWORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_@-]{8,}$").expect("valid password regex"));

/// Field name → message, for the fields that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. The first message for a field wins.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `field: message` pairs joined for logs and error display.
    pub fn summary(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `Ok(())` when empty, otherwise the errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self))
        }
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountForm {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

/// Sign-in form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Job-posting form, as typed by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobForm {
    pub title: String,
    pub location: String,
    pub industry: String,
    pub subcategory: String,
    pub rate: String,
    pub applicants_needed: String,
    pub job_type: String,
    pub shift_type: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.insert("email", "Email is Required");
    } else if !EMAIL_PATTERN.is_match(email) {
        errors.insert("email", "Invalid email address");
    }
}

/// Validate the sign-up form.
pub fn validate_account(form: &AccountForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if form.firstname.is_empty() {
        errors.insert("firstname", "First name is Required");
    }
    if form.lastname.is_empty() {
        errors.insert("lastname", "Last name is Required");
    }

    check_email(&mut errors, &form.email);

    if form.password.is_empty() {
        errors.insert("password", "Password is Required");
    } else if !PASSWORD_PATTERN.is_match(&form.password) {
        errors.insert("password", "Invalid password");
    }

    // Unconditional, independent of the other fields.
    if form.password != form.confirm_password {
        errors.insert("confirmPassword", "Password did not match");
    } else if form.confirm_password.is_empty() {
        errors.insert("confirmPassword", "Confirm password is Required");
    }

    errors
}

/// Validate the sign-in form.
pub fn validate_login(form: &LoginForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, &form.email);
    if form.password.is_empty() {
        errors.insert("password", "Password is Required");
    }
    errors
}

fn parse_job_type(raw: &str) -> Option<JobType> {
    match raw.trim() {
        "1" | "single_day" => Some(JobType::SingleDay),
        "2" | "multiple_days" => Some(JobType::MultipleDays),
        _ => None,
    }
}

fn parse_shift_type(raw: &str) -> Option<ShiftType> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "day" => Some(ShiftType::Day),
        "night" => Some(ShiftType::Night),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Validate the job-posting form.
pub fn validate_job(form: &JobForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let fields = [
        ("title", &form.title),
        ("location", &form.location),
        ("industry", &form.industry),
        ("subcategory", &form.subcategory),
        ("rate", &form.rate),
        ("applicants_needed", &form.applicants_needed),
        ("job_type", &form.job_type),
        ("shift_type", &form.shift_type),
        ("date", &form.date),
        ("start_time", &form.start_time),
        ("end_time", &form.end_time),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            errors.insert(name, "Required");
        }
    }

    for (name, value) in [
        ("title", &form.title),
        ("location", &form.location),
        ("industry", &form.industry),
        ("subcategory", &form.subcategory),
    ] {
        if value.trim().chars().count() == 1 {
            errors.insert(name, "Too short!");
        }
    }

    if !form.rate.trim().is_empty() {
        match form.rate.trim().parse::<Decimal>() {
            Ok(rate) if rate > Decimal::ZERO => {}
            _ => errors.insert("rate", "Rate must be a positive amount"),
        }
    }

    if !form.applicants_needed.trim().is_empty() {
        match form.applicants_needed.trim().parse::<u32>() {
            Ok(n) if n > 0 => {}
            _ => errors.insert(
                "applicants_needed",
                "Applicants needed must be a whole number above zero",
            ),
        }
    }

    if !form.job_type.trim().is_empty() && parse_job_type(&form.job_type).is_none() {
        errors.insert("job_type", "Select a valid job type");
    }
    if !form.shift_type.trim().is_empty() && parse_shift_type(&form.shift_type).is_none() {
        errors.insert("shift_type", "Select a valid shift type");
    }
    if !form.date.trim().is_empty() && parse_date(&form.date).is_none() {
        errors.insert("date", "Date must be YYYY-MM-DD");
    }

    let start = clock::parse(form.start_time.trim());
    let end = clock::parse(form.end_time.trim());
    if !form.start_time.trim().is_empty() && start.is_none() {
        errors.insert("start_time", "Time must be HH:MM");
    }
    if !form.end_time.trim().is_empty() && end.is_none() {
        errors.insert("end_time", "Time must be HH:MM");
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            errors.insert("end_time", "End time must be later than start time");
        }
    }

    errors
}

/// Validate a feedback submission. The written feedback is required.
pub fn validate_feedback(rating: u8, feedback: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if !(1..=5).contains(&rating) {
        errors.insert("rating", "Rating must be between 1 and 5");
    }
    match feedback.trim().chars().count() {
        0 => errors.insert("feedback", "Required"),
        1 => errors.insert("feedback", "Too short!"),
        _ => {}
    }
    errors
}

impl JobForm {
    /// Validate and convert to the typed create-job payload.
    pub fn to_new_job(&self) -> Result<NewJob, ValidationErrors> {
        validate_job(self).into_result()?;

        let parsed = (
            self.rate.trim().parse::<Decimal>().ok(),
            self.applicants_needed.trim().parse::<u32>().ok(),
            parse_job_type(&self.job_type),
            parse_shift_type(&self.shift_type),
            parse_date(&self.date),
            clock::parse(self.start_time.trim()),
            clock::parse(self.end_time.trim()),
        );
        let (
            Some(rate),
            Some(applicants_needed),
            Some(job_type),
            Some(shift_type),
            Some(date),
            Some(start_time),
            Some(end_time),
        ) = parsed
        else {
            let mut errors = FieldErrors::new();
            errors.insert("form", "Form could not be converted");
            return Err(ValidationErrors(errors));
        };

        Ok(NewJob {
            title: self.title.trim().to_string(),
            location: self.location.trim().to_string(),
            industry: self.industry.trim().to_string(),
            subcategory: self.subcategory.trim().to_string(),
            rate,
            applicants_needed,
            job_type,
            shift_type,
            date,
            start_time,
            end_time,
            payment_status: PaymentStatus::Pending,
        })
    }
}
