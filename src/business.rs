//! Small business operations that produce errors from this crate.
//!
//! They are the callers' side of the model: each one returns a value or a
//! failure, wraps lower-level failures instead of dropping them, and uses
//! the sentinels for well-known conditions.

use crate::accumulator::ErrorAccumulator;
use crate::config::{ConfigError, ValidationRules, DEFAULT_EMAIL_PATTERN};
use crate::error::{ApiError, Error, Result};
use crate::sentinel::{DIVISION_BY_ZERO, INVALID_INPUT, NOT_FOUND, TIMEOUT, UNAUTHORIZED};
use crate::wrap::wrap;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::num::ParseIntError;

lazy_static! {
    static ref DEFAULT_EMAIL: Regex =
        Regex::new(DEFAULT_EMAIL_PATTERN).expect("default email pattern is valid");
}

// =============================================================================
// Arithmetic and parsing
// =============================================================================

/// Returns the [`DIVISION_BY_ZERO`] sentinel when `b` is zero.
pub fn divide(a: f64, b: f64) -> Result<f64> {
    if b == 0.0 {
        return Err(DIVISION_BY_ZERO.clone());
    }
    Ok(a / b)
}

fn parse_age_within(text: &str, min: i64, max: i64) -> Result<i64> {
    let age: i64 = text.trim().parse().map_err(|err: ParseIntError| {
        wrap(format!("invalid age '{text}'"), Error::plain(err.to_string()))
    })?;
    if age < min || age > max {
        return Err(Error::validation(
            "age",
            format!("must be between {min} and {max}, got {age}"),
        ));
    }
    Ok(age)
}

/// Parse an age with the default bounds.
///
/// Non-numeric text gives a wrapped parse failure; a number outside the
/// bounds gives a `ValidationError` on `age`.
pub fn parse_age(text: &str) -> Result<i64> {
    let rules = ValidationRules::default();
    parse_age_within(text, rules.age_min, rules.age_max)
}

// =============================================================================
// Validation with accumulation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub age: i64,
}

/// Checks user input against a set of [`ValidationRules`].
#[derive(Debug, Clone)]
pub struct UserValidator {
    rules: ValidationRules,
    email: Regex,
}

impl Default for UserValidator {
    fn default() -> Self {
        Self {
            rules: ValidationRules::default(),
            email: DEFAULT_EMAIL.clone(),
        }
    }
}

impl UserValidator {
    pub fn new(rules: ValidationRules) -> std::result::Result<Self, ConfigError> {
        rules.check()?;
        let email = rules.email_regex()?;
        Ok(Self { rules, email })
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn parse_age(&self, text: &str) -> Result<i64> {
        parse_age_within(text, self.rules.age_min, self.rules.age_max)
    }

    fn check_name(&self, name: &str) -> Option<Error> {
        let len = name.trim().chars().count();
        if len == 0 {
            Some(Error::validation("name", "cannot be empty"))
        } else if len < self.rules.name_min_len {
            Some(Error::validation(
                "name",
                format!("must be at least {} characters", self.rules.name_min_len),
            ))
        } else {
            None
        }
    }

    fn check_email(&self, email: &str) -> Option<Error> {
        if email.is_empty() {
            Some(Error::validation("email", "cannot be empty"))
        } else if !self.email.is_match(email) {
            Some(Error::validation("email", "invalid email format"))
        } else {
            None
        }
    }

    /// Check every field and report all failures together.
    ///
    /// Each field contributes at most one entry, in the order name, email,
    /// age.
    pub fn validate(
        &self,
        name: &str,
        email: &str,
        age: &str,
    ) -> std::result::Result<User, ErrorAccumulator> {
        let mut errors = ErrorAccumulator::new();

        if let Some(err) = self.check_name(name) {
            errors.add(err);
        }
        if let Some(err) = self.check_email(email) {
            errors.add(err);
        }
        let age = match self.parse_age(age) {
            Ok(age) => age,
            Err(err) => {
                errors.add(err);
                0
            }
        };

        errors.into_result(User {
            id: 0,
            name: name.trim().to_string(),
            email: email.to_string(),
            age,
        })
    }
}

/// [`UserValidator::validate`] with the default rules.
pub fn validate_user(
    name: &str,
    email: &str,
    age: &str,
) -> std::result::Result<User, ErrorAccumulator> {
    UserValidator::default().validate(name, email, age)
}

// =============================================================================
// Lookup against a dependency
// =============================================================================

/// In-memory stand-in for the `users` table.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<u64, User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample() -> Self {
        let mut dir = Self::new();
        dir.insert(User {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            age: 30,
        });
        dir.insert(User {
            id: 2,
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            age: 25,
        });
        dir
    }

    pub fn insert(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Id 0 is rejected with [`INVALID_INPUT`]; an unknown id is a
    /// `DatabaseError` over [`NOT_FOUND`].
    pub fn find(&self, id: u64) -> Result<&User> {
        if id == 0 {
            return Err(wrap("user id 0", INVALID_INPUT.clone()));
        }
        self.users
            .get(&id)
            .ok_or_else(|| Error::database("SELECT", "users", NOT_FOUND.clone()))
    }
}

// =============================================================================
// Remote calls
// =============================================================================

/// What the simulated remote service answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedResponse {
    Ok,
    Unavailable,
    RateLimited,
    Unauthorized,
    Timeout,
}

pub fn call_external_api(endpoint: &str, response: SimulatedResponse) -> Result<String> {
    let context = format!("calling {endpoint}");
    match response {
        SimulatedResponse::Ok => Ok(format!(r#"{{"endpoint": "{endpoint}", "status": "ok"}}"#)),
        SimulatedResponse::Unavailable => Err(wrap(
            context,
            ApiError::new(503, "service unavailable")
                .with_detail("endpoint", endpoint)
                .with_detail("retry_after", 30)
                .with_detail("retryable", true)
                .into(),
        )),
        SimulatedResponse::RateLimited => Err(wrap(
            context,
            ApiError::new(429, "too many requests")
                .with_detail("endpoint", endpoint)
                .with_detail("limit", 100)
                .with_detail("window_secs", 60.0)
                .into(),
        )),
        SimulatedResponse::Unauthorized => Err(wrap(context, UNAUTHORIZED.clone())),
        SimulatedResponse::Timeout => Err(wrap(context, TIMEOUT.clone())),
    }
}
