use std::fmt;

/// Longest accepted message, counted in characters rather than bytes.
pub const MAX_MESSAGE_CHARS: usize = 255;

/// How many chirps one user may own at a time.
pub const CHIRP_QUOTA: u32 = 10;

pub const MESSAGE_FIELD: &str = "message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Required,
    TooLong,
    QuotaExceeded,
}

impl Reason {
    pub fn code(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::TooLong => "max",
            Self::QuotaExceeded => "quota_exceeded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: Reason,
}

impl FieldError {
    /// Human-readable text for forms.
    pub fn message(&self) -> String {
        match self.reason {
            Reason::Required => format!("The {} field is required.", self.field),
            Reason::TooLong => format!(
                "The {} field must not be greater than {} characters.",
                self.field, MAX_MESSAGE_CHARS
            ),
            Reason::QuotaExceeded => format!("You cannot create more than {} chirps.", CHIRP_QUOTA),
        }
    }
}

/// Every rule that failed in one validation pass, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, reason: Reason) {
        self.errors.push(FieldError { field, reason });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: &str, reason: Reason) -> bool {
        self.errors.iter().any(|e| e.field == field && e.reason == reason)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(FieldError::message).collect();
        f.write_str(&messages.join(" "))
    }
}

pub fn check_message(message: &str, errors: &mut ValidationErrors) {
    if message.is_empty() {
        errors.add(MESSAGE_FIELD, Reason::Required);
    } else if message.chars().count() > MAX_MESSAGE_CHARS {
        errors.add(MESSAGE_FIELD, Reason::TooLong);
    }
}

/// Field rules and the quota rule in a single pass, so an empty message from
/// a user at quota reports both problems.
pub fn validate_new_chirp(message: &str, existing_chirps: u32) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_message(message, &mut errors);
    if existing_chirps >= CHIRP_QUOTA {
        errors.add(MESSAGE_FIELD, Reason::QuotaExceeded);
    }
    errors.into_result()
}

pub fn validate_edit(message: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_message(message, &mut errors);
    errors.into_result()
}
