use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Email value object representing a valid email address
///
/// # Invariants
/// - Must contain '@' character with a non-empty local part and domain
/// - Must be at least 3 characters long
/// - Stored lowercased and trimmed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// # Example
    /// ```
    /// use marketplace_api::domain::user::value_objects::Email;
    ///
    /// let email = Email::new(" Ana@Example.com ").expect("valid email");
    /// assert_eq!(email.as_str(), "ana@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into().trim().to_lowercase();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(format!("Invalid email: {}", email))
        }
    }

    fn is_valid(email: &str) -> bool {
        if email.len() < 3 || email.chars().any(char::is_whitespace) {
            return false;
        }
        match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
            None => false,
        }
    }

    /// Returns the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Email::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// Account kind exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Viewer,
    Provider,
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Viewer => write!(f, "viewer"),
            UserType::Provider => write!(f, "provider"),
        }
    }
}

/// Brazilian taxpayer document kind
///
/// CPF identifies an individual, CNPJ a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    Cpf,
    Cnpj,
}

impl DocumentType {
    /// Minimum number of digits accepted for this document kind
    pub fn min_digits(&self) -> usize {
        match self {
            DocumentType::Cpf => 11,
            DocumentType::Cnpj => 14,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentType::Cpf => write!(f, "CPF"),
            DocumentType::Cnpj => write!(f, "CNPJ"),
        }
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CPF" => Ok(DocumentType::Cpf),
            "CNPJ" => Ok(DocumentType::Cnpj),
            _ => Err(format!("Unknown document type: {}", s)),
        }
    }
}

/// Validates a document number against its type.
///
/// Only the digit count is checked (no check-digit verification). Punctuation
/// such as `.`, `-` and `/` is ignored. Returns the digits-only form.
pub fn normalize_document_number(
    document_type: DocumentType,
    number: &str,
) -> Result<String, String> {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    let stray = number
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '/' | ' ')));
    if stray {
        return Err(format!("{} must contain only digits", document_type));
    }
    if digits.len() < document_type.min_digits() {
        return Err(format!(
            "{} must have at least {} digits",
            document_type,
            document_type.min_digits()
        ));
    }
    Ok(digits)
}

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanType {
    A,
    B,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanType::A => write!(f, "A"),
            PlanType::B => write!(f, "B"),
        }
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(PlanType::A),
            "B" | "b" => Ok(PlanType::B),
            _ => Err(format!("Unknown plan type: {}", s)),
        }
    }
}

/// Payment state of a provider's plan
///
/// # Status Transitions
/// ```text
/// Inactive -> Pending -> Active -> Inactive
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Inactive,
    Pending,
    Active,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStatus::Inactive => write!(f, "inactive"),
            PlanStatus::Pending => write!(f, "pending"),
            PlanStatus::Active => write!(f, "active"),
        }
    }
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(PlanStatus::Inactive),
            "pending" => Ok(PlanStatus::Pending),
            "active" => Ok(PlanStatus::Active),
            _ => Err(format!("Unknown plan status: {}", s)),
        }
    }
}

/// Postal address of a provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
}

impl Location {
    /// True when every address component is filled in
    pub fn is_complete(&self) -> bool {
        [&self.address, &self.city, &self.state, &self.zip_code]
            .iter()
            .all(|part| !part.trim().is_empty())
    }
}
