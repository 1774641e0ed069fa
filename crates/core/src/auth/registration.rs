//! Registration and profile update validation.
//!
//! Uniqueness of usernames and emails is checked by the store; everything
//! else is decided here.

use thiserror::Error;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const USERNAME_MAX: usize = 150;
const NAME_MAX: usize = 50;
const PHONE_MAX: usize = 20;
const EMAIL_MAX: usize = 254;

/// Account validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Username is blank, too long, or has disallowed characters.
    #[error("Username must be 1-150 characters: letters, digits and @/./+/-/_ only")]
    InvalidUsername,

    /// Email is not a plausible address.
    #[error("Enter a valid email address")]
    InvalidEmail,

    /// A required name is blank.
    #[error("{0} is required")]
    NameRequired(&'static str),

    /// A field exceeds its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },

    /// Password is shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Username already registered.
    #[error("This username is already taken")]
    UsernameTaken,

    /// Email already registered to another account.
    #[error("This email address is already registered")]
    EmailTaken,
}

impl RegistrationError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UsernameTaken => "username_taken",
            Self::EmailTaken => "email_taken",
            _ => "validation_error",
        }
    }
}

/// A validated registration, password still in plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Username.
    pub username: String,
    /// Email, lowercased.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Phone; may be empty.
    pub phone: String,
    /// Plain-text password, to be hashed by the caller.
    pub password: String,
}

/// Validated profile changes; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New email, lowercased.
    pub email: Option<String>,
    /// New phone.
    pub phone: Option<String>,
    /// New plain-text password.
    pub new_password: Option<String>,
}

fn username(value: &str) -> Result<String, RegistrationError> {
    let value = value.trim();
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if value.is_empty() || value.chars().count() > USERNAME_MAX || !value.chars().all(allowed) {
        return Err(RegistrationError::InvalidUsername);
    }
    Ok(value.to_string())
}

fn email(value: &str) -> Result<String, RegistrationError> {
    let value = value.trim().to_lowercase();
    let valid = value.len() <= EMAIL_MAX
        && !value.chars().any(char::is_whitespace)
        && value.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        });
    if !valid {
        return Err(RegistrationError::InvalidEmail);
    }
    Ok(value)
}

fn name(field: &'static str, value: &str) -> Result<String, RegistrationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RegistrationError::NameRequired(field));
    }
    if value.chars().count() > NAME_MAX {
        return Err(RegistrationError::TooLong { field, max: NAME_MAX });
    }
    Ok(value.to_string())
}

fn phone(value: &str) -> Result<String, RegistrationError> {
    let value = value.trim();
    if value.chars().count() > PHONE_MAX {
        return Err(RegistrationError::TooLong {
            field: "phone",
            max: PHONE_MAX,
        });
    }
    Ok(value.to_string())
}

fn password(value: &str, confirm: Option<&str>) -> Result<String, RegistrationError> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(RegistrationError::PasswordTooShort);
    }
    if confirm != Some(value) {
        return Err(RegistrationError::PasswordMismatch);
    }
    Ok(value.to_string())
}

/// Validates a registration form.
///
/// # Errors
///
/// Returns the first `RegistrationError` found, checking fields in form order.
#[allow(clippy::too_many_arguments)]
pub fn validate_registration(
    raw_username: &str,
    raw_email: &str,
    first_name: &str,
    last_name: &str,
    raw_phone: Option<&str>,
    raw_password: &str,
    password_confirm: &str,
) -> Result<NewAccount, RegistrationError> {
    Ok(NewAccount {
        first_name: name("first_name", first_name)?,
        last_name: name("last_name", last_name)?,
        username: username(raw_username)?,
        email: email(raw_email)?,
        phone: phone(raw_phone.unwrap_or_default())?,
        password: password(raw_password, Some(password_confirm))?,
    })
}

/// Validates a profile edit. Blank optional fields are treated as absent;
/// a blank new password keeps the current one.
///
/// # Errors
///
/// Returns the first `RegistrationError` found.
pub fn validate_profile_update(
    first_name: Option<&str>,
    last_name: Option<&str>,
    raw_email: Option<&str>,
    raw_phone: Option<&str>,
    new_password: Option<&str>,
    confirm_password: Option<&str>,
) -> Result<ProfileChanges, RegistrationError> {
    let new_password = match new_password.filter(|p| !p.is_empty()) {
        Some(p) => Some(password(p, confirm_password)?),
        None => None,
    };
    Ok(ProfileChanges {
        first_name: first_name.map(|v| name("first_name", v)).transpose()?,
        last_name: last_name.map(|v| name("last_name", v)).transpose()?,
        email: raw_email.map(email).transpose()?,
        phone: raw_phone.map(phone).transpose()?,
        new_password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn register(username: &str, email: &str, pw: &str, confirm: &str) -> Result<NewAccount, RegistrationError> {
        validate_registration(username, email, "Ada", "Lovelace", None, pw, confirm)
    }

    #[test]
    fn test_valid_registration() {
        let account = register(" ada ", "Ada@Example.com", "password123", "password123").unwrap();
        assert_eq!(account.username, "ada");
        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.phone, "");
    }

    #[rstest]
    #[case("", "a@b.co", "password123", "password123", RegistrationError::InvalidUsername)]
    #[case("has space", "a@b.co", "password123", "password123", RegistrationError::InvalidUsername)]
    #[case("ada", "not-an-email", "password123", "password123", RegistrationError::InvalidEmail)]
    #[case("ada", "a@nodot", "password123", "password123", RegistrationError::InvalidEmail)]
    #[case("ada", "a@b.co", "short", "short", RegistrationError::PasswordTooShort)]
    #[case("ada", "a@b.co", "password123", "password124", RegistrationError::PasswordMismatch)]
    fn test_registration_rejections(
        #[case] username: &str,
        #[case] email: &str,
        #[case] pw: &str,
        #[case] confirm: &str,
        #[case] expected: RegistrationError,
    ) {
        assert_eq!(register(username, email, pw, confirm), Err(expected));
    }

    #[test]
    fn test_names_required_and_bounded() {
        let result = validate_registration("ada", "a@b.co", " ", "L", None, "password123", "password123");
        assert_eq!(result, Err(RegistrationError::NameRequired("first_name")));

        let long = "x".repeat(51);
        let result = validate_registration("ada", "a@b.co", "A", &long, None, "password123", "password123");
        assert_eq!(result, Err(RegistrationError::TooLong { field: "last_name", max: 50 }));
    }

    #[test]
    fn test_profile_update_blank_password_is_kept() {
        let changes = validate_profile_update(None, None, None, Some("555-0100"), Some(""), None).unwrap();
        assert_eq!(changes.new_password, None);
        assert_eq!(changes.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_profile_update_password_rules() {
        assert_eq!(
            validate_profile_update(None, None, None, None, Some("newpassword"), Some("other")),
            Err(RegistrationError::PasswordMismatch)
        );
        let changes =
            validate_profile_update(Some("Grace"), None, Some("g@navy.mil"), None, Some("newpassword"), Some("newpassword"))
                .unwrap();
        assert_eq!(changes.first_name.as_deref(), Some("Grace"));
        assert_eq!(changes.new_password.as_deref(), Some("newpassword"));
    }

    #[test]
    fn test_codes() {
        assert_eq!(RegistrationError::UsernameTaken.code(), "username_taken");
        assert_eq!(RegistrationError::EmailTaken.code(), "email_taken");
        assert_eq!(RegistrationError::InvalidEmail.code(), "validation_error");
    }
}
