//! Email address validation and the Gravatar hash.
//!
//! Gravatar identifies an account by the MD5 digest of the trimmed,
//! lower-cased address, rendered as 32 lowercase hex characters. MD5 is
//! fixed by the service's URL protocol.

use std::sync::LazyLock;

use md5::{Digest, Md5};
use regex::Regex;

use crate::GravatarError;

const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_ADDRESS_LEN: usize = 254;

static LOCAL_PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*|"(?:[^"\\\r\n]|\\.)*")$"#,
    )
    .expect("valid local-part regex")
});

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*|\[[^\[\]\\\r\n]+\])$",
    )
    .expect("valid domain regex")
});

/// Checks that `email` is a syntactically valid `local-part@domain` address.
///
/// Surrounding whitespace is ignored, matching what [`hash_email`] does
/// before digesting.
///
/// # Errors
///
/// Returns [`GravatarError::InvalidEmail`] when the address is empty, too
/// long, or either side of the `@` fails the syntax check.
pub fn validate_email(email: &str) -> Result<(), GravatarError> {
    let trimmed = email.trim();
    let invalid = || GravatarError::InvalidEmail(email.to_string());

    if trimmed.is_empty() || trimmed.len() > MAX_ADDRESS_LEN {
        return Err(invalid());
    }

    // A quoted local part may itself contain '@', so split on the last one.
    let (local, domain) = trimmed.rsplit_once('@').ok_or_else(invalid)?;

    if local.is_empty() || local.len() > MAX_LOCAL_PART_LEN {
        return Err(invalid());
    }
    if !LOCAL_PART_RE.is_match(local) || !DOMAIN_RE.is_match(domain) {
        return Err(invalid());
    }

    Ok(())
}

/// Returns the Gravatar hash for `email`: MD5 of the trimmed, lower-cased
/// address as lowercase hex.
#[must_use]
pub fn hash_email(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    hex::encode(Md5::digest(normalized.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_known_digest() {
        assert_eq!(
            hash_email("myemailaddress@example.com"),
            "0bc83cb571cd1c50ba6f3e8a78ef1346"
        );
    }

    #[test]
    fn hash_ignores_case_and_surrounding_whitespace() {
        assert_eq!(
            hash_email(" User@Example.COM "),
            hash_email("user@example.com")
        );
        assert_eq!(
            hash_email("\tUSER@example.com\n"),
            "b58996c504c5638798eb6b511e6f49af"
        );
    }

    #[test]
    fn hash_is_32_lowercase_hex_chars() {
        let hash = hash_email("someone@example.org");
        assert_eq!(hash.len(), 32);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn accepts_common_addresses() {
        for email in [
            "user@example.com",
            "first.last@sub.example.co.uk",
            "user+tag@example.com",
            "o'brien@example.ie",
            "admin@localhost",
            "\"john doe\"@example.com",
            "user@[192.168.0.1]",
            "  padded@example.com  ",
        ] {
            assert!(validate_email(email).is_ok(), "expected valid: {email}");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in [
            "",
            "   ",
            "not-an-email",
            "@example.com",
            "user@",
            "user@@example.com",
            ".user@example.com",
            "user.@example.com",
            "us..er@example.com",
            "user name@example.com",
            "user@-example.com",
            "user@example-.com",
            "user@exa mple.com",
            "user@example..com",
        ] {
            assert!(
                matches!(validate_email(email), Err(GravatarError::InvalidEmail(_))),
                "expected invalid: {email:?}"
            );
        }
    }

    #[test]
    fn rejects_overlong_local_part() {
        let email = format!("{}@example.com", "a".repeat(65));
        assert!(validate_email(&email).is_err());

        let email = format!("{}@example.com", "a".repeat(64));
        assert!(validate_email(&email).is_ok());
    }

    #[test]
    fn invalid_email_error_keeps_original_input() {
        let err = validate_email("nope").unwrap_err();
        assert!(matches!(err, GravatarError::InvalidEmail(ref e) if e == "nope"));
    }
}
