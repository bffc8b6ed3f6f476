//! Random resource names and admin passwords.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

static RESOURCE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
static DNS_LABEL_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_resource_name_regex() -> &'static Regex {
    RESOURCE_NAME_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9][-A-Za-z0-9_.]{0,78}[A-Za-z0-9_]$").expect("Invalid Regex"))
}

fn get_dns_label_regex() -> &'static Regex {
    DNS_LABEL_REGEX
        .get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]{1,61}[a-z0-9]$").expect("Invalid Regex"))
}

fn random_suffix() -> String {
    let mut s = Uuid::new_v4().simple().to_string();
    s.truncate(8);
    s
}

/// `prefix-xxxxxxxx` with 8 random hex characters.
pub fn random_name(prefix: &str) -> String {
    format!("{prefix}-{}", random_suffix())
}

/// Lowercase DNS label for a public IP, `prefixxxxxxxxx`.
pub fn random_dns_label(prefix: &str) -> String {
    format!("{}{}", prefix.to_ascii_lowercase(), random_suffix())
}

/// Password that satisfies the Azure Linux complexity rules
/// (upper, lower, digit and special character, 12+ chars).
pub fn generate_password() -> String {
    let mut body = Uuid::new_v4().simple().to_string();
    body.truncate(14);
    format!("Pa5!{body}")
}

/// Fail unless `name` is usable as a disk, VM, network or group name.
pub fn validate_resource_name(kind: &str, name: &str) -> Result<()> {
    if get_resource_name_regex().is_match(name) {
        Ok(())
    } else {
        Err(Error::invalid(format!("invalid {kind} name '{name}'")))
    }
}

pub fn validate_dns_label(label: &str) -> Result<()> {
    if get_dns_label_regex().is_match(label) {
        Ok(())
    } else {
        Err(Error::invalid(format!("invalid DNS label '{label}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_name_shape() {
        let name = random_name("rgCOMV");
        assert!(name.starts_with("rgCOMV-"), "got {name}");
        assert_eq!(name.len(), "rgCOMV-".len() + 8);
        assert!(validate_resource_name("resource group", &name).is_ok());
        assert_ne!(random_name("VM1"), random_name("VM1"));
    }

    #[test]
    fn test_random_dns_label_is_valid() {
        let label = random_dns_label("PIP");
        assert!(label.starts_with("pip"));
        validate_dns_label(&label).expect("generated label should be valid");
    }

    #[test]
    fn test_generated_password_complexity() {
        let pw = generate_password();
        assert!(pw.len() >= 12);
        assert!(pw.chars().any(|c| c.is_ascii_uppercase()));
        assert!(pw.chars().any(|c| c.is_ascii_lowercase()));
        assert!(pw.chars().any(|c| c.is_ascii_digit()));
        assert!(pw.chars().any(|c| !c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_validate_resource_name() {
        assert!(validate_resource_name("disk", "dsk-a").is_ok());
        assert!(validate_resource_name("disk", "-dsk").is_err());
        assert!(validate_resource_name("disk", "a").is_err());
        assert!(validate_resource_name("disk", "has space").is_err());
    }

    #[test]
    fn test_validate_dns_label() {
        assert!(validate_dns_label("pip1234").is_ok());
        assert!(validate_dns_label("Pip1234").is_err());
        assert!(validate_dns_label("1pip").is_err());
    }
}
