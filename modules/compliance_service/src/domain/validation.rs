//! Input validation for documents, match records and registrations

use crate::contract::{ComplianceError, FieldError, NewUser};

/// Fields of a match record supplied by API callers
#[derive(Debug, Clone, PartialEq)]
pub struct MatchInput {
    pub external_party_id: String,
    pub matched_code: String,
    pub similarity_score: f64,
    pub watchlist_entry_id: Option<uuid::Uuid>,
}

/// Similarity score must be a finite number in `[0, 1]`
pub fn validate_score(score: f64) -> Result<(), ComplianceError> {
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(ComplianceError::invalid_field(
            "similarity_score",
            format!("must be between 0.0 and 1.0, got {}", score),
        ));
    }
    Ok(())
}

pub fn validate_match_input(input: &MatchInput) -> Result<(), ComplianceError> {
    let mut errors = Vec::new();
    if input.external_party_id.trim().is_empty() {
        errors.push(FieldError::new("external_party_id", "cannot be empty"));
    }
    if input.matched_code.trim().is_empty() {
        errors.push(FieldError::new("matched_code", "cannot be empty"));
    }
    if let Err(ComplianceError::Validation { field_errors, .. }) =
        validate_score(input.similarity_score)
    {
        errors.extend(field_errors);
    }
    ComplianceError::from_field_errors(errors)
}

/// Targeted snapshot sync: ids need a party type and must be non-empty
pub fn validate_sync_request(
    party_type: Option<crate::contract::PartyType>,
    ids: Option<&[String]>,
) -> Result<(), ComplianceError> {
    let Some(ids) = ids else {
        return Ok(());
    };
    let mut errors = Vec::new();
    if party_type.is_none() {
        errors.push(FieldError::new("party_type", "is required when ids are given"));
    }
    if ids.is_empty() {
        errors.push(FieldError::new("ids", "cannot be empty"));
    } else if ids.iter().any(|id| id.trim().is_empty()) {
        errors.push(FieldError::new("ids", "cannot contain blank ids"));
    }
    ComplianceError::from_field_errors(errors)
}

/// Document type tag and display name
pub fn validate_document_fields(document_type: &str, name: &str) -> Result<(), ComplianceError> {
    let mut errors = Vec::new();
    if document_type.trim().is_empty() {
        errors.push(FieldError::new("document_type", "cannot be empty"));
    } else if document_type.len() > 100 {
        errors.push(FieldError::new("document_type", "must be at most 100 characters"));
    }
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "cannot be empty"));
    } else if name.len() > 255 {
        errors.push(FieldError::new("name", "must be at most 255 characters"));
    }
    ComplianceError::from_field_errors(errors)
}

/// Registration payload
///
/// Accepts usernames of 3-150 characters from `[A-Za-z0-9_.-]`, emails with a
/// local part and a dotted domain, and passwords of at least 8 characters.
pub fn validate_new_user(user: &NewUser) -> Result<(), ComplianceError> {
    let mut errors = Vec::new();

    let username = user.username.trim();
    if username.len() < 3 || username.len() > 150 {
        errors.push(FieldError::new("username", "must be 3-150 characters"));
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        errors.push(FieldError::new(
            "username",
            "only letters, digits, '_', '.' and '-' are allowed",
        ));
    }

    let valid_email = match user.email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    };
    if !valid_email {
        errors.push(FieldError::new("email", "is not a valid email address"));
    }

    if user.password.chars().count() < 8 {
        errors.push(FieldError::new("password", "must be at least 8 characters"));
    }

    if user.full_name.trim().is_empty() {
        errors.push(FieldError::new("full_name", "cannot be empty"));
    }

    ComplianceError::from_field_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> NewUser {
        NewUser {
            username: "analyst_1".into(),
            email: "analyst@example.co.id".into(),
            password: "s3cretpass".into(),
            full_name: "Compliance Analyst".into(),
            phone: None,
        }
    }

    #[test]
    fn test_valid_user_passes() {
        assert!(validate_new_user(&user()).is_ok());
    }

    #[test]
    fn test_invalid_user_collects_all_field_errors() {
        let bad = NewUser {
            username: "a b".into(),
            email: "nope".into(),
            password: "short".into(),
            full_name: " ".into(),
            phone: None,
        };
        match validate_new_user(&bad) {
            Err(ComplianceError::Validation { field_errors, .. }) => {
                let fields: Vec<_> = field_errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["username", "email", "password", "full_name"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_score_bounds() {
        assert!(validate_score(0.0).is_ok());
        assert!(validate_score(1.0).is_ok());
        assert!(validate_score(1.01).is_err());
        assert!(validate_score(-0.1).is_err());
        assert!(validate_score(f64::NAN).is_err());
    }

    #[test]
    fn test_match_input_errors() {
        let input = MatchInput {
            external_party_id: "".into(),
            matched_code: "ID-1".into(),
            similarity_score: 2.0,
            watchlist_entry_id: None,
        };
        match validate_match_input(&input) {
            Err(ComplianceError::Validation { field_errors, .. }) => {
                assert_eq!(field_errors.len(), 2);
                assert_eq!(field_errors[0].field, "external_party_id");
                assert_eq!(field_errors[1].field, "similarity_score");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
