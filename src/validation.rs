//! Field-level validation for user payloads and list-query parameters.
//!
//! Every function here is pure and total: given any input it returns either
//! a typed value or a non-empty list of `{field, message}` errors, one per
//! failing field. The partial-update rules reuse the same per-field checks
//! as creation, so the two cannot drift.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{NewUser, Position, UserPatch};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// A single failed constraint, addressed by field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

fn position_message() -> String {
    let options = Position::ALL
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("Position must be one of: {options}")
}

// Per-field rules. `null` is a type failure everywhere: optional means
// absent, not null.

fn check_name(value: &Value) -> Result<String, FieldError> {
    match value.as_str() {
        Some("") => Err(FieldError::new("name", "Name is required")),
        Some(name) => Ok(name.to_string()),
        None => Err(FieldError::new("name", "Name must be a string")),
    }
}

fn check_age(value: &Value) -> Result<i64, FieldError> {
    match value.as_i64() {
        Some(age) if age > 0 => Ok(age),
        Some(_) => Err(FieldError::new("age", "Age must be a positive integer")),
        None => Err(FieldError::new("age", "Age must be an integer")),
    }
}

fn check_email(value: &Value) -> Result<String, FieldError> {
    match value.as_str() {
        Some(email) if EMAIL_RE.is_match(email) => Ok(email.to_string()),
        Some(_) => Err(FieldError::new("email", "Invalid email format")),
        None => Err(FieldError::new("email", "Email must be a string")),
    }
}

fn check_position(value: &Value) -> Result<Position, FieldError> {
    value
        .as_str()
        .and_then(Position::parse)
        .ok_or_else(|| FieldError::new("position", position_message()))
}

fn check_gpa(value: &Value) -> Result<f64, FieldError> {
    let Some(gpa) = value.as_f64() else {
        return Err(FieldError::new("gpa", "GPA must be a number"));
    };
    if gpa < 0.0 {
        Err(FieldError::new("gpa", "GPA cannot be less than 0"))
    } else if gpa > 4.0 {
        Err(FieldError::new("gpa", "GPA cannot be more than 4"))
    } else if gpa < 2.0 {
        // Acceptance rule, applied only once the value is in range.
        Err(FieldError::new("gpa", "GPA must be at least 2 for eligibility"))
    } else {
        Ok(gpa)
    }
}

fn check_experience(value: &Value) -> Result<f64, FieldError> {
    match value.as_f64() {
        Some(experience) if experience > 0.0 => Ok(experience),
        Some(_) => Err(FieldError::new(
            "experience",
            "Experience must be a positive number",
        )),
        None => Err(FieldError::new("experience", "Experience must be a number")),
    }
}

fn required<T>(
    map: &Map<String, Value>,
    field: &str,
    check: fn(&Value) -> Result<T, FieldError>,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match map.get(field) {
        None => {
            errors.push(FieldError::new(field, "Required"));
            None
        }
        Some(value) => match check(value) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                errors.push(error);
                None
            }
        },
    }
}

fn optional<T>(
    map: &Map<String, Value>,
    field: &str,
    check: fn(&Value) -> Result<T, FieldError>,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match map.get(field) {
        None => None,
        Some(value) => match check(value) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                errors.push(error);
                None
            }
        },
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, Vec<FieldError>> {
    body.as_object()
        .ok_or_else(|| vec![FieldError::new("", "Expected a JSON object")])
}

/// Validate a full creation payload. Unknown keys are ignored.
pub fn validate_new_user(body: &Value) -> Result<NewUser, Vec<FieldError>> {
    let map = as_object(body)?;
    let mut errors = Vec::new();

    let name = required(map, "name", check_name, &mut errors);
    let age = optional(map, "age", check_age, &mut errors);
    let email = required(map, "email", check_email, &mut errors);
    let position = required(map, "position", check_position, &mut errors);
    let gpa = required(map, "gpa", check_gpa, &mut errors);
    let experience = required(map, "experience", check_experience, &mut errors);

    match (name, email, position, gpa, experience) {
        (Some(name), Some(email), Some(position), Some(gpa), Some(experience))
            if errors.is_empty() =>
        {
            Ok(NewUser {
                name,
                age,
                email,
                position,
                gpa,
                experience,
            })
        }
        _ => Err(errors),
    }
}

/// Validate a partial-update payload: every field optional, each present
/// field held to the same rule as at creation.
pub fn validate_user_patch(body: &Value) -> Result<UserPatch, Vec<FieldError>> {
    let map = as_object(body)?;
    let mut errors = Vec::new();

    let patch = UserPatch {
        name: optional(map, "name", check_name, &mut errors),
        age: optional(map, "age", check_age, &mut errors),
        email: optional(map, "email", check_email, &mut errors),
        position: optional(map, "position", check_position, &mut errors),
        gpa: optional(map, "gpa", check_gpa, &mut errors),
        experience: optional(map, "experience", check_experience, &mut errors),
    };

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}

/// Raw list-query parameters as they arrive on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListQuery {
    pub gpa: Option<String>,
    pub position: Option<String>,
    pub experience: Option<String>,
}

/// Parsed list-query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub gpa: Option<f64>,
    pub position: Option<Position>,
    pub experience: Option<i64>,
}

/// Validate list-query parameters. Empty `gpa`/`experience` strings are
/// treated as absent; an empty `position` is an enum failure.
pub fn validate_list_query(raw: &RawListQuery) -> Result<ListQuery, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut query = ListQuery::default();

    if let Some(value) = raw.gpa.as_deref().filter(|v| !v.is_empty()) {
        match value.parse::<f64>() {
            Ok(gpa) if (0.0..=4.0).contains(&gpa) => query.gpa = Some(gpa),
            _ => errors.push(FieldError::new("gpa", "GPA must be a number between 0 and 4")),
        }
    }

    if let Some(value) = raw.position.as_deref() {
        match Position::parse(value) {
            Some(position) => query.position = Some(position),
            None => errors.push(FieldError::new("position", position_message())),
        }
    }

    if let Some(value) = raw.experience.as_deref().filter(|v| !v.is_empty()) {
        match value.parse::<f64>() {
            Ok(experience) if experience.is_finite() => query.experience = Some(experience as i64),
            _ => errors.push(FieldError::new(
                "experience",
                "Experience must be a valid number",
            )),
        }
    }

    if errors.is_empty() {
        Ok(query)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "name": "Ada Lovelace",
            "age": 28,
            "email": "ada@example.com",
            "position": "Software Engineer",
            "gpa": 3.6,
            "experience": 4
        })
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn accepts_a_valid_payload() {
        let user = validate_new_user(&valid_body()).unwrap();
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.age, Some(28));
        assert_eq!(user.position, Position::SoftwareEngineer);
        assert_eq!(user.gpa, 3.6);
        assert_eq!(user.experience, 4.0);
    }

    #[test]
    fn age_is_optional_but_must_be_positive_when_present() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("age");
        assert_eq!(validate_new_user(&body).unwrap().age, None);

        body["age"] = json!(0);
        let errors = validate_new_user(&body).unwrap_err();
        assert_eq!(errors[0].message, "Age must be a positive integer");

        body["age"] = json!(3.5);
        let errors = validate_new_user(&body).unwrap_err();
        assert_eq!(errors[0].message, "Age must be an integer");
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let errors = validate_new_user(&json!({})).unwrap_err();
        let mut reported = fields(&errors);
        reported.sort_unstable();
        assert_eq!(reported, ["email", "experience", "gpa", "name", "position"]);
        assert!(errors.iter().all(|e| e.message == "Required"));
    }

    #[test]
    fn null_is_a_type_failure_not_an_absence() {
        let mut body = valid_body();
        body["age"] = Value::Null;
        let errors = validate_new_user(&body).unwrap_err();
        assert_eq!(fields(&errors), ["age"]);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut body = valid_body();
        body["name"] = json!("");
        let errors = validate_new_user(&body).unwrap_err();
        assert_eq!(errors[0].message, "Name is required");
    }

    #[test]
    fn email_format_is_enforced() {
        let mut body = valid_body();
        for bad in ["not-an-email", "a@b", "a b@c.com", "@example.com"] {
            body["email"] = json!(bad);
            let errors = validate_new_user(&body).unwrap_err();
            assert_eq!(errors[0].message, "Invalid email format", "email: {bad}");
        }
    }

    #[test]
    fn position_outside_the_enum_is_rejected() {
        let mut body = valid_body();
        body["position"] = json!("CEO");
        let errors = validate_new_user(&body).unwrap_err();
        assert_eq!(fields(&errors), ["position"]);
        assert!(errors[0].message.contains("Software Engineer"));
    }

    #[test]
    fn gpa_range_errors_come_before_the_eligibility_rule() {
        let mut body = valid_body();

        body["gpa"] = json!(-0.5);
        let errors = validate_new_user(&body).unwrap_err();
        assert_eq!(errors[0].message, "GPA cannot be less than 0");

        body["gpa"] = json!(4.5);
        let errors = validate_new_user(&body).unwrap_err();
        assert_eq!(errors[0].message, "GPA cannot be more than 4");

        body["gpa"] = json!(1.9);
        let errors = validate_new_user(&body).unwrap_err();
        assert_eq!(errors[0].message, "GPA must be at least 2 for eligibility");

        body["gpa"] = json!(2.0);
        assert!(validate_new_user(&body).is_ok());
    }

    #[test]
    fn multiple_bad_fields_are_enumerated_together() {
        let body = json!({
            "name": "",
            "age": -1,
            "email": "nope",
            "position": "Janitor",
            "gpa": 5,
            "experience": 0
        });
        let errors = validate_new_user(&body).unwrap_err();
        let mut reported = fields(&errors);
        reported.sort_unstable();
        assert_eq!(
            reported,
            ["age", "email", "experience", "gpa", "name", "position"]
        );
    }

    #[test]
    fn non_object_body_is_a_single_root_error() {
        let errors = validate_new_user(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "");
    }

    #[test]
    fn patch_allows_any_subset_of_fields() {
        let patch = validate_user_patch(&json!({ "name": "Grace" })).unwrap();
        assert_eq!(patch.name.as_deref(), Some("Grace"));
        assert!(patch.gpa.is_none());

        let empty = validate_user_patch(&json!({})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn patch_holds_present_fields_to_creation_rules() {
        let errors = validate_user_patch(&json!({ "gpa": 4.5 })).unwrap_err();
        assert_eq!(errors[0].message, "GPA cannot be more than 4");

        let errors = validate_user_patch(&json!({ "gpa": 1.0 })).unwrap_err();
        assert_eq!(errors[0].message, "GPA must be at least 2 for eligibility");

        let errors = validate_user_patch(&json!({ "email": "broken" })).unwrap_err();
        assert_eq!(errors[0].message, "Invalid email format");
    }

    #[test]
    fn list_query_parses_present_parameters() {
        let raw = RawListQuery {
            gpa: Some("3.5".to_string()),
            position: Some("ML Engineer".to_string()),
            experience: Some("3".to_string()),
        };
        let query = validate_list_query(&raw).unwrap();
        assert_eq!(query.gpa, Some(3.5));
        assert_eq!(query.position, Some(Position::MlEngineer));
        assert_eq!(query.experience, Some(3));
    }

    #[test]
    fn list_query_treats_absent_and_empty_as_unconstrained() {
        let query = validate_list_query(&RawListQuery::default()).unwrap();
        assert_eq!(query, ListQuery::default());

        let raw = RawListQuery {
            gpa: Some(String::new()),
            position: None,
            experience: Some(String::new()),
        };
        assert_eq!(validate_list_query(&raw).unwrap(), ListQuery::default());
    }

    #[test]
    fn list_query_rejects_out_of_range_or_unparseable_values() {
        let raw = RawListQuery {
            gpa: Some("4.5".to_string()),
            ..Default::default()
        };
        let errors = validate_list_query(&raw).unwrap_err();
        assert_eq!(errors[0].message, "GPA must be a number between 0 and 4");

        let raw = RawListQuery {
            gpa: Some("abc".to_string()),
            experience: Some("lots".to_string()),
            ..Default::default()
        };
        let errors = validate_list_query(&raw).unwrap_err();
        assert_eq!(fields(&errors), ["gpa", "experience"]);
    }

    #[test]
    fn list_query_rejects_empty_position() {
        let raw = RawListQuery {
            position: Some(String::new()),
            ..Default::default()
        };
        let errors = validate_list_query(&raw).unwrap_err();
        assert_eq!(fields(&errors), ["position"]);
    }

    #[test]
    fn list_query_truncates_fractional_experience() {
        let raw = RawListQuery {
            experience: Some("3.7".to_string()),
            ..Default::default()
        };
        assert_eq!(validate_list_query(&raw).unwrap().experience, Some(3));
    }
}
