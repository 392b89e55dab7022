use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::{
    chrono_datetime_as_bson_datetime, serialize_object_id_as_hex_string,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "Software Engineer")]
    SoftwareEngineer,
    #[serde(rename = "ML Engineer")]
    MlEngineer,
    #[serde(rename = "UI/UX Designer")]
    UiUxDesigner,
}

impl Position {
    pub const ALL: [Position; 3] = [
        Position::SoftwareEngineer,
        Position::MlEngineer,
        Position::UiUxDesigner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::SoftwareEngineer => "Software Engineer",
            Position::MlEngineer => "ML Engineer",
            Position::UiUxDesigner => "UI/UX Designer",
        }
    }

    pub fn parse(value: &str) -> Option<Position> {
        Self::ALL.iter().copied().find(|p| p.as_str() == value)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored user record.
///
/// Deserializes from the BSON documents the store holds; serializes to API
/// JSON with a hex-string id and RFC 3339 timestamps. BSON documents going
/// the other way are built by hand in the store layer, never by serializing
/// this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    pub email: String,
    pub position: Position,
    pub gpa: f64,
    pub experience: f64,
    #[serde(deserialize_with = "chrono_datetime_as_bson_datetime::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "chrono_datetime_as_bson_datetime::deserialize")]
    pub updated_at: DateTime<Utc>,
}

/// A validated creation payload. Id and timestamps are assigned by the
/// store on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub age: Option<i64>,
    pub email: String,
    pub position: Position,
    pub gpa: f64,
    pub experience: f64,
}

/// A validated partial update. Absent fields leave the stored record
/// untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub email: Option<String>,
    pub position: Option<Position>,
    pub gpa: Option<f64>,
    pub experience: Option<f64>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.email.is_none()
            && self.position.is_none()
            && self.gpa.is_none()
            && self.experience.is_none()
    }
}
