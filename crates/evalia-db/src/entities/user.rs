//! User entity for authentication and role assignment

use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a user on the platform
///
/// Stored with canonical lowercase tags. Parsing accepts the Spanish and
/// English synonyms the old clients sent (`profesor`, `docente`, ...) and
/// folds them onto one variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum UserRole {
    /// Enrolled student, submits evaluations
    #[sea_orm(string_value = "student")]
    Student,

    /// Teaching staff, subject of evaluations
    #[sea_orm(string_value = "professor")]
    Professor,

    /// Career coordinator, curates the question bank
    #[sea_orm(string_value = "coordinator")]
    Coordinator,

    /// Dean, reads statistics across professors
    #[sea_orm(string_value = "dean")]
    Dean,

    /// System administrator with full access
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Professor => "professor",
            UserRole::Coordinator => "coordinator",
            UserRole::Dean => "dean",
            UserRole::Admin => "admin",
        }
    }

    /// Roles that may read any professor's reports
    pub fn is_staff_reader(&self) -> bool {
        matches!(self, UserRole::Coordinator | UserRole::Dean | UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" | "estudiante" | "alumno" => Ok(UserRole::Student),
            "professor" | "profesor" | "docente" | "teacher" => Ok(UserRole::Professor),
            "coordinator" | "coordinador" => Ok(UserRole::Coordinator),
            "dean" | "decano" => Ok(UserRole::Dean),
            "admin" | "administrator" | "administrador" => Ok(UserRole::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// User email (unique, stored lowercase)
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash, or a legacy plaintext value awaiting upgrade
    pub password_hash: String,

    pub given_name: String,

    pub family_name: String,

    pub role: UserRole,

    /// Soft-deactivation flag; users are never hard-deleted
    pub active: bool,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::professor::Entity")]
    Professor,

    #[sea_orm(has_one = "super::student::Entity")]
    Student,
}

impl Related<super::professor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Professor.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}
