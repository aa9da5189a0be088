//! Identity of whoever invokes an engine operation

use evalia_db::entities::{
    professor, student,
    user::{self, UserRole},
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Already-authenticated caller, passed explicitly to every operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: Uuid, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }

    pub fn is(&self, role: UserRole) -> bool {
        self.role == role
    }

    /// Fails with `Forbidden` unless the caller holds one of `roles`
    pub fn require_any(&self, roles: &[UserRole]) -> EngineResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(EngineError::forbidden(format!(
                "role '{}' may not perform this operation",
                self.role
            )))
        }
    }

    /// Loads the caller's user row; deactivated accounts count as signed out
    pub async fn load_user<C: ConnectionTrait>(&self, conn: &C) -> EngineResult<user::Model> {
        let user = user::Entity::find_by_id(self.user_id)
            .one(conn)
            .await?
            .ok_or(EngineError::Unauthenticated)?;

        if !user.active {
            return Err(EngineError::Unauthenticated);
        }

        Ok(user)
    }

    /// Active student record of the caller
    pub async fn student<C: ConnectionTrait>(&self, conn: &C) -> EngineResult<student::Model> {
        self.require_any(&[UserRole::Student])?;
        self.load_user(conn).await?;

        student::Entity::find()
            .filter(student::Column::UserId.eq(self.user_id))
            .filter(student::Column::Active.eq(true))
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::forbidden("no active student profile for this account"))
    }

    /// Active professor record of the caller
    pub async fn professor<C: ConnectionTrait>(&self, conn: &C) -> EngineResult<professor::Model> {
        self.require_any(&[UserRole::Professor])?;
        self.load_user(conn).await?;

        professor::Entity::find()
            .filter(professor::Column::UserId.eq(self.user_id))
            .filter(professor::Column::Active.eq(true))
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::forbidden("no active professor profile for this account"))
    }

    /// Professors may only read their own reports; staff readers may read any
    pub async fn require_professor_access<C: ConnectionTrait>(
        &self,
        conn: &C,
        professor_id: Uuid,
    ) -> EngineResult<()> {
        if self.role.is_staff_reader() {
            self.load_user(conn).await?;
            return Ok(());
        }

        if self.is(UserRole::Professor) && self.professor(conn).await?.id == professor_id {
            return Ok(());
        }

        Err(EngineError::forbidden(
            "reports are limited to the professor concerned and academic staff",
        ))
    }
}
