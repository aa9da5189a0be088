//! Indexes for the report and question-resolution queries

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Professor statistics filter by professor and period
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_evaluations_professor_period")
                    .table(Evaluations::Table)
                    .col(Evaluations::ProfessorId)
                    .col(Evaluations::PeriodId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_questions_career_active")
                    .table(Questions::Table)
                    .col(Questions::CareerId)
                    .col(Questions::Active)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_enrollments_group_id")
                    .table(Enrollments::Table)
                    .col(Enrollments::GroupId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_enrollments_group_id")
                    .table(Enrollments::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_questions_career_active")
                    .table(Questions::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_evaluations_professor_period")
                    .table(Evaluations::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Evaluations {
    Table,
    ProfessorId,
    PeriodId,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    CareerId,
    Active,
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    GroupId,
}
