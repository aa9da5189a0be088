//! Consolidated initial schema migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Identity store: users, careers, professors, students
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Users::GivenName).string_len(255).not_null())
                    .col(ColumnDef::new(Users::FamilyName).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(32)
                            .not_null()
                            .default("student"),
                    )
                    .col(ColumnDef::new(Users::Active).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Careers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Careers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Careers::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Careers::Code)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Careers::Active).boolean().not_null().default(true))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Professors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Professors::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Professors::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Professors::EmployeeCode).string_len(64).null())
                    .col(ColumnDef::new(Professors::Department).string_len(255).null())
                    .col(
                        ColumnDef::new(Professors::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_professors_user_id")
                            .from(Professors::Table, Professors::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Students::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Students::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Students::StudentCode).string_len(64).null())
                    .col(ColumnDef::new(Students::CareerId).uuid().not_null())
                    .col(ColumnDef::new(Students::Semester).integer().null())
                    .col(ColumnDef::new(Students::Active).boolean().not_null().default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_user_id")
                            .from(Students::Table, Students::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_career_id")
                            .from(Students::Table, Students::CareerId)
                            .to(Careers::Table, Careers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Academic catalog
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Courses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Courses::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Courses::Code)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Courses::Credits).integer().not_null().default(0))
                    .col(ColumnDef::new(Courses::CareerId).uuid().not_null())
                    .col(ColumnDef::new(Courses::Active).boolean().not_null().default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_courses_career_id")
                            .from(Courses::Table, Courses::CareerId)
                            .to(Careers::Table, Careers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AcademicPeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AcademicPeriods::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AcademicPeriods::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(AcademicPeriods::Code)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AcademicPeriods::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ClassGroups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ClassGroups::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ClassGroups::CourseId).uuid().not_null())
                    .col(ColumnDef::new(ClassGroups::PeriodId).uuid().not_null())
                    .col(ColumnDef::new(ClassGroups::SectionNumber).integer().not_null())
                    .col(ColumnDef::new(ClassGroups::Schedule).string_len(255).null())
                    .col(ColumnDef::new(ClassGroups::Room).string_len(64).null())
                    .col(ColumnDef::new(ClassGroups::Capacity).integer().null())
                    .col(
                        ColumnDef::new(ClassGroups::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_class_groups_course_id")
                            .from(ClassGroups::Table, ClassGroups::CourseId)
                            .to(Courses::Table, Courses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_class_groups_period_id")
                            .from(ClassGroups::Table, ClassGroups::PeriodId)
                            .to(AcademicPeriods::Table, AcademicPeriods::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_class_groups_section")
                    .table(ClassGroups::Table)
                    .col(ClassGroups::CourseId)
                    .col(ClassGroups::PeriodId)
                    .col(ClassGroups::SectionNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Enrollments::StudentId).uuid().not_null())
                    .col(ColumnDef::new(Enrollments::GroupId).uuid().not_null())
                    .col(
                        ColumnDef::new(Enrollments::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Enrollments::EnrolledAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(Enrollments::StudentId)
                            .col(Enrollments::GroupId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_student_id")
                            .from(Enrollments::Table, Enrollments::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_group_id")
                            .from(Enrollments::Table, Enrollments::GroupId)
                            .to(ClassGroups::Table, ClassGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TeachingAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeachingAssignments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TeachingAssignments::ProfessorId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeachingAssignments::GroupId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(TeachingAssignments::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teaching_assignments_professor_id")
                            .from(TeachingAssignments::Table, TeachingAssignments::ProfessorId)
                            .to(Professors::Table, Professors::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teaching_assignments_group_id")
                            .from(TeachingAssignments::Table, TeachingAssignments::GroupId)
                            .to(ClassGroups::Table, ClassGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Question bank
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(QuestionCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionCategories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(QuestionCategories::Name)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(QuestionCategories::Description).text().null())
                    .col(
                        ColumnDef::new(QuestionCategories::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(QuestionCategories::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Questions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Questions::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Questions::Text).text().not_null())
                    .col(ColumnDef::new(Questions::Description).text().null())
                    .col(
                        ColumnDef::new(Questions::ResponseType)
                            .string_len(32)
                            .not_null()
                            .default("rating"),
                    )
                    .col(ColumnDef::new(Questions::Options).text().null())
                    .col(
                        ColumnDef::new(Questions::Required)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Questions::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Questions::CareerId).uuid().null())
                    .col(ColumnDef::new(Questions::Active).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Questions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_questions_category_id")
                            .from(Questions::Table, Questions::CategoryId)
                            .to(QuestionCategories::Table, QuestionCategories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_questions_career_id")
                            .from(Questions::Table, Questions::CareerId)
                            .to(Careers::Table, Careers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Evaluations and their answers
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Evaluations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Evaluations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Evaluations::StudentId).uuid().not_null())
                    .col(ColumnDef::new(Evaluations::ProfessorId).uuid().not_null())
                    .col(ColumnDef::new(Evaluations::GroupId).uuid().not_null())
                    .col(ColumnDef::new(Evaluations::PeriodId).uuid().not_null())
                    .col(ColumnDef::new(Evaluations::Comments).text().null())
                    .col(
                        ColumnDef::new(Evaluations::Completed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Evaluations::AverageRating).double().null())
                    .col(
                        ColumnDef::new(Evaluations::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Evaluations::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evaluations_student_id")
                            .from(Evaluations::Table, Evaluations::StudentId)
                            .to(Students::Table, Students::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evaluations_professor_id")
                            .from(Evaluations::Table, Evaluations::ProfessorId)
                            .to(Professors::Table, Professors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evaluations_group_id")
                            .from(Evaluations::Table, Evaluations::GroupId)
                            .to(ClassGroups::Table, ClassGroups::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evaluations_period_id")
                            .from(Evaluations::Table, Evaluations::PeriodId)
                            .to(AcademicPeriods::Table, AcademicPeriods::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One evaluation per (student, professor, group, period). Concurrent
        // submissions for the same tuple lose on this index.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_evaluations_student_professor_group_period")
                    .table(Evaluations::Table)
                    .col(Evaluations::StudentId)
                    .col(Evaluations::ProfessorId)
                    .col(Evaluations::GroupId)
                    .col(Evaluations::PeriodId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EvaluationAnswers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EvaluationAnswers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EvaluationAnswers::EvaluationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EvaluationAnswers::QuestionId).uuid().not_null())
                    .col(
                        ColumnDef::new(EvaluationAnswers::Rating)
                            .integer()
                            .null()
                            .check(Expr::col(EvaluationAnswers::Rating).between(1, 5)),
                    )
                    .col(ColumnDef::new(EvaluationAnswers::TextAnswer).text().null())
                    .col(
                        ColumnDef::new(EvaluationAnswers::SelectedOption)
                            .string_len(255)
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evaluation_answers_evaluation_id")
                            .from(EvaluationAnswers::Table, EvaluationAnswers::EvaluationId)
                            .to(Evaluations::Table, Evaluations::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evaluation_answers_question_id")
                            .from(EvaluationAnswers::Table, EvaluationAnswers::QuestionId)
                            .to(Questions::Table, Questions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_evaluation_answers_question")
                    .table(EvaluationAnswers::Table)
                    .col(EvaluationAnswers::EvaluationId)
                    .col(EvaluationAnswers::QuestionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse dependency order
        manager
            .drop_table(Table::drop().table(EvaluationAnswers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Evaluations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QuestionCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeachingAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClassGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AcademicPeriods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Professors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Careers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    GivenName,
    FamilyName,
    Role,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Careers {
    Table,
    Id,
    Name,
    Code,
    Active,
}

#[derive(DeriveIden)]
enum Professors {
    Table,
    Id,
    UserId,
    EmployeeCode,
    Department,
    Active,
}

#[derive(DeriveIden)]
enum Students {
    Table,
    Id,
    UserId,
    StudentCode,
    CareerId,
    Semester,
    Active,
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    Name,
    Code,
    Credits,
    CareerId,
    Active,
}

#[derive(DeriveIden)]
enum AcademicPeriods {
    Table,
    Id,
    Name,
    Code,
    Active,
}

#[derive(DeriveIden)]
enum ClassGroups {
    Table,
    Id,
    CourseId,
    PeriodId,
    SectionNumber,
    Schedule,
    Room,
    Capacity,
    Active,
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    StudentId,
    GroupId,
    Active,
    EnrolledAt,
}

#[derive(DeriveIden)]
enum TeachingAssignments {
    Table,
    Id,
    ProfessorId,
    GroupId,
    Active,
}

#[derive(DeriveIden)]
enum QuestionCategories {
    Table,
    Id,
    Name,
    Description,
    Position,
    Active,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
    CategoryId,
    Text,
    Description,
    ResponseType,
    Options,
    Required,
    DisplayOrder,
    CareerId,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Evaluations {
    Table,
    Id,
    StudentId,
    ProfessorId,
    GroupId,
    PeriodId,
    Comments,
    Completed,
    AverageRating,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum EvaluationAnswers {
    Table,
    Id,
    EvaluationId,
    QuestionId,
    Rating,
    TextAnswer,
    SelectedOption,
}
