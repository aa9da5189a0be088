//! Database entities

pub mod academic_period;
pub mod career;
pub mod class_group;
pub mod course;
pub mod enrollment;
pub mod evaluation;
pub mod evaluation_answer;
pub mod professor;
pub mod question;
pub mod question_category;
pub mod student;
pub mod teaching_assignment;
pub mod user;

pub use academic_period::Entity as AcademicPeriod;
pub use career::Entity as Career;
pub use class_group::Entity as ClassGroup;
pub use course::Entity as Course;
pub use enrollment::Entity as Enrollment;
pub use evaluation::Entity as Evaluation;
pub use evaluation_answer::Entity as EvaluationAnswer;
pub use professor::Entity as Professor;
pub use question::Entity as Question;
pub use question_category::Entity as QuestionCategory;
pub use student::Entity as Student;
pub use teaching_assignment::Entity as TeachingAssignment;
pub use user::Entity as User;

pub mod prelude {
    pub use super::academic_period::Entity as AcademicPeriod;
    pub use super::career::Entity as Career;
    pub use super::class_group::Entity as ClassGroup;
    pub use super::course::Entity as Course;
    pub use super::enrollment::Entity as Enrollment;
    pub use super::evaluation::Entity as Evaluation;
    pub use super::evaluation_answer::Entity as EvaluationAnswer;
    pub use super::professor::Entity as Professor;
    pub use super::question::Entity as Question;
    pub use super::question_category::Entity as QuestionCategory;
    pub use super::student::Entity as Student;
    pub use super::teaching_assignment::Entity as TeachingAssignment;
    pub use super::user::Entity as User;
}
