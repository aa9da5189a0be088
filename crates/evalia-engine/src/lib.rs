//! Evaluation engine
//!
//! Business rules of the teacher-evaluation platform on top of `evalia-db`:
//! who may evaluate whom ([`eligibility`]), how a submission is validated and
//! written as one unit ([`submission`]), which questions apply
//! ([`questions`]) and how reports are aggregated ([`statistics`]).
//!
//! Every operation that acts on behalf of a user receives an explicit
//! [`Caller`]; nothing here reads ambient request state.

pub mod accounts;
pub mod caller;
pub mod catalog;
pub mod eligibility;
pub mod error;
pub mod history;
pub mod questions;
pub mod statistics;
pub mod submission;

pub use caller::Caller;
pub use error::{EngineError, EngineResult, FieldIssue};
pub use evalia_db::entities::user::UserRole;
