//! Professor statistics, recomputed from raw rating answers on every read
//!
//! The `average_rating` stored on each evaluation is not consulted: overall,
//! per-course, per-category and per-period figures all come from the same
//! answer rows so they cannot drift apart.

use std::collections::{BTreeMap, HashMap, HashSet};

use evalia_db::entities::{
    academic_period, class_group, course, evaluation, evaluation_answer, professor, question,
    question_category,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;
use uuid::Uuid;

use crate::caller::Caller;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsFilter {
    pub period_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfessorStatistics {
    pub professor_id: Uuid,
    pub total_evaluations: u64,
    pub average_rating: Option<f64>,
    pub by_course: Vec<CourseBreakdown>,
    pub by_category: Vec<CategoryBreakdown>,
    pub by_period: Vec<PeriodBreakdown>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseBreakdown {
    pub course_id: Uuid,
    pub course_code: String,
    pub course_name: String,
    pub evaluations: u64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBreakdown {
    pub category_id: Uuid,
    pub category_name: String,
    pub ratings: u64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBreakdown {
    pub period_id: Uuid,
    pub period_code: String,
    pub evaluations: u64,
    pub average_rating: Option<f64>,
}

/// A completed evaluation placed in the report's dimensions
#[derive(Debug, Clone, Copy)]
pub struct EvaluationFact {
    pub course_id: Uuid,
    pub period_id: Uuid,
}

/// One rating answer placed in the report's dimensions
#[derive(Debug, Clone, Copy)]
pub struct RatingSample {
    pub course_id: Uuid,
    pub period_id: Uuid,
    pub category_id: Uuid,
    pub rating: i32,
}

/// Display names for the ids found in facts and samples
#[derive(Debug, Clone, Default)]
pub struct Labels {
    /// course id -> (code, name)
    pub courses: HashMap<Uuid, (String, String)>,
    /// category id -> (position, name)
    pub categories: HashMap<Uuid, (i32, String)>,
    /// period id -> code
    pub periods: HashMap<Uuid, String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: i64,
    count: u64,
}

impl Mean {
    fn add(&mut self, value: i32) {
        self.sum += i64::from(value);
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// Fold facts and samples into a report
///
/// Only dimensions that have at least one evaluation appear; a course or
/// period without evaluations is omitted, not reported as zero.
pub fn aggregate(
    professor_id: Uuid,
    facts: &[EvaluationFact],
    samples: &[RatingSample],
    labels: &Labels,
) -> ProfessorStatistics {
    let mut overall = Mean::default();
    let mut course_counts: HashMap<Uuid, u64> = HashMap::new();
    let mut period_counts: HashMap<Uuid, u64> = HashMap::new();
    let mut course_means: HashMap<Uuid, Mean> = HashMap::new();
    let mut period_means: HashMap<Uuid, Mean> = HashMap::new();
    let mut category_means: HashMap<Uuid, Mean> = HashMap::new();

    for fact in facts {
        *course_counts.entry(fact.course_id).or_default() += 1;
        *period_counts.entry(fact.period_id).or_default() += 1;
    }

    for sample in samples {
        overall.add(sample.rating);
        course_means.entry(sample.course_id).or_default().add(sample.rating);
        period_means.entry(sample.period_id).or_default().add(sample.rating);
        category_means
            .entry(sample.category_id)
            .or_default()
            .add(sample.rating);
    }

    let mut by_course: Vec<CourseBreakdown> = course_counts
        .into_iter()
        .map(|(course_id, evaluations)| {
            let (code, name) = labels.courses.get(&course_id).cloned().unwrap_or_default();
            CourseBreakdown {
                course_id,
                course_code: code,
                course_name: name,
                evaluations,
                average_rating: course_means.get(&course_id).and_then(Mean::value),
            }
        })
        .collect();
    by_course.sort_by(|a, b| a.course_code.cmp(&b.course_code));

    let mut by_period: Vec<PeriodBreakdown> = period_counts
        .into_iter()
        .map(|(period_id, evaluations)| PeriodBreakdown {
            period_id,
            period_code: labels.periods.get(&period_id).cloned().unwrap_or_default(),
            evaluations,
            average_rating: period_means.get(&period_id).and_then(Mean::value),
        })
        .collect();
    by_period.sort_by(|a, b| a.period_code.cmp(&b.period_code));

    // keyed by (position, name) so the output follows the form's order
    let mut categories: BTreeMap<(i32, String, Uuid), Mean> = BTreeMap::new();
    for (category_id, mean) in category_means {
        let (position, name) = labels
            .categories
            .get(&category_id)
            .cloned()
            .unwrap_or((i32::MAX, String::new()));
        categories.insert((position, name, category_id), mean);
    }
    let by_category = categories
        .into_iter()
        .filter_map(|((_, name, category_id), mean)| {
            Some(CategoryBreakdown {
                category_id,
                category_name: name,
                ratings: mean.count,
                average_rating: mean.value()?,
            })
        })
        .collect();

    ProfessorStatistics {
        professor_id,
        total_evaluations: facts.len() as u64,
        average_rating: overall.value(),
        by_course,
        by_category,
        by_period,
    }
}

/// Statistics of one professor
///
/// Professors may read only their own; deans, coordinators and admins any.
pub async fn professor_statistics(
    db: &DatabaseConnection,
    caller: &Caller,
    professor_id: Uuid,
    filter: StatisticsFilter,
) -> EngineResult<ProfessorStatistics> {
    caller.require_professor_access(db, professor_id).await?;

    professor::Entity::find_by_id(professor_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("professor", professor_id))?;

    let mut query = evaluation::Entity::find()
        .filter(evaluation::Column::ProfessorId.eq(professor_id))
        .filter(evaluation::Column::Completed.eq(true));
    if let Some(period_id) = filter.period_id {
        query = query.filter(evaluation::Column::PeriodId.eq(period_id));
    }
    if let Some(course_id) = filter.course_id {
        let group_ids: Vec<Uuid> = class_group::Entity::find()
            .filter(class_group::Column::CourseId.eq(course_id))
            .all(db)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();
        query = query.filter(evaluation::Column::GroupId.is_in(group_ids));
    }

    let evaluations = query.all(db).await?;
    debug!(
        "Aggregating {} evaluations for professor {}",
        evaluations.len(),
        professor_id
    );

    if evaluations.is_empty() {
        return Ok(aggregate(professor_id, &[], &[], &Labels::default()));
    }

    let group_ids: HashSet<Uuid> = evaluations.iter().map(|e| e.group_id).collect();
    let group_course: HashMap<Uuid, Uuid> = class_group::Entity::find()
        .filter(class_group::Column::Id.is_in(group_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|g| (g.id, g.course_id))
        .collect();

    let mut labels = Labels::default();

    let course_ids: HashSet<Uuid> = group_course.values().copied().collect();
    for c in course::Entity::find()
        .filter(course::Column::Id.is_in(course_ids))
        .all(db)
        .await?
    {
        labels.courses.insert(c.id, (c.code, c.name));
    }

    let period_ids: HashSet<Uuid> = evaluations.iter().map(|e| e.period_id).collect();
    for p in academic_period::Entity::find()
        .filter(academic_period::Column::Id.is_in(period_ids))
        .all(db)
        .await?
    {
        labels.periods.insert(p.id, p.code);
    }

    // evaluation id -> (course, period)
    let placement: HashMap<Uuid, EvaluationFact> = evaluations
        .iter()
        .filter_map(|e| {
            let course_id = *group_course.get(&e.group_id)?;
            Some((
                e.id,
                EvaluationFact {
                    course_id,
                    period_id: e.period_id,
                },
            ))
        })
        .collect();

    let answers = evaluation_answer::Entity::find()
        .filter(evaluation_answer::Column::EvaluationId.is_in(placement.keys().copied()))
        .filter(evaluation_answer::Column::Rating.is_not_null())
        .all(db)
        .await?;

    let question_ids: HashSet<Uuid> = answers.iter().map(|a| a.question_id).collect();
    let question_category: HashMap<Uuid, Uuid> = question::Entity::find()
        .filter(question::Column::Id.is_in(question_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|q| (q.id, q.category_id))
        .collect();

    let category_ids: HashSet<Uuid> = question_category.values().copied().collect();
    for c in question_category::Entity::find()
        .filter(question_category::Column::Id.is_in(category_ids))
        .all(db)
        .await?
    {
        labels.categories.insert(c.id, (c.position, c.name));
    }

    let samples: Vec<RatingSample> = answers
        .iter()
        .filter_map(|a| {
            let fact = placement.get(&a.evaluation_id)?;
            Some(RatingSample {
                course_id: fact.course_id,
                period_id: fact.period_id,
                category_id: *question_category.get(&a.question_id)?,
                rating: a.rating?,
            })
        })
        .collect();

    let facts: Vec<EvaluationFact> = placement.into_values().collect();

    Ok(aggregate(professor_id, &facts, &samples, &labels))
}
