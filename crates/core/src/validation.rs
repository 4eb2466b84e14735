use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone};

use crate::model::{NewTask, Priority, TaskPatch};
use crate::parser;

/// Raw creation input as typed by the user, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub subject: String,
    pub topic: String,
    pub study_time: String,
    pub deadline: String,
    pub priority: Option<String>,
}

/// Raw partial-update input. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchDraft {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub study_time: Option<String>,
    pub deadline: Option<String>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Subject,
    Topic,
    StudyTime,
    Deadline,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Subject => "subject",
            Field::Topic => "topic",
            Field::StudyTime => "studyTime",
            Field::Deadline => "deadline",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every invalid field with its message, so a form can flag them all at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Check a draft against the creation rules, relative to `now`'s calendar day.
pub fn validate<Tz: TimeZone>(
    draft: &TaskDraft,
    now: &DateTime<Tz>,
) -> Result<NewTask, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let subject = required_text(&draft.subject, Field::Subject, &mut errors);
    let topic = required_text(&draft.topic, Field::Topic, &mut errors);
    let study_time = study_hours(&draft.study_time, &mut errors);

    let deadline = match parser::parse_deadline(&draft.deadline, now) {
        Ok(deadline) if deadline.with_timezone(&now.timezone()).date_naive() < now.date_naive() => {
            errors.insert(Field::Deadline, "Deadline cannot be in the past");
            None
        }
        Ok(deadline) => Some(deadline),
        Err(err) => {
            errors.insert(Field::Deadline, err.to_string());
            None
        }
    };

    let priority = draft
        .priority
        .as_deref()
        .and_then(|label| label.parse::<Priority>().ok())
        .unwrap_or_default();

    match (subject, topic, study_time, deadline) {
        (Some(subject), Some(topic), Some(study_time), Some(deadline)) if errors.is_empty() => {
            Ok(NewTask {
                subject,
                topic,
                study_time,
                deadline,
                priority,
            })
        }
        _ => Err(errors),
    }
}

/// Apply the creation rules to the fields a partial update carries. Text
/// fields come back trimmed. Deadlines are not range-checked.
pub fn validate_patch(mut patch: TaskPatch) -> Result<TaskPatch, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if let Some(subject) = patch.subject.take() {
        patch.subject = required_text(&subject, Field::Subject, &mut errors);
    }
    if let Some(topic) = patch.topic.take() {
        patch.topic = required_text(&topic, Field::Topic, &mut errors);
    }
    if let Some(hours) = patch.study_time {
        if !is_valid_hours(hours) {
            errors.insert(Field::StudyTime, "Study time must be a positive number of hours");
        }
    }

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}

/// Parse the raw fields of a partial update, then check them like
/// [`validate_patch`]. Parse failures are reported per field.
pub fn parse_patch<Tz: TimeZone>(
    draft: &PatchDraft,
    now: &DateTime<Tz>,
) -> Result<TaskPatch, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let study_time = draft
        .study_time
        .as_deref()
        .and_then(|raw| study_hours(raw, &mut errors));
    let deadline = draft
        .deadline
        .as_deref()
        .and_then(|raw| match parser::parse_deadline(raw, now) {
            Ok(deadline) => Some(deadline),
            Err(err) => {
                errors.insert(Field::Deadline, err.to_string());
                None
            }
        });

    let patch = TaskPatch {
        subject: draft.subject.clone(),
        topic: draft.topic.clone(),
        study_time,
        deadline,
        priority: draft.priority,
        completed: None,
    };
    match validate_patch(patch) {
        Ok(patch) if errors.is_empty() => Ok(patch),
        Ok(_) => Err(errors),
        Err(mut text_errors) => {
            text_errors.errors.extend(errors.errors);
            Err(text_errors)
        }
    }
}

fn required_text(raw: &str, field: Field, errors: &mut ValidationErrors) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.insert(field, format!("{} is required", capitalized(field)));
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn study_hours(raw: &str, errors: &mut ValidationErrors) -> Option<f64> {
    match parser::parse_study_hours(raw) {
        Ok(hours) if is_valid_hours(hours) => Some(hours),
        Ok(_) => {
            errors.insert(Field::StudyTime, "Study time must be greater than zero");
            None
        }
        Err(err) => {
            errors.insert(Field::StudyTime, err.to_string());
            None
        }
    }
}

fn is_valid_hours(hours: f64) -> bool {
    hours.is_finite() && hours > 0.0
}

fn capitalized(field: Field) -> &'static str {
    match field {
        Field::Subject => "Subject",
        Field::Topic => "Topic",
        Field::StudyTime => "Study time",
        Field::Deadline => "Deadline",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 4, 22, 0, 0)
            .unwrap()
    }

    fn draft() -> TaskDraft {
        TaskDraft {
            subject: "  Math ".into(),
            topic: "Algebra".into(),
            study_time: "2".into(),
            deadline: "tomorrow".into(),
            priority: Some("high".into()),
        }
    }

    #[test]
    fn accepts_valid_draft_and_trims_text() {
        let task = validate(&draft(), &now()).unwrap();
        assert_eq!(task.subject, "Math");
        assert_eq!(task.topic, "Algebra");
        assert_eq!(task.study_time, 2.0);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(
            task.deadline.with_timezone(&now().timezone()).date_naive(),
            now().date_naive().succ_opt().unwrap()
        );
    }

    #[test]
    fn today_is_an_acceptable_deadline() {
        let mut input = draft();
        input.deadline = "2026-03-04".into();
        assert!(validate(&input, &now()).is_ok());
    }

    #[test]
    fn reports_every_invalid_field() {
        let input = TaskDraft {
            subject: "   ".into(),
            topic: "".into(),
            study_time: "0".into(),
            deadline: "2026-03-03".into(),
            priority: None,
        };
        let errors = validate(&input, &now()).unwrap_err();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get(Field::Subject), Some("Subject is required"));
        assert_eq!(errors.get(Field::Topic), Some("Topic is required"));
        assert_eq!(
            errors.get(Field::StudyTime),
            Some("Study time must be greater than zero")
        );
        assert_eq!(
            errors.get(Field::Deadline),
            Some("Deadline cannot be in the past")
        );
    }

    #[test]
    fn unparseable_fields_carry_parser_messages() {
        let mut input = draft();
        input.study_time = "lots".into();
        input.deadline = "eventually".into();
        let errors = validate(&input, &now()).unwrap_err();

        let fields: Vec<Field> = errors.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec![Field::StudyTime, Field::Deadline]);
        assert!(errors.to_string().contains("studyTime: Unrecognized study time"));
    }

    #[test]
    fn odd_relative_deadlines_become_field_errors() {
        for spec in ["+3é", "+999999999999d"] {
            let mut input = draft();
            input.deadline = spec.into();
            let errors = validate(&input, &now()).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert!(errors.get(Field::Deadline).is_some());
        }
    }

    #[test]
    fn unknown_priority_defaults_to_medium() {
        let mut input = draft();
        input.priority = Some("urgent".into());
        assert_eq!(validate(&input, &now()).unwrap().priority, Priority::Medium);

        input.priority = None;
        assert_eq!(validate(&input, &now()).unwrap().priority, Priority::Medium);
    }

    #[test]
    fn parse_patch_reports_unparseable_fields() {
        let patch = parse_patch(
            &PatchDraft {
                study_time: Some("90m".into()),
                deadline: Some("2026-03-10".into()),
                ..PatchDraft::default()
            },
            &now(),
        )
        .unwrap();
        assert_eq!(patch.study_time, Some(1.5));
        assert!(patch.deadline.is_some());
        assert_eq!(patch.subject, None);

        let errors = parse_patch(
            &PatchDraft {
                subject: Some(" ".into()),
                study_time: Some("lots".into()),
                deadline: Some("+3é".into()),
                ..PatchDraft::default()
            },
            &now(),
        )
        .unwrap_err();
        let fields: Vec<Field> = errors.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec![Field::Subject, Field::StudyTime, Field::Deadline]);
        assert!(errors
            .get(Field::StudyTime)
            .unwrap()
            .starts_with("Unrecognized study time"));
    }

    #[test]
    fn patch_validation_trims_and_rejects() {
        let patch = validate_patch(TaskPatch {
            subject: Some(" Physics ".into()),
            study_time: Some(1.25),
            ..TaskPatch::default()
        })
        .unwrap();
        assert_eq!(patch.subject.as_deref(), Some("Physics"));

        let errors = validate_patch(TaskPatch {
            topic: Some(" ".into()),
            study_time: Some(f64::NAN),
            ..TaskPatch::default()
        })
        .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.get(Field::Topic).is_some());
        assert!(errors.get(Field::StudyTime).is_some());
    }
}
