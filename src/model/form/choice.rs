use std::collections::HashSet;

use rocket::FromForm;

use crate::model::{db::Choice, mongodb::Id};
use crate::store::ChoiceChanges;

use super::{check_length, FieldErrors, DUPLICATE_ID, INVALID_CHOICE, REQUIRED};

/// One row of the choice formset.
///
/// Rows for existing choices carry the choice's `id`; rows offered for new
/// choices leave it out.
#[derive(Debug, Default, Clone, FromForm)]
pub struct ChoiceRow {
    pub id: Option<String>,
    pub choice_text: Option<String>,
    pub delete: bool,
}

impl ChoiceRow {
    /// A pre-filled row for an existing choice.
    pub fn existing(choice: &Choice) -> Self {
        Self {
            id: Some(choice.id.to_string()),
            choice_text: Some(choice.choice_text.clone()),
            delete: false,
        }
    }

    /// An empty row for a new choice.
    pub fn blank() -> Self {
        Self::default()
    }
}

/// The input name of a field of the row at `index`.
pub fn field_name(index: usize, field: &str) -> String {
    format!("choices[{index}].{field}")
}

/// Validate a choice formset against the question's current choices.
pub fn validate(rows: &[ChoiceRow], existing: &[Choice]) -> Result<ChoiceChanges, FieldErrors> {
    let mut changes = ChoiceChanges::default();
    let mut errors = FieldErrors::new();
    let mut seen = HashSet::new();

    for (index, row) in rows.iter().enumerate() {
        let text = row.choice_text.as_deref().unwrap_or_default().trim();
        let id = row.id.as_deref().map(str::trim).filter(|id| !id.is_empty());

        // A new row: unused extras are skipped.
        let raw_id = match id {
            Some(raw_id) => raw_id,
            None => {
                if row.delete || text.is_empty() {
                    continue;
                }
                match check_length(text) {
                    Ok(()) => changes.added.push(text.to_string()),
                    Err(message) => errors.add(field_name(index, "choice_text"), message),
                }
                continue;
            }
        };

        // An existing row must name one of this question's choices, once.
        let choice = match find_choice(raw_id, existing) {
            Some(choice) => choice,
            None => {
                errors.add(field_name(index, "id"), INVALID_CHOICE);
                continue;
            }
        };
        if !seen.insert(choice.id) {
            errors.add(field_name(index, "id"), DUPLICATE_ID);
            continue;
        }

        if row.delete {
            changes.removed.push(choice.id);
        } else if text.is_empty() {
            errors.add(field_name(index, "choice_text"), REQUIRED);
        } else if let Err(message) = check_length(text) {
            errors.add(field_name(index, "choice_text"), message);
        } else if text != choice.choice_text {
            changes.edited.push((choice.id, text.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(changes)
    } else {
        Err(errors)
    }
}

fn find_choice<'a>(raw_id: &str, existing: &'a [Choice]) -> Option<&'a Choice> {
    let id = raw_id.parse::<Id>().ok()?;
    existing.iter().find(|choice| choice.id == id)
}

#[cfg(test)]
mod tests {
    use crate::model::db::ChoiceCore;

    use super::*;

    fn new_row(text: &str) -> ChoiceRow {
        ChoiceRow {
            choice_text: Some(text.to_string()),
            ..ChoiceRow::blank()
        }
    }

    fn existing_choices() -> Vec<Choice> {
        let question_id = Id::new();
        ["Red", "Blue"]
            .iter()
            .map(|text| Choice {
                id: Id::new(),
                choice: ChoiceCore::new(question_id, text.to_string()),
            })
            .collect()
    }

    #[test]
    fn new_rows_become_additions() {
        let rows = vec![new_row(" Red "), new_row("Blue"), ChoiceRow::blank()];
        let changes = validate(&rows, &[]).unwrap();
        assert_eq!(changes.added, vec!["Red".to_string(), "Blue".to_string()]);
        assert!(changes.edited.is_empty());
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn blank_and_deleted_new_rows_are_skipped() {
        let rows = vec![
            new_row("   "),
            ChoiceRow {
                delete: true,
                ..new_row("Never mind")
            },
        ];
        assert!(validate(&rows, &[]).unwrap().is_empty());
    }

    #[test]
    fn unknown_id_is_rejected() {
        let existing = existing_choices();
        let rows = vec![
            ChoiceRow {
                id: Some(Id::new().to_string()),
                ..new_row("Green")
            },
            ChoiceRow {
                id: Some("garbage".to_string()),
                ..new_row("Yellow")
            },
        ];
        let errors = validate(&rows, &existing).unwrap_err();
        assert_eq!(errors.get("choices[0].id"), &[INVALID_CHOICE.to_string()]);
        assert_eq!(errors.get("choices[1].id"), &[INVALID_CHOICE.to_string()]);
    }

    #[test]
    fn ids_are_rejected_on_create() {
        let existing = existing_choices();
        let rows = vec![ChoiceRow::existing(&existing[0])];
        let errors = validate(&rows, &[]).unwrap_err();
        assert_eq!(errors.get("choices[0].id"), &[INVALID_CHOICE.to_string()]);
    }

    #[test]
    fn edits_deletions_and_additions() {
        let existing = existing_choices();
        let rows = vec![
            ChoiceRow {
                delete: true,
                ..ChoiceRow::existing(&existing[0])
            },
            ChoiceRow {
                choice_text: Some("Navy".to_string()),
                ..ChoiceRow::existing(&existing[1])
            },
            new_row("Green"),
        ];
        let changes = validate(&rows, &existing).unwrap();
        assert_eq!(changes.removed, vec![existing[0].id]);
        assert_eq!(changes.edited, vec![(existing[1].id, "Navy".to_string())]);
        assert_eq!(changes.added, vec!["Green".to_string()]);
    }

    #[test]
    fn unchanged_rows_produce_no_writes() {
        let existing = existing_choices();
        let rows = existing.iter().map(ChoiceRow::existing).collect::<Vec<_>>();
        assert!(validate(&rows, &existing).unwrap().is_empty());
    }

    #[test]
    fn deleted_rows_skip_text_checks() {
        let existing = existing_choices();
        let rows = vec![ChoiceRow {
            choice_text: Some(String::new()),
            delete: true,
            ..ChoiceRow::existing(&existing[0])
        }];
        let changes = validate(&rows, &existing).unwrap();
        assert_eq!(changes.removed, vec![existing[0].id]);
    }

    #[test]
    fn existing_rows_need_text() {
        let existing = existing_choices();
        let rows = vec![ChoiceRow {
            choice_text: Some(" ".to_string()),
            ..ChoiceRow::existing(&existing[0])
        }];
        let errors = validate(&rows, &existing).unwrap_err();
        assert_eq!(
            errors.get("choices[0].choice_text"),
            &[REQUIRED.to_string()]
        );
    }

    #[test]
    fn duplicate_rows_are_rejected() {
        let existing = existing_choices();
        let rows = vec![
            ChoiceRow::existing(&existing[0]),
            ChoiceRow::existing(&existing[0]),
        ];
        let errors = validate(&rows, &existing).unwrap_err();
        assert!(errors.get("choices[0].id").is_empty());
        assert_eq!(errors.get("choices[1].id"), &[DUPLICATE_ID.to_string()]);
    }

    #[test]
    fn overlong_new_choice() {
        let rows = vec![new_row(&"x".repeat(201))];
        let errors = validate(&rows, &[]).unwrap_err();
        assert_eq!(errors.get("choices[0].choice_text").len(), 1);
    }
}
