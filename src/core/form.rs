use chrono::NaiveDate;

use super::record::{Record, ServiceCategory, ServiceStatus};

// Wire names of the client-writable fields, shared with the store adapter
// for building patch masks.
pub const FIELD_TITLE: &str = "title";
pub const FIELD_PASSPORT_NUMBER: &str = "passportNumber";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_DATE_ENTERED: &str = "dateEntered";
pub const FIELD_STATUS: &str = "status";

/// Draft state behind the add/edit dialog. Everything is kept as entered
/// text until submit; `validate` produces the typed draft that goes to the
/// store. The passport field is retained even while hidden so toggling the
/// title back does not force re-entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceForm {
    pub title: String,
    pub passport_number: String,
    pub description: String,
    pub date_entered: String,
    pub status: String,
}

impl Default for ServiceForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            passport_number: String::new(),
            description: String::new(),
            date_entered: chrono::Local::now()
                .date_naive()
                .format("%Y-%m-%d")
                .to_string(),
            status: ServiceStatus::Intake.as_keyword().to_string(),
        }
    }
}

impl ServiceForm {
    pub fn from_record(record: &Record) -> Self {
        Self {
            title: record.title.clone(),
            passport_number: record.passport_number.clone().unwrap_or_default(),
            description: record.description.clone(),
            date_entered: record
                .date_entered
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            status: record.status.clone(),
        }
    }

    /// Whether the passport input should be visible for the current title.
    /// Unknown titles (nothing selected yet) show it.
    pub fn shows_passport(&self) -> bool {
        ServiceCategory::from_keyword(&self.title)
            .map(|c| c.requires_passport())
            .unwrap_or(true)
    }

    /// Defensive re-check on submit: the dropdowns constrain the choices,
    /// but a draft built from a record with foreign values must not be
    /// written back unvalidated.
    pub fn validate(&self) -> Result<RecordDraft, String> {
        let Some(status) = ServiceStatus::from_keyword(&self.status) else {
            return Err(format!("Unknown status \"{}\"", self.status));
        };
        let Some(title) = ServiceCategory::from_keyword(&self.title) else {
            return Err(format!("Unknown service category \"{}\"", self.title));
        };
        let description = self.description.trim();
        if description.is_empty() {
            return Err("Description is required".to_string());
        }
        let date_entered = NaiveDate::parse_from_str(self.date_entered.trim(), "%Y-%m-%d")
            .map_err(|_| format!("Date \"{}\" is not YYYY-MM-DD", self.date_entered))?;

        // Passport-exempt categories persist no passport, even when a value
        // lingers in the hidden input.
        let passport = self.passport_number.trim();
        let passport_number = if title.requires_passport() && !passport.is_empty() {
            Some(passport.to_string())
        } else {
            None
        };

        Ok(RecordDraft {
            title,
            passport_number,
            description: description.to_string(),
            date_entered,
            status,
        })
    }
}

/// A validated draft, ready for insert or patch. Never carries an id,
/// timestamp or creator; those belong to the store and the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub title: ServiceCategory,
    pub passport_number: Option<String>,
    pub description: String,
    pub date_entered: NaiveDate,
    pub status: ServiceStatus,
}

impl RecordDraft {
    /// Wire names of the fields that differ from `record`, for a partial
    /// patch. Editing only the status yields only `status`.
    pub fn changed_fields(&self, record: &Record) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.title.as_keyword() != record.title {
            changed.push(FIELD_TITLE);
        }
        if self.passport_number != record.passport_number {
            changed.push(FIELD_PASSPORT_NUMBER);
        }
        if self.description != record.description {
            changed.push(FIELD_DESCRIPTION);
        }
        if Some(self.date_entered) != record.date_entered {
            changed.push(FIELD_DATE_ENTERED);
        }
        if self.status.as_keyword() != record.status {
            changed.push(FIELD_STATUS);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn filled_form() -> ServiceForm {
        ServiceForm {
            title: "VOA".to_string(),
            passport_number: "A1234567".to_string(),
            description: "Renewal".to_string(),
            date_entered: "2025-01-10".to_string(),
            status: "intake".to_string(),
        }
    }

    fn existing_record() -> Record {
        Record {
            id: "doc-1".to_string(),
            title: "VOA".to_string(),
            passport_number: Some("A1234567".to_string()),
            description: "Renewal".to_string(),
            date_entered: NaiveDate::from_ymd_opt(2025, 1, 10),
            status: "pending".to_string(),
            timestamp: Some(Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap()),
            created_by: "user-1".to_string(),
        }
    }

    #[test]
    fn default_draft_starts_at_intake() {
        let form = ServiceForm::default();
        assert_eq!(form.status, "intake");
        assert!(form.title.is_empty());
        assert!(!form.date_entered.is_empty());
    }

    #[test]
    fn valid_form_produces_draft() {
        let draft = filled_form().validate().unwrap();
        assert_eq!(draft.title, ServiceCategory::VisaOnArrival);
        assert_eq!(draft.passport_number.as_deref(), Some("A1234567"));
        assert_eq!(draft.description, "Renewal");
        assert_eq!(draft.date_entered, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert_eq!(draft.status, ServiceStatus::Intake);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut form = filled_form();
        form.status = "archived".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn unknown_title_is_rejected() {
        let mut form = filled_form();
        form.title = "Golf Cart Permit".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn empty_description_is_rejected() {
        let mut form = filled_form();
        form.description = "   ".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut form = filled_form();
        form.date_entered = "10/01/2025".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn stale_passport_is_cleared_for_exempt_category() {
        let mut form = filled_form();
        form.title = "New Passport".to_string();
        let draft = form.validate().unwrap();
        assert_eq!(draft.passport_number, None);
        // Still present in the draft text so toggling back restores it.
        assert_eq!(form.passport_number, "A1234567");
    }

    #[test]
    fn passport_input_hidden_for_exempt_titles() {
        let mut form = filled_form();
        assert!(form.shows_passport());
        form.title = "Other".to_string();
        assert!(!form.shows_passport());
    }

    #[test]
    fn status_only_edit_patches_only_status() {
        let mut form = ServiceForm::from_record(&existing_record());
        form.status = "follow-up".to_string();
        let draft = form.validate().unwrap();
        assert_eq!(draft.changed_fields(&existing_record()), vec![FIELD_STATUS]);
    }

    #[test]
    fn unchanged_edit_patches_nothing() {
        let record = existing_record();
        let draft = ServiceForm::from_record(&record).validate().unwrap();
        assert!(draft.changed_fields(&record).is_empty());
    }

    #[test]
    fn from_record_formats_the_calendar_date() {
        let form = ServiceForm::from_record(&existing_record());
        assert_eq!(form.date_entered, "2025-01-10");
    }
}
