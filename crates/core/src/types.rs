use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::presence::Presence;
use crate::validation::{self, ValidationError};

pub type ClientId = i64;
pub type CaseId = i64;

/// Lifecycle stage of a recovery case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    #[serde(rename = "New")]
    New,
    #[serde(rename = "In Follow-up")]
    InFollowUp,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    #[serde(rename = "Closed")]
    Closed,
}

impl CaseStatus {
    pub const ALL: [Self; 4] = [
        Self::New,
        Self::InFollowUp,
        Self::PartiallyPaid,
        Self::Closed,
    ];

    /// Returns the canonical representation used on the wire and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InFollowUp => "In Follow-up",
            Self::PartiallyPaid => "Partially Paid",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("must be one of 'New', 'In Follow-up', 'Partially Paid', 'Closed' (got '{0}')")]
pub struct UnknownStatus(pub String);

impl FromStr for CaseStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// A customer owning zero or more recovery cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub client_name: String,
    pub company_name: String,
    pub city: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An invoice recovery record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub client_id: ClientId,
    pub invoice_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub invoice_amount: Decimal,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: CaseStatus,
    pub last_follow_up_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Case representation with its owning client embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseWithClient {
    #[serde(flatten)]
    pub case: Case,
    pub client: Client,
}

/// Client creation payload as received.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientDraft {
    pub client_name: String,
    pub company_name: String,
    pub city: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
}

/// Client fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub client_name: String,
    pub company_name: String,
    pub city: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
}

impl ClientDraft {
    pub fn validate(self) -> Result<NewClient, ValidationError> {
        use validation::{bounded_text, NAME_MAX_LEN, PHONE_MAX_LEN};

        Ok(NewClient {
            client_name: bounded_text("client_name", self.client_name, NAME_MAX_LEN)?,
            company_name: bounded_text("company_name", self.company_name, NAME_MAX_LEN)?,
            city: bounded_text("city", self.city, NAME_MAX_LEN)?,
            contact_person: bounded_text("contact_person", self.contact_person, NAME_MAX_LEN)?,
            phone: bounded_text("phone", self.phone, PHONE_MAX_LEN)?,
            email: validation::email(self.email)?,
        })
    }
}

/// Case creation payload as received.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseDraft {
    pub client_id: i64,
    pub invoice_number: String,
    pub invoice_amount: Decimal,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: String,
    #[serde(default)]
    pub last_follow_up_notes: Option<String>,
}

/// Case fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCase {
    pub client_id: ClientId,
    pub invoice_number: String,
    pub invoice_amount: Decimal,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: CaseStatus,
    pub last_follow_up_notes: Option<String>,
}

impl CaseDraft {
    pub fn validate(self) -> Result<NewCase, ValidationError> {
        Ok(NewCase {
            client_id: validation::positive_id("client_id", self.client_id)?,
            invoice_number: validation::bounded_text(
                "invoice_number",
                self.invoice_number,
                validation::INVOICE_NUMBER_MAX_LEN,
            )?,
            invoice_amount: validation::invoice_amount(self.invoice_amount)?,
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            status: validation::status(&self.status)?,
            last_follow_up_notes: self.last_follow_up_notes,
        })
    }
}

/// Partial update payload. Only `status` and `last_follow_up_notes` are mutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseUpdateDraft {
    #[serde(default)]
    pub status: Presence<String>,
    #[serde(default)]
    pub last_follow_up_notes: Presence<String>,
}

/// Validated partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseChanges {
    pub status: Option<CaseStatus>,
    pub last_follow_up_notes: Presence<String>,
}

impl CaseUpdateDraft {
    pub fn validate(self) -> Result<CaseChanges, ValidationError> {
        let status = match self.status {
            Presence::Absent => None,
            Presence::Null => return Err(ValidationError::new("status", "must not be null")),
            Presence::Value(raw) => Some(validation::status(&raw)?),
        };

        Ok(CaseChanges {
            status,
            last_follow_up_notes: self.last_follow_up_notes,
        })
    }
}

impl CaseChanges {
    /// Returns `true` when the update carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.last_follow_up_notes.is_absent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_client() -> Client {
        Client {
            id: 1,
            client_name: "Acme".into(),
            company_name: "Acme SARL".into(),
            city: "Lyon".into(),
            contact_person: "Jane Doe".into(),
            phone: "+33 4 00 00 00 00".into(),
            email: "jane@acme.test".into(),
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            updated_at: "2024-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn status_round_trips_through_display() {
        for status in CaseStatus::ALL {
            assert_eq!(status.to_string().parse::<CaseStatus>().unwrap(), status);
        }
        assert!("Pending".parse::<CaseStatus>().is_err());
    }

    #[test]
    fn status_serializes_with_spaces() {
        let value = serde_json::to_value(CaseStatus::PartiallyPaid).unwrap();
        assert_eq!(value, json!("Partially Paid"));
    }

    #[test]
    fn case_with_client_flattens_case_fields() {
        let client = sample_client();
        let case = Case {
            id: 3,
            client_id: client.id,
            invoice_number: "INV-001".into(),
            invoice_amount: "1250.50".parse().unwrap(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            status: CaseStatus::InFollowUp,
            last_follow_up_notes: None,
            created_at: client.created_at,
            updated_at: client.updated_at,
        };

        let value = serde_json::to_value(CaseWithClient { case, client }).unwrap();
        assert_eq!(value["invoice_number"], json!("INV-001"));
        assert_eq!(value["invoice_amount"], json!(1250.5));
        assert_eq!(value["due_date"], json!("2024-02-10"));
        assert_eq!(value["status"], json!("In Follow-up"));
        assert_eq!(value["last_follow_up_notes"], json!(null));
        assert_eq!(value["client"]["email"], json!("jane@acme.test"));
    }

    #[test]
    fn client_draft_validation_reports_field() {
        let draft: ClientDraft = serde_json::from_value(json!({
            "client_name": "Acme",
            "company_name": "",
            "city": "Lyon",
            "contact_person": "Jane",
            "phone": "123",
            "email": "jane@acme.test"
        }))
        .unwrap();

        let err = draft.validate().unwrap_err();
        assert_eq!(err.field, "company_name");
    }

    #[test]
    fn case_draft_accepts_numeric_amount() {
        let draft: CaseDraft = serde_json::from_value(json!({
            "client_id": 1,
            "invoice_number": "INV-9",
            "invoice_amount": 99.9,
            "invoice_date": "2024-03-01",
            "due_date": "2024-04-01",
            "status": "New"
        }))
        .unwrap();

        let case = draft.validate().expect("valid case");
        assert_eq!(case.invoice_amount, "99.90".parse::<Decimal>().unwrap());
        assert_eq!(case.status, CaseStatus::New);
        assert!(case.last_follow_up_notes.is_none());
    }

    #[test]
    fn case_draft_rejects_unknown_status() {
        let draft: CaseDraft = serde_json::from_value(json!({
            "client_id": 1,
            "invoice_number": "INV-9",
            "invoice_amount": 10,
            "invoice_date": "2024-03-01",
            "due_date": "2024-04-01",
            "status": "Archived"
        }))
        .unwrap();

        assert_eq!(draft.validate().unwrap_err().field, "status");
    }

    #[test]
    fn update_draft_tracks_presence() {
        let draft: CaseUpdateDraft = serde_json::from_value(json!({"status": "Closed"})).unwrap();
        let changes = draft.validate().unwrap();
        assert_eq!(changes.status, Some(CaseStatus::Closed));
        assert!(changes.last_follow_up_notes.is_absent());

        let draft: CaseUpdateDraft =
            serde_json::from_value(json!({"last_follow_up_notes": null})).unwrap();
        let changes = draft.validate().unwrap();
        assert_eq!(changes.status, None);
        assert_eq!(changes.last_follow_up_notes, Presence::Null);
        assert!(!changes.is_empty());
    }

    #[test]
    fn update_draft_rejects_null_status() {
        let draft: CaseUpdateDraft = serde_json::from_value(json!({"status": null})).unwrap();
        assert_eq!(draft.validate().unwrap_err().field, "status");
    }

    #[test]
    fn empty_update_is_detected() {
        let draft: CaseUpdateDraft = serde_json::from_value(json!({})).unwrap();
        assert!(draft.validate().unwrap().is_empty());
    }
}
