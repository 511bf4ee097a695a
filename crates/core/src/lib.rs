//! Domain types and validation rules for the invoice recovery tracker.
//!
//! Nothing in this crate performs I/O: it turns raw request payloads into
//! validated values that the storage layer can persist as-is.

pub mod presence;
pub mod query;
pub mod types;
pub mod validation;

pub use presence::Presence;
pub use query::{CaseListQuery, QueryError, SortField, SortOrder};
pub use types::{
    Case, CaseChanges, CaseDraft, CaseId, CaseStatus, CaseUpdateDraft, CaseWithClient, Client,
    ClientDraft, ClientId, NewCase, NewClient, UnknownStatus,
};
pub use validation::ValidationError;
