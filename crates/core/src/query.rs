use thiserror::Error;

use crate::types::CaseStatus;

/// Date column a case listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    DueDate,
    InvoiceDate,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            Self::DueDate => "due_date",
            Self::InvoiceDate => "invoice_date",
        }
    }

    fn parse(value: &str) -> Result<Self, QueryError> {
        match value {
            "due_date" => Ok(Self::DueDate),
            "invoice_date" => Ok(Self::InvoiceDate),
            other => Err(QueryError::InvalidSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    fn parse(value: &str) -> Result<Self, QueryError> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(QueryError::InvalidOrder(other.to_string())),
        }
    }
}

/// Filter and ordering options for listing cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaseListQuery {
    pub status: Option<CaseStatus>,
    pub sort_by: Option<SortField>,
    pub order: SortOrder,
}

impl CaseListQuery {
    /// Parses raw query-string values. Any value outside its enumeration is
    /// rejected, including empty strings.
    pub fn parse(
        status: Option<&str>,
        sort_by: Option<&str>,
        order: Option<&str>,
    ) -> Result<Self, QueryError> {
        let status = status
            .map(|raw| {
                raw.parse::<CaseStatus>()
                    .map_err(|_| QueryError::InvalidStatus(raw.to_string()))
            })
            .transpose()?;
        let sort_by = sort_by.map(SortField::parse).transpose()?;
        let order = order.map(SortOrder::parse).transpose()?.unwrap_or_default();

        Ok(Self {
            status,
            sort_by,
            order,
        })
    }

    /// Ordering actually applied to the listing.
    ///
    /// `order` only applies when `sort_by` was given; otherwise the listing is
    /// ascending by due date.
    pub fn effective_ordering(&self) -> (SortField, SortOrder) {
        match self.sort_by {
            Some(field) => (field, self.order),
            None => (SortField::DueDate, SortOrder::Asc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("status must be one of 'New', 'In Follow-up', 'Partially Paid', 'Closed' (got '{0}')")]
    InvalidStatus(String),
    #[error("sort_by must be one of 'due_date', 'invoice_date' (got '{0}')")]
    InvalidSortField(String),
    #[error("order must be one of 'asc', 'desc' (got '{0}')")]
    InvalidOrder(String),
}

impl QueryError {
    pub fn parameter(&self) -> &'static str {
        match self {
            Self::InvalidStatus(_) => "status",
            Self::InvalidSortField(_) => "sort_by",
            Self::InvalidOrder(_) => "order",
        }
    }
}
