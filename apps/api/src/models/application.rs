use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The fixed, ordered set of tracker columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Saved,
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl ApplicationStatus {
    /// Board column order, left to right.
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Saved,
        ApplicationStatus::Applied,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Saved => "saved",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Column heading shown on the board and in notifications.
    pub fn title(self) -> &'static str {
        match self {
            ApplicationStatus::Saved => "Saved",
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::Offer => "Offer",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A tracked job application. Placement on the board is driven by `status` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub role: String,
    pub status: ApplicationStatus,
    pub link: Option<String>,
    pub salary_range: Option<String>,
    pub notes: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating an application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewApplication {
    pub company: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,
}

/// Partial update. There is no `applied_at` field: it only moves through status transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewApplication {
    pub fn new(company: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            role: role.into(),
            ..Self::default()
        }
    }

    /// Company and role are required for persistence.
    pub fn validate(&self) -> Result<(), String> {
        require_text("company", &self.company)?;
        require_text("role", &self.role)
    }
}

impl ApplicationPatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(company) = &self.company {
            require_text("company", company)?;
        }
        if let Some(role) = &self.role {
            require_text("role", role)?;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    Ok(())
}

impl Application {
    /// Builds a freshly created record. An application created straight into `applied`
    /// without an explicit timestamp is considered applied at creation time.
    pub fn new(owner: Uuid, fields: NewApplication, now: DateTime<Utc>) -> Self {
        let status = fields.status.unwrap_or_default();
        let applied_at = match (fields.applied_at, status) {
            (Some(at), _) => Some(at),
            (None, ApplicationStatus::Applied) => Some(now),
            (None, _) => None,
        };

        Self {
            id: Uuid::new_v4(),
            user_id: owner,
            company: fields.company,
            role: fields.role,
            status,
            link: fields.link,
            salary_range: fields.salary_range,
            notes: fields.notes,
            applied_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the record to `status`. `applied_at` is stamped on the first entry into
    /// `applied` and never touched again.
    pub fn transition_to(&mut self, status: ApplicationStatus, now: DateTime<Utc>) {
        self.status = status;
        if status == ApplicationStatus::Applied && self.applied_at.is_none() {
            self.applied_at = Some(now);
        }
        self.updated_at = now;
    }

    pub fn apply_patch(&mut self, patch: ApplicationPatch, now: DateTime<Utc>) {
        let ApplicationPatch {
            company,
            role,
            status,
            link,
            salary_range,
            notes,
        } = patch;

        if let Some(company) = company {
            self.company = company;
        }
        if let Some(role) = role {
            self.role = role;
        }
        if let Some(link) = link {
            self.link = Some(link);
        }
        if let Some(salary_range) = salary_range {
            self.salary_range = Some(salary_range);
        }
        if let Some(notes) = notes {
            self.notes = Some(notes);
        }
        match status {
            Some(status) => self.transition_to(status, now),
            None => self.updated_at = now,
        }
    }

    /// Case-insensitive substring match over company and role.
    /// `query` must already be lowercased.
    pub fn matches_query(&self, query: &str) -> bool {
        self.company.to_lowercase().contains(query) || self.role.to_lowercase().contains(query)
    }
}

/// Row shape of the `applications` table.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub role: String,
    pub status: String,
    pub link: Option<String>,
    pub salary_range: Option<String>,
    pub notes: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = UnknownStatus;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        Ok(Application {
            status: row.status.parse()?,
            id: row.id,
            user_id: row.user_id,
            company: row.company,
            role: row.role,
            link: row.link,
            salary_range: row.salary_range,
            notes: row.notes,
            applied_at: row.applied_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
