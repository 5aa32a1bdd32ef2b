use chrono::{DateTime, Duration, NaiveDate, Utc};

/// A record older than this (and not done) is flagged as overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Intake,
    Verified,
    Pending,
    FollowUp,
    Done,
}

impl ServiceStatus {
    pub const ALL: &'static [ServiceStatus] = &[
        Self::Intake,
        Self::Verified,
        Self::Pending,
        Self::FollowUp,
        Self::Done,
    ];

    /// The wire keyword stored in a record's `status` field.
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Verified => "verified",
            Self::Pending => "pending",
            Self::FollowUp => "follow-up",
            Self::Done => "done",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "intake" => Some(Self::Intake),
            "verified" => Some(Self::Verified),
            "pending" => Some(Self::Pending),
            "follow-up" => Some(Self::FollowUp),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Intake => "Intake",
            Self::Verified => "Verified",
            Self::Pending => "Pending",
            Self::FollowUp => "Follow Up",
            Self::Done => "Done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    VisaOnArrival,
    VisaExtension,
    Kitas,
    Kitap,
    ExitPermit,
    NewPassport,
    Sktt,
    Other,
}

impl ServiceCategory {
    pub const ALL: &'static [ServiceCategory] = &[
        Self::VisaOnArrival,
        Self::VisaExtension,
        Self::Kitas,
        Self::Kitap,
        Self::ExitPermit,
        Self::NewPassport,
        Self::Sktt,
        Self::Other,
    ];

    /// The wire keyword stored in a record's `title` field (also the display label).
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::VisaOnArrival => "VOA",
            Self::VisaExtension => "Visa Extension",
            Self::Kitas => "KITAS",
            Self::Kitap => "KITAP",
            Self::ExitPermit => "Exit Permit",
            Self::NewPassport => "New Passport",
            Self::Sktt => "SKTT",
            Self::Other => "Other",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_keyword() == s)
    }

    /// Whether a request of this category carries a passport number.
    /// A new-passport application has no passport yet, and "Other" covers
    /// paperwork that is not tied to a travel document.
    pub fn requires_passport(&self) -> bool {
        !matches!(self, Self::NewPassport | Self::Other)
    }
}

/// One service request as it exists in the shared collection.
///
/// `status` and `title` stay as wire strings so records written by other
/// clients with unknown values still display instead of being dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub title: String,
    pub passport_number: Option<String>,
    pub description: String,
    pub date_entered: Option<NaiveDate>,
    pub status: String,
    /// Server-assigned creation time. Never written by this client.
    pub timestamp: Option<DateTime<Utc>>,
    pub created_by: String,
}

impl Record {
    pub fn status(&self) -> Option<ServiceStatus> {
        ServiceStatus::from_keyword(&self.status)
    }

    pub fn category(&self) -> Option<ServiceCategory> {
        ServiceCategory::from_keyword(&self.title)
    }

    /// A record is overdue when it is not done and more than two whole days
    /// have passed since its creation time. Exactly two days is not overdue.
    /// The difference is taken absolute, so a clock-skewed future timestamp
    /// never yields a negative elapsed time.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        if self.status().is_some_and(|s| s.is_done()) {
            return false;
        }
        let Some(ts) = self.timestamp else {
            return false;
        };
        (now - ts).abs() > Duration::days(OVERDUE_AFTER_DAYS)
    }
}
