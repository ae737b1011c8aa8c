use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Review status of a loan application
///
/// The four known values are the only ones the update endpoint accepts.
/// Anything else the list endpoint returns is kept in `Other` and shown
/// verbatim instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    New,
    Processing,
    Approved,
    Rejected,
    Other(String),
}

impl Status {
    /// Known statuses in display order
    pub const KNOWN: [Status; 4] = [
        Status::New,
        Status::Processing,
        Status::Approved,
        Status::Rejected,
    ];

    /// Wire value
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Status::New => "new",
            Status::Processing => "processing",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
            Status::Other(raw) => raw,
        }
    }

    /// Human-readable label, raw value for unknown statuses
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Status::New => "New",
            Status::Processing => "Processing",
            Status::Approved => "Approved",
            Status::Rejected => "Rejected",
            Status::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Status::Other(_))
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "new" => Status::New,
            "processing" => Status::Processing,
            "approved" => Status::Approved,
            "rejected" => Status::Rejected,
            _ => Status::Other(value),
        }
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        match value {
            Status::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Parses only the four known statuses
impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Status::from(s.to_string()) {
            Status::Other(raw) => Err(UnknownStatus(raw)),
            known => Ok(known),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown status '{0}'")]
pub struct UnknownStatus(pub String);

/// Loan application as returned by the list endpoint
///
/// Rows are not validated upstream, so every field but `id` decodes
/// loosely: a value of the wrong shape becomes its empty value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub loan_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::term")]
    pub loan_term: Option<u32>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub purpose: Option<String>,
    #[serde(default = "lenient::missing_status", deserialize_with = "lenient::status")]
    pub status: Status,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: String,
}

mod lenient {
    use super::{Application, Status};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use tracing::warn;

    fn number(value: &Value) -> Option<f64> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    fn plain_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| D::Error::custom("application id is not an integer"))
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(plain_text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(plain_text(Value::deserialize(deserializer)?))
    }

    pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(number(&Value::deserialize(deserializer)?))
    }

    /// Whole months; fractional values are rounded
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn term<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let months = number(&Value::deserialize(deserializer)?).map(f64::round);
        Ok(months
            .filter(|m| (0.0..=f64::from(u32::MAX)).contains(m))
            .map(|m| m as u32))
    }

    pub fn status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Status, D::Error> {
        text(deserializer).map(Status::from)
    }

    pub fn missing_status() -> Status {
        Status::Other(String::new())
    }

    /// Decode list entries one by one, skipping those without a usable id
    pub fn entries<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<Application>>, D::Error> {
        let Some(values) = Option::<Vec<Value>>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let applications = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Application>(value) {
                Ok(app) => Some(app),
                Err(e) => {
                    warn!("Skipping unreadable application entry: {}", e);
                    None
                }
            })
            .collect();
        Ok(Some(applications))
    }
}

/// Number of applications per status
///
/// Unknown statuses land in `other`, so `total()` always equals the
/// number of applications counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub new: usize,
    pub processing: usize,
    pub approved: usize,
    pub rejected: usize,
    pub other: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn from_applications(applications: &[Application]) -> Self {
        applications
            .iter()
            .fold(Self::default(), |mut counts, app| {
                match app.status {
                    Status::New => counts.new += 1,
                    Status::Processing => counts.processing += 1,
                    Status::Approved => counts.approved += 1,
                    Status::Rejected => counts.rejected += 1,
                    Status::Other(_) => counts.other += 1,
                }
                counts
            })
    }

    #[must_use]
    pub fn get(&self, status: &Status) -> usize {
        match status {
            Status::New => self.new,
            Status::Processing => self.processing,
            Status::Approved => self.approved,
            Status::Rejected => self.rejected,
            Status::Other(_) => self.other,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.new + self.processing + self.approved + self.rejected + self.other
    }
}

/// Response of the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(
        default,
        deserialize_with = "lenient::entries",
        skip_serializing_if = "Option::is_none"
    )]
    pub applications: Option<Vec<Application>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of the update endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub id: i64,
    pub status: Status,
}

/// Response of the update endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of the submit endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
