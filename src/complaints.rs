//! Citizen complaint intake

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use validator::Validate;

/// Location recorded when the reporter leaves it blank
pub const UNSPECIFIED_LOCATION: &str = "Not specified";

/// Complaint as submitted by a citizen
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewComplaint {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    /// Infrastructure category; free text so reports can name roads, parks, etc.
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    /// Any other fields the client sent, echoed back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewComplaint {
    /// Trim input and fill defaults before validation
    pub fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        self.description = self.description.trim().to_string();

        let location = self.location.trim();
        self.location = if location.is_empty() {
            UNSPECIFIED_LOCATION.to_string()
        } else {
            location.to_string()
        };

        self.email = self
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        // Server-assigned fields win over anything the client sent
        for key in ["id", "timestamp", "status"] {
            self.extra.remove(key);
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
}

/// Stored complaint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: String,
    #[serde(flatten)]
    pub report: NewComplaint,
    pub timestamp: DateTime<Utc>,
    pub status: ComplaintStatus,
}

/// Complaint store, newest first
#[derive(Debug, Clone, Default)]
pub struct ComplaintBook {
    complaints: Arc<RwLock<Vec<Complaint>>>,
}

impl ComplaintBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and record a complaint
    pub async fn submit(&self, report: NewComplaint) -> Result<Complaint> {
        let report = report.normalize();
        report.validate()?;

        let complaint = Complaint {
            id: uuid::Uuid::new_v4().to_string(),
            report,
            timestamp: Utc::now(),
            status: ComplaintStatus::Pending,
        };

        info!(
            id = %complaint.id,
            category = %complaint.report.category,
            location = %complaint.report.location,
            "complaint received"
        );

        self.complaints.write().await.insert(0, complaint.clone());
        Ok(complaint)
    }

    pub async fn list(&self) -> Vec<Complaint> {
        self.complaints.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.complaints.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.complaints.read().await.is_empty()
    }
}
