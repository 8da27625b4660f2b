//! Read-only work-order projection and the lifecycle events that drive alarms.
//!
//! Type, status and event kind arrive as open strings from upstream. They are
//! closed enums here, each with a catch-all arm so unrecognised values
//! deserialize cleanly and are skipped by the reconciler instead of failing.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of work order. Only [`WorkOrderType::DataQuality`] raises alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderType {
    DataQuality,
    #[serde(other)]
    Other,
}

impl WorkOrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderType::DataQuality => "data_quality",
            WorkOrderType::Other => "other",
        }
    }
}

impl fmt::Display for WorkOrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "data_quality" => WorkOrderType::DataQuality,
            _ => WorkOrderType::Other,
        })
    }
}

/// Processing status of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Pending,
    Processing,
    Finished,
    #[serde(other)]
    Unknown,
}

impl WorkOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::Processing => "processing",
            WorkOrderStatus::Finished => "finished",
            WorkOrderStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => WorkOrderStatus::Pending,
            "processing" => WorkOrderStatus::Processing,
            "finished" => WorkOrderStatus::Finished,
            _ => WorkOrderStatus::Unknown,
        })
    }
}

/// The fields of a work order needed to schedule alarms and render messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub work_order_type: WorkOrderType,
    pub status: WorkOrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Recipient of every notification raised for this work order.
    pub responsible_uid: Uuid,
    pub name: String,
    pub code: String,
}

impl WorkOrder {
    pub fn is_finished(&self) -> bool {
        self.status == WorkOrderStatus::Finished
    }
}

/// Change type carried by a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkOrderEventKind {
    Added,
    Modified,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for WorkOrderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkOrderEventKind::Added => write!(f, "Added"),
            WorkOrderEventKind::Modified => write!(f, "Modified"),
            WorkOrderEventKind::Deleted => write!(f, "Deleted"),
            WorkOrderEventKind::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A work-order lifecycle event: `{"type": "Added", "resource": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderEvent {
    #[serde(rename = "type")]
    pub kind: WorkOrderEventKind,
    pub resource: WorkOrder,
}

impl WorkOrderEvent {
    pub fn new(kind: WorkOrderEventKind, resource: WorkOrder) -> Self {
        Self { kind, resource }
    }
}
