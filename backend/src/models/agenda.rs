use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::claims::Priority;
use super::portfolio::{ClientId, PolicyId};
use crate::define_id_type;

define_id_type!(AppointmentId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AppointmentStatus {
    #[default]
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Realizado")]
    Done,
    #[serde(rename = "Cancelado")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentInput {
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub policy_id: Option<PolicyId>,
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AppointmentInput {
    pub fn into_appointment(self) -> Appointment {
        Appointment {
            id: AppointmentId::new(),
            client_id: self.client_id,
            policy_id: self.policy_id,
            title: self.title,
            date: self.date,
            time: self.time,
            status: self.status,
            priority: self.priority,
            notes: self.notes,
            created_at: Utc::now(),
        }
    }
}
