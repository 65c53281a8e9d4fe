//! Sales pipeline records: pipelines, kanban stages and deals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::portfolio::ClientId;
use crate::define_id_type;

define_id_type!(PipelineId);
define_id_type!(StageId);
define_id_type!(DealId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<PipelineId>,
    pub name: String,
    /// Hex color, e.g. `#3B82F6`.
    pub color: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInput {
    #[serde(default)]
    pub pipeline_id: Option<PipelineId>,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    pub stage_id: StageId,
    pub title: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealInput {
    #[serde(default)]
    pub client_id: Option<ClientId>,
    pub stage_id: StageId,
    pub title: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub expected_close_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DealInput {
    /// New deals land at `position` in their stage.
    pub fn into_deal(self, position: i32) -> Deal {
        let now = Utc::now();
        Deal {
            id: DealId::new(),
            client_id: self.client_id,
            stage_id: self.stage_id,
            title: self.title,
            value: self.value,
            expected_close_date: self.expected_close_date,
            notes: self.notes,
            position,
            created_at: now,
            updated_at: now,
        }
    }
}
