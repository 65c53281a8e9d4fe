//! Kanban helpers for the sales pipeline.

use serde::Serialize;

use crate::models::{Deal, DealId, PipelineId, Stage, StageId, StageInput};

/// Stages created with a new pipeline: (name, color).
pub const DEFAULT_STAGES: &[(&str, &str)] = &[
    ("Novo Lead", "#3B82F6"),
    ("Em Contato", "#F59E0B"),
    ("Proposta Enviada", "#8B5CF6"),
    ("Negociação", "#EC4899"),
    ("Fechado Ganho", "#10B981"),
    ("Perdido", "#EF4444"),
];

pub fn default_stage_inputs(pipeline_id: PipelineId) -> Vec<StageInput> {
    DEFAULT_STAGES
        .iter()
        .enumerate()
        .map(|(position, (name, color))| StageInput {
            pipeline_id: Some(pipeline_id),
            name: name.to_string(),
            color: color.to_string(),
            position: Some(position as i32),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub deal_count: usize,
    pub total_value: f64,
}

/// Deal count and value per stage, in stage order.
pub fn pipeline_summary(stages: &[Stage], deals: &[Deal]) -> Vec<StageSummary> {
    let mut summary: Vec<StageSummary> = stages
        .iter()
        .map(|stage| {
            let (deal_count, total_value) = deals
                .iter()
                .filter(|d| d.stage_id == stage.id)
                .fold((0, 0.0), |(n, v), d| (n + 1, v + d.value));
            StageSummary {
                stage: stage.clone(),
                deal_count,
                total_value,
            }
        })
        .collect();
    summary.sort_by_key(|s| s.stage.position);
    summary
}

fn stage_members(deals: &[Deal], stage: StageId, skip: usize) -> Vec<usize> {
    let mut members: Vec<usize> = deals
        .iter()
        .enumerate()
        .filter(|(i, d)| *i != skip && d.stage_id == stage)
        .map(|(i, _)| i)
        .collect();
    members.sort_by_key(|i| deals[*i].position);
    members
}

/// Move deal `id` into `stage` at `position` (clamped to the stage length)
/// and renumber the positions of the source and target stages from zero.
///
/// Returns the moved deal, or `None` when `id` is not in `deals`.
pub fn reposition_deal(
    deals: &mut [Deal],
    id: DealId,
    stage: StageId,
    position: usize,
) -> Option<Deal> {
    let moved = deals.iter().position(|d| d.id == id)?;
    let source = deals[moved].stage_id;

    let mut target = stage_members(deals, stage, moved);
    target.insert(position.min(target.len()), moved);
    deals[moved].stage_id = stage;
    for (pos, idx) in target.into_iter().enumerate() {
        deals[idx].position = pos as i32;
    }

    if source != stage {
        for (pos, idx) in stage_members(deals, source, moved).into_iter().enumerate() {
            deals[idx].position = pos as i32;
        }
    }
    Some(deals[moved].clone())
}
