//! Quick-start tests a coach can load into the builder.
//!
//! Templates name movements rather than ids; the catalog of the backend at
//! hand resolves names to ids (case-insensitively) when a template is
//! instantiated.

use std::collections::HashMap;

use thiserror::Error;

use crate::builder::{default_score_type, BlockDraft, MovementDraft, WorkoutDraft};
use crate::types::{BlockType, CapacityType, LoadRule, Movement, ScoreType, WorkoutType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickStartTemplate {
    Squat,
    PressEmom,
    DeadliftFarmer,
    Pull,
    FarmerSled,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("missing movements for template: {}", .0.join(", "))]
    MissingMovements(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMovement {
    pub name: &'static str,
    pub reps: Option<i64>,
    pub meters: Option<i64>,
    pub seconds: Option<i64>,
    pub load_rule: LoadRule,
}

impl TemplateMovement {
    fn reps(name: &'static str, reps: i64) -> Self {
        Self {
            name,
            reps: Some(reps),
            meters: None,
            seconds: None,
            load_rule: LoadRule::AthleteChoice,
        }
    }

    fn meters(name: &'static str, meters: i64) -> Self {
        Self {
            meters: Some(meters),
            reps: None,
            ..Self::reps(name, 0)
        }
    }

    fn hold(name: &'static str, seconds: i64) -> Self {
        Self {
            seconds: Some(seconds),
            reps: None,
            load_rule: LoadRule::Fixed,
            ..Self::reps(name, 0)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateBlock {
    pub name: String,
    pub block_type: BlockType,
    pub repeat_int: u32,
    pub time_seconds: Option<u32>,
    pub movements: Vec<TemplateMovement>,
}

impl TemplateBlock {
    fn main(movements: Vec<TemplateMovement>) -> Self {
        Self {
            name: "Main".to_string(),
            block_type: BlockType::Work,
            repeat_int: 1,
            time_seconds: Some(600),
            movements,
        }
    }
}

/// Builder state a template fills in: metadata, weights and blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateState {
    pub title: &'static str,
    pub description: &'static str,
    pub workout_type: WorkoutType,
    pub score_type: ScoreType,
    /// The score type differs from the workout type's default.
    pub score_type_overridden: bool,
    pub weights: Vec<(CapacityType, f64)>,
    pub blocks: Vec<TemplateBlock>,
}

/// Ten minutes of alternating 60s work and rest.
fn press_emom_blocks() -> Vec<TemplateBlock> {
    (0..20)
        .map(|index| {
            let round = index / 2 + 1;
            if index % 2 == 0 {
                TemplateBlock {
                    name: format!("Work {round}"),
                    block_type: BlockType::Work,
                    repeat_int: 1,
                    time_seconds: Some(60),
                    movements: vec![TemplateMovement::reps("DB Push Press", 8)],
                }
            } else {
                TemplateBlock {
                    name: format!("Rest {round}"),
                    block_type: BlockType::Rest,
                    repeat_int: 1,
                    time_seconds: Some(60),
                    movements: Vec::new(),
                }
            }
        })
        .collect()
}

impl QuickStartTemplate {
    pub const ALL: [QuickStartTemplate; 5] = [
        QuickStartTemplate::Squat,
        QuickStartTemplate::PressEmom,
        QuickStartTemplate::DeadliftFarmer,
        QuickStartTemplate::Pull,
        QuickStartTemplate::FarmerSled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuickStartTemplate::Squat => "SQUAT",
            QuickStartTemplate::PressEmom => "PRESS_EMOM",
            QuickStartTemplate::DeadliftFarmer => "DEADLIFT_FARMER",
            QuickStartTemplate::Pull => "PULL",
            QuickStartTemplate::FarmerSled => "FARMER_SLED",
        }
    }

    pub fn state(&self) -> TemplateState {
        use CapacityType::*;

        let (title, description, workout_type, score_type, weights, blocks) = match self {
            QuickStartTemplate::Squat => (
                "Test Squat",
                "Test de squat 10min",
                WorkoutType::Amrap,
                ScoreType::Reps,
                vec![(Strength, 0.4), (MuscularEndurance, 0.6)],
                vec![TemplateBlock::main(vec![TemplateMovement::reps("Back Squat", 8)])],
            ),
            QuickStartTemplate::PressEmom => (
                "Test Press EMOM",
                "WORK/REST 60s alternado",
                WorkoutType::Emom,
                ScoreType::Reps,
                vec![(Strength, 0.3), (MuscularEndurance, 0.7)],
                press_emom_blocks(),
            ),
            QuickStartTemplate::DeadliftFarmer => (
                "Test Deadlift + Farmer",
                "Combinado fuerza/capacidad",
                WorkoutType::Blocks,
                ScoreType::Meters,
                vec![(Strength, 0.6), (WorkCapacity, 0.4)],
                vec![TemplateBlock::main(vec![
                    TemplateMovement::reps("Deadlift", 6),
                    TemplateMovement::meters("Farmer Carry", 80),
                ])],
            ),
            QuickStartTemplate::Pull => (
                "Test Pull",
                "Pull + core",
                WorkoutType::Amrap,
                ScoreType::Reps,
                vec![(MuscularEndurance, 0.2), (RelativeStrength, 0.8)],
                vec![TemplateBlock::main(vec![
                    TemplateMovement::reps("Pull-up strict", 6),
                    TemplateMovement::hold("Hollow Hold", 30),
                ])],
            ),
            QuickStartTemplate::FarmerSled => (
                "Test Farmer + Sled",
                "Capacidad de trabajo",
                WorkoutType::Blocks,
                ScoreType::Meters,
                vec![(MuscularEndurance, 0.2), (WorkCapacity, 0.8)],
                vec![TemplateBlock::main(vec![
                    TemplateMovement::meters("Farmer Carry", 100),
                    TemplateMovement::meters("Sled Push", 60),
                ])],
            ),
        };

        TemplateState {
            title,
            description,
            workout_type,
            score_type,
            score_type_overridden: score_type != default_score_type(workout_type),
            weights,
            blocks,
        }
    }
}

#[derive(Debug)]
pub struct TemplateResolution<'a> {
    /// Template movement names absent from the catalog, deduplicated, in
    /// order of first use.
    pub missing: Vec<String>,
    /// Catalog keyed by lowercased name.
    pub movement_by_name: HashMap<String, &'a Movement>,
}

pub fn resolve_template_movements(template: QuickStartTemplate, catalog: &[Movement]) -> TemplateResolution<'_> {
    let movement_by_name: HashMap<String, &Movement> =
        catalog.iter().map(|m| (m.name.to_lowercase(), m)).collect();

    let mut missing: Vec<String> = Vec::new();
    for block in template.state().blocks {
        for movement in block.movements {
            let name = movement.name.to_string();
            if !movement_by_name.contains_key(&name.to_lowercase()) && !missing.contains(&name) {
                missing.push(name);
            }
        }
    }

    TemplateResolution {
        missing,
        movement_by_name,
    }
}

/// Builder draft for `template` with movement ids taken from `catalog`.
pub fn instantiate(template: QuickStartTemplate, catalog: &[Movement]) -> Result<WorkoutDraft, TemplateError> {
    let resolution = resolve_template_movements(template, catalog);
    if !resolution.missing.is_empty() {
        return Err(TemplateError::MissingMovements(resolution.missing));
    }

    let state = template.state();
    let mut draft = WorkoutDraft {
        title: state.title.to_string(),
        description: state.description.to_string(),
        workout_type: state.workout_type,
        score_type: Some(state.score_type),
        blocks: Vec::with_capacity(state.blocks.len()),
        ..WorkoutDraft::default()
    };
    draft.set_weights(&state.weights);

    for (block_index, block) in state.blocks.into_iter().enumerate() {
        let mut movements = Vec::with_capacity(block.movements.len());
        for (index, movement) in block.movements.into_iter().enumerate() {
            let Some(catalog_movement) = resolution.movement_by_name.get(&movement.name.to_lowercase()) else {
                return Err(TemplateError::MissingMovements(vec![movement.name.to_string()]));
            };
            movements.push(MovementDraft {
                reps: movement.reps,
                meters: movement.meters,
                seconds: movement.seconds,
                load_rule: movement.load_rule,
                ..MovementDraft::new(index as u32 + 1, &catalog_movement.id)
            });
        }
        draft.blocks.push(BlockDraft {
            ord: block_index as u32 + 1,
            name: block.name,
            block_type: block.block_type,
            repeat_int: block.repeat_int,
            time_seconds: block.time_seconds,
            cap_seconds: None,
            movements,
        });
    }

    Ok(draft)
}
