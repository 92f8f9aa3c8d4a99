//! Workout builder: an editable draft plus the rules a test must satisfy
//! before it is sent to the backend.
//!
//! # Design
//! The draft is plain data. Editing helpers keep ordinals consecutive the
//! same way the front ends do (move or remove, then renumber); `validate`
//! reports every broken rule at once so a form can list them together.
//! The backend re-validates everything; these checks only save a round trip.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{
    BlockType, CapacityType, CapacityWeight, LoadRule, Movement, MovementUnit, ScaleCode, ScoreType,
    WorkoutBlockInput, WorkoutBlockMovementInput, WorkoutDetail, WorkoutScaleInput, WorkoutType,
    WorkoutUpsertRequest, WorkoutVisibility,
};

pub const TEST_DURATION_SECONDS: u32 = 600;
pub const WEIGHT_TOLERANCE: f64 = 0.01;

const PRESS_EMOM_BLOCKS: usize = 20;
const PRESS_EMOM_INTERVAL_SECONDS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderIssue {
    #[error("title is required")]
    MissingTitle,

    #[error("score type is required")]
    MissingScoreType,

    #[error("enable at least one scale")]
    NoScaleEnabled,

    #[error("capacity weights must sum to 1.00 (current sum: {sum:.2})")]
    WeightSum { sum: f64 },

    #[error("a workout needs at least one block")]
    NoBlocks,

    #[error("block ordinals must be consecutive (1..n)")]
    BlockOrder,

    #[error("block {block}: movement ordinals must be consecutive")]
    MovementOrder { block: u32 },

    #[error("block {block}: REST blocks cannot contain movements")]
    RestWithMovements { block: u32 },

    #[error("block {block}: WORK blocks need at least one movement")]
    WorkWithoutMovements { block: u32 },

    #[error("block {block}: REST blocks need timeSeconds")]
    RestWithoutTime { block: u32 },

    #[error("test duration must be 600s, got {seconds}s")]
    Duration { seconds: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovementDraft {
    pub ord: u32,
    pub movement_id: String,
    pub reps: Option<i64>,
    pub meters: Option<i64>,
    pub seconds: Option<i64>,
    pub calories: Option<i64>,
    pub load_rule: LoadRule,
    pub notes: String,
    pub box_height_cm: Option<i64>,
}

impl MovementDraft {
    /// A movement with only its id set.
    pub fn new(ord: u32, movement_id: impl Into<String>) -> Self {
        Self {
            ord,
            movement_id: movement_id.into(),
            reps: None,
            meters: None,
            seconds: None,
            calories: None,
            load_rule: LoadRule::AthleteChoice,
            notes: String::new(),
            box_height_cm: None,
        }
    }

    /// Pre-fill the prescription for the movement's primary unit.
    pub fn for_movement(ord: u32, movement: &Movement) -> Self {
        let mut draft = Self::new(ord, &movement.id);
        match movement.unit_primary {
            MovementUnit::Reps => draft.reps = Some(10),
            MovementUnit::Meters => draft.meters = Some(100),
            MovementUnit::Seconds => draft.seconds = Some(30),
            MovementUnit::Calories => draft.calories = Some(10),
        }
        draft
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockDraft {
    pub ord: u32,
    pub name: String,
    pub block_type: BlockType,
    pub repeat_int: u32,
    pub time_seconds: Option<u32>,
    pub cap_seconds: Option<u32>,
    pub movements: Vec<MovementDraft>,
}

impl BlockDraft {
    pub fn work(ord: u32, name: impl Into<String>, time_seconds: Option<u32>) -> Self {
        Self {
            ord,
            name: name.into(),
            block_type: BlockType::Work,
            repeat_int: 1,
            time_seconds,
            cap_seconds: None,
            movements: Vec::new(),
        }
    }

    pub fn rest(ord: u32, name: impl Into<String>, time_seconds: u32) -> Self {
        Self {
            block_type: BlockType::Rest,
            ..Self::work(ord, name, Some(time_seconds))
        }
    }

    /// `timeSeconds`, else `capSeconds`, else zero, times the repeat count.
    /// Saturates at `u32::MAX`.
    pub fn duration_seconds(&self) -> u32 {
        self.time_seconds
            .or(self.cap_seconds)
            .unwrap_or(0)
            .saturating_mul(self.repeat_int)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleDraft {
    pub enabled: bool,
    pub label: String,
    pub notes: String,
    pub reference_loads: Map<String, Value>,
}

impl ScaleDraft {
    fn labeled(label: &str) -> Self {
        Self {
            enabled: true,
            label: label.to_string(),
            notes: String::new(),
            reference_loads: Map::new(),
        }
    }

    /// Replace reference loads from user-edited JSON. Anything that is not
    /// a JSON object becomes an empty object.
    pub fn set_reference_loads_text(&mut self, text: &str) {
        self.reference_loads = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDraft {
    pub title: String,
    pub description: String,
    pub workout_type: WorkoutType,
    pub visibility: WorkoutVisibility,
    pub score_type: Option<ScoreType>,
    pub scales: BTreeMap<ScaleCode, ScaleDraft>,
    pub weights: BTreeMap<CapacityType, f64>,
    pub blocks: Vec<BlockDraft>,
}

impl Default for WorkoutDraft {
    fn default() -> Self {
        Self {
            title: "New test".to_string(),
            description: String::new(),
            workout_type: WorkoutType::Amrap,
            visibility: WorkoutVisibility::GymsOnly,
            score_type: Some(default_score_type(WorkoutType::Amrap)),
            scales: default_scales(),
            weights: CapacityType::WEIGHTED.into_iter().map(|c| (c, 0.25)).collect(),
            blocks: vec![BlockDraft::work(1, "Main", Some(TEST_DURATION_SECONDS))],
        }
    }
}

fn default_scales() -> BTreeMap<ScaleCode, ScaleDraft> {
    BTreeMap::from([
        (ScaleCode::Rx, ScaleDraft::labeled("RX")),
        (ScaleCode::Scaled, ScaleDraft::labeled("Scaled")),
    ])
}

pub fn default_score_type(workout_type: WorkoutType) -> ScoreType {
    match workout_type {
        WorkoutType::Fortime => ScoreType::Time,
        WorkoutType::Amrap | WorkoutType::Emom | WorkoutType::Intervals | WorkoutType::Blocks => ScoreType::Reps,
    }
}

pub fn renumber_blocks(blocks: &mut [BlockDraft]) {
    for (index, block) in blocks.iter_mut().enumerate() {
        block.ord = index as u32 + 1;
    }
}

pub fn renumber_movements(movements: &mut [MovementDraft]) {
    for (index, movement) in movements.iter_mut().enumerate() {
        movement.ord = index as u32 + 1;
    }
}

pub fn duration_seconds(blocks: &[BlockDraft]) -> u32 {
    blocks
        .iter()
        .map(BlockDraft::duration_seconds)
        .fold(0, u32::saturating_add)
}

/// 20 blocks alternating WORK/REST, 60 seconds each, no repeats.
pub fn is_press_emom(blocks: &[BlockDraft]) -> bool {
    if blocks.len() != PRESS_EMOM_BLOCKS {
        return false;
    }
    let mut ordered: Vec<&BlockDraft> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.ord);
    ordered.iter().enumerate().all(|(index, block)| {
        let work = index % 2 == 0;
        let shape = block.time_seconds == Some(PRESS_EMOM_INTERVAL_SECONDS) && block.repeat_int == 1;
        shape
            && if work {
                block.block_type == BlockType::Work && !block.movements.is_empty()
            } else {
                block.block_type == BlockType::Rest && block.movements.is_empty()
            }
    })
}

fn is_consecutive(ords: impl Iterator<Item = u32>) -> bool {
    let mut ords: Vec<u32> = ords.collect();
    ords.sort_unstable();
    ords.iter().enumerate().all(|(index, ord)| *ord == index as u32 + 1)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn move_item<T>(items: &mut [T], index: usize, direction: Direction) -> bool {
    let target = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => index.checked_add(1),
    };
    match target {
        Some(target) if index < items.len() && target < items.len() => {
            items.swap(index, target);
            true
        }
        _ => false,
    }
}

impl WorkoutDraft {
    /// Load a saved workout for editing. Scales missing from the workout
    /// start disabled; weights it does not list are zero.
    pub fn from_detail(detail: &WorkoutDetail) -> Self {
        let mut scales = default_scales();
        for scale in scales.values_mut() {
            scale.enabled = false;
        }
        for scale in &detail.scales {
            scales.insert(
                scale.code,
                ScaleDraft {
                    enabled: true,
                    label: scale.label.clone(),
                    notes: scale.notes.clone(),
                    reference_loads: scale.reference_loads.clone(),
                },
            );
        }

        let mut weights: BTreeMap<CapacityType, f64> = CapacityType::WEIGHTED.into_iter().map(|c| (c, 0.0)).collect();
        for item in detail.capacity_weights.iter().flatten() {
            if let Some(weight) = weights.get_mut(&item.capacity_type) {
                *weight = item.weight;
            }
        }

        let mut blocks: Vec<BlockDraft> = detail
            .blocks
            .iter()
            .map(|block| {
                let mut movements: Vec<MovementDraft> = block
                    .movements
                    .iter()
                    .map(|m| MovementDraft {
                        ord: m.ord,
                        movement_id: m.movement.id.clone(),
                        reps: m.reps,
                        meters: m.meters,
                        seconds: m.seconds,
                        calories: m.calories,
                        load_rule: m.load_rule,
                        notes: m.notes.clone(),
                        box_height_cm: m.box_height_cm,
                    })
                    .collect();
                movements.sort_by_key(|m| m.ord);
                BlockDraft {
                    ord: block.ord,
                    name: block.name.clone(),
                    block_type: block.block_type,
                    repeat_int: block.repeat_int,
                    time_seconds: block.time_seconds,
                    cap_seconds: block.cap_seconds,
                    movements,
                }
            })
            .collect();
        blocks.sort_by_key(|b| b.ord);
        if blocks.is_empty() {
            blocks = Self::default().blocks;
        }

        Self {
            title: detail.title.clone(),
            description: detail.description.clone(),
            workout_type: detail.workout_type,
            visibility: detail.visibility.clone(),
            score_type: Some(detail.score_type.unwrap_or(ScoreType::Reps)),
            scales,
            weights,
            blocks,
        }
    }

    /// Change the workout type and reset the score type to its default.
    pub fn set_workout_type(&mut self, workout_type: WorkoutType) {
        self.workout_type = workout_type;
        self.score_type = Some(default_score_type(workout_type));
    }

    /// Replace all weights; capacities not listed become zero.
    pub fn set_weights(&mut self, values: &[(CapacityType, f64)]) {
        for capacity in CapacityType::WEIGHTED {
            let weight = values
                .iter()
                .find(|(c, _)| *c == capacity)
                .map(|(_, w)| *w)
                .unwrap_or(0.0);
            self.weights.insert(capacity, weight);
        }
    }

    pub fn weight_sum(&self) -> f64 {
        CapacityType::WEIGHTED
            .iter()
            .map(|c| self.weights.get(c).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn duration_seconds(&self) -> u32 {
        duration_seconds(&self.blocks)
    }

    /// Append an empty block. REST blocks default to 60 seconds.
    pub fn add_block(&mut self, block_type: BlockType) {
        let ord = self.blocks.len() as u32 + 1;
        self.blocks.push(match block_type {
            BlockType::Work => BlockDraft::work(ord, "Work", None),
            BlockType::Rest => BlockDraft::rest(ord, "Rest", PRESS_EMOM_INTERVAL_SECONDS),
        });
    }

    pub fn move_block(&mut self, index: usize, direction: Direction) -> bool {
        let moved = move_item(&mut self.blocks, index, direction);
        renumber_blocks(&mut self.blocks);
        moved
    }

    pub fn remove_block(&mut self, index: usize) -> Option<BlockDraft> {
        if index >= self.blocks.len() {
            return None;
        }
        let removed = self.blocks.remove(index);
        renumber_blocks(&mut self.blocks);
        Some(removed)
    }

    /// Add `movement` to the WORK block at `block_index`. Without a usable
    /// target a new 600s WORK block is appended for it. Returns the index of
    /// the block that received the movement.
    pub fn add_movement(&mut self, block_index: Option<usize>, movement: &Movement) -> usize {
        let target = block_index.filter(|&i| {
            self.blocks
                .get(i)
                .is_some_and(|b| b.block_type == BlockType::Work)
        });
        let index = match target {
            Some(index) => index,
            None => {
                let ord = self.blocks.len() as u32 + 1;
                self.blocks
                    .push(BlockDraft::work(ord, "Work", Some(TEST_DURATION_SECONDS)));
                self.blocks.len() - 1
            }
        };
        let block = &mut self.blocks[index];
        let ord = block.movements.len() as u32 + 1;
        block.movements.push(MovementDraft::for_movement(ord, movement));
        index
    }

    pub fn move_movement(&mut self, block_index: usize, index: usize, direction: Direction) -> bool {
        let Some(block) = self.blocks.get_mut(block_index) else {
            return false;
        };
        let moved = move_item(&mut block.movements, index, direction);
        renumber_movements(&mut block.movements);
        moved
    }

    pub fn remove_movement(&mut self, block_index: usize, index: usize) -> Option<MovementDraft> {
        let block = self.blocks.get_mut(block_index)?;
        if index >= block.movements.len() {
            return None;
        }
        let removed = block.movements.remove(index);
        renumber_movements(&mut block.movements);
        Some(removed)
    }

    /// Every rule the draft breaks, in form order. Empty means valid.
    pub fn validate(&self) -> Vec<BuilderIssue> {
        let mut issues = Vec::new();

        if self.title.trim().is_empty() {
            issues.push(BuilderIssue::MissingTitle);
        }
        if self.score_type.is_none() {
            issues.push(BuilderIssue::MissingScoreType);
        }
        if !self.scales.values().any(|s| s.enabled) {
            issues.push(BuilderIssue::NoScaleEnabled);
        }

        let sum = self.weight_sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            issues.push(BuilderIssue::WeightSum { sum });
        }

        if self.blocks.is_empty() {
            issues.push(BuilderIssue::NoBlocks);
        }
        if !is_consecutive(self.blocks.iter().map(|b| b.ord)) {
            issues.push(BuilderIssue::BlockOrder);
        }

        for block in &self.blocks {
            if !is_consecutive(block.movements.iter().map(|m| m.ord)) {
                issues.push(BuilderIssue::MovementOrder { block: block.ord });
            }
            match block.block_type {
                BlockType::Rest => {
                    if !block.movements.is_empty() {
                        issues.push(BuilderIssue::RestWithMovements { block: block.ord });
                    }
                    if block.time_seconds.unwrap_or(0) == 0 {
                        issues.push(BuilderIssue::RestWithoutTime { block: block.ord });
                    }
                }
                BlockType::Work => {
                    if block.movements.is_empty() {
                        issues.push(BuilderIssue::WorkWithoutMovements { block: block.ord });
                    }
                }
            }
        }

        let timed = matches!(
            self.workout_type,
            WorkoutType::Amrap | WorkoutType::Emom | WorkoutType::Blocks
        );
        let press_emom = self.workout_type == WorkoutType::Emom && is_press_emom(&self.blocks);
        let seconds = self.duration_seconds();
        if timed && !press_emom && seconds != TEST_DURATION_SECONDS {
            issues.push(BuilderIssue::Duration { seconds });
        }

        issues
    }

    /// Request body for create or update. Only enabled scales are sent,
    /// blocks and movements go out in ordinal order, and weights are
    /// rounded to two decimals.
    pub fn to_upsert_request(&self) -> WorkoutUpsertRequest {
        let scales = self
            .scales
            .iter()
            .filter(|(_, s)| s.enabled)
            .map(|(code, s)| WorkoutScaleInput {
                code: *code,
                label: s.label.clone(),
                notes: s.notes.clone(),
                reference_loads: s.reference_loads.clone(),
            })
            .collect();

        let mut blocks: Vec<&BlockDraft> = self.blocks.iter().collect();
        blocks.sort_by_key(|b| b.ord);
        let blocks = blocks
            .into_iter()
            .map(|block| {
                let mut movements: Vec<&MovementDraft> = block.movements.iter().collect();
                movements.sort_by_key(|m| m.ord);
                WorkoutBlockInput {
                    ord: block.ord,
                    name: block.name.clone(),
                    block_type: block.block_type,
                    repeat_int: block.repeat_int,
                    time_seconds: block.time_seconds,
                    cap_seconds: block.cap_seconds,
                    movements: movements
                        .into_iter()
                        .map(|m| WorkoutBlockMovementInput {
                            ord: m.ord,
                            movement_id: m.movement_id.clone(),
                            reps: m.reps,
                            meters: m.meters,
                            seconds: m.seconds,
                            calories: m.calories,
                            load_rule: m.load_rule,
                            notes: m.notes.clone(),
                            box_height_cm: m.box_height_cm,
                        })
                        .collect(),
                }
            })
            .collect();

        let capacity_weights = CapacityType::WEIGHTED
            .into_iter()
            .map(|capacity_type| {
                let weight = round2(self.weights.get(&capacity_type).copied().unwrap_or(0.0));
                CapacityWeight { capacity_type, weight }
            })
            .collect();

        WorkoutUpsertRequest {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            is_test: true,
            workout_type: self.workout_type,
            visibility: self.visibility.clone(),
            score_type: self.score_type,
            scales,
            blocks,
            capacity_weights,
        }
    }

    /// The request body, or the first issue when the draft is invalid.
    pub fn checked_request(&self) -> Result<WorkoutUpsertRequest, BuilderIssue> {
        match self.validate().into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(self.to_upsert_request()),
        }
    }
}
