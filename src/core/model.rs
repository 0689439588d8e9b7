use serde::{Deserialize, Serialize};

pub type EventId = u32;
pub type WeaponId = String;
pub type ItemId = String;

/// Largest repeat count a step may carry.
pub const MAX_REPEAT: u32 = 1_000;

/// What a single timeline step does to the target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Shot { weapon_id: WeaponId },
    Heal { item_id: ItemId },
    #[serde(rename = "shield")]
    ShieldRecharge { item_id: ItemId },
    Nothing,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Shot { .. } => ActionKind::Shot,
            Self::Heal { .. } => ActionKind::Heal,
            Self::ShieldRecharge { .. } => ActionKind::ShieldRecharge,
            Self::Nothing => ActionKind::Nothing,
        }
    }
}

/// Action without its payload, used when adding new steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Shot,
    Heal,
    ShieldRecharge,
    Nothing,
}

impl ActionKind {
    /// Label a freshly created step gets.
    pub fn default_label(self, id: EventId) -> String {
        match self {
            Self::Shot => format!("Shot {}", id),
            Self::Heal => "Heal".to_string(),
            Self::ShieldRecharge => "Shield Recharge".to_string(),
            Self::Nothing => "Nothing".to_string(),
        }
    }
}

/// An action fired `repeat` times in a row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: EventId,
    pub action: Action,
    /// Always at least 1.
    pub repeat: u32,
    pub label: String,
}

impl Step {
    pub fn new(id: EventId, action: Action) -> Self {
        let label = action.kind().default_label(id);
        Self {
            id,
            action,
            repeat: 1,
            label,
        }
    }

    pub fn repeated(mut self, repeat: u32) -> Self {
        self.repeat = repeat.max(1);
        self
    }
}

/// One alternative inside a split. Branches hold plain steps only, so splits
/// never nest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: EventId,
    pub label: String,
    pub steps: Vec<Step>,
}

/// Branch label by position: "Option A" .. "Option Z", then "Option AA",
/// "Option AB" and so on.
pub fn branch_label(index: usize) -> String {
    let mut letters = Vec::new();
    let mut rest = index + 1;
    while rest > 0 {
        rest -= 1;
        letters.push(b'A' + (rest % 26) as u8);
        rest /= 26;
    }
    letters.reverse();
    format!("Option {}", String::from_utf8_lossy(&letters))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub id: EventId,
    pub label: String,
    pub branches: Vec<Branch>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEvent {
    Step(Step),
    Split(Split),
}

impl TimelineEvent {
    pub fn id(&self) -> EventId {
        match self {
            Self::Step(step) => step.id,
            Self::Split(split) => split.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Step(step) => &step.label,
            Self::Split(split) => &split.label,
        }
    }
}

/// Snapshot recorded after each event is fully applied to a path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub event_index: usize,
    /// Clamped to be non-negative.
    pub health: f64,
    pub shield: f64,
    /// `health + shield`, clamped to be non-negative.
    pub total_hp: f64,
    pub label: String,
}

/// One outcome trajectory through the timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Raw health; may go below zero on the killing shot.
    pub health: f64,
    pub shield: f64,
    pub data: Vec<DataPoint>,
    pub history: Vec<String>,
    pub shots_taken: u32,
    /// Index of the event that first brought health to zero. Never rewritten.
    pub death_event_index: Option<usize>,
    /// `history` joined with " > ", or "No events".
    pub label: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathOutcome {
    Died { shots: u32, at_event: usize },
    Survived { health: f64, shield: f64 },
}

impl Path {
    pub(crate) fn start(health: f64, shield: f64) -> Self {
        Self {
            health,
            shield,
            data: vec![DataPoint {
                event_index: 0,
                health,
                shield,
                total_hp: health + shield,
                label: "Start".to_string(),
            }],
            history: Vec::new(),
            shots_taken: 0,
            death_event_index: None,
            label: String::new(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn last_point(&self) -> Option<&DataPoint> {
        self.data.last()
    }

    pub fn outcome(&self) -> PathOutcome {
        let (health, shield) = self
            .last_point()
            .map_or((0.0, 0.0), |point| (point.health, point.shield));
        match self.death_event_index {
            Some(at_event) if health <= 0.0 => PathOutcome::Died {
                shots: self.shots_taken,
                at_event,
            },
            _ => PathOutcome::Survived { health, shield },
        }
    }

    /// Legend text for this path. `separate` shows shield next to health.
    pub fn summary(&self, separate: bool) -> String {
        match self.outcome() {
            PathOutcome::Died { shots, at_event } => format!(
                "Died after {} shot{} at event {}",
                shots,
                if shots == 1 { "" } else { "s" },
                at_event
            ),
            PathOutcome::Survived { health, shield } if separate => {
                format!("{} HP / {} Shield", health.round(), shield.round())
            }
            PathOutcome::Survived { health, .. } => format!("{} HP remaining", health.round()),
        }
    }
}

/// Result of firing one weapon at a static target until it dies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillEstimate {
    pub shots: u32,
    /// Shot that emptied the shield; `None` when the target had no shield.
    pub shield_break_shot: Option<u32>,
}
