//! Calculator state owned by the view layer.
//!
//! Everything the simulation needs lives here explicitly; the engine itself
//! keeps no state between runs.

use super::catalog::{Catalog, ShieldType};
use super::config::Settings;
use super::model::{
    branch_label, Action, ActionKind, Branch, EventId, Path, Split, Step, TimelineEvent, MAX_REPEAT,
};
use super::simulation::{rank_weapons, SimulationError, Simulator, Target, WeaponRanking};

pub const MIN_HEALTH: u32 = 1;
pub const MAX_HEALTH: u32 = 100;

pub struct AppState<'a> {
    catalog: &'a Catalog,
    settings: Settings,
    health: u32,
    shield: u32,
    shield_type: Option<String>,
    separate: bool,
    timeline: Vec<TimelineEvent>,
    next_id: EventId,
}

impl<'a> AppState<'a> {
    pub fn new(catalog: &'a Catalog, settings: Settings) -> Self {
        let mut state = Self {
            catalog,
            settings,
            health: MAX_HEALTH,
            shield: 0,
            shield_type: None,
            separate: false,
            timeline: Vec::new(),
            next_id: 1,
        };
        state.reset();
        state
    }

    /// Back to full health, the default shield at full charge and a single shot.
    pub fn reset(&mut self) {
        self.health = MAX_HEALTH;
        self.separate = false;
        let default_shield = self.settings.default_shield_type.clone();
        if !self.set_shield_type(default_shield.as_deref()) {
            log::warn!(
                "Unknown default shield type {:?}, starting without a shield",
                default_shield
            );
            self.set_shield_type(None);
        }
        self.timeline = vec![TimelineEvent::Step(Step::new(
            1,
            Action::Shot {
                weapon_id: self.settings.default_weapon.clone(),
            },
        ))];
        self.next_id = 2;
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn shield(&self) -> u32 {
        self.shield
    }

    pub fn shield_type_id(&self) -> Option<&str> {
        self.shield_type.as_deref()
    }

    pub fn shield_type(&self) -> Option<&'a ShieldType> {
        let catalog = self.catalog;
        self.shield_type.as_deref().and_then(|id| catalog.shield_type(id))
    }

    /// Full charge of the equipped shield, 0 without one.
    pub fn max_shield(&self) -> u32 {
        self.shield_type().map_or(0, |s| s.charge.round() as u32)
    }

    pub fn separate(&self) -> bool {
        self.separate
    }

    pub fn timeline(&self) -> &[TimelineEvent] {
        &self.timeline
    }

    pub fn next_id(&self) -> EventId {
        self.next_id
    }

    pub fn set_health(&mut self, health: u32) {
        self.health = health.clamp(MIN_HEALTH, MAX_HEALTH);
    }

    pub fn set_shield(&mut self, shield: u32) {
        self.shield = shield.min(self.max_shield());
    }

    /// Equip a shield type (or none) at full charge. Unknown ids are refused.
    pub fn set_shield_type(&mut self, id: Option<&str>) -> bool {
        match id.filter(|id| !id.is_empty()) {
            Some(id) => match self.catalog.shield_type(id) {
                Some(shield_type) => {
                    self.shield_type = Some(shield_type.id.clone());
                    self.shield = shield_type.charge.round() as u32;
                    true
                }
                None => false,
            },
            None => {
                self.shield_type = None;
                self.shield = 0;
                true
            }
        }
    }

    pub fn set_separate(&mut self, separate: bool) {
        self.separate = separate;
    }

    /// Swap in a decoded timeline along with its id counter.
    pub fn replace_timeline(&mut self, timeline: Vec<TimelineEvent>, next_id: EventId) {
        self.timeline = timeline;
        self.next_id = next_id;
    }

    /// Most recent weapon in the timeline, including split branches.
    pub fn last_used_weapon(&self) -> String {
        self.timeline
            .iter()
            .rev()
            .find_map(|event| match event {
                TimelineEvent::Step(step) => weapon_of(step),
                TimelineEvent::Split(split) => split
                    .branches
                    .iter()
                    .rev()
                    .find_map(|branch| branch.steps.iter().rev().find_map(weapon_of)),
            })
            .unwrap_or_else(|| self.settings.default_weapon.clone())
    }

    fn allocate(&mut self) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn new_step(&mut self, kind: ActionKind) -> Step {
        let action = match kind {
            ActionKind::Shot => Action::Shot {
                weapon_id: self.last_used_weapon(),
            },
            ActionKind::Heal => Action::Heal {
                item_id: self.settings.default_heal_item.clone(),
            },
            ActionKind::ShieldRecharge => Action::ShieldRecharge {
                item_id: self.settings.default_shield_item.clone(),
            },
            ActionKind::Nothing => Action::Nothing,
        };
        Step::new(self.allocate(), action)
    }

    fn new_branch(&mut self, index: usize) -> Branch {
        let id = self.allocate();
        let step = self.new_step(ActionKind::Shot);
        Branch {
            id,
            label: branch_label(index),
            steps: vec![step],
        }
    }

    pub fn add_event(&mut self, kind: ActionKind) -> EventId {
        let step = self.new_step(kind);
        let id = step.id;
        self.timeline.push(TimelineEvent::Step(step));
        id
    }

    /// Insert a two-way split right after `index`, both branches shooting the
    /// last used weapon.
    pub fn insert_split_after(&mut self, index: usize) -> EventId {
        let id = self.allocate();
        let branches = vec![self.new_branch(0), self.new_branch(1)];
        let position = (index + 1).min(self.timeline.len());
        self.timeline.insert(
            position,
            TimelineEvent::Split(Split {
                id,
                label: "Split".to_string(),
                branches,
            }),
        );
        id
    }

    pub fn remove_event(&mut self, id: EventId) -> bool {
        let before = self.timeline.len();
        self.timeline.retain(|event| event.id() != id);
        self.timeline.len() != before
    }

    /// Drag-and-drop reorder of top-level events.
    pub fn move_event(&mut self, from: usize, to: usize) -> bool {
        if from >= self.timeline.len() || to >= self.timeline.len() || from == to {
            return false;
        }
        let event = self.timeline.remove(from);
        self.timeline.insert(to, event);
        true
    }

    fn step_mut(&mut self, id: EventId) -> Option<&mut Step> {
        self.timeline.iter_mut().find_map(|event| match event {
            TimelineEvent::Step(step) => (step.id == id).then_some(step),
            TimelineEvent::Split(split) => split
                .branches
                .iter_mut()
                .flat_map(|branch| branch.steps.iter_mut())
                .find(|step| step.id == id),
        })
    }

    fn split_mut(&mut self, id: EventId) -> Option<&mut Split> {
        self.timeline.iter_mut().find_map(|event| match event {
            TimelineEvent::Split(split) if split.id == id => Some(split),
            _ => None,
        })
    }

    fn branch_mut(&mut self, split_id: EventId, branch_id: EventId) -> Option<&mut Branch> {
        self.split_mut(split_id)?
            .branches
            .iter_mut()
            .find(|branch| branch.id == branch_id)
    }

    pub fn set_repeat(&mut self, id: EventId, repeat: u32) -> bool {
        if !(1..=MAX_REPEAT).contains(&repeat) {
            return false;
        }
        match self.step_mut(id) {
            Some(step) => {
                step.repeat = repeat;
                true
            }
            None => false,
        }
    }

    pub fn set_action(&mut self, id: EventId, action: Action) -> bool {
        match self.step_mut(id) {
            Some(step) => {
                step.action = action;
                true
            }
            None => false,
        }
    }

    pub fn add_branch(&mut self, split_id: EventId) -> Option<EventId> {
        let index = self.split_mut(split_id)?.branches.len();
        let branch = self.new_branch(index);
        let id = branch.id;
        self.split_mut(split_id)?.branches.push(branch);
        Some(id)
    }

    /// A split always keeps at least two branches.
    pub fn remove_branch(&mut self, split_id: EventId, branch_id: EventId) -> bool {
        let Some(split) = self.split_mut(split_id) else {
            return false;
        };
        if split.branches.len() <= 2 {
            return false;
        }
        let before = split.branches.len();
        split.branches.retain(|branch| branch.id != branch_id);
        split.branches.len() != before
    }

    pub fn rename_branch(&mut self, split_id: EventId, branch_id: EventId, label: &str) -> bool {
        match self.branch_mut(split_id, branch_id) {
            Some(branch) => {
                branch.label = label.to_string();
                true
            }
            None => false,
        }
    }

    pub fn add_step_to_branch(
        &mut self,
        split_id: EventId,
        branch_id: EventId,
        kind: ActionKind,
    ) -> Option<EventId> {
        self.branch_mut(split_id, branch_id)?;
        let step = self.new_step(kind);
        let id = step.id;
        self.branch_mut(split_id, branch_id)?.steps.push(step);
        Some(id)
    }

    /// A branch always keeps at least one step.
    pub fn remove_step_from_branch(
        &mut self,
        split_id: EventId,
        branch_id: EventId,
        step_id: EventId,
    ) -> bool {
        let Some(branch) = self.branch_mut(split_id, branch_id) else {
            return false;
        };
        if branch.steps.len() <= 1 {
            return false;
        }
        let before = branch.steps.len();
        branch.steps.retain(|step| step.id != step_id);
        branch.steps.len() != before
    }

    pub fn target(&self) -> Target {
        Target::new(f64::from(self.health), f64::from(self.shield), self.shield_type())
    }

    pub fn simulator(&self) -> Simulator<'a> {
        Simulator::new(self.catalog).with_policy(self.settings.unknown_ids)
    }

    /// Re-run the whole timeline from the current starting state.
    pub fn paths(&self) -> Result<Vec<Path>, SimulationError> {
        self.simulator().simulate(&self.target(), &self.timeline)
    }

    pub fn weapon_rankings(&self) -> Result<Vec<WeaponRanking<'a>>, SimulationError> {
        rank_weapons(self.catalog, &self.target(), self.settings.max_shots_to_kill)
    }
}

fn weapon_of(step: &Step) -> Option<String> {
    match &step.action {
        Action::Shot { weapon_id } => Some(weapon_id.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState<'static> {
        AppState::new(Catalog::builtin(), Settings::default())
    }

    fn split_of<'s>(state: &'s AppState<'_>, id: EventId) -> &'s Split {
        state
            .timeline()
            .iter()
            .find_map(|event| match event {
                TimelineEvent::Split(split) if split.id == id => Some(split),
                _ => None,
            })
            .expect("split exists")
    }

    #[test]
    fn test_defaults() {
        let state = state();
        assert_eq!(state.health(), 100);
        assert_eq!(state.shield(), 40);
        assert_eq!(state.shield_type_id(), Some("light_shield"));
        assert_eq!(state.timeline().len(), 1);
        assert_eq!(state.timeline()[0].label(), "Shot 1");
        assert_eq!(state.next_id(), 2);
    }

    #[test]
    fn test_health_and_shield_are_clamped() {
        let mut state = state();
        state.set_health(0);
        assert_eq!(state.health(), 1);
        state.set_health(250);
        assert_eq!(state.health(), 100);
        state.set_shield(500);
        assert_eq!(state.shield(), 40);
    }

    #[test]
    fn test_shield_type_change_refills() {
        let mut state = state();
        state.set_shield(10);
        assert!(state.set_shield_type(Some("heavy_shield")));
        assert_eq!(state.shield(), 80);
        assert!(!state.set_shield_type(Some("tower_shield")));
        assert_eq!(state.shield_type_id(), Some("heavy_shield"));
        assert!(state.set_shield_type(Some("")));
        assert_eq!(state.shield_type_id(), None);
        assert_eq!(state.shield(), 0);
        state.set_shield(30);
        assert_eq!(state.shield(), 0);
    }

    #[test]
    fn test_new_shots_reuse_last_weapon() {
        let mut state = state();
        let id = state.add_event(ActionKind::Shot);
        assert!(state.set_action(id, Action::Shot { weapon_id: "osprey".to_string() }));
        state.add_event(ActionKind::Heal);
        assert_eq!(state.last_used_weapon(), "osprey");

        let next = state.add_event(ActionKind::Shot);
        let TimelineEvent::Step(step) = state.timeline().last().unwrap() else {
            panic!("expected a step");
        };
        assert_eq!(step.id, next);
        assert_eq!(step.action, Action::Shot { weapon_id: "osprey".to_string() });
        assert_eq!(step.label, format!("Shot {}", next));
    }

    #[test]
    fn test_insert_split_after() {
        let mut state = state();
        state.add_event(ActionKind::Nothing);
        let split_id = state.insert_split_after(0);

        assert_eq!(state.timeline()[1].id(), split_id);
        let split = split_of(&state, split_id);
        assert_eq!(split.branches.len(), 2);
        assert_eq!(split.branches[1].label, "Option B");
        assert_eq!(state.paths().unwrap().len(), 2);
    }

    #[test]
    fn test_branch_editing_keeps_minimums() {
        let mut state = state();
        let split_id = state.insert_split_after(0);
        let first = split_of(&state, split_id).branches[0].id;

        assert!(!state.remove_branch(split_id, first), "two branches is the floor");
        let third = state.add_branch(split_id).unwrap();
        assert_eq!(split_of(&state, split_id).branches[2].label, "Option C");
        assert!(state.remove_branch(split_id, third));

        let only_step = split_of(&state, split_id).branches[0].steps[0].id;
        assert!(!state.remove_step_from_branch(split_id, first, only_step));
        let extra = state.add_step_to_branch(split_id, first, ActionKind::Heal).unwrap();
        assert!(state.set_repeat(extra, 3));
        assert!(state.remove_step_from_branch(split_id, first, only_step));
        assert_eq!(split_of(&state, split_id).branches[0].steps[0].repeat, 3);

        assert!(state.rename_branch(split_id, first, "Peek"));
        assert_eq!(split_of(&state, split_id).branches[0].label, "Peek");
        assert!(state.add_branch(999).is_none());
    }

    #[test]
    fn test_repeat_bounds() {
        let mut state = state();
        assert!(!state.set_repeat(1, 0));
        assert!(state.set_repeat(1, 4));
        assert!(!state.set_repeat(42, 2));
        assert!(state.set_repeat(1, MAX_REPEAT));
        assert!(!state.set_repeat(1, MAX_REPEAT + 1));
        assert!(!state.set_repeat(1, u32::MAX));
    }

    #[test]
    fn test_move_and_remove() {
        let mut state = state();
        let heal = state.add_event(ActionKind::Heal);
        assert!(state.move_event(1, 0));
        assert_eq!(state.timeline()[0].id(), heal);
        assert!(!state.move_event(0, 5));
        assert!(state.remove_event(heal));
        assert!(!state.remove_event(heal));
        assert_eq!(state.timeline().len(), 1);
    }

    #[test]
    fn test_paths_and_rankings_use_current_target() {
        let mut state = state();
        state.set_shield_type(None);
        let paths = state.paths().unwrap();
        assert_eq!(paths[0].last_point().unwrap().health, 60.0);

        let rankings = state.weapon_rankings().unwrap();
        assert_eq!(rankings[0].weapon.id, "il_toro");
        assert_eq!(rankings[0].estimate.shots, 2);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = state();
        state.set_health(20);
        state.set_separate(true);
        state.add_event(ActionKind::Nothing);
        state.reset();
        assert_eq!(state.health(), 100);
        assert!(!state.separate());
        assert_eq!(state.timeline().len(), 1);
        assert_eq!(state.next_id(), 2);
    }
}
