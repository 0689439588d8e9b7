//! Damage simulation.
//!
//! `shots_to_kill` answers the headline "how many shots" question for one
//! weapon against a static target. `Simulator::simulate` walks a full
//! timeline, forking every live path at each split, and returns one
//! trajectory per resulting path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::{Catalog, ShieldType, Weapon, FALLBACK_SHIELD_CAP, NO_SHIELD_MITIGATION};
use super::model::{Action, DataPoint, KillEstimate, Path, Step, TimelineEvent, MAX_REPEAT};

/// Upper bound for `shots_to_kill` unless configured otherwise.
pub const DEFAULT_MAX_SHOTS: u32 = 10_000;

/// Repeats above this collapse into a single "{n}x..." history entry.
const HISTORY_COLLAPSE_THRESHOLD: u32 = 2;

const MAX_HEALTH: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("unknown weapon `{0}`")]
    UnknownWeapon(String),
    #[error("unknown healing item `{0}`")]
    UnknownHealingItem(String),
    #[error("unknown shield item `{0}`")]
    UnknownShieldItem(String),
    #[error("weapon damage must be positive, got {0}")]
    NonPositiveDamage(f64),
    #[error("{field} is out of range: {value}")]
    InvalidInput { field: &'static str, value: f64 },
    #[error("target still alive after {0} shots")]
    ShotLimitExceeded(u32),
    #[error("catalog has no weapons")]
    EmptyCatalog,
}

/// What to do with timeline ids missing from the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownIdPolicy {
    /// Fail the whole run with the first unknown id.
    #[default]
    Reject,
    /// Unknown weapons become the first catalog weapon; unknown items are no-ops.
    Lenient,
}

/// Starting condition of the simulated player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub health: f64,
    pub shield: f64,
    pub mitigation_percent: f64,
    /// Shield recharges stop at this value.
    pub shield_cap: f64,
}

impl Target {
    pub fn new(health: f64, shield: f64, shield_type: Option<&ShieldType>) -> Self {
        Self {
            health,
            shield,
            mitigation_percent: shield_type.map_or(NO_SHIELD_MITIGATION, |s| s.mitigation_percent),
            shield_cap: shield_type.map_or(FALLBACK_SHIELD_CAP, |s| s.charge),
        }
    }

    /// Health and shield must start non-negative, with the shield no higher
    /// than its cap.
    fn validate(&self) -> Result<(), SimulationError> {
        check_non_negative("health", self.health)?;
        check_non_negative("shield cap", self.shield_cap)?;
        check_non_negative("shield", self.shield)?;
        if self.shield > self.shield_cap {
            return Err(SimulationError::InvalidInput {
                field: "shield",
                value: self.shield,
            });
        }
        check_mitigation(self.mitigation_percent)
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidInput { field, value })
    }
}

fn check_mitigation(value: f64) -> Result<(), SimulationError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(SimulationError::InvalidInput {
            field: "mitigation",
            value,
        })
    }
}

fn check_damage(damage: f64) -> Result<(), SimulationError> {
    if damage.is_finite() && damage > 0.0 {
        Ok(())
    } else {
        Err(SimulationError::NonPositiveDamage(damage))
    }
}

/// Apply one hit. Health takes the mitigated amount while the shield holds,
/// the shield itself always loses the full damage.
fn apply_hit(health: &mut f64, shield: &mut f64, damage: f64, mitigation_percent: f64) {
    if *shield > 0.0 {
        *health -= damage * (1.0 - mitigation_percent / 100.0);
        *shield = (*shield - damage).max(0.0);
    } else {
        *health -= damage;
    }
}

/// Fire `weapon_damage` at a target that never heals until health reaches
/// zero.
pub fn shots_to_kill(
    health: f64,
    shield_charge: f64,
    mitigation_percent: f64,
    weapon_damage: f64,
) -> Result<KillEstimate, SimulationError> {
    shots_to_kill_capped(
        health,
        shield_charge,
        mitigation_percent,
        weapon_damage,
        DEFAULT_MAX_SHOTS,
    )
}

pub fn shots_to_kill_capped(
    health: f64,
    shield_charge: f64,
    mitigation_percent: f64,
    weapon_damage: f64,
    max_shots: u32,
) -> Result<KillEstimate, SimulationError> {
    check_non_negative("health", health)?;
    check_non_negative("shield", shield_charge)?;
    check_mitigation(mitigation_percent)?;
    check_damage(weapon_damage)?;

    let mut health = health;
    let mut shield = shield_charge;
    let mut shots = 0;
    let mut shield_break_shot = None;

    while health > 0.0 {
        if shots == max_shots {
            return Err(SimulationError::ShotLimitExceeded(max_shots));
        }
        shots += 1;
        let had_shield = shield > 0.0;
        apply_hit(&mut health, &mut shield, weapon_damage, mitigation_percent);
        if had_shield && shield <= 0.0 && shield_break_shot.is_none() {
            shield_break_shot = Some(shots);
        }
    }

    Ok(KillEstimate {
        shots,
        shield_break_shot,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeaponRanking<'a> {
    pub weapon: &'a Weapon,
    pub estimate: KillEstimate,
}

/// Shots-to-kill for every catalog weapon, fewest shots first.
pub fn rank_weapons<'a>(
    catalog: &'a Catalog,
    target: &Target,
    max_shots: u32,
) -> Result<Vec<WeaponRanking<'a>>, SimulationError> {
    target.validate()?;
    let mut rankings = catalog
        .weapons
        .iter()
        .map(|weapon| {
            shots_to_kill_capped(
                target.health,
                target.shield,
                target.mitigation_percent,
                weapon.damage,
                max_shots,
            )
            .map(|estimate| WeaponRanking { weapon, estimate })
        })
        .collect::<Result<Vec<_>, _>>()?;
    rankings.sort_by(|a, b| {
        a.estimate
            .shots
            .cmp(&b.estimate.shots)
            .then_with(|| b.weapon.damage.total_cmp(&a.weapon.damage))
    });
    Ok(rankings)
}

/// Timeline simulation against one catalog.
#[derive(Debug, Clone, Copy)]
pub struct Simulator<'a> {
    catalog: &'a Catalog,
    policy: UnknownIdPolicy,
}

impl<'a> Simulator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            policy: UnknownIdPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UnknownIdPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Run the timeline from `target` and return every resulting path.
    pub fn simulate(
        &self,
        target: &Target,
        timeline: &[TimelineEvent],
    ) -> Result<Vec<Path>, SimulationError> {
        target.validate()?;
        self.validate_timeline(timeline)?;

        let mut paths = vec![Path::start(target.health, target.shield)];

        for (position, event) in timeline.iter().enumerate() {
            match event {
                TimelineEvent::Step(step) => {
                    for path in &mut paths {
                        self.apply_step(path, step, position + 1, target);
                    }
                }
                TimelineEvent::Split(split) => {
                    let mut forked = Vec::with_capacity(paths.len() * split.branches.len());
                    for path in &paths {
                        for branch in &split.branches {
                            let mut fork = path.clone();
                            fork.history.push(branch.label.clone());
                            for (offset, step) in branch.steps.iter().enumerate() {
                                self.apply_step(&mut fork, step, position + offset + 1, target);
                            }
                            forked.push(fork);
                        }
                    }
                    paths = forked;
                }
            }
        }

        for path in &mut paths {
            path.label = if path.history.is_empty() {
                "No events".to_string()
            } else {
                path.history.join(" > ")
            };
        }

        log::debug!(
            "simulated {} events into {} paths",
            timeline.len(),
            paths.len()
        );
        Ok(paths)
    }

    fn validate_timeline(&self, timeline: &[TimelineEvent]) -> Result<(), SimulationError> {
        if self.catalog.weapons.is_empty() {
            return Err(SimulationError::EmptyCatalog);
        }
        for step in timeline.iter().flat_map(steps_of) {
            if step.repeat > MAX_REPEAT {
                return Err(SimulationError::InvalidInput {
                    field: "repeat",
                    value: f64::from(step.repeat),
                });
            }
            match &step.action {
                Action::Shot { weapon_id } => match self.catalog.weapon(weapon_id) {
                    Some(weapon) => check_damage(weapon.damage)?,
                    None if self.policy == UnknownIdPolicy::Reject => {
                        return Err(SimulationError::UnknownWeapon(weapon_id.clone()))
                    }
                    None => check_damage(self.catalog.weapons[0].damage)?,
                },
                Action::Heal { item_id } => {
                    if self.policy == UnknownIdPolicy::Reject
                        && self.catalog.healing_item(item_id).is_none()
                    {
                        return Err(SimulationError::UnknownHealingItem(item_id.clone()));
                    }
                }
                Action::ShieldRecharge { item_id } => {
                    if self.policy == UnknownIdPolicy::Reject
                        && self.catalog.shield_item(item_id).is_none()
                    {
                        return Err(SimulationError::UnknownShieldItem(item_id.clone()));
                    }
                }
                Action::Nothing => {}
            }
        }
        Ok(())
    }

    /// Unknown weapons fall back to the first catalog entry. Only reachable
    /// under the lenient policy; validation guarantees a non-empty catalog.
    fn resolve_weapon(&self, weapon_id: &str) -> &'a Weapon {
        let catalog = self.catalog;
        catalog.weapon(weapon_id).unwrap_or_else(|| {
            log::warn!("unknown weapon `{}`, using `{}`", weapon_id, catalog.weapons[0].id);
            &catalog.weapons[0]
        })
    }

    fn apply_step(&self, path: &mut Path, step: &Step, event_index: usize, target: &Target) {
        if !path.is_dead() {
            self.apply_action(path, step, event_index, target);
        }

        path.data.push(DataPoint {
            event_index,
            health: path.health.max(0.0),
            shield: path.shield,
            total_hp: (path.health + path.shield).max(0.0),
            label: step.label.clone(),
        });
    }

    fn apply_action(&self, path: &mut Path, step: &Step, event_index: usize, target: &Target) {
        let repeat = step.repeat.max(1);
        match &step.action {
            Action::Shot { weapon_id } => {
                let weapon = self.resolve_weapon(weapon_id);
                let description = format!("shot ({})", weapon.name);
                for fired in 0..repeat {
                    if path.is_dead() {
                        break;
                    }
                    path.shots_taken += 1;
                    apply_hit(
                        &mut path.health,
                        &mut path.shield,
                        weapon.damage,
                        target.mitigation_percent,
                    );
                    if path.is_dead() && path.death_event_index.is_none() {
                        path.death_event_index = Some(event_index);
                    }
                    record_history(path, &description, repeat, fired);
                }
            }
            Action::Heal { item_id } => match self.catalog.healing_item(item_id) {
                Some(item) => {
                    let description = format!("heal ({})", item.name);
                    for applied in 0..repeat {
                        path.health = (path.health + item.healing).min(MAX_HEALTH);
                        record_history(path, &description, repeat, applied);
                    }
                }
                None => log::warn!("unknown healing item `{}` ignored", item_id),
            },
            Action::ShieldRecharge { item_id } => match self.catalog.shield_item(item_id) {
                Some(item) => {
                    let description = format!("shield ({})", item.name);
                    for applied in 0..repeat {
                        path.shield = (path.shield + item.shield_restore).min(target.shield_cap);
                        record_history(path, &description, repeat, applied);
                    }
                }
                None => log::warn!("unknown shield item `{}` ignored", item_id),
            },
            Action::Nothing => {
                for waited in 0..repeat {
                    record_history(path, "nothing", repeat, waited);
                }
            }
        }
    }
}

fn steps_of(event: &TimelineEvent) -> Box<dyn Iterator<Item = &Step> + '_> {
    match event {
        TimelineEvent::Step(step) => Box::new(std::iter::once(step)),
        TimelineEvent::Split(split) => Box::new(split.branches.iter().flat_map(|b| b.steps.iter())),
    }
}

/// Short repeats log every application; longer ones log a single
/// "{n}x..." entry on the first application.
fn record_history(path: &mut Path, description: &str, repeat: u32, applied: u32) {
    if repeat <= HISTORY_COLLAPSE_THRESHOLD {
        path.history.push(description.to_string());
    } else if applied == 0 {
        path.history.push(format!("{}x{}", repeat, description));
    }
}

/// Simulate with the built-in catalog, no shield type cap and strict id
/// checking.
pub fn simulate(
    initial_health: f64,
    initial_shield: f64,
    mitigation_percent: f64,
    timeline: &[TimelineEvent],
) -> Result<Vec<Path>, SimulationError> {
    let target = Target {
        health: initial_health,
        shield: initial_shield,
        mitigation_percent,
        shield_cap: FALLBACK_SHIELD_CAP,
    };
    Simulator::new(Catalog::builtin()).simulate(&target, timeline)
}
