//! Static game data: weapons, consumables and shield types.
//!
//! Values come from the Arc Raiders wiki. The built-in tables are built once
//! and shared read-only for the lifetime of the process.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Mitigation applies only while the shield still has charge.
pub const NO_SHIELD_MITIGATION: f64 = 0.0;

/// Recharge cap used when no shield type is equipped.
pub const FALLBACK_SHIELD_CAP: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponClass {
    AssaultRifle,
    BattleRifle,
    SubmachineGun,
    Shotgun,
    Pistol,
    LightMachineGun,
    SniperRifle,
    Special,
}

impl WeaponClass {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AssaultRifle => "Assault Rifle",
            Self::BattleRifle => "Battle Rifle",
            Self::SubmachineGun => "Submachine Gun",
            Self::Shotgun => "Shotgun",
            Self::Pistol => "Pistol",
            Self::LightMachineGun => "Light Machine Gun",
            Self::SniperRifle => "Sniper Rifle",
            Self::Special => "Special",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireMode {
    Single,
    Burst,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmmoType {
    Light,
    Medium,
    Heavy,
    Shotgun,
    EnergyClip,
}

/// How a consumable delivers its effect. Informational only: the engine
/// applies the full amount at once regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationMode {
    Instant,
    OverTime,
    Continuous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub class: WeaponClass,
    /// Damage per shot before shield mitigation.
    pub damage: f64,
    pub fire_mode: FireMode,
    pub ammo: AmmoType,
    /// Effective range in metres.
    pub range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingItem {
    pub id: String,
    pub name: String,
    pub healing: f64,
    pub mode: ApplicationMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShieldItem {
    pub id: String,
    pub name: String,
    pub shield_restore: f64,
    pub mode: ApplicationMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShieldType {
    pub id: String,
    pub name: String,
    /// Maximum shield charge.
    pub charge: f64,
    /// Percent of incoming damage kept off health while charge remains.
    pub mitigation_percent: f64,
    pub movement_speed_modifier: f64,
    pub description: String,
}

/// Lookup tables the engine resolves event ids against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub weapons: Vec<Weapon>,
    pub healing_items: Vec<HealingItem>,
    pub shield_items: Vec<ShieldItem>,
    pub shield_types: Vec<ShieldType>,
}

lazy_static! {
    static ref BUILTIN: Catalog = Catalog::builtin_tables();
}

impl Catalog {
    /// The shared built-in tables.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn weapon(&self, id: &str) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn healing_item(&self, id: &str) -> Option<&HealingItem> {
        self.healing_items.iter().find(|h| h.id == id)
    }

    pub fn shield_item(&self, id: &str) -> Option<&ShieldItem> {
        self.shield_items.iter().find(|s| s.id == id)
    }

    pub fn shield_type(&self, id: &str) -> Option<&ShieldType> {
        self.shield_types.iter().find(|s| s.id == id)
    }

    /// Weapons ordered by damage, hardest hitting first.
    pub fn weapons_by_damage(&self) -> Vec<&Weapon> {
        let mut weapons: Vec<&Weapon> = self.weapons.iter().collect();
        weapons.sort_by(|a, b| b.damage.total_cmp(&a.damage));
        weapons
    }

    fn builtin_tables() -> Self {
        use AmmoType::{EnergyClip, Heavy, Light, Medium};
        use ApplicationMode::{Continuous, Instant, OverTime};
        use FireMode::{Auto, Burst, Single};
        use WeaponClass::*;

        let weapon = |id: &str, name: &str, class, damage, fire_mode, ammo, range| Weapon {
            id: id.to_string(),
            name: name.to_string(),
            class,
            damage,
            fire_mode,
            ammo,
            range,
        };
        let heal = |id: &str, name: &str, healing, mode| HealingItem {
            id: id.to_string(),
            name: name.to_string(),
            healing,
            mode,
        };
        let recharge = |id: &str, name: &str, shield_restore, mode| ShieldItem {
            id: id.to_string(),
            name: name.to_string(),
            shield_restore,
            mode,
        };
        let shield = |id: &str,
                      name: &str,
                      charge,
                      mitigation_percent,
                      movement_speed_modifier,
                      description: &str| ShieldType {
            id: id.to_string(),
            name: name.to_string(),
            charge,
            mitigation_percent,
            movement_speed_modifier,
            description: description.to_string(),
        };

        Self {
            weapons: vec![
                weapon("kettle", "Kettle", AssaultRifle, 10.0, Single, Light, 42.8),
                weapon("rattler", "Rattler", AssaultRifle, 9.0, Auto, Medium, 56.2),
                weapon("arpeggio", "Arpeggio", AssaultRifle, 9.5, Burst, Medium, 55.9),
                weapon("tempest", "Tempest", AssaultRifle, 10.0, Auto, Medium, 55.9),
                weapon("bettina", "Bettina", AssaultRifle, 14.0, Auto, Heavy, 51.3),
                weapon("ferro", "Ferro", BattleRifle, 40.0, Single, Heavy, 53.1),
                weapon("renegade", "Renegade", BattleRifle, 35.0, Single, Medium, 68.8),
                weapon("stitcher", "Stitcher", SubmachineGun, 7.0, Auto, Light, 42.1),
                weapon("bobcat", "Bobcat", SubmachineGun, 6.0, Auto, Light, 44.0),
                weapon("il_toro", "Il Toro", Shotgun, 67.5, Single, AmmoType::Shotgun, 20.0),
                weapon("vulcano", "Vulcano", Shotgun, 49.5, Single, AmmoType::Shotgun, 26.0),
                weapon("hairpin", "Hairpin", Pistol, 20.0, Single, Light, 38.6),
                weapon("burletta", "Burletta", Pistol, 10.0, Single, Light, 41.7),
                weapon("anvil", "Anvil", Pistol, 40.0, Single, Heavy, 50.2),
                weapon("venator", "Venator", Pistol, 18.0, Single, Medium, 48.4),
                weapon("torrente", "Torrente", LightMachineGun, 8.0, Auto, Medium, 49.9),
                weapon("osprey", "Osprey", SniperRifle, 45.0, Single, Medium, 80.3),
                weapon("jupiter", "Jupiter", SniperRifle, 55.0, Single, EnergyClip, 71.7),
                weapon("equalizer", "Equalizer", Special, 8.0, Auto, EnergyClip, 68.6),
            ],
            healing_items: vec![
                heal("vita_shot", "Vita Shot", 50.0, Instant),
                heal("sterilized_bandage", "Sterilized Bandage", 50.0, OverTime),
                heal("herbal_bandage", "Herbal Bandage", 35.0, OverTime),
                heal("fruit_mix", "Fruit Mix", 25.0, Instant),
                heal("bandage", "Bandage", 20.0, OverTime),
                heal("vita_spray", "Vita Spray", 15.0, Continuous),
                heal("expired_pasta", "Expired Pasta", 15.0, Instant),
                heal("mushroom", "Mushroom", 15.0, Instant),
                heal("agave", "Agave", 10.0, OverTime),
                heal("fabric", "Fabric", 10.0, OverTime),
                heal("moss", "Moss", 10.0, OverTime),
                heal("resin", "Resin", 10.0, OverTime),
            ],
            shield_items: vec![
                recharge("surge_shield_recharger", "Surge Shield Recharger", 50.0, Instant),
                recharge("shield_recharger", "Shield Recharger", 40.0, OverTime),
                recharge("arc_powercell", "ARC Powercell", 20.0, OverTime),
            ],
            shield_types: vec![
                shield(
                    "light_shield",
                    "Light Shield",
                    40.0,
                    40.0,
                    0.0,
                    "Low protection, no mobility penalty",
                ),
                shield(
                    "medium_shield",
                    "Medium Shield",
                    70.0,
                    42.5,
                    -5.0,
                    "Balanced protection, 5% speed reduction",
                ),
                shield(
                    "heavy_shield",
                    "Heavy Shield",
                    80.0,
                    52.5,
                    -15.0,
                    "Maximum protection, 15% speed reduction",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookups() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.weapons.len(), 19);
        assert_eq!(catalog.weapon("ferro").map(|w| w.damage), Some(40.0));
        assert_eq!(catalog.healing_item("bandage").map(|h| h.healing), Some(20.0));
        assert_eq!(
            catalog.shield_item("shield_recharger").map(|s| s.shield_restore),
            Some(40.0)
        );
        assert!(catalog.weapon("railgun").is_none());
    }

    #[test]
    fn test_shield_types_match_wiki() {
        let catalog = Catalog::builtin();
        let medium = catalog.shield_type("medium_shield").expect("medium shield");
        assert_eq!(medium.charge, 70.0);
        assert_eq!(medium.mitigation_percent, 42.5);
        assert!(catalog.shield_type("").is_none());
    }

    #[test]
    fn test_every_builtin_weapon_deals_damage() {
        for weapon in &Catalog::builtin().weapons {
            assert!(weapon.damage > 0.0, "{} has no damage", weapon.id);
            assert!(!weapon.class.display_name().is_empty());
        }
    }

    #[test]
    fn test_weapons_by_damage_descending() {
        let sorted = Catalog::builtin().weapons_by_damage();
        assert_eq!(sorted[0].id, "il_toro");
        assert!(sorted.windows(2).all(|pair| pair[0].damage >= pair[1].damage));
    }
}
