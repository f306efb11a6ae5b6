use std::collections::HashMap;

pub mod catalog;
pub mod collection;
pub mod handlers;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Rank {
    Elite,
    Veteran,
    Green,
    #[default]
    #[serde(other)]
    NA,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackType {
    Primary,
    Secondary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Ballistic,
    Energetic,
    Melee,
}

/// Triangular indicator printed next to some dial steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    None,
    Black,
    Green,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackStat {
    pub attack_type: AttackType,
    pub damage_type: DamageType,
    pub target_count: u32,
    pub min_range: i32,
    pub max_range: i32,
}

/// One printed position of a combat dial. Steps are numbered from 1.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CombatDialStep {
    pub step: u32,
    pub marker: Marker,
    pub primary_value: i32,
    pub secondary_value: i32,
    pub movement_value: i32,
    pub attack_value: i32,
    pub defense_value: i32,
    pub primary_equip_color_meaning_id: Option<String>,
    pub secondary_equip_color_meaning_id: Option<String>,
    pub movement_equip_color_meaning_id: Option<String>,
    pub attack_equip_color_meaning_id: Option<String>,
    pub defense_equip_color_meaning_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub variant: String,
    pub faction: String,
    pub expansion: String,
    #[serde(deserialize_with = "lenient_number")]
    pub collection_number: u32,
    pub is_unique: bool,
    pub rank: Rank,

    #[serde(rename = "type")]
    pub unit_type: String,
    pub speed_mode: String,
    #[serde(rename = "class")]
    pub unit_class: String,

    pub points: u32,
    pub health: u32,
    pub max_attack: i32,
    pub max_defense: i32,
    pub max_damage: i32,
    pub max_speed: i32,
    pub vent_capacity: i32,

    /// Degrees, transported as strings.
    pub front_arc: String,
    pub rear_arc: String,

    pub image_url: String,

    pub attack_stats: Option<Vec<AttackStat>>,
    #[serde(deserialize_with = "patched_dial")]
    pub combat_dial: Option<Vec<CombatDialStep>>,
}

/// Collection files written by older releases store some numbers as text.
fn lenient_number<'de, D: serde::Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
        Nothing(()),
    }

    Ok(match <Raw as serde::Deserialize>::deserialize(d)? {
        Raw::Number(n) => n,
        Raw::Text(s) => s.trim().parse().unwrap_or(0),
        Raw::Nothing(()) => 0,
    })
}

/// Null entries in a dial table repeat the step before them, so a damaged
/// record still yields a contiguous table.
fn patched_dial<'de, D: serde::Deserializer<'de>>(
    d: D,
) -> Result<Option<Vec<CombatDialStep>>, D::Error> {
    let raw: Option<Vec<Option<CombatDialStep>>> = serde::Deserialize::deserialize(d)?;
    Ok(raw.map(|steps| {
        let mut last = CombatDialStep::default();
        steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| {
                let step = step.unwrap_or_else(|| CombatDialStep {
                    step: i as u32 + 1,
                    ..last.clone()
                });
                last = step.clone();
                step
            })
            .collect()
    }))
}

fn parse_degrees(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(0.0)
}

impl Unit {
    pub fn front_arc(&self) -> f64 {
        parse_degrees(&self.front_arc)
    }

    pub fn rear_arc(&self) -> f64 {
        parse_degrees(&self.rear_arc)
    }

    fn attack(&self, attack_type: AttackType) -> Option<&AttackStat> {
        self.attack_stats
            .as_deref()?
            .iter()
            .find(|s| s.attack_type == attack_type)
    }

    pub fn primary_attack(&self) -> Option<&AttackStat> {
        self.attack(AttackType::Primary)
    }

    pub fn secondary_attack(&self) -> Option<&AttackStat> {
        self.attack(AttackType::Secondary)
    }

    /// Non-empty combat dial table, if the unit carries one.
    pub fn dial(&self) -> Option<&[CombatDialStep]> {
        self.combat_dial.as_deref().filter(|d| !d.is_empty())
    }

    #[cfg(test)]
    pub fn sample(unit_type: &str, points: u32) -> Self {
        static ID: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(1);

        let id = ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Self {
            id: format!("unit-{id}"),
            name: format!("Unit {id}"),
            variant: "A".to_string(),
            faction: "Test Faction".to_string(),
            expansion: "TST".to_string(),
            collection_number: id as u32,
            unit_type: unit_type.to_string(),
            points,
            front_arc: "180".to_string(),
            rear_arc: "90".to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
impl CombatDialStep {
    pub fn sample(step: u32) -> Self {
        let v = 18 - step as i32;
        Self {
            step,
            primary_value: v,
            secondary_value: v - 1,
            movement_value: v + 1,
            attack_value: v / 2,
            defense_value: v / 3,
            ..Default::default()
        }
    }

    pub fn table(len: u32) -> Vec<Self> {
        (1..=len).map(Self::sample).collect()
    }
}

/// Criteria for narrowing a unit list. Empty criteria match everything. Point
/// bounds are kept as text so exported documents round-trip unchanged.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitFilters {
    pub factions: Vec<String>,
    pub expansions: Vec<String>,
    #[serde(rename = "type")]
    pub unit_type: String,
    pub min_points: String,
    pub max_points: String,
    pub search: String,
}

impl UnitFilters {
    fn bound(s: &str) -> Option<u32> {
        s.trim().parse().ok()
    }

    pub fn matches(&self, unit: &Unit) -> bool {
        let search = self.search.to_lowercase();

        (self.unit_type.is_empty() || unit.unit_type == self.unit_type)
            && Self::bound(&self.min_points).map_or(true, |min| unit.points >= min)
            && Self::bound(&self.max_points).map_or(true, |max| unit.points <= max)
            && (search.is_empty()
                || unit.name.to_lowercase().contains(&search)
                || unit.variant.to_lowercase().contains(&search))
            && (self.factions.is_empty() || self.factions.contains(&unit.faction))
            && (self.expansions.is_empty() || self.expansions.contains(&unit.expansion))
    }
}

pub struct UnitDatabase {
    id_to_unit: HashMap<String, Unit>,
}

impl UnitDatabase {
    pub fn new() -> Self {
        Self {
            id_to_unit: HashMap::new(),
        }
    }

    pub fn add(&mut self, unit: Unit) {
        self.id_to_unit.insert(unit.id.clone(), unit);
    }

    pub fn get(&self, id: &str) -> Option<&Unit> {
        self.id_to_unit.get(id)
    }

    pub fn size(&self) -> usize {
        self.id_to_unit.len()
    }

    /// Units matching the filters, ordered by name.
    pub fn search(&self, filters: &UnitFilters) -> Vec<&Unit> {
        let mut units: Vec<&Unit> = self
            .id_to_unit
            .values()
            .filter(|u| filters.matches(u))
            .collect();
        units.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        units
    }
}
