use crate::units::{CombatDialStep, Marker, Unit};

use colors::{damage_shade, CellColor, Rgb};
use layout::{compute_layout, value_offset, LayoutPlan};
use table::{dial_table, DialTable};

pub mod colors;
pub mod handlers;
pub mod layout;
pub mod table;

/// Printed positions on a physical dial.
pub const DIAL_POSITIONS: u32 = 18;
pub const MAX_DAMAGE: u32 = DIAL_POSITIONS - 1;

/// Damage clicks taken, 0 (undamaged) to 17.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct DamageLevel(u32);

impl DamageLevel {
    /// Clamps to the dial's range.
    pub fn new(clicks: u32) -> Self {
        Self(clicks.min(MAX_DAMAGE))
    }

    pub fn clicks(self) -> u32 {
        self.0
    }

    /// 1-based position shown to the player.
    pub fn position(self) -> u32 {
        self.0 + 1
    }

    pub fn damaged(self) -> Self {
        Self::new(self.0 + 1)
    }

    pub fn repaired(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// How far along the dial, from 0 to 1.
    fn intensity(self) -> f64 {
        self.0 as f64 / MAX_DAMAGE as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCell {
    pub value: i32,
    pub color: CellColor,
    pub label_offset_x: f64,
}

impl StatCell {
    fn new(value: i32, meaning_id: Option<&str>, defense: bool) -> Self {
        Self {
            value,
            color: CellColor::for_meaning(meaning_id),
            label_offset_x: value_offset(value, defense),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct MarkerView {
    pub visible: bool,
    pub color: Rgb,
}

impl From<Marker> for MarkerView {
    fn from(marker: Marker) -> Self {
        match marker {
            Marker::None => MarkerView {
                visible: false,
                color: Rgb::WHITE,
            },
            Marker::Black => MarkerView {
                visible: true,
                color: Rgb::BLACK,
            },
            Marker::Green => MarkerView {
                visible: true,
                color: Rgb::GREEN,
            },
            Marker::Unknown => MarkerView {
                visible: true,
                color: Rgb::WHITE,
            },
        }
    }
}

/// Values and colours showing in the dial window at one damage level.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStep {
    pub step: u32,
    pub primary: StatCell,
    /// Absent when the unit has no secondary attack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<StatCell>,
    pub movement: StatCell,
    pub attack: StatCell,
    pub defense: StatCell,
    pub marker: MarkerView,
}

impl ResolvedStep {
    fn new(step: &CombatDialStep, has_secondary: bool) -> Self {
        Self {
            step: step.step,
            primary: StatCell::new(
                step.primary_value,
                step.primary_equip_color_meaning_id.as_deref(),
                false,
            ),
            secondary: has_secondary.then(|| {
                StatCell::new(
                    step.secondary_value,
                    step.secondary_equip_color_meaning_id.as_deref(),
                    false,
                )
            }),
            movement: StatCell::new(
                step.movement_value,
                step.movement_equip_color_meaning_id.as_deref(),
                false,
            ),
            attack: StatCell::new(
                step.attack_value,
                step.attack_equip_color_meaning_id.as_deref(),
                false,
            ),
            defense: StatCell::new(
                step.defense_value,
                step.defense_equip_color_meaning_id.as_deref(),
                true,
            ),
            marker: step.marker.into(),
        }
    }
}

/// Warning colours for units without a dial table.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressiveDamage {
    pub primary: CellColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<CellColor>,
    pub movement: CellColor,
    pub attack: CellColor,
    pub defense: CellColor,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(
    tag = "state",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum DialState {
    Active(ResolvedStep),
    /// The dial has run past its printed steps. `death_click` counts from 1
    /// out of `of` remaining positions.
    Destroyed { death_click: u32, of: u32 },
    NoDial(ProgressiveDamage),
}

/// Colour a stat turns once a unit without a dial has taken `clicks` damage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    pub clicks: u32,
    pub base: Rgb,
}

impl Threshold {
    const fn new(clicks: u32, base: Rgb) -> Self {
        Self { clicks, base }
    }
}

/// Progressive damage colouring for units with no dial table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallbackPolicy {
    pub primary: Threshold,
    pub secondary: Threshold,
    pub movement: Threshold,
    pub attack: Threshold,
    pub defense: Threshold,
    /// Brightness of a warning colour on an undamaged unit.
    pub intensity_floor: f64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            primary: Threshold::new(6, Rgb::RED),
            secondary: Threshold::new(7, Rgb::ORANGE_RED),
            movement: Threshold::new(3, Rgb::YELLOW),
            attack: Threshold::new(4, Rgb::RED),
            defense: Threshold::new(5, Rgb::ORANGE),
            intensity_floor: 0.3,
        }
    }
}

impl FallbackPolicy {
    fn cell(&self, threshold: Threshold, damage: DamageLevel) -> CellColor {
        if damage.clicks() >= threshold.clicks {
            CellColor::filled(damage_shade(
                threshold.base,
                damage.intensity(),
                self.intensity_floor,
            ))
        } else {
            CellColor::NONE
        }
    }

    pub fn progressive(&self, damage: DamageLevel, has_secondary: bool) -> ProgressiveDamage {
        ProgressiveDamage {
            primary: self.cell(self.primary, damage),
            secondary: has_secondary.then(|| self.cell(self.secondary, damage)),
            movement: self.cell(self.movement, damage),
            attack: self.cell(self.attack, damage),
            defense: self.cell(self.defense, damage),
        }
    }
}

/// Look up the step showing at `damage`. None when the table is empty.
pub fn resolve_step(
    dial: &[CombatDialStep],
    damage: DamageLevel,
    has_secondary: bool,
) -> Option<DialState> {
    let printed = dial.len() as u32;
    if printed == 0 {
        return None;
    }
    if damage.clicks() >= printed {
        return Some(DialState::Destroyed {
            death_click: damage.clicks() - printed + 1,
            of: DIAL_POSITIONS.saturating_sub(printed),
        });
    }

    let index = damage.clicks().min(printed - 1) as usize;
    Some(DialState::Active(ResolvedStep::new(&dial[index], has_secondary)))
}

pub fn resolve(unit: &Unit, damage: DamageLevel, policy: &FallbackPolicy) -> DialState {
    let has_secondary = unit.secondary_attack().is_some();
    unit.dial()
        .and_then(|dial| resolve_step(dial, damage, has_secondary))
        .unwrap_or_else(|| DialState::NoDial(policy.progressive(damage, has_secondary)))
}

/// Everything needed to draw the dial for one unit at its current damage.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialView {
    pub unit_id: String,
    pub damage_level: DamageLevel,
    pub position: u32,
    pub positions: u32,
    pub state: DialState,
    pub layout: LayoutPlan,
    pub table: Option<DialTable>,
}

/// The unit being inspected and how much damage it has taken.
pub struct DialSession {
    unit: Unit,
    damage: DamageLevel,
    policy: FallbackPolicy,
}

impl DialSession {
    pub fn new(unit: Unit, policy: FallbackPolicy) -> Self {
        Self::resume(unit, DamageLevel::default(), policy)
    }

    /// Pick up a session at a known damage level.
    pub fn resume(unit: Unit, damage: DamageLevel, policy: FallbackPolicy) -> Self {
        Self {
            unit,
            damage,
            policy,
        }
    }

    /// Switch to another unit. Damage starts over.
    pub fn select(&mut self, unit: Unit) -> DialState {
        self.unit = unit;
        self.damage = DamageLevel::default();
        self.state()
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn damage(&self) -> DamageLevel {
        self.damage
    }

    pub fn state(&self) -> DialState {
        resolve(&self.unit, self.damage, &self.policy)
    }

    /// Does nothing at full damage.
    pub fn apply_damage(&mut self) -> DialState {
        self.damage = self.damage.damaged();
        self.state()
    }

    /// Does nothing when undamaged.
    pub fn apply_repair(&mut self) -> DialState {
        self.damage = self.damage.repaired();
        self.state()
    }

    pub fn view(&self) -> DialView {
        DialView {
            unit_id: self.unit.id.clone(),
            damage_level: self.damage,
            position: self.damage.position(),
            positions: DIAL_POSITIONS,
            state: self.state(),
            layout: compute_layout(&self.unit),
            table: dial_table(&self.unit, self.damage),
        }
    }
}
