use crate::units::{CombatDialStep, DamageType, Marker, Unit};

use super::{DamageLevel, DIAL_POSITIONS};

/// One printed position of the dial as shown in the flat table view.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialColumn {
    pub position: u32,
    pub current: bool,
    /// Past the end of the printed steps.
    pub destroyed: bool,
    pub marker: Marker,
    pub primary: i32,
    pub secondary: i32,
    pub movement: i32,
    pub attack: i32,
    pub defense: i32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialTable {
    pub primary_damage_type: Option<DamageType>,
    pub secondary_damage_type: Option<DamageType>,
    pub columns: Vec<DialColumn>,
}

/// Lay the whole dial out as a table with one column per position. Columns
/// follow the order of the dial's steps, the same order damage resolves in;
/// positions past the last step show zeros.
pub fn dial_table(unit: &Unit, damage: DamageLevel) -> Option<DialTable> {
    let steps = unit.dial()?;
    let printed = steps.len() as u32;

    let columns = (1..=DIAL_POSITIONS)
        .map(|position| {
            let destroyed = position > printed;
            let step = steps.get(position as usize - 1);
            let value = |f: fn(&CombatDialStep) -> i32| step.map_or(0, f);
            DialColumn {
                position,
                current: position == damage.position(),
                destroyed,
                marker: step.map_or(Marker::None, |s| s.marker),
                primary: value(|s| s.primary_value),
                secondary: value(|s| s.secondary_value),
                movement: value(|s| s.movement_value),
                attack: value(|s| s.attack_value),
                defense: value(|s| s.defense_value),
            }
        })
        .collect();

    Some(DialTable {
        primary_damage_type: unit.primary_attack().map(|s| s.damage_type),
        secondary_damage_type: unit.secondary_attack().map(|s| s.damage_type),
        columns,
    })
}

#[cfg(test)]
mod test {
    use crate::{
        dial::{resolve_step, DamageLevel, DialState},
        units::{CombatDialStep, Marker, Unit},
    };

    use super::dial_table;

    #[test]
    fn test_table() {
        let mut unit = Unit::sample("Mech", 100);
        let mut steps = CombatDialStep::table(13);
        steps[2].marker = Marker::Green;
        unit.combat_dial = Some(steps);

        let table = dial_table(&unit, DamageLevel::new(2)).unwrap();
        assert_eq!(table.columns.len(), 18);
        assert!(table.columns[2].current);
        assert_eq!(table.columns.iter().filter(|c| c.current).count(), 1);
        assert_eq!(table.columns[2].marker, Marker::Green);
        assert_eq!(table.columns[0].primary, 17);
        assert_eq!(table.columns[4].primary, 13);

        // Positions 14..=18 are past the end.
        assert!(!table.columns[12].destroyed);
        assert!(table.columns[13].destroyed);
        assert_eq!(table.columns[13].primary, 0);
        assert_eq!(table.columns[13].marker, Marker::None);
        assert_eq!(table.columns.iter().filter(|c| c.destroyed).count(), 5);
        assert!(table.primary_damage_type.is_none());
    }

    #[test]
    fn test_table_matches_resolved_step() {
        // A record that skips step 5 in its numbering.
        let mut steps = CombatDialStep::table(14);
        steps.remove(4);
        let mut unit = Unit::sample("Mech", 100);
        unit.combat_dial = Some(steps.clone());

        for clicks in 0..13 {
            let damage = DamageLevel::new(clicks);
            let table = dial_table(&unit, damage).unwrap();
            let current = table.columns.iter().find(|c| c.current).unwrap();
            let Some(DialState::Active(step)) = resolve_step(&steps, damage, false) else {
                panic!("expected an active step at {clicks} clicks");
            };
            assert_eq!(current.primary, step.primary.value);
            assert_eq!(current.defense, step.defense.value);
            assert_eq!(current.marker, steps[clicks as usize].marker);
        }
    }

    #[test]
    fn test_no_dial() {
        let unit = Unit::sample("Infantry", 20);
        assert!(dial_table(&unit, DamageLevel::default()).is_none());
    }
}
