use std::fmt::Display;

use chrono::{DateTime, Utc};

use crate::units::Unit;

pub mod boosters;
pub mod config;
pub mod handlers;
pub mod random;
pub mod server;
pub mod store;

pub const MAX_PLAYERS: u32 = 64;
pub const MAX_BOOSTERS_PER_PLAYER: u32 = 64;
/// Most unit copies a single draft pool may hold.
pub const MAX_POOL_COPIES: u64 = 100_000;

/// How many units of one type go into a single booster opening.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoosterConfig {
    pub unit_type: String,
    pub quantity: u32,
}

impl BoosterConfig {
    fn new(unit_type: &str, quantity: u32) -> Self {
        Self {
            unit_type: unit_type.to_string(),
            quantity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSettings {
    pub number_of_players: u32,
    pub boosters_per_player: u32,
    pub booster_configs: Vec<BoosterConfig>,
    #[serde(default)]
    pub use_collection: bool,
    #[serde(default)]
    pub respect_filters: bool,
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            number_of_players: 2,
            boosters_per_player: 3,
            booster_configs: vec![
                BoosterConfig::new("Infantry", 3),
                BoosterConfig::new("Vehicle", 1),
                BoosterConfig::new("Mech", 1),
            ],
            use_collection: false,
            respect_filters: false,
        }
    }
}

impl DraftSettings {
    /// Number of unit slots the draft will try to fill.
    pub fn requested_slots(&self) -> u64 {
        let per_booster: u64 = self
            .booster_configs
            .iter()
            .map(|c| u64::from(c.quantity))
            .fold(0, u64::saturating_add);
        u64::from(self.number_of_players)
            .saturating_mul(u64::from(self.boosters_per_player))
            .saturating_mul(per_booster)
    }
}

/// A selectable unit and how many physical copies of it are in the pool.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DraftUnitWithQuantity {
    pub unit: Unit,
    pub quantity: u32,
}

/// The part of a unit carried into a draft result. Each drafted copy is
/// distinct, so quantity is always 1.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftedUnit {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub unit_type: String,
    pub points: u32,
    pub faction: String,
    pub expansion: String,
    pub collection_number: u32,
    pub quantity: u32,
}

impl From<&Unit> for DraftedUnit {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id.clone(),
            name: unit.name.clone(),
            unit_type: unit.unit_type.clone(),
            points: unit.points,
            faction: unit.faction.clone(),
            expansion: unit.expansion.clone(),
            collection_number: unit.collection_number,
            quantity: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResult {
    pub player_id: u32,
    pub player_name: String,
    pub units: Vec<DraftedUnit>,
    pub total_points: u32,
}

impl DraftResult {
    fn new(player_id: u32) -> Self {
        Self {
            player_id,
            player_name: format!("Player {player_id}"),
            units: Vec::new(),
            total_points: 0,
        }
    }

    fn receive(&mut self, unit: DraftedUnit) {
        self.total_points = self.total_points.saturating_add(unit.points);
        self.units.push(unit);
    }
}

/// A finalised draft as persisted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub settings: DraftSettings,

    // Records written before pools were stored lack this field.
    #[serde(default)]
    pub available_units: Vec<DraftUnitWithQuantity>,
    pub results: Vec<DraftResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    pub fn create(
        name: String,
        description: Option<String>,
        settings: DraftSettings,
        available_units: Vec<DraftUnitWithQuantity>,
        results: Vec<DraftResult>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description: description.filter(|d| !d.trim().is_empty()),
            settings,
            available_units,
            results,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of a request to generate a draft, over HTTP or the websocket.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub settings: DraftSettings,
    pub available_units: Vec<DraftUnitWithQuantity>,
}

impl DraftRequest {
    pub fn finish(self, results: Vec<DraftResult>) -> Draft {
        Draft::create(
            self.name,
            self.description,
            self.settings,
            self.available_units,
            results,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftError {
    /// The pool holds no unit copies.
    NoUnitsSelected,
    NoPlayers,
    NoBoosters,
    TooManyPlayers,
    TooManyBoosters,
    PoolTooLarge,
    /// Weighted selection was asked to choose from nothing. Unreachable while
    /// the generator checks candidates first.
    EmptySelection,
}

impl Display for DraftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftError::NoUnitsSelected => write!(f, "Select at least one unit for the draft."),
            DraftError::NoPlayers => write!(f, "A draft needs at least one player."),
            DraftError::NoBoosters => write!(f, "Each player needs at least one booster."),
            DraftError::TooManyPlayers => {
                write!(f, "A draft can have at most {MAX_PLAYERS} players.")
            }
            DraftError::TooManyBoosters => write!(
                f,
                "Each player can open at most {MAX_BOOSTERS_PER_PLAYER} boosters."
            ),
            DraftError::PoolTooLarge => {
                write!(f, "A draft pool can hold at most {MAX_POOL_COPIES} units.")
            }
            DraftError::EmptySelection => write!(f, "Cannot select from an empty set."),
        }
    }
}

impl std::error::Error for DraftError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: DraftSettings = serde_json::from_str(
            r#"{"numberOfPlayers": 3, "boostersPerPlayer": 2,
                "boosterConfigs": [{"unitType": "Mech", "quantity": 2}, {"unitType": "Infantry", "quantity": 1}]}"#,
        )
        .unwrap();
        assert!(!settings.use_collection);
        assert!(!settings.respect_filters);
        assert_eq!(settings.requested_slots(), 18);
        assert_eq!(DraftSettings::default().requested_slots(), 30);

        let huge = DraftSettings {
            number_of_players: u32::MAX,
            boosters_per_player: u32::MAX,
            booster_configs: vec![
                BoosterConfig::new("Mech", u32::MAX),
                BoosterConfig::new("Infantry", u32::MAX),
            ],
            ..Default::default()
        };
        assert_eq!(huge.requested_slots(), u64::MAX);
    }

    #[test]
    fn test_legacy_draft_record() {
        const DATA: &str = r#"{
            "id": "1717171717171",
            "name": "Friday",
            "settings": {"numberOfPlayers": 1, "boostersPerPlayer": 1, "boosterConfigs": []},
            "results": [{"playerId": 1, "playerName": "Jogador 1", "units": [], "totalPoints": 0}],
            "createdAt": "2024-05-31T12:00:00.000Z",
            "updatedAt": "2024-05-31T12:00:00.000Z"
        }"#;
        let draft: Draft = serde_json::from_str(DATA).unwrap();
        assert!(draft.available_units.is_empty());
        assert_eq!(draft.results[0].player_name, "Jogador 1");
        assert!(draft.description.is_none());
    }

    #[test]
    fn test_create() {
        let draft = Draft::create(
            "Night".to_string(),
            Some("  ".to_string()),
            DraftSettings::default(),
            Vec::new(),
            vec![DraftResult::new(1)],
        );
        assert!(uuid::Uuid::parse_str(&draft.id).is_ok());
        assert!(draft.description.is_none());
        assert_eq!(draft.created_at, draft.updated_at);
        assert_eq!(draft.results[0].player_name, "Player 1");
    }

    #[test]
    fn test_drafted_unit() {
        let unit = Unit::sample("Mech", 75);
        let drafted = DraftedUnit::from(&unit);
        assert_eq!(drafted.quantity, 1);
        assert_eq!(drafted.points, 75);

        let mut result = DraftResult::new(2);
        result.receive(drafted.clone());
        result.receive(drafted);
        assert_eq!(result.total_points, 150);
        assert_eq!(result.units.len(), 2);

        result.receive(DraftedUnit::from(&Unit::sample("Mech", u32::MAX)));
        assert_eq!(result.total_points, u32::MAX);

        let json = serde_json::to_value(&result.units[0]).unwrap();
        assert_eq!(json["type"], "Mech");
        assert_eq!(json["collectionNumber"], unit.collection_number);
    }
}
