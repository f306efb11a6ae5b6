use std::collections::HashMap;

use rand::Rng;

use crate::units::Unit;

use super::{
    random::{over_shuffle, select_weighted, shuffle},
    DraftError, DraftResult, DraftSettings, DraftUnitWithQuantity, DraftedUnit,
    MAX_BOOSTERS_PER_PLAYER, MAX_PLAYERS, MAX_POOL_COPIES,
};

/// Units drafted this many times or more all share the minimum weight of 1.
const DISTRIBUTION_WEIGHT_CEILING: i64 = 10;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DraftEvent {
    /// A player opens their next booster. Boosters are numbered from 1.
    BoosterOpened { booster: usize, player_id: u32 },
    Pick {
        booster: usize,
        player_id: u32,
        unit: DraftedUnit,
        player_total_points: u32,
    },
}

/// A draft in progress. Each call to `next` performs one step of the draft
/// and yields what happened, so callers can pace or abandon the run; draining
/// it produces the same results as `generate_draft`.
pub struct DraftRun<R> {
    rng: R,
    settings: DraftSettings,

    /// One entry per pool line.
    units: Vec<Unit>,
    /// Remaining copies, as indices into `units`, in shuffled order.
    remaining: Vec<usize>,
    /// Times each unit id has gone to a player.
    distribution: HashMap<String, u32>,
    player_order: Vec<usize>,
    results: Vec<DraftResult>,

    total_boosters: usize,
    opened: usize,
    /// Index of the booster being opened, if one is open.
    booster: Option<usize>,
    player: usize,
    config: usize,
    picks_left: u32,
    candidates: Vec<usize>,
    failed: bool,
}

impl<R: Rng> DraftRun<R> {
    pub fn new(
        pool: &[DraftUnitWithQuantity],
        settings: &DraftSettings,
        mut rng: R,
    ) -> Result<Self, DraftError> {
        if pool.iter().all(|entry| entry.quantity == 0) {
            return Err(DraftError::NoUnitsSelected);
        }
        if settings.number_of_players == 0 {
            return Err(DraftError::NoPlayers);
        }
        if settings.boosters_per_player == 0 {
            return Err(DraftError::NoBoosters);
        }
        if settings.number_of_players > MAX_PLAYERS {
            return Err(DraftError::TooManyPlayers);
        }
        if settings.boosters_per_player > MAX_BOOSTERS_PER_PLAYER {
            return Err(DraftError::TooManyBoosters);
        }
        let copies = pool
            .iter()
            .map(|entry| u64::from(entry.quantity))
            .fold(0, u64::saturating_add);
        if copies > MAX_POOL_COPIES {
            return Err(DraftError::PoolTooLarge);
        }

        let units: Vec<Unit> = pool.iter().map(|entry| entry.unit.clone()).collect();
        let mut remaining: Vec<usize> = pool
            .iter()
            .enumerate()
            .flat_map(|(i, entry)| std::iter::repeat(i).take(entry.quantity as usize))
            .collect();
        over_shuffle(&mut remaining, &mut rng);

        let players = settings.number_of_players as usize;
        let mut player_order: Vec<usize> = (0..players).collect();
        shuffle(&mut player_order, &mut rng);

        tracing::debug!(
            "Drafting {} copies for {} players, {} slots requested.",
            remaining.len(),
            players,
            settings.requested_slots()
        );

        Ok(Self {
            rng,
            settings: settings.clone(),
            units,
            remaining,
            distribution: HashMap::new(),
            player_order,
            results: (1..=settings.number_of_players)
                .map(DraftResult::new)
                .collect(),
            total_boosters: players * settings.boosters_per_player as usize,
            opened: 0,
            booster: None,
            player: 0,
            config: 0,
            picks_left: 0,
            candidates: Vec::new(),
            failed: false,
        })
    }

    /// Results so far, in player order.
    pub fn results(&self) -> &[DraftResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<DraftResult> {
        self.results
    }

    /// Which player opens the given booster. Turns go round in seat order,
    /// except that the first booster of every second lap is given to a seat
    /// from a shuffled order so the sequence is less predictable.
    fn player_for(&self, booster: usize) -> usize {
        let players = self.player_order.len();
        if booster % (players * 2) == 0 {
            self.player_order[booster % players]
        } else {
            booster % players
        }
    }

    /// Gather and shuffle the remaining copies matching the current booster
    /// slot's unit type.
    fn fill_slot(&mut self) {
        let Some(slot) = self.settings.booster_configs.get(self.config) else {
            self.picks_left = 0;
            self.candidates.clear();
            return;
        };

        let wanted = slot.unit_type.to_lowercase();
        self.candidates = self
            .remaining
            .iter()
            .copied()
            .filter(|&i| self.units[i].unit_type.to_lowercase() == wanted)
            .collect();
        shuffle(&mut self.candidates, &mut self.rng);
        self.picks_left = slot.quantity;
    }

    fn weight(&self, unit: usize) -> f64 {
        let drafted = self
            .distribution
            .get(&self.units[unit].id)
            .copied()
            .unwrap_or(0) as i64;
        (DISTRIBUTION_WEIGHT_CEILING - drafted).max(1) as f64
    }

    fn pick(&mut self, booster: usize) -> Result<DraftEvent, DraftError> {
        let weights: Vec<f64> = self.candidates.iter().map(|&i| self.weight(i)).collect();
        let slots: Vec<usize> = (0..self.candidates.len()).collect();
        let slot = *select_weighted(&slots, Some(&weights), &mut self.rng)?;

        // Only this copy leaves the pool; other copies of the unit stay.
        let chosen = self.candidates.remove(slot);
        if let Some(pos) = self.remaining.iter().position(|&i| i == chosen) {
            self.remaining.remove(pos);
        }
        self.picks_left -= 1;

        let unit = &self.units[chosen];
        *self.distribution.entry(unit.id.clone()).or_default() += 1;

        let drafted = DraftedUnit::from(unit);
        let result = &mut self.results[self.player];
        result.receive(drafted.clone());

        Ok(DraftEvent::Pick {
            booster: booster + 1,
            player_id: result.player_id,
            unit: drafted,
            player_total_points: result.total_points,
        })
    }

    fn advance(&mut self) -> Result<Option<DraftEvent>, DraftError> {
        loop {
            if let Some(booster) = self.booster {
                // A type with no copies left just leaves its slots empty.
                if self.picks_left > 0 && !self.candidates.is_empty() {
                    return self.pick(booster).map(Some);
                }

                self.config += 1;
                if self.config < self.settings.booster_configs.len() {
                    self.fill_slot();
                    continue;
                }
                self.booster = None;
            }

            if self.opened >= self.total_boosters {
                return Ok(None);
            }
            let next = self.opened;
            self.opened += 1;

            self.booster = Some(next);
            self.player = self.player_for(next);
            self.config = 0;
            self.fill_slot();

            return Ok(Some(DraftEvent::BoosterOpened {
                booster: next + 1,
                player_id: self.results[self.player].player_id,
            }));
        }
    }
}

impl<R: Rng> Iterator for DraftRun<R> {
    type Item = Result<DraftEvent, DraftError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.advance() {
            Ok(event) => event.map(Ok),
            Err(e) => {
                tracing::warn!("Abandoning draft: {e}");
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Distribute the pool among the players in one synchronous pass.
pub fn generate_draft<R: Rng>(
    pool: &[DraftUnitWithQuantity],
    settings: &DraftSettings,
    rng: R,
) -> Result<Vec<DraftResult>, DraftError> {
    let mut run = DraftRun::new(pool, settings, rng)?;
    for event in run.by_ref() {
        event?;
    }
    Ok(run.into_results())
}
