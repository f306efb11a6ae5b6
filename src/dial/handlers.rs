use axum::response::Response;

use crate::{
    units::{Unit, UnitDatabase},
    Resp,
};

use super::{DamageLevel, DialSession, FallbackPolicy};

#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialAction {
    Damage,
    Repair,
}

/// A unit from the catalog by id, or one supplied inline (for example from
/// an imported collection), at a damage level with an optional click to
/// apply.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialRequest {
    #[serde(default)]
    unit_id: Option<String>,
    #[serde(default)]
    unit: Option<Unit>,
    #[serde(default)]
    damage_level: u32,
    #[serde(default)]
    action: Option<DialAction>,
}

pub fn handle_dial_request(
    units: &UnitDatabase,
    policy: FallbackPolicy,
    request: DialRequest,
) -> Response<String> {
    let unit = match (request.unit, request.unit_id) {
        (Some(unit), _) => unit,
        (None, Some(id)) => match units.get(&id) {
            Some(unit) => unit.clone(),
            None => return Resp::e404(format!("No unit with id {id}.")),
        },
        (None, None) => return Resp::e422("Request names no unit."),
    };

    let mut session = DialSession::resume(unit, DamageLevel::new(request.damage_level), policy);
    match request.action {
        Some(DialAction::Damage) => {
            session.apply_damage();
        }
        Some(DialAction::Repair) => {
            session.apply_repair();
        }
        None => {}
    }

    Resp::json(&session.view())
}
