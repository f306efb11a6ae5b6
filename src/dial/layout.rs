//! Placement of everything printed on the dial face. Angles are degrees,
//! offsets are pixels on a 500x500 face, measured the way a canvas library
//! rotates a shape about the dial centre.

use crate::units::{AttackStat, DamageType, Rank, Unit};

pub const DIAL_SIZE: f64 = 500.0;
pub const DIAL_CENTER: f64 = DIAL_SIZE / 2.0;

/// Arc length one character of curved text takes up along the name path.
pub const ANGLE_PER_CHARACTER: f64 = 4.5;
pub const UNIQUE_STAR: char = '★';
/// Room left in the name text for the rank insignia.
const RANK_SPACING: &str = "     ";

const TEXT_PATH_RADIUS: f64 = 175.0;
const FONT_SIZE: f64 = 16.0;
pub const COLLECTION_NUMBER_ROTATION: f64 = -200.5;
pub const VARIANT_ROTATION: f64 = 42.0;

const FRONT_ARC_RADII: (f64, f64) = (186.0, 190.0);
const REAR_ARC_RADII: (f64, f64) = (185.0, 190.0);

const LOGO_SIZE: f64 = 30.0;
const LOGO_OFFSET: (f64, f64) = (17.0, -152.0);
pub const FACTION_LOGO_ROTATION: f64 = -127.0;
pub const EXPANSION_LOGO_ROTATION: f64 = -104.0;
const DEFAULT_LOGO: &str = "/images/logo-dial-default-white.png";

/// Degrees between the start of the name text and the insignia. Three digit
/// point values push the insignia further round.
const INSIGNIA_GAP: f64 = 8.0;
const INSIGNIA_GAP_WIDE_POINTS: f64 = 11.0;

const VENT_ROTATION: f64 = 180.0;
const VENT_OFFSET: (f64, f64) = (18.0, -57.0);

const ATTACK_ICON_HEIGHT: f64 = 20.0;
const MELEE_PADDING: f64 = -15.0;
const MELEE_STEP: f64 = -16.0;
const RANGED_STEP: f64 = -8.0;
/// The secondary row sits this far above the primary row.
const SECONDARY_ROW_SHIFT: f64 = -40.0;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcSweep {
    pub angle: f64,
    pub rotation: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Rotation of the two tick lines marking the ends of the arc.
    pub edges: [f64; 2],
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPlacement {
    pub text: String,
    pub rotation: f64,
    pub radius: f64,
    pub font_size: f64,
}

impl TextPlacement {
    fn curved(text: String, rotation: f64) -> Self {
        Self {
            text,
            rotation,
            radius: TEXT_PATH_RADIUS,
            font_size: FONT_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlacement {
    pub src: String,
    pub rotation: f64,
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub text: String,
    pub offset_x: f64,
    pub offset_y: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRow {
    pub damage_type: DamageType,
    /// Vertical shift of the whole row from the dial centre.
    pub shift_y: f64,
    pub icons: Vec<ImagePlacement>,
    pub range: Label,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPlan {
    pub size: f64,
    pub center: f64,
    pub front_arc: ArcSweep,
    pub rear_arc: ArcSweep,
    pub name: TextPlacement,
    pub collection_number: TextPlacement,
    pub variant: TextPlacement,
    pub faction_logo: ImagePlacement,
    pub expansion_logo: ImagePlacement,
    pub insignia: Option<ImagePlacement>,
    pub vent: ImagePlacement,
    pub vent_capacity: Label,
    pub primary_attack: Option<AttackRow>,
    pub secondary_attack: Option<AttackRow>,
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        c => c,
    }
}

/// File name fragment for a faction or expansion logo.
pub fn logo_slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(strip_accent)
        .filter(|c| !matches!(c, '\'' | '’' | '‘' | '`'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

pub fn logo_path(name: &str) -> String {
    let slug = logo_slug(name);
    if slug.is_empty() {
        DEFAULT_LOGO.to_string()
    } else {
        format!("/images/logo-dial-{slug}-white.png")
    }
}

fn front_arc(degrees: f64) -> ArcSweep {
    let rotation = (180.0 - degrees) / 2.0;
    ArcSweep {
        angle: degrees,
        rotation,
        inner_radius: FRONT_ARC_RADII.0,
        outer_radius: FRONT_ARC_RADII.1,
        edges: [-rotation, rotation - 180.0],
    }
}

fn rear_arc(degrees: f64) -> ArcSweep {
    ArcSweep {
        angle: degrees,
        rotation: 270.0 - degrees / 2.0,
        inner_radius: REAR_ARC_RADII.0,
        outer_radius: REAR_ARC_RADII.1,
        edges: [90.0 + degrees / 2.0, 90.0 - degrees / 2.0],
    }
}

/// Points, rank gap, unique star and name, as printed along the top edge.
pub fn name_text(unit: &Unit) -> String {
    let mut text = format!("{}  ", unit.points);
    if unit.rank != Rank::NA {
        text.push_str(RANK_SPACING);
    }
    if unit.is_unique {
        text.push(' ');
        text.push(UNIQUE_STAR);
    }
    text.push(' ');
    text.push_str(if unit.name.is_empty() {
        "Unknown"
    } else {
        unit.name.as_str()
    });
    text
}

/// Longer text starts further round so it stays centred on the top edge.
pub fn name_rotation(text: &str) -> f64 {
    let adjust = -(text.chars().count() as f64 * ANGLE_PER_CHARACTER) / 2.0;
    -(90.0 + adjust / 2.0)
}

fn insignia(unit: &Unit, name_rotation: f64) -> Option<ImagePlacement> {
    let (src, height, offset_y) = match unit.rank {
        Rank::Elite => ("/images/elite.png", 15.0, -166.0),
        Rank::Veteran => ("/images/veteran.png", 10.0, -168.0),
        Rank::Green => ("/images/green.png", 5.0, -170.0),
        Rank::NA => return None,
    };
    let gap = if unit.points < 100 {
        INSIGNIA_GAP
    } else {
        INSIGNIA_GAP_WIDE_POINTS
    };
    Some(ImagePlacement {
        src: src.to_string(),
        rotation: 90.0 + name_rotation - gap,
        width: 15.0,
        height,
        offset_x: 0.0,
        offset_y,
    })
}

fn logo(name: &str, rotation: f64) -> ImagePlacement {
    ImagePlacement {
        src: logo_path(name),
        rotation,
        width: LOGO_SIZE,
        height: LOGO_SIZE,
        offset_x: LOGO_OFFSET.0,
        offset_y: LOGO_OFFSET.1,
    }
}

fn icon_width(damage_type: DamageType) -> f64 {
    match damage_type {
        DamageType::Ballistic => 4.5,
        DamageType::Energetic => 5.5,
        DamageType::Melee => 16.5,
    }
}

fn icon_src(damage_type: DamageType) -> &'static str {
    match damage_type {
        DamageType::Ballistic => "/images/ballisticDamage.png",
        DamageType::Energetic => "/images/energeticDamage.png",
        DamageType::Melee => "/images/meleeDamage.png",
    }
}

/// One icon per target followed by the `min/max` range.
pub fn attack_row(stat: &AttackStat, secondary: bool) -> AttackRow {
    let (shift_y, icon_offset_y, label_offset_y) = if secondary {
        (SECONDARY_ROW_SHIFT, -68.0, -110.0)
    } else {
        (0.0, -84.0, -86.0)
    };

    let icons = (1..=stat.target_count)
        .map(|i| {
            let offset_x = match stat.damage_type {
                DamageType::Melee => MELEE_PADDING + (i - 1) as f64 * MELEE_STEP,
                _ => RANGED_STEP + i as f64 * RANGED_STEP,
            };
            ImagePlacement {
                src: icon_src(stat.damage_type).to_string(),
                rotation: 180.0,
                width: icon_width(stat.damage_type),
                height: ATTACK_ICON_HEIGHT,
                offset_x,
                offset_y: icon_offset_y,
            }
        })
        .collect();

    AttackRow {
        damage_type: stat.damage_type,
        shift_y,
        icons,
        range: Label {
            text: format!("{}/{}", stat.min_range, stat.max_range),
            offset_x: -18.0 + stat.target_count as f64 * RANGED_STEP,
            offset_y: label_offset_y,
        },
    }
}

/// Everything about the dial face that does not change with damage.
pub fn compute_layout(unit: &Unit) -> LayoutPlan {
    let name = name_text(unit);
    let rotation = name_rotation(&name);

    LayoutPlan {
        size: DIAL_SIZE,
        center: DIAL_CENTER,
        front_arc: front_arc(unit.front_arc()),
        rear_arc: rear_arc(unit.rear_arc()),
        insignia: insignia(unit, rotation),
        name: TextPlacement::curved(name, rotation),
        collection_number: TextPlacement::curved(
            format!("{:03}", unit.collection_number),
            COLLECTION_NUMBER_ROTATION,
        ),
        variant: TextPlacement::curved(unit.variant.clone(), VARIANT_ROTATION),
        faction_logo: logo(&unit.faction, FACTION_LOGO_ROTATION),
        expansion_logo: logo(&unit.expansion, EXPANSION_LOGO_ROTATION),
        vent: ImagePlacement {
            src: "/images/vent.png".to_string(),
            rotation: VENT_ROTATION,
            width: 30.0,
            height: 20.0,
            offset_x: VENT_OFFSET.0,
            offset_y: VENT_OFFSET.1,
        },
        vent_capacity: Label {
            text: unit.vent_capacity.to_string(),
            offset_x: -1.0,
            offset_y: -60.0,
        },
        primary_attack: unit.primary_attack().map(|s| attack_row(s, false)),
        secondary_attack: unit.secondary_attack().map(|s| attack_row(s, true)),
    }
}

/// Horizontal offset that centres a stat value in its cell.
pub fn value_offset(value: i32, defense: bool) -> f64 {
    match (value > 9, defense) {
        (true, _) => 11.5,
        (false, true) => 7.0,
        (false, false) => 6.5,
    }
}

#[cfg(test)]
mod test {
    use crate::units::{AttackStat, AttackType, DamageType, Rank, Unit};

    use super::*;

    fn unit() -> Unit {
        Unit {
            name: "Atlas".to_string(),
            points: 90,
            rank: Rank::Veteran,
            is_unique: true,
            collection_number: 7,
            variant: "AS7-D".to_string(),
            faction: "Draconis Combine".to_string(),
            expansion: "Dark Age".to_string(),
            front_arc: "120".to_string(),
            rear_arc: "60".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_arcs() {
        let plan = compute_layout(&unit());
        assert_eq!(plan.front_arc.rotation, 30.0);
        assert_eq!(plan.front_arc.edges, [-30.0, -150.0]);
        assert_eq!(plan.rear_arc.rotation, 240.0);
        assert_eq!(plan.rear_arc.edges, [120.0, 60.0]);
    }

    #[test]
    fn test_name_text() {
        let mut unit = unit();
        assert_eq!(name_text(&unit), "90        ★ Atlas");
        // 17 characters.
        assert_eq!(name_rotation(&name_text(&unit)), -70.875);

        unit.rank = Rank::NA;
        unit.is_unique = false;
        assert_eq!(name_text(&unit), "90   Atlas");
        assert!(compute_layout(&unit).insignia.is_none());
    }

    #[test]
    fn test_insignia() {
        let mut unit = unit();
        let plan = compute_layout(&unit);
        let insignia = plan.insignia.unwrap();
        assert_eq!(insignia.src, "/images/veteran.png");
        assert_eq!(insignia.height, 10.0);
        assert_eq!(insignia.rotation, 90.0 + plan.name.rotation - 8.0);

        unit.points = 120;
        unit.rank = Rank::Elite;
        let plan = compute_layout(&unit);
        let insignia = plan.insignia.unwrap();
        assert_eq!(insignia.offset_y, -166.0);
        assert_eq!(insignia.rotation, 90.0 + plan.name.rotation - 11.0);
    }

    #[test]
    fn test_fixed_text() {
        let plan = compute_layout(&unit());
        assert_eq!(plan.collection_number.text, "007");
        assert_eq!(plan.collection_number.rotation, -200.5);
        assert_eq!(plan.variant.text, "AS7-D");
        assert_eq!(plan.variant.rotation, 42.0);
        assert_eq!(
            plan.faction_logo.src,
            "/images/logo-dial-draconis-combine-white.png"
        );
        assert_eq!(plan.expansion_logo.rotation, -104.0);
    }

    #[test]
    fn test_logo_slug() {
        assert_eq!(logo_slug("Clan Ghost Bear"), "clan-ghost-bear");
        assert_eq!(logo_slug("Wolf's  Dragoons"), "wolfs-dragoons");
        assert_eq!(logo_slug("Fédération Unie"), "federation-unie");
        assert_eq!(logo_path(""), "/images/logo-dial-default-white.png");
        assert_eq!(logo_path("  "), "/images/logo-dial-default-white.png");
    }

    #[test]
    fn test_attack_rows() {
        let mut unit = unit();
        unit.attack_stats = Some(vec![
            AttackStat {
                attack_type: AttackType::Primary,
                damage_type: DamageType::Melee,
                target_count: 2,
                min_range: 0,
                max_range: 0,
            },
            AttackStat {
                attack_type: AttackType::Secondary,
                damage_type: DamageType::Ballistic,
                target_count: 3,
                min_range: 2,
                max_range: 10,
            },
        ]);
        let plan = compute_layout(&unit);

        let primary = plan.primary_attack.unwrap();
        assert_eq!(
            primary.icons.iter().map(|i| i.offset_x).collect::<Vec<_>>(),
            vec![-15.0, -31.0]
        );
        assert_eq!(primary.icons[0].width, 16.5);
        assert_eq!(primary.range.text, "0/0");
        assert_eq!(primary.range.offset_x, -34.0);

        let secondary = plan.secondary_attack.unwrap();
        assert_eq!(secondary.shift_y, -40.0);
        assert_eq!(
            secondary.icons.iter().map(|i| i.offset_x).collect::<Vec<_>>(),
            vec![-16.0, -24.0, -32.0]
        );
        assert_eq!(secondary.icons[0].offset_y, -68.0);
        assert_eq!(secondary.range.text, "2/10");
        assert_eq!(secondary.range.offset_y, -110.0);
    }

    #[test]
    fn test_layout_idempotent() {
        let unit = unit();
        assert_eq!(compute_layout(&unit), compute_layout(&unit));
    }

    #[test]
    fn test_value_offset() {
        assert_eq!(value_offset(10, false), 11.5);
        assert_eq!(value_offset(9, false), 6.5);
        assert_eq!(value_offset(9, true), 7.0);
    }
}
