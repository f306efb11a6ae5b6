use std::{collections::HashMap, fmt::Display, sync::OnceLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);
    pub const RED: Rgb = Rgb(0xff, 0x00, 0x00);
    pub const BLUE: Rgb = Rgb(0x00, 0xee, 0xff);
    pub const GREEN: Rgb = Rgb(0x00, 0xff, 0x00);
    pub const GRAY: Rgb = Rgb(0xb4, 0xb4, 0xb4);
    pub const PURPLE: Rgb = Rgb(0xc2, 0x00, 0xc6);
    pub const ORANGE_RED: Rgb = Rgb(0xff, 0x45, 0x00);
    pub const YELLOW: Rgb = Rgb(0xff, 0xff, 0x00);
    pub const ORANGE: Rgb = Rgb(0xff, 0x66, 0x00);

    /// Multiply each channel by `factor`, rounding to the nearest value.
    pub fn scaled(self, factor: f64) -> Rgb {
        let channel = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
        Rgb(channel(self.0), channel(self.1), channel(self.2))
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl serde::Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Equipment colours printed on dial cells. Each group covers several
/// reference ids from the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorGroup {
    Red,
    Blue,
    Black,
    Green,
    Gray,
    Purple,
    Unknown,
}

const GROUPS: [(ColorGroup, &[&str]); 6] = [
    (
        ColorGroup::Red,
        &[
            "6724024d-1887-4150-829a-5485229b6f9d",
            "6a51d7c5-00b2-428c-a60f-3ed7fdd877ca",
            "b5d55f08-a809-4230-b6f4-763204bbf590",
            "0b7bd1c2-5159-4ee8-884c-b80544fa7d39",
            "37adc6ad-b3c2-4ef2-90da-3c269534fe3f",
            "80343ab1-1c48-41ce-9c78-2f6d7ee3432c",
            "a22f0c1b-3b57-451e-9d4e-70766cca4f99",
            "cbf53b69-c314-4e0b-bb89-6b44e427ce72",
            "7605ac82-774b-4965-b933-bc6cd88c8cea",
        ],
    ),
    (
        ColorGroup::Blue,
        &[
            "495ad354-768a-4eec-bfe2-cc3e96abdec4",
            "ba2f357e-87c8-4578-8373-29626038b8c4",
            "83533d0d-69c0-4174-b834-725ea798f7c9",
            "f225198f-8013-4c6f-9b26-06721d535d87",
            "175e2f4d-e2d1-4e11-a3f9-6eb5505bcc60",
            "883f206e-4835-4036-875f-3e89534c39a3",
        ],
    ),
    (
        ColorGroup::Black,
        &[
            "a426c4d7-9c45-43c7-8ac1-a38ec62196b1",
            "a104887a-682f-4c20-9e07-4ce87607f72d",
            "966342d2-defc-4730-8e05-356d79e26882",
            "f8f0f78c-051c-4c1f-80ad-515d555f035e",
            "62b1417c-b1db-4b9e-9aa3-a73b57f80338",
            "d8f82245-6cc9-4443-a608-ed2c9b499a09",
        ],
    ),
    (
        ColorGroup::Green,
        &[
            "26bfaaac-ef6a-469d-807b-2f5d02861275",
            "67568b06-43a6-4b2a-bd6c-6ca1a128f5b6",
            "d057de00-6126-437d-b6ea-d05ffd0a45c0",
            "f1ea3a07-4233-490d-ba40-0e933d589fca",
            "4853082e-8863-40ff-9fcd-eb78d6c14e93",
            "d7c9ec9e-11ac-428e-b133-61a62a95ff28",
            "ebff8de4-3217-4dc0-9de9-148257912517",
            "b5599269-d95c-4554-a6dd-a2af32c73088",
            "757ae965-b8f9-4473-b5fb-87b36efd96a7",
        ],
    ),
    (
        ColorGroup::Gray,
        &[
            "76f01d7b-ca06-421b-b381-29570edbbaf8",
            "6f5b7c23-e721-4a0b-9a1f-f966aba1a749",
            "4633adee-87ea-470a-8b6c-f3d645c571df",
            "6205fd17-a246-450f-9d7c-a2eaee2b8a93",
            "64d6be48-70cc-485a-8bf4-0b9feabf66b2",
            "b9b3e23e-2d8c-4146-a4a3-0adbc50a5238",
        ],
    ),
    (
        ColorGroup::Purple,
        &[
            "071000b0-f5f0-4815-93fd-5fac9bf263a9",
            "023225ca-c455-4f8c-952c-1d1a1ebed381",
            "cea94143-24bc-4b4c-8169-d52bf6801593",
            "fdcebbf1-f2f7-431d-a11c-d45c878f83cf",
            "881d1b60-879a-4b54-b9a0-a8591e35a673",
        ],
    ),
];

fn meaning_ids() -> &'static HashMap<&'static str, ColorGroup> {
    static IDS: OnceLock<HashMap<&'static str, ColorGroup>> = OnceLock::new();
    IDS.get_or_init(|| {
        GROUPS
            .iter()
            .flat_map(|(group, ids)| ids.iter().map(move |id| (*id, *group)))
            .collect()
    })
}

impl ColorGroup {
    pub fn of(meaning_id: &str) -> ColorGroup {
        meaning_ids()
            .get(meaning_id.trim().to_lowercase().as_str())
            .copied()
            .unwrap_or(ColorGroup::Unknown)
    }

    pub fn rgb(self) -> Option<Rgb> {
        match self {
            ColorGroup::Red => Some(Rgb::RED),
            ColorGroup::Blue => Some(Rgb::BLUE),
            ColorGroup::Black => Some(Rgb::BLACK),
            ColorGroup::Green => Some(Rgb::GREEN),
            ColorGroup::Gray => Some(Rgb::GRAY),
            ColorGroup::Purple => Some(Rgb::PURPLE),
            ColorGroup::Unknown => None,
        }
    }
}

/// Fill and text colour of one stat cell. Text is white only on black.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellColor {
    pub has_color: bool,
    pub fill: Rgb,
    pub text: Rgb,
}

impl CellColor {
    pub const NONE: CellColor = CellColor {
        has_color: false,
        fill: Rgb::WHITE,
        text: Rgb::BLACK,
    };

    pub fn filled(fill: Rgb) -> CellColor {
        CellColor {
            has_color: true,
            fill,
            text: if fill == Rgb::BLACK {
                Rgb::WHITE
            } else {
                Rgb::BLACK
            },
        }
    }

    pub fn for_meaning(meaning_id: Option<&str>) -> CellColor {
        meaning_id
            .and_then(|id| ColorGroup::of(id).rgb())
            .map_or(CellColor::NONE, CellColor::filled)
    }
}

/// Darken `base` according to how far along the dial the unit is.
/// `intensity` runs from 0 (undamaged) to 1 (fully damaged); the result never
/// drops below `floor` of the original brightness.
pub fn damage_shade(base: Rgb, intensity: f64, floor: f64) -> Rgb {
    base.scaled(floor + intensity.clamp(0.0, 1.0) * (1.0 - floor))
}
