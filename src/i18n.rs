//! Language handling for generated rows.
//!
//! Room names, fixtures and object names entered by the installer are kept in
//! their standard (Dutch) form internally and rendered through a [`Translate`]
//! implementation at generation time. The crate itself only carries the small
//! [`Lexicon`] of UI words it has to emit on its own (category labels, the
//! "output" word in comments, the reserve placeholder) plus the name-variant
//! lists used to recognize scene/central middle groups in any supported
//! language.

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Nl,
    En,
    De,
    Fr,
    Es,
}

/// What kind of text is being translated. Implementations may keep separate
/// dictionaries per kind ("keuken" is a room, "spots" is a fixture).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextKind {
    RoomName,
    Fixture,
    ObjectName,
    FixedAddressName,
}

/// Collaborator boundary for user-input translation.
///
/// Both methods are pure and default to identity, which is a valid
/// implementation: generation then simply emits the stored names unchanged.
pub trait Translate {
    /// Render `text` in the target language.
    fn translate(&self, text: &str, _lang: Language, _kind: TextKind) -> String {
        text.to_string()
    }

    /// Normalize possibly-translated input back to its standard form before
    /// generation, so stored devices behave the same regardless of the
    /// language they were edited in.
    fn standard_form(&self, text: &str, _kind: TextKind) -> String {
        text.to_string()
    }
}

/// The identity translator.
pub struct Identity;

impl Translate for Identity {}

/// Fixed UI words the generator emits by itself.
pub struct Lexicon {
    pub reserve: &'static str,
    pub output: &'static str,
    pub climate: &'static str,
    pub switching: &'static str,
    pub dimming: &'static str,
    pub shading: &'static str,
    pub main_group: &'static str,
    pub middle_group: &'static str,
}

pub fn lexicon(lang: Language) -> &'static Lexicon {
    match lang {
        Language::Nl => &Lexicon {
            reserve: "reserve",
            output: "Uitgang",
            climate: "Klimaat / HVAC",
            switching: "Schakelen",
            dimming: "Dimmen",
            shading: "Jaloezie / Rolluik",
            main_group: "Hoofdgroep",
            middle_group: "Middengroep",
        },
        Language::En => &Lexicon {
            reserve: "reserve",
            output: "Output",
            climate: "Climate / HVAC",
            switching: "Switch",
            dimming: "Dimming",
            shading: "Blind / Shutter",
            main_group: "Main group",
            middle_group: "Middle group",
        },
        Language::De => &Lexicon {
            reserve: "Reserve",
            output: "Ausgang",
            climate: "Klima / HLK",
            switching: "Schalten",
            dimming: "Dimmen",
            shading: "Jalousie / Rollladen",
            main_group: "Hauptgruppe",
            middle_group: "Mittelgruppe",
        },
        Language::Fr => &Lexicon {
            reserve: "réserve",
            output: "Sortie",
            climate: "Climat / CVC",
            switching: "Interrupteur",
            dimming: "Variation",
            shading: "Volet / Store",
            main_group: "Groupe principal",
            middle_group: "Groupe intermédiaire",
        },
        Language::Es => &Lexicon {
            reserve: "reserva",
            output: "Salida",
            climate: "Clima / HVAC",
            switching: "Interruptor",
            dimming: "Atenuación",
            shading: "Persiana / Toldo",
            main_group: "Grupo principal",
            middle_group: "Grupo intermedio",
        },
    }
}

/// Middle-group names that identify the scene block.
pub const SCENE_VARIANTS: &[&str] = &[
    "scène's", "scènes", "scenes", "scene", "escenas", "escena", "scène", "szenen", "szene",
];

/// Middle-group names that identify central switching.
pub const CENTRAL_SWITCHING_VARIANTS: &[&str] = &[
    "centraal",
    "centraal schakelen",
    "centraal objecten",
    "central switching",
    "central objects",
    "central",
    "objetos centrales",
    "objetos central",
    "objets centraux",
    "objets central",
    "zentrale objekte",
    "zentral",
    "zentrales schalten",
];

pub const CENTRAL_DIMMING_VARIANTS: &[&str] = &[
    "centraal dimmen",
    "central dimming",
    "dimming central",
    "centrale dimmerung",
    "dimming centrale",
];

pub const CENTRAL_BLIND_VARIANTS: &[&str] = &[
    "centraal jalouzie / rolluik",
    "centraal jalouzie",
    "centraal rolluik",
    "central blind",
    "central shading",
    "central jalousie",
    "central store",
    "zentrale jalousie",
    "zentrale rollo",
    "jalousie central",
    "store central",
];

/// Sub-0 default entry of the central switching block.
pub const ALL_OFF_VARIANTS: &[&str] = &[
    "alles uit",
    "all off",
    "todo apagado",
    "tout éteindre",
    "alles aus",
];

/// Sub-0 default entry of the scene block.
pub const WELCOME_VARIANTS: &[&str] = &[
    "welkom",
    "welcome",
    "bienvenido",
    "bienvenue",
    "willkommen",
];

/// Case-insensitive membership test against a variant list.
pub fn matches_variant(name: &str, variants: &[&str]) -> bool {
    let name = name.trim().to_lowercase();
    variants.iter().any(|v| name == v.trim().to_lowercase())
}
