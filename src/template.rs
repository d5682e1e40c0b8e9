//! Template configuration: the legacy per-category object lists and the
//! teach-by-example configuration with its analyzed patterns.

use crate::address::{AddressStructure, AddressingConfig};

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address_structure: AddressStructure,
    #[serde(default)]
    pub devices: DeviceTemplates,
    #[serde(default, rename = "teachByExampleConfig")]
    pub teach_by_example: Option<TeachByExampleConfig>,
}

/// Legacy per-category templates plus the fixed scene/central blocks. The
/// dimmer slot accepts one config or a list of parallel tracks.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTemplates {
    #[serde(default)]
    pub switch: CategoryTemplate,
    #[serde(default)]
    pub dimmer: OneOrMany<CategoryTemplate>,
    #[serde(default)]
    pub blind: CategoryTemplate,
    #[serde(default)]
    pub hvac: CategoryTemplate,
    #[serde(default)]
    pub fixed: Option<FixedConfig>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTemplate {
    #[serde(default)]
    pub objects: Vec<ObjectTemplate>,
    #[serde(default)]
    pub addressing: Option<AddressingConfig>,
}

/// One communication object of a legacy category template.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTemplate {
    pub name: String,
    pub dpt: String,
    pub main: u16,
    pub middle: u16,
    #[serde(default)]
    pub start: u16,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Either a single `T` or a list of them; templates historically stored both
/// shapes, so deserialization accepts both and everything downstream works on
/// the normalized slice.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item),
            OneOrMany::Many(items) => items,
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachByExampleConfig {
    #[serde(default)]
    pub auto_generate_room_addresses: bool,
    #[serde(default)]
    pub auto_generate_middle_groups: AutoGenerateMiddleGroups,
    #[serde(default)]
    pub categories: Categories,
}

/// Per-kind switches for fixed-address auto-generation. All default to on;
/// the global `auto_generate_room_addresses` flag gates the whole feature.
#[derive(Clone, Copy, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoGenerateMiddleGroups {
    #[serde(default = "default_true")]
    pub scenes: bool,
    #[serde(default = "default_true")]
    pub central_switching: bool,
    #[serde(default = "default_true")]
    pub central_dimming: bool,
    #[serde(default = "default_true")]
    pub central_blind: bool,
}

impl Default for AutoGenerateMiddleGroups {
    fn default() -> Self {
        AutoGenerateMiddleGroups {
            scenes: true,
            central_switching: true,
            central_dimming: true,
            central_blind: true,
        }
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Categories {
    #[serde(default)]
    pub switching: Option<OneOrMany<CategoryConfig>>,
    #[serde(default)]
    pub dimming: Option<OneOrMany<CategoryConfig>>,
    #[serde(default)]
    pub shading: Option<OneOrMany<CategoryConfig>>,
    #[serde(default)]
    pub hvac: Option<OneOrMany<CategoryConfig>>,
}

impl Categories {
    pub fn switching_tracks(&self) -> &[CategoryConfig] {
        self.switching.as_ref().map(OneOrMany::as_slice).unwrap_or_default()
    }

    pub fn dimming_tracks(&self) -> &[CategoryConfig] {
        self.dimming.as_ref().map(OneOrMany::as_slice).unwrap_or_default()
    }

    pub fn shading_tracks(&self) -> &[CategoryConfig] {
        self.shading.as_ref().map(OneOrMany::as_slice).unwrap_or_default()
    }

    pub fn hvac_tracks(&self) -> &[CategoryConfig] {
        self.hvac.as_ref().map(OneOrMany::as_slice).unwrap_or_default()
    }
}

/// How much of a category is in use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Usage {
    #[default]
    Full,
    /// Addresses are allocated but rows carry the unused placeholder name.
    #[serde(alias = "basic")]
    Partial,
    None,
}

/// One teach-by-example track of a category.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub enabled: Usage,
    #[serde(default)]
    pub example_addresses: Vec<ExampleAddress>,
    #[serde(default)]
    pub pattern: Option<GroupPattern>,
    #[serde(default)]
    pub extra_objects: Vec<ExtraObject>,
    #[serde(default)]
    pub linked_to_switching: bool,
    #[serde(default)]
    pub unused_name: Option<String>,
}

impl CategoryConfig {
    pub fn unused_name(&self) -> &str {
        self.unused_name.as_deref().unwrap_or("---")
    }
}

/// One example row the installer assigned to the first physical unit. The
/// per-component increments state how the address advances for each further
/// unit.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleAddress {
    #[serde(default)]
    pub object_name: String,
    pub main: u16,
    pub middle: u16,
    pub sub: u16,
    #[serde(default)]
    pub dpt: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub main_increment: u16,
    #[serde(default)]
    pub middle_increment: u16,
    #[serde(default)]
    pub sub_increment: u16,
}

impl ExampleAddress {
    pub fn dpt(&self) -> &str {
        self.dpt.as_deref().unwrap_or("DPT1.001")
    }
}

/// An additional object emitted once per physical unit at a fixed or derived
/// address, outside the analyzed pattern.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraObject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub main: Option<u16>,
    #[serde(default)]
    pub middle: Option<u16>,
    #[serde(default)]
    pub sub: Option<u16>,
    #[serde(default)]
    pub dpt: Option<String>,
    #[serde(default)]
    pub sub_increment: Option<u16>,
}

impl ExtraObject {
    pub fn dpt(&self) -> &str {
        self.dpt.as_deref().unwrap_or("DPT1.001")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum MiddleGroupPattern {
    #[serde(rename = "same")]
    Same,
    #[serde(rename = "perType")]
    PerType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubGroupPattern {
    Increment,
    Offset,
    Sequence,
}

/// Pattern detected from (or stored with) a track's example addresses.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPattern {
    pub fixed_main: u16,
    pub middle_group_pattern: MiddleGroupPattern,
    pub sub_group_pattern: SubGroupPattern,
    #[serde(default)]
    pub offset_value: Option<u16>,
    #[serde(default)]
    pub objects_per_device: usize,
    #[serde(default)]
    pub middle_groups: Option<Vec<u16>>,
    #[serde(default)]
    pub start_sub: Option<u16>,
    #[serde(default)]
    pub extra_main_groups: Vec<ExtraMainGroup>,
}

impl GroupPattern {
    pub fn start_sub(&self) -> u16 {
        self.start_sub.unwrap_or(1)
    }
}

/// Overflow space for HVAC zone multiplexing once the 0..=7 middle groups of
/// the base main group are exhausted.
#[derive(Clone, Copy, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraMainGroup {
    pub main: u16,
    pub middle: u16,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedConfig {
    #[serde(default)]
    pub main_groups: Vec<FixedMainGroup>,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedMainGroup {
    pub main: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub middle_groups: Vec<FixedMiddleGroup>,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedMiddleGroup {
    pub middle: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subs: Vec<FixedSub>,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedSub {
    #[serde(default)]
    pub name: String,
    pub sub: u16,
    #[serde(default)]
    pub dpt: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl FixedSub {
    pub fn dpt(&self) -> &str {
        self.dpt.as_deref().unwrap_or("DPT1.001")
    }
}
