//! Input data model (devices as drawn up by the installer) and the flat row
//! type every generation path produces.

use std::path::Path;

use crate::address::GroupAddress;
use crate::i18n::Language;
use crate::template::TemplateConfig;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Switch,
    Dimmer,
    Blind,
    Hvac,
    Central,
}

/// One actuator channel. Group-index fields select which parallel track of
/// the category configuration the channel belongs to.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub room_address: String,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub fixture: String,
    #[serde(default)]
    pub switch_code: String,
    #[serde(default)]
    pub is_reserve: bool,
    #[serde(default)]
    pub switch_group_index: usize,
    #[serde(default)]
    pub dim_group_index: usize,
    #[serde(default)]
    pub blind_group_index: usize,
}

impl Output {
    pub fn channel_name(&self, index: usize) -> String {
        self.channel_name.clone().unwrap_or_else(|| format!("K{}", index + 1))
    }
}

/// One HVAC zone on a zone controller.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    #[serde(default)]
    pub room_address: String,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub channel_name: Option<String>,
}

impl Zone {
    pub fn channel_name(&self) -> &str {
        self.channel_name.as_deref().unwrap_or("K1")
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub category: Category,
    /// `a.l.d` bus address. HVAC zone controllers may not have one.
    #[serde(default)]
    pub physical_address: Option<String>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

/// Where a generated row came from. Carried on every row so the hierarchical
/// overview can name groups without reverse-engineering address patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowSource {
    Fixed,
    Switch { track: usize },
    Dimmer { track: usize },
    Blind { track: usize },
    Hvac { zone: usize },
}

/// Secondary ordering data captured at generation time.
///
/// Rows without a backing device (fixed and HVAC rows) use `[0, 0, 0]` so they
/// sort ahead of everything tied to an actuator. Sub-zero placeholder rows use
/// object index -1 to land before the objects of their middle group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub physical_address: [u16; 3],
    pub channel_number: u32,
    pub object_index: i32,
}

#[derive(Clone, Debug)]
pub struct GroupAddressRow {
    pub address: GroupAddress,
    pub name: String,
    pub datapoint_type: String,
    pub comment: String,
    pub sort_key: SortKey,
    pub source: RowSource,
}

/// Which name components are rendered into row names.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameDisplayOptions {
    #[serde(default = "default_true")]
    pub show_room_address: bool,
    #[serde(default = "default_true")]
    pub show_switch_code: bool,
    #[serde(default = "default_true")]
    pub show_object_name: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NameDisplayOptions {
    fn default() -> Self {
        NameDisplayOptions {
            show_room_address: true,
            show_switch_code: true,
            show_object_name: true,
        }
    }
}

/// The on-disk project file: a template plus the device list.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub template: TemplateConfig,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub name_options: Option<NameDisplayOptions>,
}

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("could not read the project file at {1:?}")]
    Read(#[source] std::io::Error, std::path::PathBuf),
    #[error("could not parse the project file at {1:?}")]
    Parse(#[source] serde_json::Error, std::path::PathBuf),
}

impl Project {
    pub fn load(path: &Path) -> Result<Project, ProjectError> {
        let data = std::fs::read(path).map_err(|e| ProjectError::Read(e, path.into()))?;
        serde_json::from_slice(&data).map_err(|e| ProjectError::Parse(e, path.into()))
    }
}
