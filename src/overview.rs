//! Hierarchical Main-Group / Middle-Group / Address rollup for display.
//!
//! Group identity comes from the [`RowSource`] every row carries, so names
//! never have to be reverse-engineered out of numeric address patterns.

use std::collections::BTreeMap;

use crate::address::GroupAddress;
use crate::generate;
use crate::i18n::{self, Language, TextKind, Translate};
use crate::model::{Device, GroupAddressRow, NameDisplayOptions, RowSource, Zone};
use crate::names;
use crate::template::{CategoryConfig, TemplateConfig};

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub main_groups: Vec<MainGroup>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MainGroup {
    pub main: u16,
    pub name: String,
    pub middle_groups: Vec<MiddleGroup>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiddleGroup {
    pub middle: u16,
    pub name: String,
    pub addresses: Vec<Entry>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub address: GroupAddress,
    pub name: String,
    pub datapoint_type: String,
    pub comment: String,
}

fn entry(row: &GroupAddressRow) -> Entry {
    Entry {
        address: row.address,
        name: row.name.clone(),
        datapoint_type: row.datapoint_type.clone(),
        comment: row.comment.clone(),
    }
}

struct Resolver<'a> {
    template: &'a TemplateConfig,
    zones: Vec<Zone>,
    lang: Language,
    translator: &'a dyn Translate,
}

impl<'a> Resolver<'a> {
    fn new(
        template: &'a TemplateConfig,
        devices: &[Device],
        lang: Language,
        translator: &'a dyn Translate,
    ) -> Self {
        Resolver { template, zones: generate::collect_zones(devices), lang, translator }
    }

    fn track_config(&self, source: RowSource) -> Option<&CategoryConfig> {
        let categories = &self.template.teach_by_example.as_ref()?.categories;
        match source {
            RowSource::Switch { track } => categories.switching_tracks().get(track),
            RowSource::Dimmer { track } => categories.dimming_tracks().get(track),
            RowSource::Blind { track } => categories.shading_tracks().get(track),
            RowSource::Hvac { .. } => categories.hvac_tracks().first(),
            RowSource::Fixed => None,
        }
    }

    fn translated_group_name(&self, cfg: &CategoryConfig) -> Option<String> {
        let raw = cfg.group_name.trim();
        if raw.is_empty() {
            return None;
        }
        Some(self.translator.translate(raw, self.lang, TextKind::ObjectName))
    }

    /// Display label for the category a source belongs to: its configured
    /// group name when set, otherwise the lexicon word. A dim track that is
    /// linked to switching labels as both.
    fn source_label(&self, source: RowSource) -> Option<String> {
        let lexicon = i18n::lexicon(self.lang);
        let cfg = self.track_config(source);
        if let Some(cfg) = cfg
            && let Some(name) = self.translated_group_name(cfg)
        {
            return Some(name);
        }
        match source {
            RowSource::Switch { .. } => Some(lexicon.switching.to_string()),
            RowSource::Dimmer { .. } => {
                let linked = cfg.is_some_and(|c| c.linked_to_switching)
                    && self
                        .template
                        .teach_by_example
                        .as_ref()
                        .is_some_and(|t| !t.categories.switching_tracks().is_empty());
                if linked {
                    Some(format!("{} / {}", lexicon.dimming, lexicon.switching))
                } else {
                    Some(lexicon.dimming.to_string())
                }
            }
            RowSource::Blind { .. } => Some(lexicon.shading.to_string()),
            RowSource::Hvac { .. } => Some(lexicon.climate.to_string()),
            RowSource::Fixed => None,
        }
    }

    fn fixed_main_name(&self, main: u16) -> Option<String> {
        let fixed = self.template.devices.fixed.as_ref()?;
        let group = fixed.main_groups.iter().find(|g| g.main == main)?;
        if group.name.trim().is_empty() {
            return None;
        }
        Some(self.translator.translate(&group.name, self.lang, TextKind::FixedAddressName))
    }

    fn fixed_middle_name(&self, main: u16, middle: u16) -> Option<String> {
        let fixed = self.template.devices.fixed.as_ref()?;
        let group = fixed.main_groups.iter().find(|g| g.main == main)?;
        let middle_group = group.middle_groups.iter().find(|g| g.middle == middle)?;
        if middle_group.name.trim().is_empty() {
            return None;
        }
        Some(self.translator.translate(&middle_group.name, self.lang, TextKind::FixedAddressName))
    }

    fn main_name(&self, main: u16, rows: &[&GroupAddressRow]) -> String {
        if let Some(name) = self.fixed_main_name(main) {
            return name;
        }
        for row in rows {
            if row.source == RowSource::Fixed {
                continue;
            }
            if let Some(label) = self.source_label(row.source) {
                return label;
            }
        }
        if let Some(name) = self.legacy_main_name(main) {
            return name;
        }
        format!("{} {main}", i18n::lexicon(self.lang).main_group)
    }

    fn legacy_main_name(&self, main: u16) -> Option<String> {
        let lexicon = i18n::lexicon(self.lang);
        let devices = &self.template.devices;
        let first_main = |objects: &[crate::template::ObjectTemplate]| {
            objects.first().map(|o| o.main)
        };
        if first_main(&devices.switch.objects) == Some(main) {
            return Some(lexicon.switching.to_string());
        }
        for dimmer in devices.dimmer.as_slice() {
            if first_main(&dimmer.objects) == Some(main) {
                return Some(lexicon.dimming.to_string());
            }
        }
        if first_main(&devices.blind.objects) == Some(main) {
            return Some(lexicon.shading.to_string());
        }
        if first_main(&devices.hvac.objects) == Some(main) {
            return Some(lexicon.climate.to_string());
        }
        None
    }

    fn middle_name(&self, main: u16, middle: u16, rows: &[&GroupAddressRow]) -> String {
        if let Some(name) = self.fixed_middle_name(main, middle) {
            return name;
        }

        // Status rows (sub >= 100 mirroring a sub-100 sibling) never decide
        // the group name when base rows exist.
        let base: Vec<&GroupAddressRow> =
            rows.iter().copied().filter(|r| r.address.parts().2 < 100).collect();
        let candidates = if base.is_empty() { rows } else { &base[..] };

        for row in candidates {
            if let Some(name) = self.source_middle_name(row.source, main, middle) {
                return name;
            }
        }
        if let Some(name) = self.legacy_middle_name(main, middle) {
            return name;
        }
        format!("{} {middle}", i18n::lexicon(self.lang).middle_group)
    }

    fn source_middle_name(&self, source: RowSource, main: u16, middle: u16) -> Option<String> {
        let cfg = self.track_config(source)?;
        if let RowSource::Hvac { zone } = source {
            let mode1 = cfg.example_addresses.first().is_some_and(|e| e.middle_increment == 1);
            if mode1 {
                // Every middle group is one zone; the row remembers which.
                if let Some(zone) = self.zones.get(zone) {
                    let name = names::zone_name(
                        zone,
                        self.lang,
                        self.translator,
                        &NameDisplayOptions::default(),
                    );
                    if !name.is_empty() {
                        return Some(name);
                    }
                }
            }
        }

        let example = cfg.example_addresses.iter().find(|e| e.middle == middle);
        if let Some(example) = example
            && !example.object_name.trim().is_empty()
        {
            let cased = names::title_case(&example.object_name);
            return Some(self.translator.translate(&cased, self.lang, TextKind::ObjectName));
        }
        let extra = cfg
            .extra_objects
            .iter()
            .find(|e| e.middle == Some(middle) && e.main.is_none_or(|m| m == main));
        if let Some(extra) = extra
            && !extra.name.trim().is_empty()
        {
            let cased = names::title_case(&extra.name);
            return Some(self.translator.translate(&cased, self.lang, TextKind::ObjectName));
        }
        None
    }

    fn legacy_middle_name(&self, main: u16, middle: u16) -> Option<String> {
        let devices = &self.template.devices;
        let mut object_lists: Vec<&[crate::template::ObjectTemplate]> =
            vec![&devices.switch.objects];
        for dimmer in devices.dimmer.as_slice() {
            object_lists.push(&dimmer.objects);
        }
        object_lists.push(&devices.blind.objects);
        object_lists.push(&devices.hvac.objects);

        for objects in object_lists {
            if let Some(obj) = objects.iter().find(|o| o.main == main && o.middle == middle) {
                let cased = names::title_case(&obj.name);
                return Some(self.translator.translate(&cased, self.lang, TextKind::ObjectName));
            }
        }
        None
    }
}

/// Group the flat rows into the Main-Group / Middle-Group tree.
///
/// When several dimming tracks share one main group, the main group is
/// emitted once per track so each keeps its own heading; middle groups that
/// belong to no dimming track stay together in a separate entry.
pub fn rollup(
    rows: &[GroupAddressRow],
    template: &TemplateConfig,
    devices: &[Device],
    lang: Language,
    translator: &dyn Translate,
) -> Overview {
    let resolver = Resolver::new(template, devices, lang, translator);

    let mut grouped: BTreeMap<u16, BTreeMap<u16, Vec<&GroupAddressRow>>> = BTreeMap::new();
    for row in rows {
        let (main, middle, _) = row.address.parts();
        grouped.entry(main).or_default().entry(middle).or_default().push(row);
    }

    let dim_track_count = template
        .teach_by_example
        .as_ref()
        .map(|t| t.categories.dimming_tracks().len())
        .unwrap_or(0);

    let mut main_groups = Vec::new();
    for (main, middles) in &grouped {
        let all_rows: Vec<&GroupAddressRow> =
            middles.values().flat_map(|v| v.iter().copied()).collect();

        let mut by_dim_track: BTreeMap<Option<usize>, Vec<(u16, &Vec<&GroupAddressRow>)>> =
            BTreeMap::new();
        for (middle, middle_rows) in middles {
            let track = middle_rows.iter().find_map(|r| match r.source {
                RowSource::Dimmer { track } => Some(track),
                _ => None,
            });
            by_dim_track.entry(track).or_default().push((*middle, middle_rows));
        }
        let distinct_tracks = by_dim_track.keys().filter(|k| k.is_some()).count();

        if dim_track_count > 1 && distinct_tracks > 1 {
            for (track, bucket) in &by_dim_track {
                let middle_groups = build_middles(&resolver, *main, bucket);
                let name = match track {
                    Some(track) => resolver
                        .source_label(RowSource::Dimmer { track: *track })
                        .unwrap_or_else(|| i18n::lexicon(lang).dimming.to_string()),
                    None => {
                        let bucket_rows: Vec<&GroupAddressRow> =
                            bucket.iter().flat_map(|(_, v)| v.iter().copied()).collect();
                        resolver.main_name(*main, &bucket_rows)
                    }
                };
                main_groups.push(MainGroup { main: *main, name, middle_groups });
            }
        } else {
            let bucket: Vec<(u16, &Vec<&GroupAddressRow>)> =
                middles.iter().map(|(m, v)| (*m, v)).collect();
            let middle_groups = build_middles(&resolver, *main, &bucket);
            main_groups.push(MainGroup {
                main: *main,
                name: resolver.main_name(*main, &all_rows),
                middle_groups,
            });
        }
    }

    Overview { main_groups }
}

fn build_middles(
    resolver: &Resolver,
    main: u16,
    middles: &[(u16, &Vec<&GroupAddressRow>)],
) -> Vec<MiddleGroup> {
    middles
        .iter()
        .map(|(middle, rows)| {
            let mut sorted: Vec<&GroupAddressRow> = (*rows).clone();
            sorted.sort_by_key(|r| r.address.parts().2);
            MiddleGroup {
                middle: *middle,
                name: resolver.middle_name(main, *middle, &sorted),
                addresses: sorted.iter().map(|r| entry(r)).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Identity;
    use crate::model::{Category, Output};
    use crate::template::{
        Categories, ExampleAddress, OneOrMany, TeachByExampleConfig,
    };

    fn example(name: &str, main: u16, middle: u16, sub: u16, sub_increment: u16) -> ExampleAddress {
        ExampleAddress {
            object_name: name.into(),
            main,
            middle,
            sub,
            sub_increment,
            enabled: true,
            ..Default::default()
        }
    }

    fn rollup_for(template: &TemplateConfig, devices: &[Device]) -> Overview {
        let rows = generate::generate_group_addresses(
            template,
            devices,
            Language::Nl,
            &Identity,
            &NameDisplayOptions::default(),
        );
        rollup(&rows, template, devices, Language::Nl, &Identity)
    }

    fn switch_device(physical: &str, rooms: &[(&str, &str)]) -> Device {
        Device {
            category: Category::Switch,
            physical_address: Some(physical.into()),
            outputs: rooms
                .iter()
                .enumerate()
                .map(|(i, (addr, name))| Output {
                    channel_name: Some(format!("K{}", i + 1)),
                    room_address: (*addr).into(),
                    room_name: (*name).into(),
                    ..Default::default()
                })
                .collect(),
            zones: Vec::new(),
        }
    }

    #[test]
    fn switch_groups_take_track_and_object_names() {
        let template = TemplateConfig {
            teach_by_example: Some(TeachByExampleConfig {
                categories: Categories {
                    switching: Some(OneOrMany::One(CategoryConfig {
                        group_name: "Verlichting".into(),
                        example_addresses: vec![
                            example("aan/uit", 1, 1, 1, 1),
                            example("aan/uit status", 1, 4, 1, 1),
                        ],
                        ..Default::default()
                    })),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        let devices = vec![switch_device("1.1.1", &[("0.1", "entree")])];
        let overview = rollup_for(&template, &devices);

        assert_eq!(overview.main_groups.len(), 1);
        let main = &overview.main_groups[0];
        assert_eq!(main.main, 1);
        assert_eq!(main.name, "Verlichting");
        let names: Vec<(u16, &str)> =
            main.middle_groups.iter().map(|m| (m.middle, m.name.as_str())).collect();
        assert_eq!(names, [(1, "Aan / Uit"), (4, "Aan / Uit Status")]);
        // Addresses inside a middle group run by sub, placeholder first.
        let subs: Vec<u16> =
            main.middle_groups[0].addresses.iter().map(|e| e.address.parts().2).collect();
        assert_eq!(subs, [0, 1]);
    }

    #[test]
    fn hvac_zone_middles_use_zone_names() {
        let template = TemplateConfig {
            teach_by_example: Some(TeachByExampleConfig {
                categories: Categories {
                    hvac: Some(OneOrMany::One(CategoryConfig {
                        example_addresses: vec![{
                            let mut e = example("temperatuur", 2, 0, 1, 0);
                            e.middle_increment = 1;
                            e
                        }],
                        ..Default::default()
                    })),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        let devices = vec![Device {
            category: Category::Hvac,
            physical_address: None,
            outputs: Vec::new(),
            zones: vec![
                Zone {
                    room_address: "0.1".into(),
                    room_name: "entree".into(),
                    channel_name: Some("K1".into()),
                },
                Zone {
                    room_address: "1.1".into(),
                    room_name: "woonkamer".into(),
                    channel_name: Some("K2".into()),
                },
            ],
        }];
        let overview = rollup_for(&template, &devices);
        let main = &overview.main_groups[0];
        assert_eq!(main.name, "Klimaat / HVAC");
        let names: Vec<(u16, &str)> =
            main.middle_groups.iter().map(|m| (m.middle, m.name.as_str())).collect();
        assert_eq!(names, [(0, "0.1 entree"), (1, "1.1 woonkamer")]);
    }

    #[test]
    fn parallel_dim_tracks_split_the_main_group() {
        let dim_track = |name: &str, middle: u16| CategoryConfig {
            group_name: name.into(),
            example_addresses: vec![example("dimmen", 3, middle, 1, 1)],
            ..Default::default()
        };
        let template = TemplateConfig {
            teach_by_example: Some(TeachByExampleConfig {
                categories: Categories {
                    dimming: Some(OneOrMany::Many(vec![
                        dim_track("DALI", 1),
                        dim_track("1-10V", 2),
                    ])),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        let dimmer = |physical: &str, track: usize| Device {
            category: Category::Dimmer,
            physical_address: Some(physical.into()),
            outputs: vec![Output {
                channel_name: Some("K1".into()),
                room_address: "0.1".into(),
                room_name: "entree".into(),
                dim_group_index: track,
                ..Default::default()
            }],
            zones: Vec::new(),
        };
        let devices = vec![dimmer("1.1.1", 0), dimmer("1.1.2", 1)];
        let overview = rollup_for(&template, &devices);

        let summary: Vec<(u16, &str, Vec<u16>)> = overview
            .main_groups
            .iter()
            .map(|g| {
                (g.main, g.name.as_str(), g.middle_groups.iter().map(|m| m.middle).collect())
            })
            .collect();
        assert_eq!(summary, [(3, "DALI", vec![1]), (3, "1-10V", vec![2])]);
    }

    #[test]
    fn fixed_config_names_win() {
        use crate::template::{FixedConfig, FixedMainGroup, FixedMiddleGroup, FixedSub};
        let template = TemplateConfig {
            devices: crate::template::DeviceTemplates {
                fixed: Some(FixedConfig {
                    main_groups: vec![FixedMainGroup {
                        main: 1,
                        name: "Algemeen".into(),
                        middle_groups: vec![FixedMiddleGroup {
                            middle: 0,
                            name: "Scènes".into(),
                            subs: vec![FixedSub {
                                name: "welkom".into(),
                                sub: 0,
                                dpt: None,
                                enabled: true,
                            }],
                        }],
                    }],
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let overview = rollup_for(&template, &[]);
        let main = &overview.main_groups[0];
        assert_eq!(main.name, "Algemeen");
        assert_eq!(main.middle_groups[0].name, "Scènes");
        assert_eq!(main.middle_groups[0].addresses[0].name, "welkom");
    }

    #[test]
    fn unknown_groups_fall_back_to_generic_labels() {
        let rows = vec![GroupAddressRow {
            address: GroupAddress::ThreeLevel { main: 9, middle: 3, sub: 1 },
            name: "x".into(),
            datapoint_type: "DPT1.001".into(),
            comment: String::new(),
            sort_key: crate::model::SortKey {
                physical_address: [0, 0, 0],
                channel_number: 0,
                object_index: 0,
            },
            source: RowSource::Fixed,
        }];
        let template = TemplateConfig::default();
        let overview = rollup(&rows, &template, &[], Language::Nl, &Identity);
        assert_eq!(overview.main_groups[0].name, "Hoofdgroep 9");
        assert_eq!(overview.main_groups[0].middle_groups[0].name, "Middengroep 3");
    }
}
