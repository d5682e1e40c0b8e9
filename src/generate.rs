//! The generation engine: turns a template plus the device list into the flat
//! row list. Two paths exist, teach-by-example expansion and the older
//! per-category object templates, both feeding the fixed-address generator and
//! the final aggregation.

use std::collections::{HashMap, HashSet};

use crate::address::{self, AddressStructure, GroupAddress};
use crate::aggregate;
use crate::fixed;
use crate::i18n::{Language, TextKind, Translate};
use crate::model::{
    Category, Device, GroupAddressRow, NameDisplayOptions, Output, RowSource, SortKey, Zone,
};
use crate::names;
use crate::pattern::{self, GenerationContext};
use crate::template::{
    CategoryConfig, GroupPattern, SubGroupPattern, TeachByExampleConfig, TemplateConfig, Usage,
};

/// Run the whole pipeline: migrate inputs to standard form, expand either the
/// teach-by-example configuration or the legacy templates, append the fixed
/// scene/central rows, then filter and order the result.
pub fn generate_group_addresses(
    template: &TemplateConfig,
    devices: &[Device],
    lang: Language,
    translator: &dyn Translate,
    options: &NameDisplayOptions,
) -> Vec<GroupAddressRow> {
    let mut migrated = migrate_devices(devices, translator);
    migrated.sort_by_key(|d| address::parse_physical_address(d.physical_address.as_deref()));

    let mut rows = Vec::new();
    if let Some(tbe) = &template.teach_by_example {
        expand_teach_by_example(tbe, &migrated, &mut rows, lang, translator, options);
    } else {
        legacy_templates(template, &migrated, &mut rows, lang, translator, options);
    }

    // Room collection for fixed addresses works on the devices as entered.
    fixed::generate(template, devices, lang, translator, options, &mut rows);

    aggregate::finalize(rows)
}

/// Inputs may have been edited in a translated UI; normalize the free-text
/// fields back to their standard form before any name is built.
fn migrate_devices(devices: &[Device], translator: &dyn Translate) -> Vec<Device> {
    devices
        .iter()
        .map(|device| {
            let mut device = device.clone();
            for output in &mut device.outputs {
                output.room_name = translator.standard_form(&output.room_name, TextKind::RoomName);
                output.fixture = translator.standard_form(&output.fixture, TextKind::Fixture);
            }
            for zone in &mut device.zones {
                zone.room_name = translator.standard_form(&zone.room_name, TextKind::RoomName);
            }
            device
        })
        .collect()
}

/// The stored pattern when present, otherwise a fresh analysis of the example
/// addresses. Tracks whose examples do not form a pattern yield no rows.
fn effective_pattern(cfg: &CategoryConfig) -> Option<GroupPattern> {
    if let Some(p) = &cfg.pattern {
        return Some(p.clone());
    }
    if cfg.example_addresses.is_empty() {
        return None;
    }
    match pattern::analyze(&cfg.example_addresses) {
        Ok(p) => Some(p),
        Err(err) => {
            tracing::warn!(group = cfg.group_name, %err, "example addresses form no usable pattern");
            None
        }
    }
}

/// One device's outputs for a track, with their channel labels, in channel
/// order.
struct UnitBatch<'a> {
    physical_address: Option<&'a str>,
    outputs: Vec<(String, &'a Output)>,
}

fn batches_where<'a>(
    devices: &'a [Device],
    category: Category,
    mut keep: impl FnMut(&Output) -> bool,
) -> Vec<UnitBatch<'a>> {
    devices
        .iter()
        .filter(|d| d.category == category)
        .filter_map(|device| {
            let mut outputs: Vec<(String, &Output)> = device
                .outputs
                .iter()
                .enumerate()
                .filter(|(_, o)| !o.is_reserve && keep(o))
                .map(|(i, o)| (o.channel_name(i), o))
                .collect();
            if outputs.is_empty() {
                return None;
            }
            outputs.sort_by_key(|(label, _)| address::extract_channel_number(label));
            Some(UnitBatch { physical_address: device.physical_address.as_deref(), outputs })
        })
        .collect()
}

struct TrackRun<'a> {
    cfg: &'a CategoryConfig,
    pattern: Option<&'a GroupPattern>,
    source: RowSource,
    /// Switch side of a linked switch/dimmer pair: dim-only objects are
    /// emitted under the placeholder name.
    linked_switch: bool,
    lang: Language,
    translator: &'a dyn Translate,
    options: &'a NameDisplayOptions,
}

fn expand_teach_by_example(
    config: &TeachByExampleConfig,
    devices: &[Device],
    rows: &mut Vec<GroupAddressRow>,
    lang: Language,
    translator: &dyn Translate,
    options: &NameDisplayOptions,
) {
    let categories = &config.categories;
    let switching = categories.switching_tracks();
    let dimming = categories.dimming_tracks();
    let linked_dim_tracks: Vec<usize> = dimming
        .iter()
        .enumerate()
        .filter(|(_, d)| d.linked_to_switching)
        .map(|(i, _)| i)
        .collect();

    for (track, switch_cfg) in switching.iter().enumerate() {
        if switch_cfg.enabled == Usage::None && linked_dim_tracks.is_empty() {
            continue;
        }
        let switch_batches =
            batches_where(devices, Category::Switch, |o| o.switch_group_index == track);
        if switch_batches.is_empty() {
            continue;
        }

        if linked_dim_tracks.is_empty() {
            let pattern = effective_pattern(switch_cfg);
            let run = TrackRun {
                cfg: switch_cfg,
                pattern: pattern.as_ref(),
                source: RowSource::Switch { track },
                linked_switch: false,
                lang,
                translator,
                options,
            };
            let mut ctx = GenerationContext::new();
            process_track(&run, &switch_batches, &mut ctx, rows);
            continue;
        }

        for &dim_track in &linked_dim_tracks {
            let dim_cfg = &dimming[dim_track];
            if dim_cfg.example_addresses.is_empty() {
                continue;
            }

            // Both sides use the dim track's example addresses so their
            // objects line up; names differ per side.
            let modified_switch = CategoryConfig {
                example_addresses: dim_cfg.example_addresses.clone(),
                pattern: switch_cfg.pattern.clone().or_else(|| dim_cfg.pattern.clone()),
                ..switch_cfg.clone()
            };
            let modified_dim = CategoryConfig {
                example_addresses: dim_cfg.example_addresses.clone(),
                pattern: switch_cfg.pattern.clone().or_else(|| dim_cfg.pattern.clone()),
                enabled: dim_cfg.enabled,
                ..switch_cfg.clone()
            };
            let pattern = effective_pattern(&modified_switch);
            let Some(pattern) = pattern else { continue };

            let mut merged: Vec<(Category, UnitBatch)> = Vec::new();
            for batch in batches_where(devices, Category::Switch, |o| {
                o.switch_group_index == track && o.dim_group_index == dim_track
            }) {
                merged.push((Category::Switch, batch));
            }
            for batch in batches_where(devices, Category::Dimmer, |o| {
                o.dim_group_index == dim_track
            }) {
                merged.push((Category::Dimmer, batch));
            }
            if merged.is_empty() {
                continue;
            }
            merged.sort_by_key(|(_, b)| address::parse_physical_address(b.physical_address));

            // One shared context: the combined device sequence draws from a
            // single set of counters so addresses stay consecutive.
            let mut ctx = GenerationContext::new();
            for (category, batch) in &merged {
                let run = match category {
                    Category::Switch => TrackRun {
                        cfg: &modified_switch,
                        pattern: Some(&pattern),
                        source: RowSource::Switch { track },
                        linked_switch: true,
                        lang,
                        translator,
                        options,
                    },
                    _ => TrackRun {
                        cfg: &modified_dim,
                        pattern: Some(&pattern),
                        source: RowSource::Dimmer { track: dim_track },
                        linked_switch: false,
                        lang,
                        translator,
                        options,
                    },
                };
                process_track(&run, std::slice::from_ref(batch), &mut ctx, rows);
            }
        }
    }

    for (track, dim_cfg) in dimming.iter().enumerate() {
        if dim_cfg.enabled == Usage::None {
            continue;
        }
        if dim_cfg.linked_to_switching && !switching.is_empty() {
            // Already handled together with the switch devices.
            continue;
        }
        let batches = batches_where(devices, Category::Dimmer, |o| o.dim_group_index == track);
        if batches.is_empty() {
            continue;
        }
        let pattern = effective_pattern(dim_cfg);
        let run = TrackRun {
            cfg: dim_cfg,
            pattern: pattern.as_ref(),
            source: RowSource::Dimmer { track },
            linked_switch: false,
            lang,
            translator,
            options,
        };
        let mut ctx = GenerationContext::new();
        process_track(&run, &batches, &mut ctx, rows);
    }

    for (track, shade_cfg) in categories.shading_tracks().iter().enumerate() {
        if shade_cfg.enabled == Usage::None {
            continue;
        }
        let batches = batches_where(devices, Category::Blind, |o| o.blind_group_index == track);
        if batches.is_empty() {
            continue;
        }
        let pattern = effective_pattern(shade_cfg);
        let run = TrackRun {
            cfg: shade_cfg,
            pattern: pattern.as_ref(),
            source: RowSource::Blind { track },
            linked_switch: false,
            lang,
            translator,
            options,
        };
        let mut ctx = GenerationContext::new();
        process_track(&run, &batches, &mut ctx, rows);
    }

    if let Some(hvac_cfg) = categories.hvac_tracks().first()
        && hvac_cfg.enabled != Usage::None
    {
        process_hvac(hvac_cfg, devices, rows, lang, translator, options);
    }
}

/// Whether an object of a linked switch track keeps its real name. The on/off
/// pair stays readable on both sides; the dim-only objects become
/// placeholders on the switch side.
fn linked_switch_name_kind(object_name: &str) -> LinkedName {
    let lower = object_name.trim().to_lowercase();
    let normalized = lower.split_whitespace().collect::<Vec<_>>().join(" ");
    match normalized.as_str() {
        "dimmen" | "waarde" | "waarde status" => LinkedName::Placeholder,
        "aan/uit" | "aan / uit" | "aan/uit status" | "aan / uit status" => LinkedName::Always,
        _ => LinkedName::Regular,
    }
}

enum LinkedName {
    Always,
    Regular,
    Placeholder,
}

fn process_track(
    run: &TrackRun,
    batches: &[UnitBatch],
    ctx: &mut GenerationContext,
    rows: &mut Vec<GroupAddressRow>,
) {
    let cfg = run.cfg;
    let examples = &cfg.example_addresses;
    let has_pattern = run.pattern.is_some() && !examples.is_empty();
    if !has_pattern && cfg.extra_objects.is_empty() {
        return;
    }

    for batch in batches {
        let physical = batch.physical_address.unwrap_or("n/a");
        let physical_parts = address::parse_physical_address(batch.physical_address);

        for (label, output) in &batch.outputs {
            let output = *output;
            let comment = names::output_comment(physical, label, run.lang);
            let channel_number = address::extract_channel_number(label);
            let mut used = Vec::new();

            if let Some(pattern) = run.pattern.filter(|_| has_pattern) {
                for (obj_index, ex) in examples.iter().enumerate() {
                    let counter = ctx.counter(obj_index);
                    used.push(obj_index);

                    let base_middle = pattern::pattern_middle(pattern, obj_index, ex);
                    let main = address::clamp_component(
                        i64::from(ex.main) + i64::from(ex.main_increment) * i64::from(counter),
                        31,
                        "main",
                    );
                    let middle = address::clamp_component(
                        i64::from(base_middle)
                            + i64::from(ex.middle_increment) * i64::from(counter),
                        7,
                        "middle",
                    );
                    let sub = if ex.sub_increment > 0 {
                        address::clamp_component(
                            i64::from(ex.sub) + i64::from(ex.sub_increment) * i64::from(counter),
                            255,
                            "sub",
                        )
                    } else {
                        address::clamp_component(
                            i64::from(pattern::pattern_sub(pattern, counter)),
                            255,
                            "sub",
                        )
                    };

                    if pattern.start_sub() == 1 && ctx.claim_sub_zero(main, middle) {
                        rows.push(GroupAddressRow {
                            address: GroupAddress::ThreeLevel { main, middle, sub: 0 },
                            name: "---".to_string(),
                            datapoint_type: ex.dpt().to_string(),
                            comment: String::new(),
                            sort_key: SortKey {
                                physical_address: physical_parts,
                                channel_number: 0,
                                object_index: -1,
                            },
                            source: run.source,
                        });
                    }

                    let should_name = cfg.enabled == Usage::Full && ex.enabled;
                    let real_name = || {
                        names::output_name(
                            output,
                            &ex.object_name,
                            run.lang,
                            run.translator,
                            run.options,
                        )
                    };
                    let name = if run.linked_switch {
                        match linked_switch_name_kind(&ex.object_name) {
                            LinkedName::Placeholder => cfg.unused_name().to_string(),
                            LinkedName::Always => real_name(),
                            LinkedName::Regular if should_name => real_name(),
                            LinkedName::Regular => cfg.unused_name().to_string(),
                        }
                    } else if should_name {
                        real_name()
                    } else {
                        cfg.unused_name().to_string()
                    };

                    rows.push(GroupAddressRow {
                        address: GroupAddress::ThreeLevel { main, middle, sub },
                        name,
                        datapoint_type: ex.dpt().to_string(),
                        comment: comment.clone(),
                        sort_key: SortKey {
                            physical_address: physical_parts,
                            channel_number,
                            object_index: obj_index as i32,
                        },
                        source: run.source,
                    });
                }
                ctx.advance(used);
            }

            for (extra_index, extra) in cfg.extra_objects.iter().enumerate() {
                let first = examples.first();
                let main = extra.main.or(first.map(|e| e.main)).unwrap_or(0);
                let middle = extra.middle.or(first.map(|e| e.middle)).unwrap_or(0);
                let sub = extra.sub.unwrap_or_else(|| {
                    let last = examples.last().map(|e| e.sub).unwrap_or(0);
                    last + 1 + extra_index as u16
                });

                if let Some(pattern) = run.pattern.filter(|_| has_pattern)
                    && pattern.start_sub() == 1
                    && ctx.claim_sub_zero(main, middle)
                {
                    rows.push(GroupAddressRow {
                        address: GroupAddress::ThreeLevel { main, middle, sub: 0 },
                        name: "---".to_string(),
                        datapoint_type: extra.dpt().to_string(),
                        comment: String::new(),
                        sort_key: SortKey {
                            physical_address: physical_parts,
                            channel_number: 0,
                            object_index: -1,
                        },
                        source: run.source,
                    });
                }

                let name =
                    names::output_name(output, &extra.name, run.lang, run.translator, run.options);
                rows.push(GroupAddressRow {
                    address: GroupAddress::ThreeLevel { main, middle, sub: sub.min(255) },
                    name,
                    datapoint_type: extra.dpt().to_string(),
                    comment: comment.clone(),
                    sort_key: SortKey {
                        physical_address: physical_parts,
                        channel_number,
                        object_index: (examples.len() + extra_index) as i32,
                    },
                    source: run.source,
                });
            }
        }
    }
}

/// HVAC zones have no own bus device: rows sort under physical `[0, 0, 0]`
/// and carry no comment. Zones are deduplicated by room address across all
/// zone controllers and numbered globally.
pub(crate) fn collect_zones(devices: &[Device]) -> Vec<Zone> {
    let mut seen = HashSet::new();
    let mut zones = Vec::new();
    for device in devices.iter().filter(|d| d.category == Category::Hvac) {
        let mut sorted: Vec<&Zone> = device.zones.iter().collect();
        sorted.sort_by_key(|z| address::extract_channel_number(z.channel_name()));
        for zone in sorted {
            if seen.insert(zone.room_address.clone()) {
                zones.push(zone.clone());
            }
        }
    }
    zones
}

fn process_hvac(
    cfg: &CategoryConfig,
    devices: &[Device],
    rows: &mut Vec<GroupAddressRow>,
    lang: Language,
    translator: &dyn Translate,
    options: &NameDisplayOptions,
) {
    let Some(pattern) = effective_pattern(cfg) else { return };
    let examples = &cfg.example_addresses;
    let Some(first_example) = examples.first() else { return };

    // Mode 1: every zone claims its own middle group. Mode 2: zones share
    // middle groups and advance through the sub range.
    let zone_per_middle = first_example.middle_increment == 1;
    let start_middle = first_example.middle;
    let start_sub = pattern.start_sub();

    let mut created: HashSet<GroupAddress> = HashSet::new();
    let mut sub_zero_seen: HashSet<(u16, u16)> = HashSet::new();
    let mut sub_counters: HashMap<(u16, u16), u16> = HashMap::new();

    let zones = collect_zones(devices);
    for (zone_index, zone) in zones.iter().enumerate() {
        let zone_label = names::zone_name(zone, lang, translator, options);
        let channel_number = address::extract_channel_number(zone.channel_name());
        let zi = zone_index as i64;

        for (obj_index, ex) in examples.iter().enumerate() {
            let (main, middle, sub);
            if zone_per_middle {
                if ex.middle_increment == 1 && ex.main_increment == 0 {
                    let (m, mid) =
                        pattern::zone_main_and_middle(&pattern, ex.middle, zone_index as u32);
                    main = m;
                    middle = mid;
                } else {
                    main = address::clamp_component(
                        i64::from(ex.main) + i64::from(ex.main_increment) * zi,
                        31,
                        "main",
                    );
                    middle = address::clamp_component(
                        i64::from(ex.middle) + i64::from(ex.middle_increment) * zi,
                        7,
                        "middle",
                    );
                }
                sub = if ex.sub_increment > 0 {
                    address::clamp_component(
                        i64::from(ex.sub) + i64::from(ex.sub_increment) * zi,
                        255,
                        "sub",
                    )
                } else {
                    address::clamp_component(
                        i64::from(start_sub) + obj_index as i64,
                        255,
                        "sub",
                    )
                };
            } else {
                main = address::clamp_component(
                    i64::from(ex.main) + i64::from(ex.main_increment) * zi,
                    31,
                    "main",
                );
                middle = address::clamp_component(
                    i64::from(ex.middle) + i64::from(ex.middle_increment) * zi,
                    7,
                    "middle",
                );
                let key = (main, middle);
                let current = sub_counters.get(&key).copied().unwrap_or(start_sub);
                let raw = if ex.sub_increment > 0 {
                    i64::from(ex.sub) + i64::from(ex.sub_increment) * zi
                } else {
                    match pattern.sub_group_pattern {
                        SubGroupPattern::Increment => i64::from(start_sub) + obj_index as i64,
                        SubGroupPattern::Offset => {
                            let offset = pattern.offset_value.unwrap_or(100);
                            sub_counters.insert(key, current.saturating_add(offset));
                            i64::from(current)
                        }
                        SubGroupPattern::Sequence => {
                            sub_counters.insert(key, current + 1);
                            i64::from(ex.sub) + i64::from(current - start_sub.min(current))
                        }
                    }
                };
                sub = address::clamp_component(raw, 255, "sub");
            }

            if start_sub == 1 && !sub_zero_seen.contains(&(main, middle)) {
                let placeholder = GroupAddress::ThreeLevel { main, middle, sub: 0 };
                if created.insert(placeholder) {
                    rows.push(GroupAddressRow {
                        address: placeholder,
                        name: "---".to_string(),
                        datapoint_type: ex.dpt().to_string(),
                        comment: String::new(),
                        sort_key: SortKey {
                            physical_address: [0, 0, 0],
                            channel_number: 0,
                            object_index: -1,
                        },
                        source: RowSource::Hvac { zone: zone_index },
                    });
                }
                sub_zero_seen.insert((main, middle));
            }

            let address = GroupAddress::ThreeLevel { main, middle, sub };
            if !created.insert(address) {
                tracing::debug!(%address, zone = zone_index, "duplicate zone address dropped");
                continue;
            }

            let should_name = cfg.enabled == Usage::Full && ex.enabled;
            let name = if should_name {
                let object = translator.translate(&ex.object_name, lang, TextKind::ObjectName);
                format!("{zone_label} {object}").trim().to_lowercase()
            } else {
                cfg.unused_name().to_string()
            };

            rows.push(GroupAddressRow {
                address,
                name,
                datapoint_type: ex.dpt().to_string(),
                comment: String::new(),
                sort_key: SortKey {
                    physical_address: [0, 0, 0],
                    channel_number,
                    object_index: obj_index as i32,
                },
                source: RowSource::Hvac { zone: zone_index },
            });
        }

        for (extra_index, extra) in cfg.extra_objects.iter().enumerate() {
            let main_increment = i64::from(first_example.main_increment);
            let middle_increment = i64::from(first_example.middle_increment);
            let sub_increment =
                i64::from(extra.sub_increment.unwrap_or(first_example.sub_increment));

            if zone_index == 0 && start_sub == 1 {
                let (zone_main, zone_middle) = if zone_per_middle {
                    pattern::zone_main_and_middle(&pattern, start_middle, 0)
                } else {
                    (pattern.fixed_main, start_middle)
                };
                let main = extra.main.unwrap_or(zone_main);
                let middle = extra.middle.unwrap_or(zone_middle);
                if !sub_zero_seen.contains(&(main, middle)) {
                    let placeholder = GroupAddress::ThreeLevel { main, middle, sub: 0 };
                    if created.insert(placeholder) {
                        rows.push(GroupAddressRow {
                            address: placeholder,
                            name: "---".to_string(),
                            datapoint_type: extra.dpt().to_string(),
                            comment: String::new(),
                            sort_key: SortKey {
                                physical_address: [0, 0, 0],
                                channel_number: 0,
                                object_index: -1,
                            },
                            source: RowSource::Hvac { zone: zone_index },
                        });
                        sub_zero_seen.insert((main, middle));
                    }
                }
            }

            let (main, middle, sub);
            if zone_per_middle {
                let (zone_main, zone_middle) =
                    pattern::zone_main_and_middle(&pattern, start_middle, zone_index as u32);
                main = address::clamp_component(
                    i64::from(extra.main.unwrap_or(zone_main)) + main_increment * zi,
                    31,
                    "main",
                );
                middle = address::clamp_component(
                    i64::from(extra.middle.unwrap_or(zone_middle)) + middle_increment * zi,
                    7,
                    "middle",
                );
                let base_sub = extra.sub.map(i64::from).unwrap_or(
                    i64::from(start_sub) + examples.len() as i64 + extra_index as i64,
                );
                sub = address::clamp_component(base_sub + sub_increment * zi, 255, "sub");
            } else {
                main = address::clamp_component(
                    i64::from(extra.main.unwrap_or(pattern.fixed_main)) + main_increment * zi,
                    31,
                    "main",
                );
                middle = address::clamp_component(
                    i64::from(extra.middle.unwrap_or(start_middle.saturating_add(
                        zone_index as u16,
                    ))) + middle_increment * zi,
                    7,
                    "middle",
                );
                let last_example_sub =
                    examples.last().map(|e| e.sub).unwrap_or(start_sub);
                let raw = if let Some(explicit) = extra.sub {
                    i64::from(explicit) + sub_increment * zi
                } else if pattern.sub_group_pattern == SubGroupPattern::Increment {
                    i64::from(last_example_sub) + 1 + extra_index as i64 + sub_increment * zi
                } else {
                    let key = (main, middle);
                    let current =
                        *sub_counters.entry(key).or_insert(last_example_sub.saturating_add(1));
                    sub_counters.insert(key, current + 1);
                    i64::from(current) + sub_increment * zi
                };
                sub = address::clamp_component(raw, 255, "sub");
            }

            let address = GroupAddress::ThreeLevel { main, middle, sub };
            if !created.insert(address) {
                tracing::debug!(%address, zone = zone_index, "duplicate zone address dropped");
                continue;
            }

            let object = translator.translate(&extra.name, lang, TextKind::ObjectName);
            let name = if object.trim().is_empty() {
                zone_label.clone()
            } else {
                format!("{zone_label} {object}").trim().to_lowercase()
            };
            rows.push(GroupAddressRow {
                address,
                name,
                datapoint_type: extra.dpt().to_string(),
                comment: String::new(),
                sort_key: SortKey {
                    physical_address: [0, 0, 0],
                    channel_number,
                    object_index: (examples.len() + extra_index) as i32,
                },
                source: RowSource::Hvac { zone: zone_index },
            });
        }
    }
}

/// Pre-teach-by-example generation: every category carries an explicit object
/// list, and one counter per `(main, middle)` slot numbers the devices.
fn legacy_templates(
    template: &TemplateConfig,
    devices: &[Device],
    rows: &mut Vec<GroupAddressRow>,
    lang: Language,
    translator: &dyn Translate,
    options: &NameDisplayOptions,
) {
    let mut counters: HashMap<(u16, u16), u32> = HashMap::new();

    for device in devices {
        if matches!(device.category, Category::Hvac | Category::Central) {
            continue;
        }
        let physical = device.physical_address.as_deref().unwrap_or("n/a");
        let physical_parts = address::parse_physical_address(device.physical_address.as_deref());

        let mut outputs: Vec<(String, &Output)> = device
            .outputs
            .iter()
            .enumerate()
            .map(|(i, o)| (o.channel_name(i), o))
            .collect();
        outputs.sort_by_key(|(label, _)| address::extract_channel_number(label));

        for (label, output) in outputs {
            if output.is_reserve {
                continue;
            }
            let comment = names::output_comment(physical, &label, lang);
            let channel_number = address::extract_channel_number(&label);

            let (cfg, source, fixture): (_, _, &str) = match device.category {
                Category::Switch => (
                    &template.devices.switch,
                    RowSource::Switch { track: 0 },
                    output.fixture.as_str(),
                ),
                Category::Dimmer => {
                    let dimmers = template.devices.dimmer.as_slice();
                    let track = if output.dim_group_index < dimmers.len() {
                        output.dim_group_index
                    } else {
                        0
                    };
                    let Some(cfg) = dimmers.get(track) else { continue };
                    (cfg, RowSource::Dimmer { track }, output.fixture.as_str())
                }
                Category::Blind => {
                    let fixture: &str = if output.fixture.trim().is_empty() {
                        "Zonwering"
                    } else {
                        &output.fixture
                    };
                    (&template.devices.blind, RowSource::Blind { track: 0 }, fixture)
                }
                _ => continue,
            };

            for (obj_index, obj) in cfg.objects.iter().enumerate() {
                if obj.main == 0 && obj.middle == 0 {
                    continue;
                }
                let slot = (obj.main, obj.middle);
                let count = counters.get(&slot).copied().unwrap_or(0);
                counters.insert(slot, count + 1);

                if let Some(addressing) = &cfg.addressing
                    && addressing.mode == crate::address::AddressingMode::Mode1
                    && addressing.function_number.unwrap_or(obj.main) == 0
                    && obj.middle == 0
                {
                    continue;
                }

                let is_status = address::is_status_object(&obj.name);
                let address = address::build_with_mode(
                    obj.main,
                    obj.middle,
                    count,
                    template.address_structure,
                    cfg.addressing.as_ref(),
                    &output.room_address,
                    is_status,
                );
                if address.is_invalid() {
                    continue;
                }

                let name = if obj.enabled {
                    names::legacy_name(output, fixture, &obj.name, lang, translator, options)
                } else {
                    "---".to_string()
                };
                rows.push(GroupAddressRow {
                    address,
                    name,
                    datapoint_type: obj.dpt.clone(),
                    comment: comment.clone(),
                    sort_key: SortKey {
                        physical_address: physical_parts,
                        channel_number,
                        object_index: obj_index as i32,
                    },
                    source,
                });
            }
        }
    }

    legacy_hvac(template, devices, rows, lang, translator);
}

fn legacy_hvac(
    template: &TemplateConfig,
    devices: &[Device],
    rows: &mut Vec<GroupAddressRow>,
    lang: Language,
    translator: &dyn Translate,
) {
    let cfg = &template.devices.hvac;
    if cfg.objects.is_empty() {
        return;
    }

    let mut zone_number: u32 = 0;
    for device in devices.iter().filter(|d| d.category == Category::Hvac) {
        let mut zones: Vec<&Zone> = device.zones.iter().collect();
        zones.sort_by_key(|z| address::extract_channel_number(z.channel_name()));

        for zone in zones {
            zone_number += 1;
            let comment = names::output_comment("HVAC", zone.channel_name(), lang);

            for obj in &cfg.objects {
                let is_status = address::is_status_object(&obj.name);
                let mut sub = i64::from(obj.start) + i64::from(zone_number) - 1;
                if is_status && let Some(addressing) = &cfg.addressing {
                    match addressing.mode {
                        crate::address::AddressingMode::Mode2 => sub += 1,
                        crate::address::AddressingMode::Mode3 => {
                            sub += i64::from(addressing.status_offset.unwrap_or(100));
                        }
                        crate::address::AddressingMode::Mode1 => {}
                    }
                }
                let sub = address::clamp_component(sub, 255, "sub");

                let address = match template.address_structure {
                    AddressStructure::TwoLevel => GroupAddress::TwoLevel {
                        main: obj.main,
                        sub: address::clamp_component(
                            i64::from(obj.middle) + i64::from(sub.max(1)) - 1,
                            2047,
                            "sub",
                        ),
                    },
                    AddressStructure::ThreeLevel => {
                        GroupAddress::ThreeLevel { main: obj.main, middle: obj.middle, sub }
                    }
                };

                let name = if obj.enabled {
                    let room =
                        translator.translate(&zone.room_name, lang, TextKind::RoomName);
                    let object = translator.translate(&obj.name, lang, TextKind::ObjectName);
                    let climate = crate::i18n::lexicon(lang).climate;
                    let mut parts = Vec::new();
                    if !zone.room_address.trim().is_empty() {
                        parts.push(zone.room_address.as_str());
                    }
                    if !room.trim().is_empty() {
                        parts.push(room.as_str());
                    }
                    parts.push(climate);
                    if !object.trim().is_empty() {
                        parts.push(object.as_str());
                    }
                    parts.join(" ")
                } else {
                    "---".to_string()
                };

                rows.push(GroupAddressRow {
                    address,
                    name,
                    datapoint_type: obj.dpt.clone(),
                    comment: comment.clone(),
                    sort_key: SortKey {
                        physical_address: [0, 0, 0],
                        channel_number: address::extract_channel_number(zone.channel_name()),
                        object_index: i32::from(obj.main) * 10_000
                            + i32::from(obj.middle) * 100
                            + zone_number as i32,
                    },
                    source: RowSource::Hvac { zone: zone_number as usize - 1 },
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Identity;
    use crate::template::{Categories, ExampleAddress, ObjectTemplate, OneOrMany};

    fn example(
        name: &str,
        main: u16,
        middle: u16,
        sub: u16,
        sub_increment: u16,
    ) -> ExampleAddress {
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

    fn run(template: &TemplateConfig, devices: &[Device]) -> Vec<GroupAddressRow> {
        generate_group_addresses(
            template,
            devices,
            Language::Nl,
            &Identity,
            &NameDisplayOptions::default(),
        )
    }

    fn tbe_template(categories: Categories) -> TemplateConfig {
        TemplateConfig {
            teach_by_example: Some(TeachByExampleConfig {
                categories,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn switch_track_expands_per_output() {
        let template = tbe_template(Categories {
            switching: Some(OneOrMany::One(CategoryConfig {
                group_name: "Verlichting".into(),
                example_addresses: vec![example("aan/uit", 1, 1, 1, 1)],
                ..Default::default()
            })),
            ..Default::default()
        });
        let devices = vec![switch_device("1.1.1", &[("0.1", "entree"), ("0.2", "keuken")])];
        let rows = run(&template, &devices);

        let summary: Vec<(String, String)> =
            rows.iter().map(|r| (r.address.to_string(), r.name.clone())).collect();
        assert_eq!(
            summary,
            [
                ("1/1/0".to_string(), "---".to_string()),
                ("1/1/1".to_string(), "0.1 entree aan/uit".to_string()),
                ("1/1/2".to_string(), "0.2 keuken aan/uit".to_string()),
            ]
        );
        assert_eq!(rows[1].comment, "1.1.1 uitgang K1");
        assert_eq!(rows[2].comment, "1.1.1 uitgang K2");
    }

    #[test]
    fn partial_track_allocates_but_blanks_names() {
        let template = tbe_template(Categories {
            switching: Some(OneOrMany::One(CategoryConfig {
                enabled: Usage::Partial,
                example_addresses: vec![example("aan/uit", 1, 1, 1, 1)],
                ..Default::default()
            })),
            ..Default::default()
        });
        let devices = vec![switch_device("1.1.1", &[("0.1", "entree")])];
        let rows = run(&template, &devices);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].address.to_string(), "1/1/1");
        assert_eq!(rows[1].name, "---");
    }

    #[test]
    fn linked_dimming_merges_by_physical_address() {
        let template = tbe_template(Categories {
            switching: Some(OneOrMany::One(CategoryConfig {
                group_name: "Schakelen".into(),
                ..Default::default()
            })),
            dimming: Some(OneOrMany::One(CategoryConfig {
                group_name: "Dimmen".into(),
                linked_to_switching: true,
                example_addresses: vec![
                    example("aan/uit", 1, 1, 1, 1),
                    example("dimmen", 1, 2, 1, 1),
                    example("waarde status", 1, 3, 1, 1),
                ],
                ..Default::default()
            })),
            ..Default::default()
        });
        let devices = vec![
            switch_device("1.1.2", &[("0.2", "keuken")]),
            Device {
                category: Category::Dimmer,
                physical_address: Some("1.1.1".into()),
                outputs: vec![Output {
                    channel_name: Some("K1".into()),
                    room_address: "0.1".into(),
                    room_name: "woonkamer".into(),
                    ..Default::default()
                }],
                zones: Vec::new(),
            },
        ];
        let rows = run(&template, &devices);
        let find = |addr: &str| {
            rows.iter().find(|r| r.address.to_string() == addr).map(|r| r.name.clone())
        };

        // The dimmer at 1.1.1 comes first and takes sub 1, the switch at
        // 1.1.2 continues with sub 2.
        assert_eq!(find("1/1/1"), Some("0.1 woonkamer aan/uit".to_string()));
        assert_eq!(find("1/2/1"), Some("0.1 woonkamer dimmen".to_string()));
        assert_eq!(find("1/1/2"), Some("0.2 keuken aan/uit".to_string()));
        assert_eq!(find("1/2/2"), Some("---".to_string()));
        assert_eq!(find("1/3/2"), Some("---".to_string()));
        // One sub-zero row per middle group, created once.
        assert_eq!(rows.iter().filter(|r| r.address.to_string() == "1/1/0").count(), 1);
    }

    #[test]
    fn hvac_zone_per_middle_group() {
        let template = tbe_template(Categories {
            hvac: Some(OneOrMany::One(CategoryConfig {
                group_name: "Klimaat".into(),
                example_addresses: vec![{
                    let mut e = example("gemeten temperatuur", 2, 0, 1, 0);
                    e.middle_increment = 1;
                    e
                }],
                ..Default::default()
            })),
            ..Default::default()
        });
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
        let rows = run(&template, &devices);
        let find = |addr: &str| {
            rows.iter().find(|r| r.address.to_string() == addr).map(|r| r.name.clone())
        };
        assert_eq!(find("2/0/1"), Some("0.1 entree gemeten temperatuur".to_string()));
        assert_eq!(find("2/1/1"), Some("1.1 woonkamer gemeten temperatuur".to_string()));
        assert_eq!(find("2/0/0"), Some("---".to_string()));
        assert_eq!(find("2/1/0"), Some("---".to_string()));
        assert!(rows.iter().all(|r| r.comment.is_empty()));
    }

    #[test]
    fn hvac_zones_dedup_by_room_address() {
        let template = tbe_template(Categories {
            hvac: Some(OneOrMany::One(CategoryConfig {
                example_addresses: vec![{
                    let mut e = example("temperatuur", 2, 0, 1, 0);
                    e.middle_increment = 1;
                    e
                }],
                ..Default::default()
            })),
            ..Default::default()
        });
        let zone = |addr: &str, name: &str| Zone {
            room_address: addr.into(),
            room_name: name.into(),
            channel_name: Some("K1".into()),
        };
        let devices = vec![
            Device {
                category: Category::Hvac,
                physical_address: None,
                outputs: Vec::new(),
                zones: vec![zone("0.1", "entree")],
            },
            Device {
                category: Category::Hvac,
                physical_address: None,
                outputs: Vec::new(),
                zones: vec![zone("0.1", "hal")],
            },
        ];
        let rows = run(&template, &devices);
        assert_eq!(
            rows.iter().filter(|r| r.name.contains("temperatuur")).count(),
            1
        );
    }

    #[test]
    fn reserve_outputs_produce_no_rows() {
        let template = tbe_template(Categories {
            switching: Some(OneOrMany::One(CategoryConfig {
                example_addresses: vec![example("aan/uit", 1, 1, 1, 1)],
                ..Default::default()
            })),
            ..Default::default()
        });
        let mut device = switch_device("1.1.1", &[("0.1", "entree"), ("0.2", "keuken")]);
        device.outputs[1].is_reserve = true;
        let rows = run(&template, &[device]);
        assert!(rows.iter().all(|r| !r.name.contains("keuken")));
        // The reserve channel does not advance the counter either.
        assert!(rows.iter().any(|r| r.address.to_string() == "1/1/1"));
        assert!(!rows.iter().any(|r| r.address.to_string() == "1/1/2"));
    }

    #[test]
    fn legacy_switch_counts_per_slot() {
        let template = TemplateConfig {
            devices: crate::template::DeviceTemplates {
                switch: crate::template::CategoryTemplate {
                    objects: vec![
                        ObjectTemplate {
                            name: "aan/uit".into(),
                            dpt: "DPT1.001".into(),
                            main: 1,
                            middle: 1,
                            start: 1,
                            enabled: true,
                        },
                        ObjectTemplate {
                            name: "aan/uit status".into(),
                            dpt: "DPT1.001".into(),
                            main: 1,
                            middle: 4,
                            start: 1,
                            enabled: false,
                        },
                    ],
                    addressing: None,
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let devices = vec![switch_device("1.1.1", &[("0.1", "entree"), ("0.2", "keuken")])];
        let rows = run(&template, &devices);
        let summary: Vec<(String, String)> =
            rows.iter().map(|r| (r.address.to_string(), r.name.clone())).collect();
        assert_eq!(
            summary,
            [
                ("1/1/1".to_string(), "0.1 entree aan/uit".to_string()),
                ("1/1/2".to_string(), "0.2 keuken aan/uit".to_string()),
                ("1/4/1".to_string(), "---".to_string()),
                ("1/4/2".to_string(), "---".to_string()),
            ]
        );
    }

    #[test]
    fn legacy_hvac_numbers_zones_globally() {
        let template = TemplateConfig {
            devices: crate::template::DeviceTemplates {
                hvac: crate::template::CategoryTemplate {
                    objects: vec![ObjectTemplate {
                        name: "setpoint".into(),
                        dpt: "DPT9.001".into(),
                        main: 2,
                        middle: 1,
                        start: 1,
                        enabled: true,
                    }],
                    addressing: None,
                },
                ..Default::default()
            },
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
        let rows = run(&template, &devices);
        let summary: Vec<(String, String)> =
            rows.iter().map(|r| (r.address.to_string(), r.name.clone())).collect();
        assert_eq!(
            summary,
            [
                ("2/1/1".to_string(), "0.1 entree Klimaat / HVAC setpoint".to_string()),
                ("2/1/2".to_string(), "1.1 woonkamer Klimaat / HVAC setpoint".to_string()),
            ]
        );
        assert_eq!(rows[0].comment, "HVAC uitgang K1");
    }
}
