//! Fixed group addresses: the scene and central blocks plus any other
//! manually configured middle groups.

use std::collections::{HashMap, HashSet};

use crate::address;
use crate::i18n::{self, Language, TextKind, Translate};
use crate::model::{Category, Device, GroupAddressRow, NameDisplayOptions, RowSource, SortKey};
use crate::names;
use crate::template::{FixedMiddleGroup, FixedSub, TemplateConfig};

/// Which well-known block a fixed middle group represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockKind {
    Scenes,
    CentralSwitching,
    CentralDimming,
    CentralBlind,
}

/// Recognize a block by its (possibly translated) name, or by the standard
/// layout convention: main group 1 reserves middle groups 0..=3 for scenes,
/// central switching, central dimming and central blinds in that order.
fn detect_block(main: u16, middle_group: &FixedMiddleGroup) -> Option<BlockKind> {
    let name = &middle_group.name;
    if i18n::matches_variant(name, i18n::SCENE_VARIANTS) {
        return Some(BlockKind::Scenes);
    }
    if i18n::matches_variant(name, i18n::CENTRAL_SWITCHING_VARIANTS) {
        return Some(BlockKind::CentralSwitching);
    }
    if i18n::matches_variant(name, i18n::CENTRAL_DIMMING_VARIANTS) {
        return Some(BlockKind::CentralDimming);
    }
    if i18n::matches_variant(name, i18n::CENTRAL_BLIND_VARIANTS) {
        return Some(BlockKind::CentralBlind);
    }
    if main == 1 {
        match middle_group.middle {
            0 => Some(BlockKind::Scenes),
            1 => Some(BlockKind::CentralSwitching),
            2 => Some(BlockKind::CentralDimming),
            3 => Some(BlockKind::CentralBlind),
            _ => None,
        }
    } else {
        None
    }
}

/// Does this sub-0 entry count as the block's default row?
fn is_default_entry(kind: BlockKind, sub: &FixedSub) -> bool {
    if sub.sub != 0 {
        return false;
    }
    let name = sub.name.trim();
    match kind {
        BlockKind::CentralSwitching => i18n::matches_variant(name, i18n::ALL_OFF_VARIANTS),
        BlockKind::Scenes => i18n::matches_variant(name, i18n::WELCOME_VARIANTS),
        BlockKind::CentralDimming | BlockKind::CentralBlind => {
            matches!(name, "---" | "—" | "–")
        }
    }
}

#[derive(Clone, Debug)]
struct Room {
    room_address: String,
    room_name: String,
}

/// Every room referenced by a non-reserve output or HVAC zone.
fn collect_rooms(devices: &[Device]) -> Vec<Room> {
    let mut seen = HashSet::new();
    let mut rooms = Vec::new();
    for device in devices {
        if device.category == Category::Hvac {
            for zone in &device.zones {
                push_room(&mut seen, &mut rooms, &zone.room_address, &zone.room_name);
            }
        } else if device.category != Category::Central {
            for output in &device.outputs {
                if output.is_reserve {
                    continue;
                }
                push_room(&mut seen, &mut rooms, &output.room_address, &output.room_name);
            }
        }
    }
    rooms
}

fn push_room(
    seen: &mut HashSet<String>,
    rooms: &mut Vec<Room>,
    room_address: &str,
    room_name: &str,
) {
    if room_address.trim().is_empty() && room_name.trim().is_empty() {
        return;
    }
    let key = format!("{room_address}-{room_name}");
    if seen.insert(key) {
        rooms.push(Room { room_address: room_address.to_string(), room_name: room_name.to_string() });
    }
}

fn fixed_sort_key(main: u16, middle: u16, sub: u16) -> SortKey {
    SortKey {
        physical_address: [0, 0, 0],
        channel_number: 0,
        object_index: i32::from(main) * 10_000 + i32::from(middle) * 100 + i32::from(sub),
    }
}

fn push_named(
    rows: &mut Vec<GroupAddressRow>,
    template: &TemplateConfig,
    main: u16,
    middle: u16,
    sub: &FixedSub,
    lang: Language,
    translator: &dyn Translate,
) {
    let address = address::build_fixed(main, middle, sub.sub, template.address_structure);
    if address.is_invalid() {
        return;
    }
    let name = translator.translate(&sub.name, lang, TextKind::FixedAddressName);
    rows.push(GroupAddressRow {
        address,
        name: names::lowercase_first(&name),
        datapoint_type: sub.dpt().to_string(),
        comment: String::new(),
        sort_key: fixed_sort_key(main, middle, sub.sub),
        source: RowSource::Fixed,
    });
}

/// Generate all fixed rows into `rows`.
///
/// Scene/central blocks with auto-generation on get their default sub-0 row,
/// one row per unique room address (sub 1..=99, sorted by floor then room,
/// negative floors first) and any manually maintained entries at sub >= 100.
/// Everything else emits its enabled entries as configured.
pub fn generate(
    template: &TemplateConfig,
    devices: &[Device],
    lang: Language,
    translator: &dyn Translate,
    options: &NameDisplayOptions,
    rows: &mut Vec<GroupAddressRow>,
) {
    let Some(fixed) = &template.devices.fixed else { return };

    let auto_enabled = template
        .teach_by_example
        .as_ref()
        .map(|tbe| tbe.auto_generate_room_addresses)
        .unwrap_or(false);
    let per_kind = template
        .teach_by_example
        .as_ref()
        .map(|tbe| tbe.auto_generate_middle_groups)
        .unwrap_or_default();

    let rooms = collect_rooms(devices);

    for main_group in &fixed.main_groups {
        if main_group.main == 0 {
            continue;
        }
        for middle_group in &main_group.middle_groups {
            let kind = detect_block(main_group.main, middle_group);
            let kind_enabled = match kind {
                Some(BlockKind::Scenes) => per_kind.scenes,
                Some(BlockKind::CentralSwitching) => per_kind.central_switching,
                Some(BlockKind::CentralDimming) => per_kind.central_dimming,
                Some(BlockKind::CentralBlind) => per_kind.central_blind,
                None => false,
            };

            if let Some(kind) = kind
                && auto_enabled
                && kind_enabled
            {
                if let Some(sub0) = middle_group.subs.iter().find(|s| is_default_entry(kind, s)) {
                    push_named(
                        rows,
                        template,
                        main_group.main,
                        middle_group.middle,
                        sub0,
                        lang,
                        translator,
                    );
                }

                // One row per unique room address, in floor/room order.
                let mut unique: HashMap<&str, &Room> = HashMap::new();
                let mut ordered: Vec<&Room> = Vec::new();
                for room in &rooms {
                    let addr = room.room_address.trim();
                    if addr.is_empty() {
                        continue;
                    }
                    if unique.insert(addr, room).is_none() {
                        ordered.push(room);
                    }
                }
                ordered.sort_by_key(|room| address::parse_room_address(&room.room_address));

                let default_dpt =
                    middle_group.subs.first().map(FixedSub::dpt).unwrap_or("DPT1.001");
                let mut sub_counter: u16 = 1;
                for room in ordered {
                    if sub_counter > 99 {
                        tracing::warn!(
                            middle_group = middle_group.name,
                            "auto-generated room addresses exhausted at sub 99, \
                             remaining rooms skipped"
                        );
                        break;
                    }
                    let address = address::build_fixed(
                        main_group.main,
                        middle_group.middle,
                        sub_counter,
                        template.address_structure,
                    );
                    if address.is_invalid() {
                        continue;
                    }
                    let name = if options.show_room_address && !room.room_address.is_empty() {
                        names::zone_name(
                            &crate::model::Zone {
                                room_address: room.room_address.clone(),
                                room_name: room.room_name.clone(),
                                channel_name: None,
                            },
                            lang,
                            translator,
                            options,
                        )
                    } else {
                        translator.translate(&room.room_name, lang, TextKind::RoomName)
                    };
                    rows.push(GroupAddressRow {
                        address,
                        name: name.to_lowercase(),
                        datapoint_type: default_dpt.to_string(),
                        comment: String::new(),
                        sort_key: fixed_sort_key(main_group.main, middle_group.middle, sub_counter),
                        source: RowSource::Fixed,
                    });
                    sub_counter += 1;
                }

                // The manual band above the auto-generated range.
                for sub in middle_group.subs.iter().filter(|s| s.enabled && s.sub >= 100) {
                    push_named(
                        rows,
                        template,
                        main_group.main,
                        middle_group.middle,
                        sub,
                        lang,
                        translator,
                    );
                }
            } else {
                for sub in middle_group.subs.iter().filter(|s| s.enabled) {
                    push_named(
                        rows,
                        template,
                        main_group.main,
                        middle_group.middle,
                        sub,
                        lang,
                        translator,
                    );
                }
            }
        }
    }
}
