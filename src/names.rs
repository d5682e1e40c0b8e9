//! Row name and comment composition.

use crate::i18n::{self, Language, TextKind, Translate};
use crate::model::{NameDisplayOptions, Output, Zone};

/// Join the non-empty parts with single spaces.
fn join_parts(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(part);
    }
    out
}

/// Name for a teach-by-example row:
/// `room-address room-name fixture switch-code object-name`, lowercased.
pub fn output_name(
    output: &Output,
    object_name: &str,
    lang: Language,
    translator: &dyn Translate,
    options: &NameDisplayOptions,
) -> String {
    let address = if options.show_room_address { output.room_address.as_str() } else { "" };
    let room = translate_nonempty(&output.room_name, lang, TextKind::RoomName, translator);
    let fixture = translate_nonempty(&output.fixture, lang, TextKind::Fixture, translator);
    let object = if options.show_object_name {
        translate_nonempty(object_name, lang, TextKind::ObjectName, translator)
    } else {
        String::new()
    };
    let code = if options.show_switch_code { output.switch_code.as_str() } else { "" };
    join_parts(&[address, &room, &fixture, code, &object]).to_lowercase()
}

/// Name for a legacy-template row. Reserve channels and fully empty outputs
/// collapse to the translated reserve placeholder.
pub fn legacy_name(
    output: &Output,
    fixture: &str,
    object_name: &str,
    lang: Language,
    translator: &dyn Translate,
    options: &NameDisplayOptions,
) -> String {
    let reserve = i18n::lexicon(lang).reserve;
    if output.is_reserve {
        return reserve.to_string();
    }
    let empty = output.room_address.trim().is_empty()
        && output.room_name.trim().is_empty()
        && fixture.trim().is_empty();
    if empty {
        return reserve.to_string();
    }

    let address = if options.show_room_address { output.room_address.as_str() } else { "" };
    let room = translate_nonempty(&output.room_name, lang, TextKind::RoomName, translator);
    let fixture = translate_nonempty(fixture, lang, TextKind::Fixture, translator);
    let object = if options.show_object_name { object_name } else { "" };
    let code = if options.show_switch_code { output.switch_code.as_str() } else { "" };
    let name = join_parts(&[address, &room, &fixture, code, object]).to_lowercase();
    if name.is_empty() { reserve.to_string() } else { name }
}

/// `room-address room-name` for an HVAC zone, e.g. `"0.1 entree"`.
pub fn zone_name(
    zone: &Zone,
    lang: Language,
    translator: &dyn Translate,
    options: &NameDisplayOptions,
) -> String {
    let address = if options.show_room_address { zone.room_address.as_str() } else { "" };
    let room = translate_nonempty(&zone.room_name, lang, TextKind::RoomName, translator);
    join_parts(&[address, &room])
}

/// Comment tying a row back to its actuator channel:
/// `"1.1.3 uitgang K2"`, with the output word in the target language.
pub fn output_comment(physical: &str, channel: &str, lang: Language) -> String {
    let output_word = lowercase_first(i18n::lexicon(lang).output);
    join_parts(&[physical, &output_word, channel])
}

fn translate_nonempty(
    text: &str,
    lang: Language,
    kind: TextKind,
    translator: &dyn Translate,
) -> String {
    if text.trim().is_empty() {
        String::new()
    } else {
        translator.translate(text, lang, kind)
    }
}

pub fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Capitalize each word, keeping slash-joined pairs readable:
/// `"aan/uit status"` -> `"Aan / Uit Status"`.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            if word.contains('/') {
                word.split('/').map(capitalize).collect::<Vec<_>>().join(" / ")
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Identity;

    fn output() -> Output {
        Output {
            channel_name: Some("K1".into()),
            room_address: "0.1".into(),
            room_name: "Entree".into(),
            fixture: "spots".into(),
            switch_code: "S1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn output_name_joins_and_lowercases() {
        let name = output_name(
            &output(),
            "aan/uit",
            Language::Nl,
            &Identity,
            &NameDisplayOptions::default(),
        );
        assert_eq!(name, "0.1 entree spots s1 aan/uit");
    }

    #[test]
    fn display_options_drop_parts() {
        let options = NameDisplayOptions {
            show_room_address: false,
            show_switch_code: false,
            show_object_name: true,
        };
        let name = output_name(&output(), "aan/uit", Language::Nl, &Identity, &options);
        assert_eq!(name, "entree spots aan/uit");
    }

    #[test]
    fn legacy_name_falls_back_to_reserve() {
        let mut out = Output::default();
        let name =
            legacy_name(&out, "", "aan/uit", Language::Nl, &Identity, &NameDisplayOptions::default());
        assert_eq!(name, "reserve");

        out.room_name = "keuken".into();
        out.is_reserve = true;
        let name =
            legacy_name(&out, "", "aan/uit", Language::Nl, &Identity, &NameDisplayOptions::default());
        assert_eq!(name, "reserve");
    }

    #[test]
    fn comment_uses_translated_output_word() {
        assert_eq!(output_comment("1.1.3", "K2", Language::Nl), "1.1.3 uitgang K2");
        assert_eq!(output_comment("1.1.3", "K2", Language::En), "1.1.3 output K2");
    }

    #[test]
    fn title_case_handles_slashes() {
        assert_eq!(title_case("aan/uit status"), "Aan / Uit Status");
        assert_eq!(title_case("dimmen"), "Dimmen");
    }

    #[test]
    fn zone_name_skips_empty_parts() {
        let zone = Zone { room_address: "0.1".into(), room_name: "entree".into(), channel_name: None };
        assert_eq!(
            zone_name(&zone, Language::Nl, &Identity, &NameDisplayOptions::default()),
            "0.1 entree"
        );
    }
}
