//! End-to-end runs of the generation pipeline on small but realistic
//! projects.

use knx_ga_tools::generate::generate_group_addresses;
use knx_ga_tools::i18n::{Identity, Language};
use knx_ga_tools::model::{Category, Device, NameDisplayOptions, Output, Project, Zone};
use knx_ga_tools::overview::rollup;
use knx_ga_tools::template::TemplateConfig;

fn run(template: &TemplateConfig, devices: &[Device]) -> Vec<knx_ga_tools::model::GroupAddressRow> {
    generate_group_addresses(
        template,
        devices,
        Language::Nl,
        &Identity,
        &NameDisplayOptions::default(),
    )
}

fn project(json: &str) -> Project {
    serde_json::from_str(json).expect("project json")
}

const SWITCH_PROJECT: &str = r#"{
    "template": {
        "name": "demo",
        "addressStructure": "three-level",
        "devices": {
            "fixed": {
                "mainGroups": [{
                    "main": 1,
                    "name": "Algemeen",
                    "middleGroups": [{
                        "middle": 0,
                        "name": "Scènes",
                        "subs": [{ "name": "welkom", "sub": 0, "dpt": "DPT1.001" }]
                    }]
                }]
            }
        },
        "teachByExampleConfig": {
            "autoGenerateRoomAddresses": true,
            "categories": {
                "switching": {
                    "groupName": "Verlichting",
                    "exampleAddresses": [{
                        "objectName": "aan/uit",
                        "main": 1, "middle": 1, "sub": 1,
                        "subIncrement": 1
                    }]
                }
            }
        }
    },
    "devices": [{
        "category": "switch",
        "physicalAddress": "1.1.1",
        "outputs": [
            { "channelName": "K1", "roomAddress": "0.1", "roomName": "entree" },
            { "channelName": "K2", "roomAddress": "1.1", "roomName": "woonkamer" },
            { "channelName": "K3", "isReserve": true }
        ]
    }],
    "language": "nl"
}"#;

#[test]
fn switch_project_expands_with_scenes() {
    let project = project(SWITCH_PROJECT);
    let rows = run(&project.template, &project.devices);
    let summary: Vec<(String, String)> =
        rows.iter().map(|r| (r.address.to_string(), r.name.clone())).collect();

    assert_eq!(
        summary,
        [
            // Scene block: default row, then one row per unique room address.
            ("1/0/0".to_string(), "welkom".to_string()),
            ("1/0/1".to_string(), "0.1 entree".to_string()),
            ("1/0/2".to_string(), "1.1 woonkamer".to_string()),
            // Switch track: sub-zero placeholder, then one row per output.
            ("1/1/0".to_string(), "---".to_string()),
            ("1/1/1".to_string(), "0.1 entree aan/uit".to_string()),
            ("1/1/2".to_string(), "1.1 woonkamer aan/uit".to_string()),
        ]
    );
    assert_eq!(rows[4].comment, "1.1.1 uitgang K1");
    // The reserve channel K3 produced nothing and advanced no counter.
    assert!(!rows.iter().any(|r| r.address.to_string() == "1/1/3"));
}

#[test]
fn generation_is_deterministic() {
    let project = project(SWITCH_PROJECT);
    let first = run(&project.template, &project.devices);
    let second = run(&project.template, &project.devices);
    let flat = |rows: &[knx_ga_tools::model::GroupAddressRow]| -> Vec<(String, String, String)> {
        rows.iter()
            .map(|r| (r.address.to_string(), r.name.clone(), r.comment.clone()))
            .collect()
    };
    assert_eq!(flat(&first), flat(&second));
}

#[test]
fn no_sentinel_addresses_leak() {
    let project = project(SWITCH_PROJECT);
    let rows = run(&project.template, &project.devices);
    assert!(rows.iter().all(|r| !r.address.is_invalid()));
}

#[test]
fn hvac_zones_claim_their_own_middle_groups() {
    let template: TemplateConfig = serde_json::from_str(
        r#"{
            "name": "hvac",
            "addressStructure": "three-level",
            "devices": {},
            "teachByExampleConfig": {
                "categories": {
                    "hvac": {
                        "groupName": "Klimaat",
                        "exampleAddresses": [
                            {
                                "objectName": "gemeten temperatuur",
                                "main": 2, "middle": 0, "sub": 1,
                                "middleIncrement": 1
                            },
                            {
                                "objectName": "setpoint",
                                "main": 2, "middle": 0, "sub": 2,
                                "middleIncrement": 1
                            }
                        ]
                    }
                }
            }
        }"#,
    )
    .unwrap();
    let zone = |addr: &str, name: &str, channel: &str| Zone {
        room_address: addr.into(),
        room_name: name.into(),
        channel_name: Some(channel.into()),
    };
    let devices = vec![Device {
        category: Category::Hvac,
        physical_address: None,
        outputs: Vec::new(),
        zones: vec![zone("0.1", "entree", "K1"), zone("1.1", "woonkamer", "K2")],
    }];

    let rows = run(&template, &devices);
    let find = |addr: &str| {
        rows.iter().find(|r| r.address.to_string() == addr).map(|r| r.name.clone())
    };
    assert_eq!(find("2/0/1"), Some("0.1 entree gemeten temperatuur".to_string()));
    assert_eq!(find("2/0/2"), Some("0.1 entree setpoint".to_string()));
    assert_eq!(find("2/1/1"), Some("1.1 woonkamer gemeten temperatuur".to_string()));
    assert_eq!(find("2/1/2"), Some("1.1 woonkamer setpoint".to_string()));
    // HVAC rows carry no device comment.
    assert!(rows.iter().all(|r| r.comment.is_empty()));

    let overview = rollup(&rows, &template, &devices, Language::Nl, &Identity);
    let main = &overview.main_groups[0];
    assert_eq!(main.name, "Klimaat");
    let middles: Vec<&str> = main.middle_groups.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(middles, ["0.1 entree", "1.1 woonkamer"]);
}

#[test]
fn fixed_rows_sort_ahead_of_device_rows() {
    let project = project(SWITCH_PROJECT);
    let rows = run(&project.template, &project.devices);
    let scene_end = rows
        .iter()
        .position(|r| r.address.to_string() == "1/1/0")
        .expect("switch rows present");
    assert!(rows[..scene_end].iter().all(|r| r.address.to_string().starts_with("1/0/")));
}

#[test]
fn overview_groups_the_flat_rows() {
    let project = project(SWITCH_PROJECT);
    let rows = run(&project.template, &project.devices);
    let overview = rollup(&rows, &project.template, &project.devices, Language::Nl, &Identity);

    assert_eq!(overview.main_groups.len(), 1);
    let main = &overview.main_groups[0];
    assert_eq!(main.main, 1);
    // The fixed configuration names the main group.
    assert_eq!(main.name, "Algemeen");
    let middles: Vec<(u16, &str)> =
        main.middle_groups.iter().map(|m| (m.middle, m.name.as_str())).collect();
    assert_eq!(middles, [(0, "Scènes"), (1, "Aan / Uit")]);
    // Every row of the flat list appears exactly once in the tree.
    let total: usize = main.middle_groups.iter().map(|m| m.addresses.len()).sum();
    assert_eq!(total, rows.len());
}
