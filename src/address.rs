//! Group address arithmetic and the parsing helpers shared by the generator.

/// A KNX group address in either display structure.
///
/// Two-level addresses only carry a main group and a sub part; three-level
/// addresses use the familiar `main/middle/sub` split with ranges 0..=31,
/// 0..=7 and 0..=255. The all-zero address is reserved on the bus and is used
/// here as the sentinel for "could not be built": such rows are dropped before
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupAddress {
    TwoLevel { main: u16, sub: u16 },
    ThreeLevel { main: u16, middle: u16, sub: u16 },
}

impl GroupAddress {
    pub const INVALID: GroupAddress = GroupAddress::ThreeLevel { main: 0, middle: 0, sub: 0 };

    /// An address whose main and middle parts are both zero can never be a
    /// usable bus address, whatever the sub part ended up as.
    pub fn is_invalid(&self) -> bool {
        match *self {
            GroupAddress::TwoLevel { main, sub } => main == 0 && sub == 0,
            GroupAddress::ThreeLevel { main, middle, .. } => main == 0 && middle == 0,
        }
    }

    /// Numeric parts for ordering and grouping. Two-level addresses compare on
    /// `(main, sub, 0)` so both structures share one total order.
    pub fn parts(&self) -> (u16, u16, u16) {
        match *self {
            GroupAddress::TwoLevel { main, sub } => (main, sub, 0),
            GroupAddress::ThreeLevel { main, middle, sub } => (main, middle, sub),
        }
    }
}

impl std::fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            GroupAddress::TwoLevel { main, sub } => write!(f, "{main}/{sub}"),
            GroupAddress::ThreeLevel { main, middle, sub } => write!(f, "{main}/{middle}/{sub}"),
        }
    }
}

impl serde::Serialize for GroupAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AddressStructure {
    #[serde(rename = "two-level")]
    TwoLevel,
    #[default]
    #[serde(rename = "three-level")]
    ThreeLevel,
}

/// How the legacy template maps objects onto three-level addresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    /// function / type / device
    #[default]
    Mode1,
    /// floor / function / device, status objects shifted by one
    Mode2,
    /// floor / function / device, status objects shifted by an offset
    Mode3,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressingConfig {
    #[serde(default)]
    pub mode: AddressingMode,
    #[serde(default)]
    pub function_number: Option<u16>,
    #[serde(default)]
    pub status_offset: Option<u16>,
    #[serde(default)]
    pub start_channel_number: Option<u16>,
    #[serde(default)]
    pub channel_increment: Option<bool>,
}

/// Build the address for the `count`-th unit of a legacy template object.
///
/// `count` is how many units were already placed in the object's
/// `(main, middle)` slot. The device number saturates at 255 with a warning,
/// and a `(0, 0)` main/middle outcome yields the invalid sentinel.
pub fn build_with_mode(
    main: u16,
    middle: u16,
    count: u32,
    structure: AddressStructure,
    addressing: Option<&AddressingConfig>,
    room_address: &str,
    is_status: bool,
) -> GroupAddress {
    let mode = addressing.map(|a| a.mode).unwrap_or_default();
    let start_channel = addressing.and_then(|a| a.start_channel_number).unwrap_or(1);
    let channel_increment = addressing.and_then(|a| a.channel_increment).unwrap_or(true);

    let device_number = if channel_increment {
        u32::from(start_channel) + count
    } else {
        u32::from(start_channel)
    };
    let device_number = if device_number > 255 {
        tracing::warn!(device_number, "device number exceeds 255, clamping");
        255
    } else {
        device_number as u16
    };

    if let AddressStructure::TwoLevel = structure {
        let sub = clamp_component(
            i64::from(middle) + i64::from(device_number) - 1,
            2047,
            "sub",
        );
        return GroupAddress::TwoLevel { main, sub };
    }

    match mode {
        AddressingMode::Mode1 => {
            let main = addressing.and_then(|a| a.function_number).unwrap_or(main);
            if main == 0 && middle == 0 {
                return GroupAddress::INVALID;
            }
            GroupAddress::ThreeLevel { main, middle, sub: device_number }
        }
        AddressingMode::Mode2 => {
            let floor = extract_floor(room_address).max(0);
            let middle = addressing.and_then(|a| a.function_number).unwrap_or(main);
            let sub = if is_status { device_number + 1 } else { device_number };
            let main = clamp_component(i64::from(floor), 31, "main");
            if main == 0 && middle == 0 {
                return GroupAddress::INVALID;
            }
            GroupAddress::ThreeLevel { main, middle, sub: sub.min(255) }
        }
        AddressingMode::Mode3 => {
            let floor = extract_floor(room_address).max(0);
            let middle = addressing.and_then(|a| a.function_number).unwrap_or(main);
            let status_offset = addressing.and_then(|a| a.status_offset).unwrap_or(100);
            let sub = if is_status { device_number + status_offset } else { device_number };
            let main = clamp_component(i64::from(floor), 31, "main");
            if main == 0 && middle == 0 {
                return GroupAddress::INVALID;
            }
            GroupAddress::ThreeLevel { main, middle, sub: sub.min(255) }
        }
    }
}

/// Build an address for a fixed (scene/central) entry at an explicit sub.
pub fn build_fixed(main: u16, middle: u16, sub: u16, structure: AddressStructure) -> GroupAddress {
    if main == 0 && middle == 0 {
        return GroupAddress::INVALID;
    }
    let sub = if sub > 255 {
        tracing::warn!(sub, "fixed sub exceeds 255, clamping");
        255
    } else {
        sub
    };
    match structure {
        AddressStructure::TwoLevel => GroupAddress::TwoLevel {
            main,
            sub: clamp_component(
                i64::from(middle) + i64::from(sub.max(1)) - 1,
                2047,
                "sub",
            ),
        },
        AddressStructure::ThreeLevel => GroupAddress::ThreeLevel { main, middle, sub },
    }
}

/// Clamp an out-of-range address component, logging when a cut happens.
pub fn clamp_component(value: i64, max: u16, component: &'static str) -> u16 {
    if value < 0 {
        tracing::warn!(value, component, "address component below 0, clamping");
        0
    } else if value > i64::from(max) {
        tracing::warn!(value, component, max, "address component out of range, clamping");
        max
    } else {
        value as u16
    }
}

/// Floor number from a room address like `"3.1"` or `"-1.2"`. Defaults to 0.
pub fn extract_floor(room_address: &str) -> i32 {
    room_address
        .split('.')
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0)
}

/// `(floor, room)` pair for room-address ordering, supporting negative floors.
pub fn parse_room_address(room_address: &str) -> (i32, i32) {
    let mut parts = room_address.split('.');
    let floor = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
    let room = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
    (floor, room)
}

/// Parse a physical address like `"1.1.3"`; anything unparsable sorts last.
pub fn parse_physical_address(addr: Option<&str>) -> [u16; 3] {
    const LAST: [u16; 3] = [999, 999, 999];
    let Some(addr) = addr else { return LAST };
    let mut out = [0u16; 3];
    let mut parts = addr.trim().split('.');
    for slot in &mut out {
        match parts.next().and_then(|p| p.parse().ok()) {
            Some(n) => *slot = n,
            None => return LAST,
        }
    }
    if parts.next().is_some() {
        return LAST;
    }
    out
}

/// First run of digits in a channel name (`"K12"` -> 12). 0 when absent.
pub fn extract_channel_number(channel_name: &str) -> u32 {
    let digits: String = channel_name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Status objects carry an English or Dutch status marker in their name.
pub fn is_status_object(object_name: &str) -> bool {
    let name = object_name.to_lowercase();
    name.contains("status") || name.contains("state")
}
