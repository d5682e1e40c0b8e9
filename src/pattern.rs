//! Pattern analysis and the counter state used during teach-by-example
//! expansion.

use std::collections::{HashMap, HashSet};

use crate::template::{
    ExampleAddress, GroupPattern, MiddleGroupPattern, SubGroupPattern,
};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PatternError {
    #[error("no example addresses given")]
    Empty,
    #[error("object {index} ({name}): {component} {value} is out of range (0..={max})")]
    ComponentOutOfRange {
        index: usize,
        name: String,
        component: &'static str,
        value: u16,
        max: u16,
    },
    #[error("example addresses use more than one main group: {mains:?}")]
    MainGroupMismatch { mains: Vec<u16> },
}

/// Detect the pattern behind a track's example addresses.
///
/// All examples must share one main group. The middle groups decide between
/// the `same` and `perType` layouts; the sorted sub values decide between a
/// plain increment, a fixed offset (consecutive or in steps of 100), or an
/// irregular sequence.
pub fn analyze(examples: &[ExampleAddress]) -> Result<GroupPattern, PatternError> {
    if examples.is_empty() {
        return Err(PatternError::Empty);
    }

    for (index, addr) in examples.iter().enumerate() {
        let checks = [("main group", addr.main, 31), ("middle group", addr.middle, 7), (
            "sub group",
            addr.sub,
            255,
        )];
        for (component, value, max) in checks {
            if value > max {
                return Err(PatternError::ComponentOutOfRange {
                    index: index + 1,
                    name: addr.object_name.clone(),
                    component,
                    value,
                    max,
                });
            }
        }
    }

    let mut mains: Vec<u16> = examples.iter().map(|a| a.main).collect();
    mains.sort_unstable();
    mains.dedup();
    let &[fixed_main] = mains.as_slice() else {
        return Err(PatternError::MainGroupMismatch { mains });
    };

    let mut middles: Vec<u16> = examples.iter().map(|a| a.middle).collect();
    middles.sort_unstable();
    middles.dedup();
    let middle_group_pattern =
        if middles.len() == 1 { MiddleGroupPattern::Same } else { MiddleGroupPattern::PerType };

    let mut subs: Vec<u16> = examples.iter().map(|a| a.sub).collect();
    subs.sort_unstable();
    let sequential = subs.windows(2).all(|w| w[1] == w[0] + 1);

    let mut offset_value = None;
    let sub_group_pattern = if sequential && subs.len() > 1 {
        let diff = subs[1] - subs[0];
        if diff == 1 {
            SubGroupPattern::Increment
        } else {
            offset_value = Some(diff);
            SubGroupPattern::Offset
        }
    } else if subs.len() == 1 {
        SubGroupPattern::Increment
    } else {
        // Non-sequential subs can still form an offset pattern in steps of
        // 100 (e.g. 5, 105, 205).
        let first = subs[0];
        let diffs: Vec<u16> = subs[1..]
            .iter()
            .map(|&s| s - first)
            .filter(|&d| d > 0 && d % 100 == 0)
            .collect();
        if !diffs.is_empty() && diffs.iter().all(|&d| d == diffs[0]) {
            offset_value = Some(diffs[0]);
            SubGroupPattern::Offset
        } else {
            SubGroupPattern::Sequence
        }
    };

    Ok(GroupPattern {
        fixed_main,
        middle_group_pattern,
        sub_group_pattern,
        offset_value,
        objects_per_device: examples.len(),
        middle_groups: match middle_group_pattern {
            MiddleGroupPattern::PerType => Some(middles),
            MiddleGroupPattern::Same => None,
        },
        start_sub: Some(subs[0]),
        extra_main_groups: Vec::new(),
    })
}

/// Sub value for the `counter`-th physical unit when the example carries no
/// explicit sub increment.
pub fn pattern_sub(pattern: &GroupPattern, counter: u32) -> u16 {
    let start = u32::from(pattern.start_sub());
    let value = match pattern.sub_group_pattern {
        SubGroupPattern::Increment | SubGroupPattern::Sequence => start + counter,
        SubGroupPattern::Offset => {
            start + counter * u32::from(pattern.offset_value.unwrap_or(100))
        }
    };
    value.min(u32::from(u16::MAX)) as u16
}

/// Middle group the `object_index`-th object of a unit maps to.
pub fn pattern_middle(pattern: &GroupPattern, object_index: usize, example: &ExampleAddress) -> u16 {
    match pattern.middle_group_pattern {
        MiddleGroupPattern::Same => pattern
            .middle_groups
            .as_deref()
            .and_then(|m| m.first().copied())
            .unwrap_or(example.middle),
        MiddleGroupPattern::PerType => pattern
            .middle_groups
            .as_deref()
            .and_then(|m| m.get(object_index).copied())
            .unwrap_or(example.middle),
    }
}

/// `(main, middle)` for the `counter`-th HVAC zone when every zone gets its
/// own middle group: cycle through middle groups 0..=7 starting at
/// `start_middle`, then spill into the configured extra main groups.
pub fn zone_main_and_middle(pattern: &GroupPattern, start_middle: u16, counter: u32) -> (u16, u16) {
    const MIDDLE_GROUPS: u32 = 8;
    let consumed_in_base = MIDDLE_GROUPS - u32::from(start_middle.min(7));

    if counter >= consumed_in_base && !pattern.extra_main_groups.is_empty() {
        let extra_index = ((counter - consumed_in_base) / MIDDLE_GROUPS) as usize;
        if let Some(extra) = pattern.extra_main_groups.get(extra_index) {
            let remaining = (counter - consumed_in_base) % MIDDLE_GROUPS;
            let middle = (u32::from(extra.middle) + remaining) % MIDDLE_GROUPS;
            return (extra.main, middle as u16);
        }
    }

    let middle = (u32::from(start_middle) + counter % MIDDLE_GROUPS) % MIDDLE_GROUPS;
    (pattern.fixed_main, middle as u16)
}

/// Counter and dedup state threaded through one expansion run. Linked
/// switch/dimmer processing shares a single context so both sides draw from
/// the same sequence.
#[derive(Debug, Default)]
pub struct GenerationContext {
    counters: HashMap<usize, u32>,
    sub_zero_seen: HashSet<(u16, u16)>,
}

impl GenerationContext {
    pub fn new() -> Self {
        GenerationContext::default()
    }

    /// How many physical units were already placed for this object type.
    pub fn counter(&self, object_index: usize) -> u32 {
        self.counters.get(&object_index).copied().unwrap_or(0)
    }

    /// Advance the counters of every object type used by one physical unit.
    pub fn advance(&mut self, used: impl IntoIterator<Item = usize>) {
        for object_index in used {
            *self.counters.entry(object_index).or_insert(0) += 1;
        }
    }

    /// Returns true the first time a `(main, middle)` slot asks for its
    /// sub-zero placeholder row.
    pub fn claim_sub_zero(&mut self, main: u16, middle: u16) -> bool {
        self.sub_zero_seen.insert((main, middle))
    }
}
