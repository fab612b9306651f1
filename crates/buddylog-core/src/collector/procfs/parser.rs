//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.

use std::collections::HashMap;
use std::fmt::Write;

use crate::model::{BuddyInfoSnapshot, NumaNode, Zone};

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parses `/proc/buddyinfo` content.
///
/// Format: `Node <N>, zone <NAME> <count order 0> <count order 1> ...`
///
/// Zones are grouped by node in first-seen order. Any malformed line fails
/// the whole parse; blank lines are ignored.
pub fn parse_buddyinfo(content: &str, timestamp: i64) -> Result<BuddyInfoSnapshot, ParseError> {
    let mut numa_nodes: Vec<NumaNode> = Vec::new();
    // node_index -> position in numa_nodes
    let mut positions: HashMap<u32, usize> = HashMap::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (node_index, zone) = parse_buddyinfo_line(line).map_err(|e| {
            ParseError::new(format!("buddyinfo line {}: {}", line_no + 1, e.message))
        })?;

        match positions.get(&node_index) {
            Some(&pos) => numa_nodes[pos].zones.push(zone),
            None => {
                positions.insert(node_index, numa_nodes.len());
                numa_nodes.push(NumaNode {
                    node_index,
                    zones: vec![zone],
                });
            }
        }
    }

    Ok(BuddyInfoSnapshot {
        timestamp,
        numa_nodes,
    })
}

fn parse_buddyinfo_line(line: &str) -> Result<(u32, Zone), ParseError> {
    let mut tokens = line.split_whitespace();

    if tokens.next() != Some("Node") {
        return Err(ParseError::new("expected 'Node'"));
    }

    // "0," - the index is followed by a comma in the kernel output
    let node_token = tokens
        .next()
        .ok_or_else(|| ParseError::new("missing node index"))?;
    let node_index: u32 = node_token
        .trim_end_matches(',')
        .parse()
        .map_err(|_| ParseError::new(format!("invalid node index '{}'", node_token)))?;

    if !tokens.by_ref().any(|t| t == "zone") {
        return Err(ParseError::new("expected 'zone'"));
    }

    let zone_type = tokens
        .next()
        .ok_or_else(|| ParseError::new("missing zone name"))?;
    if !zone_type.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ParseError::new(format!("invalid zone name '{}'", zone_type)));
    }

    let free_fragments = tokens
        .map(|t| {
            t.parse::<u64>()
                .map_err(|_| ParseError::new(format!("invalid free count '{}'", t)))
        })
        .collect::<Result<Vec<u64>, ParseError>>()?;
    if free_fragments.is_empty() {
        return Err(ParseError::new(format!("no free counts for zone {}", zone_type)));
    }

    Ok((node_index, Zone::new(zone_type, free_fragments)))
}

/// Renders a snapshot back into `/proc/buddyinfo` format.
///
/// The timestamp is not part of the format.
pub fn render_buddyinfo(snapshot: &BuddyInfoSnapshot) -> String {
    let mut out = String::new();
    for node in &snapshot.numa_nodes {
        for zone in &node.zones {
            let _ = write!(out, "Node {}, zone {:>8}", node.node_index, zone.zone_type);
            for count in &zone.free_fragments {
                let _ = write!(out, " {:>6}", count);
            }
            out.push('\n');
        }
    }
    out
}

/// Parsed data from `/proc/meminfo`, values in kB.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub active: u64,
    pub inactive: u64,
    pub shmem: u64,
    pub slab: u64,
    pub s_reclaimable: u64,
}

/// Parses `/proc/meminfo` content.
///
/// Unknown keys are ignored; missing keys stay 0.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(value) = rest.split_whitespace().next() else {
            continue;
        };
        let slot = match key {
            "MemTotal" => &mut info.mem_total,
            "MemFree" => &mut info.mem_free,
            "MemAvailable" => &mut info.mem_available,
            "Buffers" => &mut info.buffers,
            "Cached" => &mut info.cached,
            "Active" => &mut info.active,
            "Inactive" => &mut info.inactive,
            "Shmem" => &mut info.shmem,
            "Slab" => &mut info.slab,
            "SReclaimable" => &mut info.s_reclaimable,
            _ => continue,
        };
        *slot = value
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {} value '{}'", key, value)))?;
    }

    if info.mem_total == 0 {
        return Err(ParseError::new("missing MemTotal in meminfo"));
    }

    Ok(info)
}

/// Parsed data from `/proc/[pid]/statm`, values in pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statm {
    pub size: u64,
    pub resident: u64,
    pub shared: u64,
    pub text: u64,
    pub lib: u64,
    pub data: u64,
    pub dt: u64,
}

/// Parses `/proc/[pid]/statm` content.
///
/// Format: size resident shared text lib data dt
pub fn parse_statm(content: &str) -> Result<Statm, ParseError> {
    let fields = content
        .split_whitespace()
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| ParseError::new(format!("invalid statm field '{}'", s)))
        })
        .collect::<Result<Vec<u64>, ParseError>>()?;

    if fields.len() < 7 {
        return Err(ParseError::new(format!(
            "not enough fields in statm: expected 7, got {}",
            fields.len()
        )));
    }

    Ok(Statm {
        size: fields[0],
        resident: fields[1],
        shared: fields[2],
        text: fields[3],
        lib: fields[4],
        data: fields[5],
        dt: fields[6],
    })
}
