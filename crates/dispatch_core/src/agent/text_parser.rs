//! Rule-based reading of request text.
//!
//! Zone names are matched with one case-insensitive alternation built from the zone table,
//! longest names first so that "Upper East Side North" wins over "Upper East Side". The
//! words right before a mention decide whether it is the origin or the destination.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::types::ParsedRequest;
use crate::location::Location;
use crate::requests::ZoneTable;

#[derive(Debug, Clone)]
struct ZoneEntry {
    id: u32,
    centroid: Option<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Origin,
    Destination,
    Unknown,
}

const ORIGIN_CUES: [&str; 2] = [" from", " at"];
const DESTINATION_CUES: [&str; 1] = [" to"];

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2}):(\d{2})(?:\s*([ap])\.?m\b\.?)?").expect("literal regex")
    })
}

fn passengers_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(\d+|one|two|three|four|five|six|seven|eight)\s+(?:passengers?|people|persons?|riders?|of us)\b",
        )
        .expect("literal regex")
    })
}

fn solo_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:just me|only me|by myself)\b").expect("literal regex"))
}

fn wheelchair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bwheelchair").expect("literal regex"))
}

fn shared_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:shared ride is (?:fine|ok|okay)|happy to share|share the ride|shared is (?:fine|ok))")
            .expect("literal regex")
    })
}

fn count_word(word: &str) -> Option<u32> {
    let n = match word.to_ascii_lowercase().as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        digits => return digits.parse().ok(),
    };
    Some(n)
}

/// Extracts zones, time, party size and flags from free text.
#[derive(Debug, Clone)]
pub struct TextParser {
    zone_pattern: Option<Regex>,
    zones: HashMap<String, ZoneEntry>,
}

impl TextParser {
    pub fn new(zone_table: &ZoneTable) -> Result<Self, regex::Error> {
        let mut zones = HashMap::new();
        let mut names: Vec<&str> = Vec::new();
        for zone in zone_table.iter() {
            let name = zone.name.trim();
            if name.is_empty() {
                continue;
            }
            zones.insert(
                name.to_lowercase(),
                ZoneEntry {
                    id: zone.id,
                    centroid: zone.centroid.clone(),
                },
            );
            names.push(name);
        }
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

        let zone_pattern = if names.is_empty() {
            None
        } else {
            let alternation: Vec<String> = names.iter().map(|n| bounded(n)).collect();
            Some(Regex::new(&format!("(?i)(?:{})", alternation.join("|")))?)
        };
        Ok(Self { zone_pattern, zones })
    }

    pub fn parse(&self, text: &str) -> ParsedRequest {
        let mut parsed = ParsedRequest::default();
        let (origin, destination) = self.endpoints(text);
        if let Some(zone) = origin {
            parsed.pickup_zone_id = Some(zone.id);
            if let Some(c) = &zone.centroid {
                parsed.pickup_latitude = Some(c.latitude);
                parsed.pickup_longitude = Some(c.longitude);
            }
        }
        if let Some(zone) = destination {
            parsed.dropoff_zone_id = Some(zone.id);
            if let Some(c) = &zone.centroid {
                parsed.dropoff_latitude = Some(c.latitude);
                parsed.dropoff_longitude = Some(c.longitude);
            }
        }
        parsed.pickup_time = parse_time(text);
        parsed.passenger_count = parse_passengers(text);
        parsed.wheelchair_accessible = wheelchair_re().is_match(text);
        parsed.shared_ride_ok = shared_re().is_match(text);
        parsed
    }

    fn endpoints(&self, text: &str) -> (Option<&ZoneEntry>, Option<&ZoneEntry>) {
        let Some(pattern) = &self.zone_pattern else {
            return (None, None);
        };
        let mentions: Vec<(Role, &ZoneEntry)> = pattern
            .find_iter(text)
            .filter_map(|m| {
                let entry = self.zones.get(&m.as_str().to_lowercase())?;
                Some((role_before(&text[..m.start()]), entry))
            })
            .collect();

        let origin = mentions
            .iter()
            .find(|(role, _)| *role == Role::Origin)
            .or_else(|| mentions.iter().find(|(role, _)| *role == Role::Unknown))
            .map(|(_, entry)| *entry);
        let destination = mentions
            .iter()
            .find(|(role, _)| *role == Role::Destination)
            .or_else(|| {
                mentions.iter().find(|(role, entry)| {
                    *role == Role::Unknown && Some(entry.id) != origin.map(|o| o.id)
                })
            })
            .map(|(_, entry)| *entry);
        (origin, destination)
    }
}

/// Adds word boundaries where the name starts or ends with a word character.
fn bounded(name: &str) -> String {
    let escaped = regex::escape(name);
    let start = if name.starts_with(|c: char| c.is_alphanumeric()) { r"\b" } else { "" };
    let end = if name.ends_with(|c: char| c.is_alphanumeric()) { r"\b" } else { "" };
    format!("{start}{escaped}{end}")
}

fn role_before(prefix: &str) -> Role {
    let before = prefix.trim_end().to_lowercase();
    let before = format!(" {before}");
    if DESTINATION_CUES.iter().any(|cue| before.ends_with(cue)) {
        Role::Destination
    } else if ORIGIN_CUES.iter().any(|cue| before.ends_with(cue)) {
        Role::Origin
    } else {
        Role::Unknown
    }
}

/// First clock time in the text as 24h `HH:MM`.
pub fn parse_time(text: &str) -> Option<String> {
    time_re().captures_iter(text).find_map(|caps| {
        let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
        if minute >= 60 {
            return None;
        }
        match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(half) => {
                if !(1..=12).contains(&hour) {
                    return None;
                }
                hour %= 12;
                if half == "p" {
                    hour += 12;
                }
            }
            None if hour >= 24 => return None,
            None => {}
        }
        Some(format!("{hour:02}:{minute:02}"))
    })
}

pub fn parse_passengers(text: &str) -> Option<u32> {
    if let Some(caps) = passengers_re().captures(text) {
        return caps.get(1).and_then(|m| count_word(m.as_str()));
    }
    solo_re().is_match(text).then_some(1)
}
