//! Natural-language request text.
//!
//! [`TemplatePromptWriter`] uses a handful of fixed sentences; [`PhrasebookPromptWriter`]
//! mixes freer phrasing. The generator's template ratio picks between them per request.

use rand::{Rng, RngCore};

/// Everything a writer may mention.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    /// `HH:MM`, 24h.
    pub pickup_time: &'a str,
    pub passengers: u32,
    pub wheelchair: bool,
    pub shared_ok: bool,
}

pub trait PromptWriter: Send + Sync {
    fn write(&self, ctx: &PromptContext<'_>, rng: &mut dyn RngCore) -> String;
}

/// `08:05` -> `8:05 AM`.
fn twelve_hour(hhmm: &str) -> String {
    let Some((h, m)) = hhmm.split_once(':') else {
        return hhmm.to_string();
    };
    let Ok(h) = h.parse::<u32>() else {
        return hhmm.to_string();
    };
    let suffix = if h < 12 { "AM" } else { "PM" };
    let h12 = match h % 12 {
        0 => 12,
        h => h,
    };
    format!("{h12}:{m} {suffix}")
}

fn passengers_phrase(n: u32) -> String {
    if n == 1 {
        "1 passenger".to_string()
    } else {
        format!("{n} passengers")
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TemplatePromptWriter;

impl PromptWriter for TemplatePromptWriter {
    fn write(&self, ctx: &PromptContext<'_>, rng: &mut dyn RngCore) -> String {
        let time = twelve_hour(ctx.pickup_time);
        let pax = passengers_phrase(ctx.passengers);
        let mut text = match rng.gen_range(0..3) {
            0 => format!(
                "I need a ride from {} to {} at {} for {}.",
                ctx.origin, ctx.destination, time, pax
            ),
            1 => format!(
                "Please pick me up from {} at {} and take me to {}. {}.",
                ctx.origin, time, ctx.destination, pax
            ),
            _ => format!(
                "Requesting a pickup from {} to {} for {} at {}.",
                ctx.origin, ctx.destination, pax, time
            ),
        };
        if ctx.wheelchair {
            text.push_str(" Wheelchair accessible vehicle required.");
        }
        if ctx.shared_ok {
            text.push_str(" Shared ride is fine.");
        }
        text
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PhrasebookPromptWriter;

const OPENERS: [&str; 4] = ["Hey,", "Hi there!", "Good day.", "Quick one:"];
const COUNT_WORDS: [&str; 7] = ["zero", "one", "two", "three", "four", "five", "six"];

impl PromptWriter for PhrasebookPromptWriter {
    fn write(&self, ctx: &PromptContext<'_>, rng: &mut dyn RngCore) -> String {
        let opener = OPENERS[rng.gen_range(0..OPENERS.len())];
        let time = twelve_hour(ctx.pickup_time);
        let party = match ctx.passengers {
            1 => "It's just me".to_string(),
            n => match COUNT_WORDS.get(n as usize) {
                Some(word) => format!("There are {word} of us"),
                None => format!("There are {n} of us"),
            },
        };
        let route = if rng.gen_bool(0.5) {
            format!(
                "could someone get me from {} to {} around {}?",
                ctx.origin, ctx.destination, time
            )
        } else {
            format!(
                "I'm at {} and heading to {}, leaving around {}.",
                ctx.origin, ctx.destination, time
            )
        };
        let mut text = format!("{opener} {route} {party}.");
        if ctx.wheelchair {
            text.push_str(" I use a wheelchair, so the car needs a ramp or lift.");
        }
        if ctx.shared_ok {
            text.push_str(" Happy to share the ride with others.");
        } else if rng.gen_bool(0.3) {
            text.push_str(" I'd prefer a private ride.");
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn ctx() -> PromptContext<'static> {
        PromptContext {
            origin: "Midtown Center",
            destination: "JFK Airport",
            pickup_time: "17:45",
            passengers: 2,
            wheelchair: true,
            shared_ok: false,
        }
    }

    #[test]
    fn twelve_hour_clock() {
        assert_eq!(twelve_hour("00:05"), "12:05 AM");
        assert_eq!(twelve_hour("12:30"), "12:30 PM");
        assert_eq!(twelve_hour("17:45"), "5:45 PM");
    }

    #[test]
    fn templates_mention_every_field() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            let text = TemplatePromptWriter.write(&ctx(), &mut rng);
            assert!(text.contains("Midtown Center"));
            assert!(text.contains("JFK Airport"));
            assert!(text.contains("5:45 PM"));
            assert!(text.contains("2 passengers"));
            assert!(text.contains("Wheelchair"));
            assert!(!text.contains("Shared"));
        }
    }

    #[test]
    fn phrasebook_is_deterministic_for_a_seed() {
        let a = PhrasebookPromptWriter.write(&ctx(), &mut StdRng::seed_from_u64(9));
        let b = PhrasebookPromptWriter.write(&ctx(), &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
        assert!(a.contains("two of us"));
    }
}
