//! Text rendering for both views. Everything here is a pure function of its
//! input, the caller decides where the text goes.

use crate::{
    geocode::Candidate,
    location::Location,
    ticker::{Card, Frame},
};
use itertools::Itertools;
use std::fmt::Write;

const EMPTY_LIST: &str = "No cities selected.";
/// Cards per dashboard row
const COLUMNS: usize = 3;
/// Width of a card's text, not counting the gutter
const CARD_WIDTH: usize = 24;
const GUTTER: &str = "  |  ";

/// Terminal stand-in for font size. Sizes are CSS-style rem multipliers, so
/// ~1 is body text.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Emphasis {
    Dim,
    Normal,
    Bold,
}

impl Emphasis {
    pub fn for_size(size: f64) -> Self {
        if size < 1.0 {
            Self::Dim
        } else if size < 2.0 {
            Self::Normal
        } else {
            Self::Bold
        }
    }

    /// Wrap text in the matching ANSI escape
    fn apply(self, text: &str) -> String {
        match self {
            Self::Dim => format!("\x1b[2m{text}\x1b[0m"),
            Self::Normal => text.to_owned(),
            Self::Bold => format!("\x1b[1m{text}\x1b[0m"),
        }
    }
}

/// Saved list for the search view, with its count
pub fn render_saved_list(locations: &[Location]) -> String {
    let mut out = format!("Saved cities ({})\n", locations.len());
    if locations.is_empty() {
        out.push_str(EMPTY_LIST);
        out.push('\n');
        return out;
    }
    for (i, location) in locations.iter().enumerate() {
        // Writing to a String can't fail
        let _ = writeln!(out, "{:>3}. {} ({})", i + 1, location.name, location.country);
    }
    out
}

/// Search results, numbered for `add <n>`
pub fn render_results(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            format!(
                "{:>3}. {}\n     {}\n",
                i + 1,
                candidate.name,
                candidate.region()
            )
        })
        .collect()
}

/// The dashboard grid
pub fn render_dashboard(frame: &Frame) -> String {
    if frame.cards.is_empty() {
        return format!("{EMPTY_LIST}\n");
    }

    let settings = &frame.settings;
    let styles = [
        Emphasis::Normal, // Controls
        Emphasis::for_size(settings.city_size),
        Emphasis::for_size(settings.country_size),
        Emphasis::for_size(settings.time_size),
        Emphasis::for_size(settings.date_size),
    ];

    let mut out = String::new();
    let rows = frame.cards.iter().enumerate().chunks(COLUMNS);
    for row in &rows {
        let cells: Vec<[String; 5]> =
            row.map(|(i, card)| card_lines(i, card)).collect();
        for (line, style) in styles.iter().enumerate() {
            let text = cells
                .iter()
                .map(|cell| style.apply(&pad(&cell[line])))
                .join(GUTTER);
            out.push_str(text.trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Plain text for each line of a card, top to bottom
fn card_lines(index: usize, card: &Card) -> [String; 5] {
    [
        format!("[{}]  <  >  x", index + 1),
        card.location.name.clone(),
        card.location.country.clone(),
        card.display.time.clone(),
        card.display.date.clone(),
    ]
}

/// Fit text to exactly the card width
fn pad(text: &str) -> String {
    let truncated: String = text.chars().take(CARD_WIDTH).collect();
    format!("{truncated:<CARD_WIDTH$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ClockDisplay, settings::Settings};
    use pretty_assertions::assert_eq;

    fn card(name: &str, time: &str) -> Card {
        Card {
            location: Location::new(name, Some("Country".into()), None),
            display: ClockDisplay {
                time: time.into(),
                date: "Tue, Mar 5".into(),
            },
        }
    }

    /// Settings that render with no escape codes
    fn plain_settings() -> Settings {
        Settings {
            city_size: 1.0,
            country_size: 1.0,
            time_size: 1.0,
            date_size: 1.0,
            ..Settings::default()
        }
    }

    #[test]
    fn test_saved_list() {
        assert_eq!(render_saved_list(&[]), "Saved cities (0)\nNo cities selected.\n");
        let locations = [
            Location::new("Paris", Some("France".into()), None),
            Location::new("Lima", None, None),
        ];
        assert_eq!(
            render_saved_list(&locations),
            "Saved cities (2)\n  1. Paris (France)\n  2. Lima (Unknown)\n"
        );
    }

    #[test]
    fn test_results() {
        let candidates = [Candidate {
            name: "Paris".into(),
            admin1: Some("Texas".into()),
            country: Some("United States".into()),
            timezone: None,
        }];
        assert_eq!(
            render_results(&candidates),
            "  1. Paris\n     Texas, United States\n"
        );
    }

    #[test]
    fn test_dashboard_empty() {
        assert_eq!(render_dashboard(&Frame::default()), "No cities selected.\n");
    }

    #[test]
    fn test_dashboard_grid() {
        let frame = Frame {
            cards: vec![
                card("A", "01:00"),
                card("B", "02:00"),
                card("C", "03:00"),
                card("D", "04:00"),
            ],
            settings: plain_settings(),
        };
        let rendered = render_dashboard(&frame);
        let lines: Vec<&str> = rendered.lines().collect();
        // Two rows of five lines, each followed by a blank line
        assert_eq!(lines.len(), 12);
        assert!(lines[0].starts_with("[1]  <  >  x"));
        assert!(lines[0].contains("[3]  <  >  x"));
        assert!(lines[3].contains("01:00") && lines[3].contains("03:00"));
        assert_eq!(lines[6], "[4]  <  >  x");
        assert_eq!(lines[9], "04:00");
    }

    #[test]
    fn test_dashboard_emphasis() {
        let frame = Frame {
            cards: vec![card("A", "01:00")],
            settings: Settings {
                time_size: 2.8,
                country_size: 0.5,
                ..plain_settings()
            },
        };
        let rendered = render_dashboard(&frame);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "A");
        assert!(lines[2].starts_with("\x1b[2mCountry"));
        assert!(lines[3].starts_with("\x1b[1m01:00"));
    }

    #[test]
    fn test_pad_truncates() {
        let long = "Llanfairpwllgwyngyllgogerychwyrndrobwll";
        assert_eq!(pad(long).chars().count(), CARD_WIDTH);
        assert_eq!(pad("Oslo").len(), CARD_WIDTH);
    }
}
