use std::{collections::BTreeMap, sync::OnceLock};

use gyro_common::Quantity;
use log::trace;
use regex::Regex;

use super::fuzzy::match_option;

fn fragment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\s*(.*)$").expect("order fragment regex is valid"))
}

/// Extracts `<quantity> <option>` pairs from a chat message.
///
/// The text is split on newlines and commas. Fragments that do not start with a number, whose number is above the
/// maximum quantity, or whose option cannot be matched are skipped. When an option is mentioned more than once, the
/// last mention wins. A zero quantity is kept in the result; it means "remove this option".
///
/// Returns `None` if nothing in the text could be understood as an order.
pub fn parse_order_lines<S: AsRef<str>>(text: &str, options: &[S]) -> Option<BTreeMap<String, Quantity>> {
    let mut result = BTreeMap::new();
    let fragments = text.lines().flat_map(|line| line.split(',')).map(str::trim).filter(|f| !f.is_empty());
    for fragment in fragments {
        let Some(caps) = fragment_regex().captures(fragment) else {
            trace!("🥙 Skipping order fragment without a quantity: '{fragment}'");
            continue;
        };
        let Ok(quantity) = caps[1].parse::<Quantity>() else {
            trace!("🥙 Skipping order fragment with an invalid quantity: '{fragment}'");
            continue;
        };
        let Some(option) = match_option(&caps[2], options) else {
            trace!("🥙 Skipping order fragment with an unknown option: '{fragment}'");
            continue;
        };
        result.insert(option.to_string(), quantity);
    }
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DEFAULTS: [&str; 2] = ["Fleisch", "Vegetarisch"];

    fn order(pairs: &[(&str, i64)]) -> Option<BTreeMap<String, Quantity>> {
        Some(pairs.iter().map(|(o, q)| (o.to_string(), Quantity::try_from(*q).unwrap())).collect())
    }

    #[test]
    fn single_and_multiple_items() {
        assert_eq!(parse_order_lines("2 fleisch", &DEFAULTS), order(&[("Fleisch", 2)]));
        assert_eq!(parse_order_lines("3 veg", &DEFAULTS), order(&[("Vegetarisch", 3)]));
        assert_eq!(parse_order_lines("2 fleisch, 3 veg", &DEFAULTS), order(&[("Fleisch", 2), ("Vegetarisch", 3)]));
        assert_eq!(parse_order_lines("2 fleisch\n3 veg", &DEFAULTS), order(&[("Fleisch", 2), ("Vegetarisch", 3)]));
        assert_eq!(parse_order_lines("2 fl", &DEFAULTS), order(&[("Fleisch", 2)]));
    }

    #[test]
    fn custom_options() {
        let pizza = ["Margherita", "Salami", "Hawaiian"];
        assert_eq!(
            parse_order_lines("2 marg, 1 sal, 3 hawaii", &pizza),
            order(&[("Margherita", 2), ("Salami", 1), ("Hawaiian", 3)])
        );
    }

    #[test]
    fn whitespace_and_case() {
        assert_eq!(parse_order_lines("2fleisch", &DEFAULTS), order(&[("Fleisch", 2)]));
        assert_eq!(parse_order_lines("  2   fleisch  ", &DEFAULTS), order(&[("Fleisch", 2)]));
        assert_eq!(parse_order_lines("2 FLEISCH", &DEFAULTS), order(&[("Fleisch", 2)]));
    }

    #[test]
    fn last_mention_wins() {
        assert_eq!(parse_order_lines("2 fleisch, 5 fleisch", &DEFAULTS), order(&[("Fleisch", 5)]));
    }

    #[test]
    fn zero_is_kept() {
        assert_eq!(parse_order_lines("0 veg, 1 fleisch", &DEFAULTS), order(&[("Fleisch", 1), ("Vegetarisch", 0)]));
    }

    #[test]
    fn partially_valid_input() {
        assert_eq!(parse_order_lines("2 fleisch, xyz", &DEFAULTS), order(&[("Fleisch", 2)]));
        assert_eq!(parse_order_lines("15 veg, 1 fleisch", &DEFAULTS), order(&[("Fleisch", 1)]));
    }

    #[test]
    fn nothing_recognised() {
        for text in ["15 fleisch", "-2 fleisch", "2 xyz", "fleisch", "", "   \n  ", "Wer kommt heute mit?"] {
            assert_eq!(parse_order_lines(text, &DEFAULTS), None, "{text:?}");
        }
    }

    #[test]
    fn huge_numbers_are_skipped() {
        assert_eq!(parse_order_lines("99999999999999999999999 fleisch", &DEFAULTS), None);
    }
}
