//! Turns recognised invoice text into line items.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::models::LineItem;

/// A name, whitespace, then a trailing run of digits and nothing else.
fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.+?)\s+(\d+)\s*$").expect("line pattern is valid"))
}

/// Parses one trimmed line. Lines without a trailing quantity, or whose
/// quantity does not fit in a `u64`, yield `None`.
pub fn parse_line(line: &str) -> Option<LineItem> {
    let caps = line_pattern().captures(line)?;
    let quantity = caps[2].parse::<u64>().ok()?;
    Some(LineItem {
        product_name: caps[1].to_string(),
        description: None,
        quantity,
    })
}

/// Extracts every line item from `text`, preserving line order.
pub fn parse_line_items(text: &str) -> Vec<LineItem> {
    let items: Vec<LineItem> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_line)
        .collect();

    debug!(lines = text.lines().count(), items = items.len(), "Parsed invoice text");
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: u64) -> LineItem {
        LineItem {
            product_name: name.to_string(),
            description: None,
            quantity,
        }
    }

    #[test]
    fn keeps_matching_lines_in_order() {
        let items = parse_line_items("Apples 12\nBananas 5\nThank you\n");
        assert_eq!(items, vec![item("Apples", 12), item("Bananas", 5)]);
    }

    #[test]
    fn drops_lines_without_trailing_digits() {
        assert!(parse_line_items("Notes:\nTotal\n12 apples\n").is_empty());
    }

    #[test]
    fn surrounding_whitespace_and_blank_lines_are_ignored() {
        let items = parse_line_items("\n   \n\t Green tea   7  \r\n\n");
        assert_eq!(items, vec![item("Green tea", 7)]);
    }

    #[test]
    fn only_the_last_digit_group_is_the_quantity() {
        assert_eq!(parse_line("Box 12 pack 3"), Some(item("Box 12 pack", 3)));
        assert_eq!(parse_line("2024 1"), Some(item("2024", 1)));
    }

    #[test]
    fn a_lone_number_is_not_a_line_item() {
        assert_eq!(parse_line("42"), None);
    }

    #[test]
    fn zero_quantity_is_kept() {
        assert_eq!(parse_line("Pears 0"), Some(item("Pears", 0)));
    }

    #[test]
    fn quantities_beyond_u64_are_discarded() {
        assert_eq!(parse_line("Sand 99999999999999999999999"), None);
    }

    #[test]
    fn description_is_always_null_on_the_wire() {
        let json = serde_json::to_value(item("Apples", 12)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"productName": "Apples", "description": null, "quantity": 12})
        );
    }
}
