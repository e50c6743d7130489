//! Renders windows and their orders as chat messages (Telegram Markdown, German).
use chrono_tz::Tz;
use gyro_common::Quantity;

use crate::db_types::{Order, OrderingWindow, Quantities};

pub const NO_ORDERS_YET: &str = "Noch keine Bestellungen 😢";
pub const NO_ORDERS_RECEIVED: &str = "Keine Bestellungen eingegangen 😢";

/// One participant's line in a summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub name: String,
    pub items: Vec<(String, Quantity)>,
}

/// Orders of a window, aggregated per participant and per option. Options appear in the window's order; options and
/// participants without any items are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub lines: Vec<SummaryLine>,
    pub totals: Vec<(String, u32)>,
    pub grand_total: u32,
}

impl OrderSummary {
    pub fn new(window: &OrderingWindow, orders: &[Order]) -> Self {
        let lines = orders
            .iter()
            .filter(|o| o.has_items())
            .filter_map(|order| {
                let items = items_in_option_order(&window.options, &order.quantities);
                if items.is_empty() {
                    None
                } else {
                    Some(SummaryLine { name: order.participant.display_name(), items })
                }
            })
            .collect::<Vec<_>>();
        let totals = window
            .options
            .iter()
            .map(|option| {
                let sum = lines
                    .iter()
                    .flat_map(|l| l.items.iter())
                    .filter(|(o, _)| o == option)
                    .map(|(_, q)| u32::from(*q))
                    .sum::<u32>();
                (option.clone(), sum)
            })
            .filter(|(_, sum)| *sum > 0)
            .collect::<Vec<_>>();
        let grand_total = totals.iter().map(|(_, sum)| sum).sum();
        Self { lines, totals, grand_total }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// e.g. `5 (2 Fleisch, 3 Vegetarisch)`
    pub fn totals_text(&self) -> String {
        let per_option = self.totals.iter().map(|(option, sum)| format!("{sum} {option}")).collect::<Vec<_>>();
        format!("{} ({})", self.grand_total, per_option.join(", "))
    }

    /// The bulleted participant list followed by the totals line, or `empty_text` if nobody ordered.
    pub fn render(&self, empty_text: &str) -> String {
        if self.is_empty() {
            return empty_text.to_string();
        }
        let mut text = String::new();
        for line in &self.lines {
            let items = line.items.iter().map(|(o, q)| format!("{q} {o}")).collect::<Vec<_>>().join(", ");
            text.push_str(&format!("• {}: {}\n", escape_markdown(&line.name), escape_markdown(&items)));
        }
        text.push_str(&format!("\n🥙 *Gesamt:* {}", escape_markdown(&self.totals_text())));
        text
    }
}

fn items_in_option_order(options: &[String], quantities: &Quantities) -> Vec<(String, Quantity)> {
    options
        .iter()
        .filter_map(|option| {
            let q = quantities.get(option);
            (!q.is_zero()).then(|| (option.clone(), q))
        })
        .collect()
}

/// `2 Fleisch, 3 Vegetarisch` for the non-zero quantities, in the window's option order. Empty if there are none.
pub fn format_quantities(options: &[String], quantities: &Quantities) -> String {
    items_in_option_order(options, quantities)
        .into_iter()
        .map(|(option, q)| format!("{q} {option}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_deadline(window: &OrderingWindow, tz: Tz) -> String {
    window.local_deadline(tz).format("%H:%M").to_string()
}

/// The reply to `/status`.
pub fn format_status(window: &OrderingWindow, orders: &[Order], tz: Tz) -> String {
    let summary = OrderSummary::new(window, orders);
    format!(
        "📊 *Aktueller Status:* {}\n⏰ Deadline: {}\n\n{}",
        escape_markdown(&window.name),
        format_deadline(window, tz),
        summary.render(NO_ORDERS_YET)
    )
}

/// The summary posted once a window closes.
pub fn format_final(window: &OrderingWindow, orders: &[Order], tz: Tz) -> String {
    let summary = OrderSummary::new(window, orders);
    format!(
        "📊 *Finale Bestellübersicht:* {}\n⏰ Deadline war: {}\n\n{}",
        escape_markdown(&window.name),
        format_deadline(window, tz),
        summary.render(NO_ORDERS_RECEIVED)
    )
}

/// The message that presents an open window to the group. It is re-rendered after every change.
///
/// The creator's name is taken from their own order if they placed one; otherwise `creator_name` is used.
pub fn format_window_message(window: &OrderingWindow, orders: &[Order], creator_name: Option<&str>, tz: Tz) -> String {
    let creator = orders
        .iter()
        .find(|o| o.participant.user_id == window.created_by)
        .map(|o| o.participant.display_name())
        .or_else(|| creator_name.map(str::to_string))
        .unwrap_or_else(|| format!("User {}", window.created_by));
    let summary = OrderSummary::new(window, orders);
    let mut text = format!(
        "🥙 *Gyroskop geöffnet:* {}\n\n👤 Erstellt von: {}\n⏰ Deadline: {}\n\n",
        escape_markdown(&window.name),
        escape_markdown(&creator),
        format_deadline(window, tz)
    );
    if !summary.is_empty() {
        text.push_str("*Bestellungen:*\n");
        text.push_str(&summary.render(NO_ORDERS_YET));
        text.push_str("\n\n");
    }
    let example = window
        .options
        .iter()
        .take(2)
        .zip([2, 1])
        .map(|(option, q)| format!("{q} {option}"))
        .collect::<Vec<_>>()
        .join(", ");
    text.push_str(&format!("Bestellt per Button oder schreibt z.B. \"{}\"\n", escape_markdown(&example)));
    text.push_str("Zum Beenden: Antwortet auf diese Nachricht mit /ende");
    text
}

/// Escapes the characters that have a meaning in Telegram's legacy Markdown.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
