use gyro_common::Quantity;
use gyroskop_engine::{db_types::OrderingWindow, window_objects::Selection};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use super::callback::CallbackPayload;

/// Buttons for the quantities 1 to 5. Larger amounts can still be ordered by text.
const NUMBER_EMOJI: [&str; 5] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣"];

/// The keyboard under a window message: a label row and a row of quantity buttons per option, then a cancel button.
pub fn window_keyboard(window: &OrderingWindow) -> InlineKeyboardMarkup {
    let mut rows = Vec::with_capacity(window.options.len() * 2 + 1);
    for (option_index, option) in window.options.iter().enumerate() {
        rows.push(vec![InlineKeyboardButton::callback(format!("{option}:"), CallbackPayload::Noop.to_string())]);
        let buttons = NUMBER_EMOJI
            .iter()
            .zip(1u32..)
            .filter_map(|(&label, q)| {
                let quantity = Quantity::try_from(q).ok()?;
                let payload = CallbackPayload::Selection(Selection::Quantity { option_index, quantity });
                Some(InlineKeyboardButton::callback(label, payload.to_string()))
            })
            .collect::<Vec<_>>();
        rows.push(buttons);
    }
    let cancel = CallbackPayload::Selection(Selection::CancelAll);
    rows.push(vec![InlineKeyboardButton::callback("❌ Stornieren", cancel.to_string())]);
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use gyroskop_engine::db_types::{GroupId, UserId};
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;

    fn payloads(markup: &InlineKeyboardMarkup) -> Vec<Vec<String>> {
        markup
            .inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| match &button.kind {
                        InlineKeyboardButtonKind::CallbackData(data) => data.clone(),
                        other => panic!("unexpected button kind {other:?}"),
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn one_block_per_option() {
        let window = OrderingWindow {
            id: 3,
            group_id: GroupId(-1),
            created_by: UserId(1),
            message_ref: None,
            name: "Pizza".into(),
            options: vec!["Margherita".into(), "Salami".into(), "Funghi".into()],
            deadline: Utc::now(),
            is_open: true,
        };
        let markup = window_keyboard(&window);
        assert_eq!(markup.inline_keyboard.len(), 7);
        assert_eq!(markup.inline_keyboard[0][0].text, "Margherita:");
        assert_eq!(markup.inline_keyboard[4][0].text, "Funghi:");
        assert_eq!(markup.inline_keyboard[6][0].text, "❌ Stornieren");

        let data = payloads(&markup);
        assert_eq!(data[0], vec!["noop"]);
        assert_eq!(data[1], vec!["g0_1", "g0_2", "g0_3", "g0_4", "g0_5"]);
        assert_eq!(data[3], vec!["g1_1", "g1_2", "g1_3", "g1_4", "g1_5"]);
        assert_eq!(data[5][4], "g2_5");
        assert_eq!(data[6], vec!["g0"]);
        for payload in data.iter().flatten() {
            assert!(payload.parse::<CallbackPayload>().is_ok(), "{payload}");
        }
    }
}
