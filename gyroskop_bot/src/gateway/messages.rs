//! The German texts the bot sends.
use chrono_tz::Tz;
use gyroskop_engine::{
    db_types::OrderingWindow,
    events::WindowClosedEvent,
    summary::{escape_markdown, format_deadline, format_final, format_quantities},
    window_objects::{CloseReason, Submission, WindowChange},
    WindowApiError,
};

pub const HELP: &str = "🥙 *Gyroskop Bot - Gemeinsam Essen bestellen*

*Befehle:*
/gyroskop \\[Deadline], \\[Name], Option1, Option2, ... - Neues Gyroskop öffnen
/status - Aktuellen Status anzeigen
/ende - Gyroskop beenden (nur als Antwort auf die Gyroskop-Nachricht)
/stornieren - Eigene Bestellung stornieren
/help - Diese Hilfe anzeigen

*Deadline:* 30min, 2h oder eine Uhrzeit wie 18:30. Ohne Angabe: 15 Minuten.
Ohne Name und Optionen gibt es Gyros mit Fleisch oder Vegetarisch.

*Bestellen:*
Nutzt die Buttons 1️⃣-5️⃣ unter der jeweiligen Option oder schreibt z.B. \"2 Fleisch, 1 Veg\".
❌ *Stornieren:* Schreibt \"0\" oder nutzt den ❌ Stornieren Button.

*Ändern:* Antwortet mit /gyroskop auf die Gyroskop-Nachricht, um die Deadline zu ändern oder ein beendetes \
Gyroskop wieder zu öffnen.

*Beispiele:*
/gyroskop 17:00 - Gyros bis 17:00 Uhr
/gyroskop 30min, Pizza, Margherita, Salami - Pizza für die nächsten 30 Minuten";

pub const GROUPS_ONLY: &str = "🥙 Gyroskop funktioniert nur in Gruppen!";
pub const END_NEEDS_REPLY: &str = "⚠️ /ende muss als Antwort auf die Gyroskop-Nachricht verwendet werden!";
pub const NO_ACTIVE_WINDOW: &str = "❌ Kein aktives Gyroskop in dieser Gruppe";
pub const INVALID_BUTTON: &str = "⚠️ Ungültige Auswahl";

/// The user-facing text for a failed request.
pub fn error_text(e: &WindowApiError) -> String {
    match e {
        WindowApiError::InvalidFormat(_) => {
            "⚠️ Ungültiges Format. Beispiele: /gyroskop 30min oder /gyroskop 18:30, Pizza, Margherita, Salami".into()
        },
        WindowApiError::InvalidDuration(_) => "⚠️ Ungültige Dauer. Die Dauer muss größer als 0 sein.".into(),
        WindowApiError::Unauthorized => "⚠️ Nur der Ersteller kann das Gyroskop beenden oder ändern!".into(),
        WindowApiError::ConflictingWindow(_) => {
            "⚠️ In dieser Gruppe ist bereits ein Gyroskop offen! Beendet es zuerst mit /ende.".into()
        },
        WindowApiError::NotFound => NO_ACTIVE_WINDOW.into(),
        WindowApiError::WindowExpired(_) => "⏰ Das Gyroskop ist bereits abgelaufen!".into(),
        WindowApiError::UnrecognisedOrder => "🤔 Bestellung nicht erkannt. Schreibt z.B. \"2 Fleisch, 1 Veg\"".into(),
        WindowApiError::InvalidSelection(_) => INVALID_BUTTON.into(),
        WindowApiError::StoreFailure(_) => "❌ Fehler beim Speichern. Bitte versucht es gleich noch einmal.".into(),
    }
}

/// The reply to an accepted text order or `/stornieren`.
pub fn submission_text(submission: &Submission) -> String {
    let name = escape_markdown(&submission.participant.display_name());
    if submission.is_cancellation() {
        format!("❌ Bestellung von {name} wurde storniert")
    } else {
        let items = format_quantities(&submission.window.options, &submission.quantities);
        format!("✅ {name}: {}", escape_markdown(&items))
    }
}

/// The short acknowledgement shown after a button press. Not Markdown.
pub fn selection_ack(submission: &Submission) -> String {
    if submission.is_cancellation() {
        "❌ Bestellung storniert".into()
    } else {
        format!("✅ {}", format_quantities(&submission.window.options, &submission.quantities))
    }
}

pub fn window_changed_text(window: &OrderingWindow, change: WindowChange, tz: Tz) -> String {
    let deadline = format_deadline(window, tz);
    match change {
        WindowChange::Reopened => format!("🔓 *Gyroskop wieder geöffnet!* Neue Deadline: {deadline}"),
        WindowChange::Updated => format!("✏️ *Gyroskop geändert.* Neue Deadline: {deadline}"),
    }
}

/// The announcement posted to the group once a window has closed.
pub fn closed_announcement(event: &WindowClosedEvent, tz: Tz) -> String {
    let header = match event.reason {
        CloseReason::Manual(_) => "🔒 *Gyroskop beendet!*",
        CloseReason::Expired => "⏰ *Gyroskop abgelaufen!*",
    };
    format!("{header}\n\n{}", format_final(&event.window, &event.orders, tz))
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use chrono_tz::Europe::Berlin;
    use gyro_common::Quantity;
    use gyroskop_engine::{
        db_types::{GroupId, Order, Participant, Quantities, UserId},
        WindowStoreError,
    };

    use super::*;

    fn window() -> OrderingWindow {
        OrderingWindow {
            id: 1,
            group_id: GroupId(-5),
            created_by: UserId(1),
            message_ref: None,
            name: "Gyros".into(),
            options: vec!["Fleisch".into(), "Vegetarisch".into()],
            deadline: Utc.with_ymd_and_hms(2024, 6, 1, 16, 0, 0).unwrap(),
            is_open: false,
        }
    }

    fn submission(pairs: &[(&str, i64)]) -> Submission {
        let quantities =
            pairs.iter().map(|(o, q)| (o.to_string(), Quantity::try_from(*q).unwrap())).collect::<Quantities>();
        Submission { window: window(), participant: Participant::new(UserId(2)).with_username("max_m"), quantities }
    }

    #[test]
    fn submissions() {
        let sub = submission(&[("Vegetarisch", 1), ("Fleisch", 2)]);
        assert_eq!(submission_text(&sub), "✅ @max\\_m: 2 Fleisch, 1 Vegetarisch");
        assert_eq!(selection_ack(&sub), "✅ 2 Fleisch, 1 Vegetarisch");
        let sub = submission(&[]);
        assert_eq!(submission_text(&sub), "❌ Bestellung von @max\\_m wurde storniert");
        assert_eq!(selection_ack(&sub), "❌ Bestellung storniert");
    }

    #[test]
    fn every_error_has_a_message() {
        let errors = [
            WindowApiError::InvalidFormat("x".into()),
            WindowApiError::InvalidDuration("x".into()),
            WindowApiError::Unauthorized,
            WindowApiError::ConflictingWindow(4),
            WindowApiError::NotFound,
            WindowApiError::WindowExpired(Utc::now()),
            WindowApiError::UnrecognisedOrder,
            WindowApiError::InvalidSelection(9),
            WindowApiError::StoreFailure(WindowStoreError::DatabaseError("disk full".into())),
        ];
        for e in errors {
            let text = error_text(&e);
            assert!(!text.is_empty());
            // Internal details stay in the logs
            assert!(!text.contains("disk full"));
        }
        assert_eq!(error_text(&WindowApiError::NotFound), NO_ACTIVE_WINDOW);
    }

    #[test]
    fn announcements() {
        let order = Order {
            id: 1,
            window_id: 1,
            participant: Participant::new(UserId(1)).with_name("Anna", None),
            quantities: [("Fleisch".to_string(), Quantity::try_from(2i64).unwrap())].into_iter().collect(),
        };
        let event = WindowClosedEvent { window: window(), orders: vec![order], reason: CloseReason::Expired };
        let text = closed_announcement(&event, Berlin);
        assert!(text.starts_with("⏰ *Gyroskop abgelaufen!*\n\n📊 *Finale Bestellübersicht:* Gyros"), "{text}");
        assert!(text.contains("⏰ Deadline war: 18:00"));
        assert!(text.contains("• Anna: 2 Fleisch"));
        let event = WindowClosedEvent { reason: CloseReason::Manual(UserId(1)), ..event };
        assert!(closed_announcement(&event, Berlin).starts_with("🔒 *Gyroskop beendet!*"));

        let text = window_changed_text(&window(), WindowChange::Reopened, Berlin);
        assert_eq!(text, "🔓 *Gyroskop wieder geöffnet!* Neue Deadline: 18:00");
    }
}
