//! Dialog priorities.
//!
//! Higher priorities win during resolution. Negative priorities are never
//! picked automatically; such dialogs are only reachable through explicit
//! transitions.

/// Only reachable by an explicit transition.
pub const MANUAL_ONLY: i32 = -1;
/// Picked when nothing else is eligible.
pub const FALLBACK: i32 = 0;
/// Farewells, idle chatter.
pub const LOW: i32 = 1;
/// Ordinary conversation.
pub const NORMAL: i32 = 5;
/// Greetings and entry points.
pub const HIGH: i32 = 10;
/// Overrides everything else.
pub const CRITICAL: i32 = 100;

/// Suggested priority for a dialog with the given label, for editors.
/// Dialogs start at [`FALLBACK`] unless a priority is set explicitly.
#[must_use]
pub fn default_priority_for(label: &str) -> i32 {
    match label.trim().to_ascii_lowercase().as_str() {
        "default" | "start" | "welcome" | "greeting" | "intro" | "introduction" => HIGH,
        "main" | "question" | "help" | "info" | "information" | "talk" | "conversation" => NORMAL,
        "bye" | "goodbye" | "farewell" | "exit" | "leave" | "thanks" | "thankyou" | "idle"
        | "random" => LOW,
        _ => FALLBACK,
    }
}

/// Human-readable name of a priority.
#[must_use]
pub fn display_name(priority: i32) -> &'static str {
    match priority {
        MANUAL_ONLY => "Manual Only",
        FALLBACK => "Fallback",
        LOW => "Low",
        NORMAL => "Normal",
        HIGH => "High",
        CRITICAL => "Critical",
        _ => "Custom",
    }
}

/// Whether resolution may ever pick a dialog with this priority.
#[must_use]
pub fn is_auto_selectable(priority: i32) -> bool {
    priority >= FALLBACK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_by_label() {
        assert_eq!(default_priority_for("Welcome"), HIGH);
        assert_eq!(default_priority_for("talk"), NORMAL);
        assert_eq!(default_priority_for("goodbye"), LOW);
        assert_eq!(default_priority_for("quest_hint"), FALLBACK);
    }

    #[test]
    fn names() {
        assert_eq!(display_name(MANUAL_ONLY), "Manual Only");
        assert_eq!(display_name(CRITICAL), "Critical");
        assert_eq!(display_name(42), "Custom");
    }

    #[test]
    fn manual_only_is_not_selectable() {
        assert!(!is_auto_selectable(MANUAL_ONLY));
        assert!(is_auto_selectable(FALLBACK));
    }
}
