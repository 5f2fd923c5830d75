//! Label generation and name helpers.
//!
//! Labels are the stable, author-facing keys of dialogs and buttons; ids are
//! derived from them.

use uuid::Uuid;

/// Longest label accepted for dialogs and buttons.
pub const MAX_LABEL_LENGTH: usize = 32;

/// Derive a dialog label from a display name.
///
/// `"Main"` becomes `"main"`; an empty name yields a random `dialog_<hex>`.
#[must_use]
pub fn generate_dialog_label(name: &str) -> String {
    generate_label(name, "dialog")
}

/// Derive a button label from a display name.
///
/// `"My Button"` becomes `"my_button"`; an empty name yields a random
/// `button_<hex>`.
#[must_use]
pub fn generate_button_label(name: &str) -> String {
    generate_label(name, "button")
}

fn generate_label(name: &str, prefix: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return random_label(prefix);
    }
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .take(MAX_LABEL_LENGTH)
        .collect()
}

fn random_label(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    let mut label = format!("{prefix}_{hex}");
    label.truncate(MAX_LABEL_LENGTH);
    label
}

/// Whether `text` looks like a translation key (`gui.palaver.dialog.title`):
/// at least two non-empty dot-separated segments of ASCII letters, digits,
/// `_` or `-`.
#[must_use]
pub fn is_translation_key(text: &str) -> bool {
    if text.is_empty() || !text.contains('.') {
        return false;
    }
    text.split('.').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_from_names() {
        assert_eq!(generate_button_label("abc"), "abc");
        assert_eq!(generate_button_label("test123"), "test123");
        assert_eq!(generate_button_label("My Button"), "my_button");
        assert_eq!(generate_dialog_label("main"), "main");
        assert_eq!(generate_dialog_label("Quest"), "quest");
    }

    #[test]
    fn generation_is_idempotent() {
        let once = generate_button_label("Hello, World!");
        assert_eq!(generate_button_label(&once), once);
    }

    #[test]
    fn long_names_are_truncated() {
        let label = generate_dialog_label(&"x".repeat(80));
        assert_eq!(label.len(), MAX_LABEL_LENGTH);
    }

    #[test]
    fn empty_names_get_random_labels() {
        let a = generate_button_label("");
        let b = generate_button_label("   ");
        assert!(a.starts_with("button_"));
        assert!(a.len() > 7);
        assert_ne!(a, b);
        assert_eq!(a, a.to_lowercase());
        assert!(!a.contains('-'));
        assert!(generate_dialog_label("").starts_with("dialog_"));
    }

    #[test]
    fn translation_keys() {
        assert!(is_translation_key("item.minecraft.diamond_sword"));
        assert!(is_translation_key("text.config.advanced-trading"));
        for key in [
            "",
            "invalid",
            "no_dots",
            ".startsWithDot",
            "endsWithDot.",
            "double..dot",
            "has space.key",
            "special@char.key",
        ] {
            assert!(!is_translation_key(key), "{key}");
        }
    }
}
