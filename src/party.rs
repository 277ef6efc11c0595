//! Party color table and display labels.

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_COLOR: &str = "#cccccc";

/// Declared order is the legend order.
pub const PARTY_COLORS: &[(&str, &str)] = &[
    ("PC", "#9999FF"),
    ("Liberal", "#EA6D6A"),
    ("Green", "#99C955"),
    (UNKNOWN, UNKNOWN_COLOR),
];

/// Exact-match lookup; unrecognized codes get the Unknown color.
pub fn color_for(party: &str) -> &'static str {
    PARTY_COLORS
        .iter()
        .find(|(code, _)| *code == party)
        .map(|(_, color)| *color)
        .unwrap_or(UNKNOWN_COLOR)
}

/// Long-form label for the legend. Codes without an override display as-is.
pub fn label_for(party: &str) -> &str {
    match party {
        "PC" => "Progressive Conservative",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_parties_map_to_their_colors() {
        assert_eq!(color_for("PC"), "#9999FF");
        assert_eq!(color_for("Liberal"), "#EA6D6A");
        assert_eq!(color_for("Green"), "#99C955");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(color_for("pc"), UNKNOWN_COLOR);
        assert_eq!(color_for("People's Alliance"), UNKNOWN_COLOR);
    }

    #[test]
    fn only_pc_has_a_long_label() {
        assert_eq!(label_for("PC"), "Progressive Conservative");
        assert_eq!(label_for("Liberal"), "Liberal");
        assert_eq!(label_for("Green"), "Green");
    }
}
