//! Display colours for entity classes.

/// Colour for classes missing from the table
pub const UNKNOWN_CLASS_COLOR: &str = "#808080";

const CLASS_COLORS: &[(&str, &str)] = &[
    ("Druid", "#FF7D0A"),
    ("Hunter", "#ABD473"),
    ("Mage", "#69CCF0"),
    ("Paladin", "#F58CBA"),
    ("Priest", "#FFFFFF"),
    ("Rogue", "#FFF569"),
    ("Shaman", "#0070DE"),
    ("Warlock", "#9482C9"),
    ("Warrior", "#C79C6E"),
];

/// Returns the hex colour used to draw `class`.
pub fn class_color(class: &str) -> &'static str {
    CLASS_COLORS
        .iter()
        .find(|(name, _)| *name == class)
        .map(|(_, color)| *color)
        .unwrap_or(UNKNOWN_CLASS_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_classes() {
        assert_eq!(class_color("Warrior"), "#C79C6E");
        assert_eq!(class_color("Shaman"), "#0070DE");
        assert_eq!(class_color("Pet"), UNKNOWN_CLASS_COLOR);
    }
}
