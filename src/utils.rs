//! Small formatting helpers shared by the API layer and the UI.

/// Format a Pokémon `name` into a human-friendly form.
///
/// Examples: `mr-mime` -> `Mr Mime`, `ho_oh` -> `Ho Oh`.
pub fn format_name(name: &str) -> String {
    let replaced = name.replace('-', " ").replace('_', " ");
    let parts: Vec<String> = replaced
        .split_whitespace()
        .map(|w| {
            let mut chs = w.chars();
            match chs.next() {
                None => String::new(),
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chs.as_str().to_lowercase()
                }
            }
        })
        .collect();
    parts.join(" ")
}

/// Wrap text into lines no longer than `width` (simple greedy algorithm).
pub fn text_to_lines(s: &str, width: usize) -> Vec<String> {
    let mut lines = vec![];
    let mut current = String::new();
    for word in s.split_whitespace() {
        if current.len() + word.len() + 1 > width && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Strip the control characters, line breaks and stray symbols the species
/// endpoint embeds in flavor text. Letters, spaces, `é` and basic
/// punctuation survive; everything else becomes a space, then runs of
/// whitespace collapse.
pub fn sanitize_flavor_text(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphabetic() || matches!(c, ' ' | 'é' | '.' | '!' | '?' | ',') {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_name_capitalizes_and_splits() {
        assert_eq!(format_name("mr-mime"), "Mr Mime");
        assert_eq!(format_name("ho_oh"), "Ho Oh");
        assert_eq!(format_name("PIKACHU"), "Pikachu");
        assert_eq!(format_name(""), "");
    }

    #[test]
    fn text_to_lines_wraps_greedily() {
        let lines = text_to_lines("a bb ccc dddd", 6);
        assert_eq!(lines, vec!["a bb", "ccc", "dddd"]);
        assert!(text_to_lines("", 10).is_empty());
    }

    #[test]
    fn sanitize_drops_control_characters() {
        let raw = "When several of\nthese POKéMON\u{c}gather, their\nelectricity.";
        assert_eq!(
            sanitize_flavor_text(raw),
            "When several of these POKéMON gather, their electricity."
        );
    }

    #[test]
    fn sanitize_keeps_basic_punctuation() {
        assert_eq!(
            sanitize_flavor_text("It's strong! Really? Yes, very."),
            "It s strong! Really? Yes, very."
        );
    }
}
