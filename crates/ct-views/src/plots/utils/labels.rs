//! Display labels for narrow chart axes and hover text

/// Names longer than this (in characters) are abbreviated when multi-word
const MAX_LABEL_CHARS: usize = 13;

/// Abbreviate long multi-word names to their initials.
///
/// Initials keep their original case: "United Kingdom" becomes "UK",
/// "Bosnia and Herzegovina" becomes "BaH".
pub fn compress_label(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    if words.len() > 1 && name.chars().count() > MAX_LABEL_CHARS {
        words.iter().filter_map(|w| w.chars().next()).collect()
    } else {
        name.to_string()
    }
}

/// Place name with an optional parenthesised sub-region
pub fn place_label(place: &str, sub_region: Option<&str>) -> String {
    match sub_region.map(str::trim) {
        Some(sub) if !sub.is_empty() => format!("{} ({})", place, sub),
        _ => place.to_string(),
    }
}

/// A ratio rendered as a percentage with two decimals
pub fn percent_label(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_label() {
        assert_eq!(compress_label("United Kingdom"), "UK");
        assert_eq!(compress_label("Italy"), "Italy");
        assert_eq!(compress_label("Korea, South"), "Korea, South");
        assert_eq!(compress_label("Bosnia and Herzegovina"), "BaH");
        assert_eq!(compress_label("Czechoslovakia"), "Czechoslovakia");
    }

    #[test]
    fn test_place_label() {
        assert_eq!(place_label("Canada", Some("Ontario")), "Canada (Ontario)");
        assert_eq!(place_label("Italy", Some("")), "Italy");
        assert_eq!(place_label("Italy", None), "Italy");
    }

    #[test]
    fn test_percent_label() {
        assert_eq!(percent_label(0.03456), "3.46%");
        assert_eq!(percent_label(0.0), "0.00%");
    }
}
