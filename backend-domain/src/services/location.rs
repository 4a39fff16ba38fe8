// Location label normalization

const UNKNOWN_LOCATION: &str = "Unknown";

/// Preliminary-solution markers some feeds append to the region name.
const PRELIMINARY_MARKERS: [&str; 6] = ["ilksel", "i̇lksel", "ýlksel", "yüksel", "yuksel", "yiksel"];

const REVISION_MARKER: &str = "REVIZE";

/// Reduces a raw feed location to a stable region label so repeated
/// detections in the same area reconcile onto one record.
pub fn clean_location(raw: &str) -> String {
    let mut label = raw.trim();

    if let Some(index) = find_ascii_case_insensitive(label, REVISION_MARKER) {
        label = label[..index].trim_end();
    }

    let mut label = label.to_string();
    loop {
        let trimmed = strip_trailing_marker(&label);
        if trimmed.len() == label.len() {
            break;
        }
        label = trimmed;
    }

    if let (Some(open), Some(close)) = (label.find('('), label.find(')')) {
        if open < close {
            label.truncate(close + 1);
        }
    }

    let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
    if label.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        label
    }
}

fn strip_trailing_marker(label: &str) -> String {
    let trimmed = label.trim_end();
    let Some((head, last)) = trimmed.rsplit_once(char::is_whitespace) else {
        return if is_marker(trimmed) {
            String::new()
        } else {
            trimmed.to_string()
        };
    };
    if is_marker(last) {
        head.trim_end().to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_marker(word: &str) -> bool {
    let lower = word.to_lowercase();
    PRELIMINARY_MARKERS.iter().any(|marker| lower == *marker)
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .char_indices()
        .map(|(index, _)| index)
        .find(|index| {
            haystack
                .get(*index..*index + needle.len())
                .map(|candidate| candidate.eq_ignore_ascii_case(needle))
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_preliminary_marker_and_keeps_province() {
        assert_eq!(
            clean_location("KAVAKCALI-ULA (MUGLA) Yüksel"),
            "KAVAKCALI-ULA (MUGLA)"
        );
        assert_eq!(clean_location("SINDIRGI (BALIKESIR)   İlksel"), "SINDIRGI (BALIKESIR)");
        assert_eq!(clean_location("AKDENIZ Ýlksel"), "AKDENIZ");
    }

    #[test]
    fn strips_revision_suffix() {
        assert_eq!(
            clean_location("PAZARCIK (KAHRAMANMARAS) REVIZE01 (2023.02.06 04:30:12)"),
            "PAZARCIK (KAHRAMANMARAS)"
        );
    }

    #[test]
    fn collapses_whitespace_and_leaves_plain_labels_alone() {
        assert_eq!(clean_location("  10 km SW of   Ridgecrest, CA "), "10 km SW of Ridgecrest, CA");
    }

    #[test]
    fn empty_or_marker_only_becomes_unknown() {
        assert_eq!(clean_location(""), "Unknown");
        assert_eq!(clean_location("   "), "Unknown");
        assert_eq!(clean_location("Ilksel"), "Unknown");
    }
}
