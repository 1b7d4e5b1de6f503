/// Characters that are not allowed in file names on common desktop filesystems.
const FORBIDDEN: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Trims, replaces forbidden characters with `_` and collapses whitespace runs.
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .trim()
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `"{artist} - {title}.mp3"`, sanitized.
pub fn safe_filename(artist: &str, title: &str) -> String {
    sanitize_filename(&format!("{artist} - {title}.mp3"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_forbidden_characters() {
        assert_eq!(
            sanitize_filename(r#"a\b/c*d?e:f"g<h>i|j"#),
            "a_b_c_d_e_f_g_h_i_j"
        );
    }

    #[test]
    fn test_collapses_whitespace_and_trims() {
        assert_eq!(sanitize_filename("  Hello \t  World\n "), "Hello World");
    }

    #[test]
    fn test_safe_filename_format() {
        assert_eq!(safe_filename("AC/DC", "Back In Black"), "AC_DC - Back In Black.mp3");
    }

    #[test]
    fn test_cyrillic_kept() {
        assert_eq!(safe_filename("Кино", "Группа крови"), "Кино - Группа крови.mp3");
    }

    #[test]
    fn test_empty_parts() {
        assert_eq!(safe_filename("", ""), "- .mp3");
    }

    #[test]
    fn test_idempotent_and_clean() {
        let inputs = [
            "",
            "   ",
            "plain",
            " <<>> ",
            "a :: b ?? c",
            "tab\tand\u{a0}nbsp",
            "\"quoted\" | piped / slashed \\ back",
            "x * y",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "not idempotent for {input:?}");
            assert!(
                !once.chars().any(|c| FORBIDDEN.contains(&c)),
                "forbidden char left in {once:?}"
            );
        }
    }
}
