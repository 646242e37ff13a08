use std::sync::LazyLock;

use regex::Regex;

static SLIDE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^----\n").expect("slide break pattern is valid"));

static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)\A\s*^---\n(.*?)^---\n").expect("front matter pattern is valid")
});

/// Split a document into raw slide chunks at lines that are exactly `----`.
pub fn split(content: &str) -> Vec<String> {
    let content = content.replace("\r\n", "\n");
    SLIDE_BREAK.split(&content).map(String::from).collect()
}

/// Separate a chunk into `(front matter, body)`.
///
/// Front matter is the text between the first two `---` lines at the very
/// start of the chunk. Without a closing `---` the whole chunk is body.
pub fn front_matter(chunk: &str) -> (&str, &str) {
    match FRONT_MATTER.captures(chunk) {
        Some(caps) => {
            let (Some(all), Some(properties)) = (caps.get(0), caps.get(1)) else {
                return ("", chunk);
            };
            (properties.as_str(), &chunk[all.end()..])
        }
        None => ("", chunk),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_delimiter_lines() {
        let slides = split("# One\n----\n# Two\n----\n# Three\n");
        assert_eq!(slides, vec!["# One\n", "# Two\n", "# Three\n"]);
    }

    #[test]
    fn test_split_normalizes_crlf() {
        let slides = split("# One\r\n----\r\n# Two\r\n");
        assert_eq!(slides, vec!["# One\n", "# Two\n"]);
    }

    #[test]
    fn test_split_ignores_other_rules() {
        // Only a line of exactly four dashes splits
        let slides = split("a\n-----\nb\n---\nc\n  ----\nd");
        assert_eq!(slides.len(), 1);
    }

    #[test]
    fn test_single_slide() {
        assert_eq!(split("just text"), vec!["just text"]);
        assert_eq!(split(""), vec![""]);
    }

    #[test]
    fn test_front_matter() {
        let (props, body) = front_matter("---\ntransition: flip\n---\n# Title\n");
        assert_eq!(props, "transition: flip\n");
        assert_eq!(body, "# Title\n");
    }

    #[test]
    fn test_front_matter_after_blank_lines() {
        let (props, body) = front_matter("\n\n---\nstyle:\n  border: thick\n---\nbody");
        assert_eq!(props, "style:\n  border: thick\n");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_empty_front_matter() {
        let (props, body) = front_matter("---\n---\nbody");
        assert_eq!(props, "");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_no_front_matter() {
        let chunk = "# Title\n\n---\n\ntext";
        assert_eq!(front_matter(chunk), ("", chunk));
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let chunk = "---\ntransition: flip\n# Title";
        assert_eq!(front_matter(chunk), ("", chunk));
    }
}
