/// Capitalise the first letter of every whitespace-separated word
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Length of a string in characters, which is what length bounds are measured in
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cut `text` to at most `max_chars` characters, ending in "..." when cut
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let head: String = text.chars().take(keep).collect();
    format!("{}...", head)
}

/// First `n` whitespace-separated words of `text`
pub fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// Lower-cased words of a URL path, splitting on separators
///
/// `https://example.com/services/sofa-polishing_andheri/` gives
/// `["services", "sofa", "polishing", "andheri"]`.
pub fn slug_words(url: &str) -> Vec<String> {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    path.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Lower-cased keyword tokens of a set of keyword phrases, deduplicated, in order
pub fn keyword_tokens(keywords: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for keyword in keywords {
        for token in keyword.split_whitespace() {
            let token = token.to_lowercase();
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("sofa polishing"), "Sofa Polishing");
        assert_eq!(title_case("  vile   parle "), "Vile Parle");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        let cut = truncate_with_ellipsis("abcdefghijkl", 10);
        assert_eq!(cut, "abcdefg...");
        assert_eq!(char_len(&cut), 10);
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let cut = truncate_with_ellipsis("ééééééééééééé", 6);
        assert_eq!(cut, "ééé...");
    }

    #[test]
    fn test_slug_words() {
        assert_eq!(
            slug_words("https://example.com/services/sofa-polishing_andheri/"),
            vec!["services", "sofa", "polishing", "andheri"]
        );
        assert_eq!(slug_words("/Bandra/upholstery?ref=1"), vec!["bandra", "upholstery"]);
    }

    #[test]
    fn test_keyword_tokens_dedupes() {
        let keywords = vec!["Sofa Polishing".to_string(), "sofa repair".to_string()];
        assert_eq!(keyword_tokens(&keywords), vec!["sofa", "polishing", "repair"]);
    }
}
