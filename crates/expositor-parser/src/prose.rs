//! Cleanup of free-form prose returned by the model.

/// Remove a fence wrapping the whole text.
///
/// The opening fence line (with any language tag) is removed only when the
/// text starts with a fence; a trailing fence is removed wherever it is.
pub fn strip_outer_fence(text: &str) -> &str {
    let mut out = text.trim();

    if out.starts_with("```") {
        out = match out.split_once('\n') {
            Some((_, rest)) => rest,
            None => out.trim_start_matches('`'),
        };
    }
    if let Some(stripped) = out.trim_end().strip_suffix("```") {
        out = stripped;
    }

    out.trim()
}

/// Remove the first of `preambles` the text starts with, ignoring ASCII case.
///
/// Colons, spaces and newlines following the preamble go with it.
pub fn strip_preamble<'a>(text: &'a str, preambles: &[&str]) -> &'a str {
    let text = text.trim_start();
    preambles
        .iter()
        .find(|p| {
            text.get(..p.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(p))
        })
        .map_or(text, |p| {
            text[p.len()..].trim_start_matches([':', ' ', '\n', '\r'])
        })
}

/// Strip an outer fence, then a preamble. Returns `None` if nothing is left.
pub fn clean<'a>(text: &'a str, preambles: &[&str]) -> Option<&'a str> {
    let cleaned = strip_preamble(strip_outer_fence(text), preambles).trim();
    (!cleaned.is_empty()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAP_PREAMBLES: &[&str] = &["Rap Lyrics:", "Here's a rap about the code:", "Code Rap:"];

    #[test]
    fn test_strip_outer_fence_with_tag() {
        assert_eq!(
            strip_outer_fence("```markdown\n# Report\n- gap\n```"),
            "# Report\n- gap"
        );
    }

    #[test]
    fn test_strip_outer_fence_untouched() {
        assert_eq!(strip_outer_fence("  plain text  "), "plain text");
    }

    #[test]
    fn test_strip_preamble_case_insensitive() {
        assert_eq!(
            strip_preamble("RAP LYRICS:\n\nYo, the parser reads", RAP_PREAMBLES),
            "Yo, the parser reads"
        );
    }

    #[test]
    fn test_strip_preamble_only_first_match() {
        assert_eq!(
            strip_preamble("Code Rap: Code Rap: again", RAP_PREAMBLES),
            "Code Rap: again"
        );
    }

    #[test]
    fn test_clean_empty_after_cleanup() {
        assert_eq!(clean("```\nRap Lyrics:\n```", RAP_PREAMBLES), None);
    }
}
