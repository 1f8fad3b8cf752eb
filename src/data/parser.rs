// ============================================================
// Layer 4 — Binary Parse Token Extractor
// ============================================================
// SNLI ships every sentence as a fully bracketed binary parse:
//
//   ( ( The cat ) ( sat ( on ( the mat ) ) ) )
//
// The surface tokens are whatever is left once the brackets are
// gone. Literal brackets inside the sentence are escaped by the
// parser as -LRB- / -RRB- and are restored here.
//
// No validation happens: malformed input simply yields whatever
// whitespace split remains.

/// Extract the surface tokens of a bracketed binary parse.
pub fn extract_tokens(parse: &str) -> Vec<String> {
    parse
        .replace(['(', ')'], " ")
        .replace("-LRB-", "(")
        .replace("-RRB-", ")")
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Surface tokens joined with single spaces, the form kept on an Example.
pub fn sentence_text(parse: &str) -> String {
    extract_tokens(parse).join(" ")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_brackets() {
        assert_eq!(extract_tokens("( ( A B ) ( C D ) )"), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_restores_escaped_brackets() {
        let tokens = extract_tokens("( ( -LRB- a ) ( b -RRB- ) )");
        assert_eq!(tokens, vec!["(", "a", "b", ")"]);
    }

    #[test]
    fn test_token_count_ignores_nesting_depth() {
        let flat   = extract_tokens("( A B C D )");
        let nested = extract_tokens("( ( ( A B ) C ) D )");
        assert_eq!(flat.len(), nested.len());
        assert_eq!(flat, nested);
    }

    #[test]
    fn test_brackets_glued_to_words() {
        // Parse strings are not always space-separated around brackets
        assert_eq!(extract_tokens("((A B)(C))"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_sentence_text_joins_with_single_spaces() {
        assert_eq!(sentence_text("( ( A  man ) ( sleeps . ) )"), "A man sleeps .");
    }

    #[test]
    fn test_empty_parse() {
        assert!(extract_tokens("").is_empty());
        assert!(extract_tokens("( ( ) )").is_empty());
    }
}
