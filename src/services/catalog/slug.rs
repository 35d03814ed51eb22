use unicode_normalization::UnicodeNormalization;

/// Combining diacritical marks block, dropped after NFD decomposition.
fn is_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// URL-safe slug: lowercase, diacritics stripped, every run of other
/// characters collapsed to one `-`, no leading or trailing `-`.
///
/// `"Écharpes & Gants"` becomes `"echarpes-gants"`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut separator_pending = false;

    for c in input
        .chars()
        .flat_map(char::to_lowercase)
        .nfd()
        .filter(|c| !is_diacritic(*c))
    {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if separator_pending && !slug.is_empty() {
                slug.push('-');
            }
            separator_pending = false;
            slug.push(c);
        } else {
            separator_pending = true;
        }
    }

    slug
}

/// `base`, then `base-1`, `base-2`, ... for the n-th collision.
pub fn with_suffix(base: &str, counter: u32) -> String {
    if counter == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("Écharpes & Gants", "echarpes-gants")]
    #[case("Vestes", "vestes")]
    #[case("  --T-shirts  (été) 2026--", "t-shirts-ete-2026")]
    #[case("Chaussures_Homme", "chaussures-homme")]
    #[case("Ça coûte 10€", "ca-coute-10")]
    #[case("!!!", "")]
    fn derives_slugs(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn suffixes_start_at_one() {
        assert_eq!(with_suffix("vestes", 0), "vestes");
        assert_eq!(with_suffix("vestes", 1), "vestes-1");
        assert_eq!(with_suffix("vestes", 2), "vestes-2");
    }

    proptest! {
        #[test]
        fn slug_alphabet_and_hyphens(input in "\\PC{0,40}") {
            let slug = slugify(&input);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn slugify_is_idempotent(input in "\\PC{0,40}") {
            let once = slugify(&input);
            prop_assert_eq!(slugify(&once), once);
        }
    }
}
