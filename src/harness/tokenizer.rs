/// Split `text` on every occurrence of `delimiter`, dropping the empty runs between
/// consecutive delimiters. The tokens borrow from `text`.
pub fn split(text: &str, delimiter: char) -> Vec<&str> {
    text.split(delimiter).filter(|t| !t.is_empty()).collect()
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::split;

    #[test]
    fn empty_runs() {
        assert!(split("", ',').is_empty());
        assert!(split(",,,", ',').is_empty());
        assert_eq!(split("a,,b", ','), vec!["a", "b"]);
        assert_eq!(split(",x,y,", ','), vec!["x", "y"]);
        assert_eq!(split("x^2-1", ','), vec!["x^2-1"]);
    }

    proptest! {
        #[test]
        fn without_delimiter(s in "[^,]+") {
            prop_assert_eq!(split(&s, ','), vec![s.as_str()]);
        }

        #[test]
        fn joined_tokens(tokens in prop::collection::vec("[a-z0-9^*+-]{1,8}", 0..8), gaps in 1usize..4) {
            let text = tokens.join(&",".repeat(gaps));
            let expected: Vec<&str> = tokens.iter().map(|t| t.as_str()).collect();
            prop_assert_eq!(split(&text, ','), expected);
        }
    }
}
