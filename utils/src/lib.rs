pub mod color;

/// Like `assert!(matches!(..))`, but prints the offending value on failure.
#[macro_export]
macro_rules! assert_matches {
    ($expression: expr, $( $pattern: pat )|* $( if $guard: expr )?) => {{
        match $expression {
            $( $pattern )|* $( if $guard )? => (),
            expression => panic!(
                r#"assertion failed: `(if let pattern = expression), {}:{}:{}`
pattern: `{}`,
expression: `{:?}`"#,
                file!(),
                line!(),
                column!(),
                stringify!($( $pattern )|* $( if $guard )?),
                expression
            ),
        }
    }};
}

/// Left-pads `s` with spaces up to `pad` characters. Never truncates.
pub fn pad_left(s: &str, pad: usize) -> String {
    pad_left_with_char(s, pad, ' ')
}

pub fn pad_left_with_char(s: &str, pad: usize, chr: char) -> String {
    format!(
        "{padding}{string}",
        padding = chr
            .to_string()
            .repeat(pad.checked_sub(s.len()).unwrap_or(0)),
        string = s
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_left() {
        let tests = vec![("a", "    a"), ("", "          "), ("a", "a"), ("", "")];

        for (input, expected) in tests {
            assert_eq!(expected, pad_left(input, expected.len()));
        }

        // not enough padding does not truncate string
        assert_eq!("a", pad_left("a", 0));
    }

    #[test]
    fn assert_matches_accepts_guards() {
        assert_matches!(Some(3), Some(n) if n > 2);
    }

    #[test]
    #[should_panic]
    fn assert_matches_panics_on_mismatch() {
        assert_matches!(None::<u8>, Some(_));
    }
}
