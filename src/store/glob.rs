//! Glob matcher for the KEYS command.
//!
//! Implements single-segment shell-filename semantics: `*` matches any run
//! of characters except `/`, `?` matches any single character except `/`,
//! `[...]` matches a character class (with `a-z` ranges and `^` negation),
//! and `\` escapes the next character. A malformed pattern (unterminated
//! class or trailing escape) matches nothing.
//!
//! The pattern is compiled to a token list once and reused across every key
//! in the scan.

/// One compiled element of a glob pattern.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(char),
    /// `*`: any run of non-`/` characters
    Any,
    /// `?`: exactly one non-`/` character
    Single,
    /// `[...]`: ranges stored as inclusive (start, end) pairs
    Class(Vec<(char, char)>, bool),
}

/// A compiled glob pattern.
#[derive(Debug)]
pub(crate) struct GlobPattern {
    tokens: Vec<Token>,
    malformed: bool,
}

impl GlobPattern {
    pub(crate) fn compile(pattern: &str) -> Self {
        let mut tokens = Vec::with_capacity(pattern.len());
        let mut malformed = false;
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '*' => tokens.push(Token::Any),
                '?' => tokens.push(Token::Single),
                '[' => {
                    let negated = chars.peek() == Some(&'^');
                    if negated {
                        chars.next();
                    }
                    let mut ranges = Vec::new();
                    let mut closed = false;
                    while let Some(start) = chars.next() {
                        if start == ']' && !ranges.is_empty() {
                            closed = true;
                            break;
                        }
                        if chars.peek() == Some(&'-') {
                            chars.next();
                            match chars.next() {
                                Some(end) if end != ']' => {
                                    ranges.push((start, end));
                                    continue;
                                }
                                // "a-]" and a trailing "a-" are malformed
                                _ => break,
                            }
                        }
                        ranges.push((start, start));
                    }
                    if !closed {
                        malformed = true;
                        break;
                    }
                    tokens.push(Token::Class(ranges, negated));
                }
                '\\' => match chars.next() {
                    Some(escaped) => tokens.push(Token::Literal(escaped)),
                    None => {
                        malformed = true;
                        break;
                    }
                },
                _ => tokens.push(Token::Literal(c)),
            }
        }

        Self { tokens, malformed }
    }

    pub(crate) fn matches(&self, text: &str) -> bool {
        if self.malformed {
            return false;
        }
        let chars: Vec<char> = text.chars().collect();
        match_from(&self.tokens, &chars)
    }
}

fn match_from(tokens: &[Token], text: &[char]) -> bool {
    let Some(token) = tokens.first() else {
        return text.is_empty();
    };

    match token {
        Token::Literal(c) => !text.is_empty() && text[0] == *c && match_from(&tokens[1..], &text[1..]),
        Token::Single => {
            !text.is_empty() && text[0] != '/' && match_from(&tokens[1..], &text[1..])
        }
        Token::Any => {
            // Consume zero or more characters, stopping at a segment boundary.
            for i in 0..=text.len() {
                if match_from(&tokens[1..], &text[i..]) {
                    return true;
                }
                if i < text.len() && text[i] == '/' {
                    return false;
                }
            }
            false
        }
        Token::Class(ranges, negated) => {
            if text.is_empty() {
                return false;
            }
            let c = text[0];
            let in_class = ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
            in_class != *negated && match_from(&tokens[1..], &text[1..])
        }
    }
}
