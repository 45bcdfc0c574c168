//! Glob-style key matching for offset-cursor scans.
//!
//! Supported syntax: `*` (any run of bytes), `?` (any single byte),
//! `[abc]`, `[^abc]`, `[a-z]` classes and `\x` to match `x` literally.
//! Matching is byte-wise, so binary keys work as well as text.

/// Returns true when `key` matches the whole `pattern`.
pub fn match_pattern(pattern: &[u8], key: &[u8]) -> bool {
    match_from(pattern, key)
}

/// Convenience wrapper for string patterns.
pub fn matches(pattern: &str, key: &[u8]) -> bool {
    match_from(pattern.as_bytes(), key)
}

/// One pattern token tried against the next key byte.
enum Step {
    Star,
    /// Matched one key byte, consuming this many pattern bytes.
    Advance(usize),
    Mismatch,
}

fn step(pattern: &[u8], c: Option<u8>) -> Step {
    let Some(&p) = pattern.first() else {
        return Step::Mismatch;
    };
    match (p, c) {
        (b'*', _) => Step::Star,
        (_, None) => Step::Mismatch,
        (b'?', Some(_)) => Step::Advance(1),
        (b'[', Some(c)) => match match_class(&pattern[1..], c) {
            (true, rest) => Step::Advance(pattern.len() - rest.len()),
            (false, _) => Step::Mismatch,
        },
        (b'\\', Some(c)) if pattern.len() >= 2 => {
            if pattern[1] == c { Step::Advance(2) } else { Step::Mismatch }
        }
        (literal, Some(c)) => {
            if literal == c { Step::Advance(1) } else { Step::Mismatch }
        }
    }
}

/// Iterative matcher. On a mismatch only the most recent `*` is retried,
/// one key byte further on, so the cost stays O(pattern * key).
fn match_from(pattern: &[u8], key: &[u8]) -> bool {
    let (mut pi, mut ki) = (0, 0);
    // Pattern index after the last `*` and the key offset it resumes at.
    let mut star: Option<(usize, usize)> = None;

    while pi < pattern.len() || ki < key.len() {
        match step(&pattern[pi..], key.get(ki).copied()) {
            Step::Star => {
                pi += 1;
                star = Some((pi, ki));
                continue;
            }
            Step::Advance(consumed) => {
                pi += consumed;
                ki += 1;
                continue;
            }
            Step::Mismatch => {}
        }
        match star {
            Some((star_pi, star_ki)) if star_ki < key.len() => {
                star = Some((star_pi, star_ki + 1));
                pi = star_pi;
                ki = star_ki + 1;
            }
            _ => return false,
        }
    }
    true
}

/// Matches `c` against a class body (after the `[`), returning the match
/// result and the pattern remaining after the closing `]`.
fn match_class(mut body: &[u8], c: u8) -> (bool, &[u8]) {
    let negate = body.first() == Some(&b'^');
    if negate {
        body = &body[1..];
    }

    let mut matched = false;
    loop {
        match body {
            [] => break,
            [b']', rest @ ..] => {
                body = rest;
                break;
            }
            [b'\\', escaped, rest @ ..] => {
                if *escaped == c {
                    matched = true;
                }
                body = rest;
            }
            [start, b'-', end, rest @ ..] if *end != b']' => {
                let (lo, hi) = if start <= end { (*start, *end) } else { (*end, *start) };
                if (lo..=hi).contains(&c) {
                    matched = true;
                }
                body = rest;
            }
            [single, rest @ ..] => {
                if *single == c {
                    matched = true;
                }
                body = rest;
            }
        }
    }

    (matched != negate, body)
}
