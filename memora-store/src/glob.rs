//! Redis-compatible glob matching for key scans.
//!
//! Supports `*`, `?`, bracket classes (`[abc]`, `[^a]`, `[a-z]`) and `\`
//! escapes. An unterminated `[` matches itself.

/// Returns true if `text` matches the glob `pattern`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    // (pattern index after the last `*`, text index that star currently absorbs up to)
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            pi += 1;
            backtrack = Some((pi, ti));
            continue;
        }
        if pi < p.len() {
            if let Some(next) = step(&p, pi, t[ti]) {
                pi = next;
                ti += 1;
                continue;
            }
        }
        match backtrack {
            Some((resume, start)) => {
                pi = resume;
                ti = start + 1;
                backtrack = Some((resume, start + 1));
            }
            None => return false,
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

/// Matches one non-star token at `pi` against `c`, returning the next pattern index.
fn step(p: &[char], pi: usize, c: char) -> Option<usize> {
    match p[pi] {
        '?' => Some(pi + 1),
        '\\' if pi + 1 < p.len() => (p[pi + 1] == c).then_some(pi + 2),
        '[' => match_class(p, pi, c),
        lit => (lit == c).then_some(pi + 1),
    }
}

fn match_class(p: &[char], pi: usize, c: char) -> Option<usize> {
    let mut i = pi + 1;
    let negate = i < p.len() && p[i] == '^';
    if negate {
        i += 1;
    }

    let mut matched = false;
    let mut closed = false;
    while i < p.len() {
        match p[i] {
            ']' => {
                closed = true;
                break;
            }
            '\\' if i + 1 < p.len() => {
                matched |= p[i + 1] == c;
                i += 2;
            }
            lo if i + 2 < p.len() && p[i + 1] == '-' && p[i + 2] != ']' => {
                let hi = p[i + 2];
                let (a, b) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                matched |= a <= c && c <= b;
                i += 3;
            }
            x => {
                matched |= x == c;
                i += 1;
            }
        }
    }

    if !closed {
        return (c == '[').then_some(pi + 1);
    }
    (matched != negate).then_some(i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("memora:ns:*", "memora:ns:abc" => true ; "star suffix")]
    #[test_case("memora:ns:*", "memora:ns:" => true ; "star matches empty")]
    #[test_case("memora:ns:*", "memora:other:abc" => false ; "different namespace")]
    #[test_case("*", "" => true ; "lone star")]
    #[test_case("a*b*c", "aXXbYYc" => true ; "multiple stars")]
    #[test_case("a*b*c", "aXXbYY" => false ; "missing tail")]
    #[test_case("h?llo", "hello" => true ; "question mark")]
    #[test_case("h?llo", "hllo" => false ; "question needs one char")]
    #[test_case("h[ae]llo", "hallo" => true ; "class")]
    #[test_case("h[^e]llo", "hello" => false ; "negated class")]
    #[test_case("h[a-c]llo", "hbllo" => true ; "range")]
    #[test_case("p\\*:ns", "p*:ns" => true ; "escaped star is literal")]
    #[test_case("p\\*:ns", "px:ns" => false ; "escaped star not wildcard")]
    #[test_case("a\\[b\\]", "a[b]" => true ; "escaped brackets")]
    #[test_case("a[b", "a[b" => true ; "unterminated bracket literal")]
    fn test_glob(pattern: &str, text: &str) -> bool {
        glob_match(pattern, text)
    }
}
