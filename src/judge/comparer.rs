//! Output comparison for judged test cases

/// How an actual output is matched against the expected output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputComparator {
    /// Byte equality, insensitive to CRLF line endings.
    Exact,
    /// Line-by-line, token-by-token comparison where tokens that parse as
    /// floating point numbers match within the given tolerance (applied as
    /// both relative and absolute, like the judges do).
    FloatTolerant { error: f64 },
}

impl OutputComparator {
    pub fn new(error: Option<f64>) -> Self {
        match error {
            Some(error) => OutputComparator::FloatTolerant { error },
            None => OutputComparator::Exact,
        }
    }

    pub fn matches(&self, actual: &[u8], expected: &[u8]) -> bool {
        let actual = normalize_crlf(actual);
        let expected = normalize_crlf(expected);
        match self {
            OutputComparator::Exact => actual == expected,
            OutputComparator::FloatTolerant { error } => {
                lines_match(&actual, &expected, *error)
            }
        }
    }
}

fn normalize_crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\r' && data.get(i + 1) == Some(&b'\n') {
            i += 1;
            continue;
        }
        out.push(data[i]);
        i += 1;
    }
    out
}

fn lines_match(actual: &[u8], expected: &[u8], error: f64) -> bool {
    let strip = |data: &[u8]| -> Vec<Vec<u8>> {
        let mut data = data.to_vec();
        while data.last() == Some(&b'\n') {
            data.pop();
        }
        data.split(|&b| b == b'\n').map(|l| l.to_vec()).collect()
    };

    let actual_lines = strip(actual);
    let expected_lines = strip(expected);
    if actual_lines.len() != expected_lines.len() {
        return false;
    }
    actual_lines
        .iter()
        .zip(&expected_lines)
        .all(|(a, e)| words_match(a, e, error))
}

fn words_match(actual: &[u8], expected: &[u8], error: f64) -> bool {
    let words = |data: &[u8]| -> Vec<Vec<u8>> {
        data.split(|b| b.is_ascii_whitespace())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_vec())
            .collect()
    };

    let actual_words = words(actual);
    let expected_words = words(expected);
    if actual_words.len() != expected_words.len() {
        return false;
    }
    actual_words
        .iter()
        .zip(&expected_words)
        .all(|(a, e)| word_matches(a, e, error))
}

fn word_matches(actual: &[u8], expected: &[u8], error: f64) -> bool {
    let parse = |w: &[u8]| std::str::from_utf8(w).ok().and_then(|s| s.parse::<f64>().ok());
    match (parse(actual), parse(expected)) {
        (Some(x), Some(y)) => is_close(x, y, error, error),
        _ => actual == expected,
    }
}

fn is_close(a: f64, b: f64, rel_tol: f64, abs_tol: f64) -> bool {
    (a - b).abs() <= f64::max(rel_tol * f64::max(a.abs(), b.abs()), abs_tol)
}
