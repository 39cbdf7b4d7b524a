use crate::music::natural_pitch_class;

/// Classification of the lexeme starting at a position in an ABC body line.
///
/// Variants carrying `end` are consumed whole by the caller (`end` is the
/// index just past the lexeme). The others are opened here and consumed by
/// their own handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lexeme {
    Space,                              // whitespace, `\`, `$`, backtick
    BarLine { end: usize },             // |  ||  |]  [|  :|  |:  ::  |1  [2
    Decoration { end: usize },          // ~ . H..v  !trill!  +fermata+  "Am"
    InlineField { end: usize },         // [K:G]  [V:2]
    ChordOpen,                          // [
    TupletOpen,                         // (3
    GraceOpen,                          // {
    SlurOpen,                           // (
    SlurClose,                          // )
    Rest { whole_measure: bool },       // z x  /  Z X
    Note,                               // optional ^ _ = prefix, then A-G a-g
    Unknown,
}

/// Single-character decorations and spacers that carry no timing.
const DECORATION_CHARS: &[char] = &[
    '~', '.', 'H', 'L', 'M', 'O', 'P', 'S', 'T', 'u', 'v', 'y', '-', '>', '<',
];

/// Classify the lexeme at `i`. `i` must be in bounds.
pub fn classify(chars: &[char], i: usize) -> Lexeme {
    let c = chars[i];
    let next = chars.get(i + 1).copied();

    match c {
        ' ' | '\t' | '\r' | '`' | '\\' | '$' => Lexeme::Space,
        '|' | ':' => Lexeme::BarLine {
            end: scan_bar(chars, i),
        },
        '[' => match next {
            Some('|') => Lexeme::BarLine {
                end: scan_bar(chars, i + 1),
            },
            Some(d) if d.is_ascii_digit() => Lexeme::BarLine {
                end: scan_volta(chars, i + 1),
            },
            Some(l) if l.is_ascii_alphabetic() && chars.get(i + 2) == Some(&':') => {
                Lexeme::InlineField {
                    end: find_closing(chars, i, ']').map_or(chars.len(), |e| e + 1),
                }
            }
            _ => Lexeme::ChordOpen,
        },
        '(' => match next {
            Some(d) if d.is_ascii_digit() => Lexeme::TupletOpen,
            _ => Lexeme::SlurOpen,
        },
        ')' => Lexeme::SlurClose,
        '{' => Lexeme::GraceOpen,
        'z' | 'x' => Lexeme::Rest {
            whole_measure: false,
        },
        'Z' | 'X' => Lexeme::Rest {
            whole_measure: true,
        },
        '!' | '+' => Lexeme::Decoration {
            end: find_closing(chars, i, c).map_or(i + 1, |e| e + 1),
        },
        // An unterminated annotation swallows the rest of the line
        '"' => Lexeme::Decoration {
            end: find_closing(chars, i, '"').map_or(chars.len(), |e| e + 1),
        },
        '^' | '_' | '=' => {
            let mut j = i;
            while j < chars.len() && matches!(chars[j], '^' | '_' | '=') {
                j += 1;
            }
            match chars.get(j) {
                Some(&l) if natural_pitch_class(l).is_some() => Lexeme::Note,
                _ => Lexeme::Unknown,
            }
        }
        c if natural_pitch_class(c).is_some() => Lexeme::Note,
        c if DECORATION_CHARS.contains(&c) => Lexeme::Decoration { end: i + 1 },
        _ => Lexeme::Unknown,
    }
}

/// Index of the first `close` after `open_idx`.
pub fn find_closing(chars: &[char], open_idx: usize, close: char) -> Option<usize> {
    chars
        .iter()
        .skip(open_idx + 1)
        .position(|&c| c == close)
        .map(|offset| open_idx + 1 + offset)
}

fn scan_bar(chars: &[char], start: usize) -> usize {
    let mut j = start;
    while j < chars.len() {
        match chars[j] {
            '|' | ':' => j += 1,
            ']' if j > start && chars[j - 1] == '|' => j += 1,
            _ => break,
        }
    }
    scan_volta(chars, j)
}

// Volta numbers such as `1`, `1,3` or `1-2` directly after a bar
fn scan_volta(chars: &[char], start: usize) -> usize {
    let mut j = start;
    while j < chars.len() {
        let c = chars[j];
        let digit_follows = chars.get(j + 1).is_some_and(|n| n.is_ascii_digit());
        if c.is_ascii_digit() || ((c == ',' || c == '-') && digit_follows) {
            j += 1;
        } else {
            break;
        }
    }
    j
}
