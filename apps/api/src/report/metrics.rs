//! Static advance-width tables for the two standard PDF fonts the report uses.
//!
//! Widths are the Adobe Core 14 AFM values in 1/1000 em. Tables cover ASCII 0x20..=0x7E;
//! index = (char as usize) - 32. Accented Latin letters take the width of their base
//! letter, which matches the AFM data for every letter the intake forms produce.

use unicode_normalization::UnicodeNormalization;

use crate::report::document::Weight;

/// Millimetres per PostScript point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Width used for characters with no table entry and no ASCII base letter.
const FALLBACK_WIDTH: u16 = 556;

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0    1    2    3    4    5    6    7    8    9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // :    ;    <    =    >    ?    @
    278, 278, 584, 584, 584, 556, 1015,
    // A    B    C    D    E    F    G    H    I    J    K    L    M
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [    \    ]    ^    _    `
    278, 278, 278, 469, 556, 333,
    // a    b    c    d    e    f    g    h    i    j    k    l    m
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    // n    o    p    q    r    s    t    u    v    w    x    y    z
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // {    |    }    ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0    1    2    3    4    5    6    7    8    9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // :    ;    <    =    >    ?    @
    333, 333, 584, 584, 584, 611, 975,
    // A    B    C    D    E    F    G    H    I    J    K    L    M
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [    \    ]    ^    _    `
    333, 278, 333, 584, 556, 333,
    // a    b    c    d    e    f    g    h    i    j    k    l    m
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    // n    o    p    q    r    s    t    u    v    w    x    y    z
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    // {    |    }    ~
    389, 280, 389, 584,
];

fn table(weight: Weight) -> &'static [u16; 95] {
    match weight {
        Weight::Regular => &HELVETICA,
        Weight::Bold => &HELVETICA_BOLD,
    }
}

fn ascii_width(c: char, weight: Weight) -> Option<u16> {
    let code = c as usize;
    (32..=126).contains(&code).then(|| table(weight)[code - 32])
}

/// Advance width of one character in 1/1000 em.
pub fn char_width(c: char, weight: Weight) -> u16 {
    if let Some(w) = ascii_width(c, weight) {
        return w;
    }
    match c {
        '€' => 556,
        '•' => 350,
        'º' => 365,
        'ª' => 370,
        '¿' => 611,
        '¡' => 333,
        '\u{00A0}' => 278,
        _ => c
            .nfd()
            .next()
            .and_then(|base| ascii_width(base, weight))
            .unwrap_or(FALLBACK_WIDTH),
    }
}

/// Rendered width of `text` in millimetres at `size_pt`.
pub fn measure(text: &str, weight: Weight, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, weight))).sum();
    units as f32 / 1000.0 * size_pt * MM_PER_PT
}

// ────────────────────────────────────────────────────────────────────────────
// Line wrapping
// ────────────────────────────────────────────────────────────────────────────

/// Greedy word wrap to `max_width` millimetres.
///
/// Explicit `\n` always breaks; an empty paragraph yields an empty line. Words wider than
/// `max_width` are split between characters, never producing an empty line.
pub fn wrap_text(text: &str, weight: Weight, size_pt: f32, max_width: f32) -> Vec<String> {
    let space = measure(" ", weight, size_pt);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in paragraph.split_whitespace() {
            let word_width = measure(word, weight, size_pt);

            if current.is_empty() && word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
            } else if !current.is_empty() && current_width + space + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
            } else if word_width <= max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_width;
            } else {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = split_long_word(word, weight, size_pt, max_width);
                // The tail stays open so following words can join it.
                current = pieces.pop().unwrap_or_default();
                current_width = measure(&current, weight, size_pt);
                lines.extend(pieces);
            }
        }
        lines.push(current);
    }
    lines
}

fn split_long_word(word: &str, weight: Weight, size_pt: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0_f32;
    for c in word.chars() {
        let w = f32::from(char_width(c, weight)) / 1000.0 * size_pt * MM_PER_PT;
        if !piece.is_empty() && width + w > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}
