//! Measured glyph widths of the Gen 4 dialogue font and the template file naming scheme.

/// Advance used for glyphs missing from the width table and for unknown glyph regions.
pub const DEFAULT_WIDTH: u32 = 5;
/// Rows of a normal text line at native resolution.
pub const CHAR_HEIGHT: u32 = 15;

#[rustfmt::skip]
const WIDTHS: &[(char, u32)] = &[
    ('a', 5), ('b', 5), ('c', 5), ('d', 5), ('e', 5), ('f', 4), ('g', 5), ('h', 5),
    ('i', 3), ('j', 4), ('k', 5), ('l', 3), ('m', 7), ('n', 5), ('o', 6), ('p', 5),
    ('q', 5), ('r', 4), ('s', 5), ('t', 4), ('u', 5), ('v', 5), ('w', 7), ('x', 5),
    ('y', 5), ('z', 5),
    ('A', 6), ('B', 6), ('C', 6), ('D', 6), ('E', 5), ('F', 5), ('G', 6), ('H', 6),
    ('I', 4), ('J', 5), ('K', 6), ('L', 5), ('M', 7), ('N', 6), ('O', 6), ('P', 5),
    ('Q', 6), ('R', 6), ('S', 5), ('T', 6), ('U', 6), ('V', 6), ('W', 7), ('X', 6),
    ('Y', 6), ('Z', 5),
    ('0', 5), ('1', 4), ('2', 5), ('3', 5), ('4', 5), ('5', 5), ('6', 5), ('7', 5),
    ('8', 5), ('9', 5),
    (' ', 4), ('.', 3), (',', 3), ('!', 3), ('?', 5), ('\'', 3), ('"', 5), (':', 3),
    (';', 3), ('-', 4), ('/', 4), ('(', 4), (')', 4), ('&', 6), ('#', 6), ('%', 6),
    ('+', 5), ('*', 5), ('=', 5), ('@', 7),
    ('à', 5), ('è', 5), ('é', 5), ('ì', 3), ('ò', 6), ('ù', 5),
    ('À', 6), ('È', 5), ('É', 5), ('Ì', 4), ('Ò', 6), ('Ù', 6),
    ('♀', 6), ('♂', 6), ('×', 5), ('…', 7), ('·', 3), ('«', 6),
];

const NAMED_GLYPHS: &[(&str, char)] = &[
    ("space", ' '),
    ("period", '.'),
    ("comma", ','),
    ("exclaim", '!'),
    ("question", '?'),
    ("apostrophe", '\''),
    ("apostrophe_open", '\u{2018}'),
    ("quote", '"'),
    ("quote_close", '\u{201D}'),
    ("colon", ':'),
    ("semicolon", ';'),
    ("hyphen", '-'),
    ("slash", '/'),
    ("lparen", '('),
    ("rparen", ')'),
    ("plus", '+'),
    ("equals", '='),
    ("asterisk", '*'),
    ("percent", '%'),
    ("hash", '#'),
    ("at", '@'),
    ("tilde", '~'),
    ("tilde_inverted", '~'),
    ("ellipsis", '…'),
    ("middot", '·'),
    ("a_grave", 'à'),
    ("e_grave", 'è'),
    ("e_acute", 'é'),
    ("i_grave", 'ì'),
    ("o_grave", 'ò'),
    ("u_grave", 'ù'),
    ("upper_A_grave", 'À'),
    ("upper_E_grave", 'È'),
    ("upper_E_acute", 'É'),
    ("upper_I_grave", 'Ì'),
    ("upper_O_grave", 'Ò'),
    ("upper_U_grave", 'Ù'),
    ("female", '♀'),
    ("male", '♂'),
    ("musical_note", '♪'),
    ("sun", '☀'),
    ("cloud", '☁'),
    ("umbrella", '☂'),
    ("snowman", '☃'),
    ("arrow_up", '↑'),
    ("arrow_down", '↓'),
    ("triangle", '△'),
    ("circle_dot", '◉'),
    ("square", '□'),
    ("rhombus", '◇'),
    ("heart", '♥'),
    ("diamond", '♦'),
    ("spade", '♠'),
    ("clover", '♣'),
    ("star", '★'),
    ("smiley", '☺'),
    ("grinning_face", '😀'),
    ("astonished_face", '😮'),
    ("angry_face", '😠'),
    ("sleeping_zz", '💤'),
];

/// Declared advance of a glyph in native pixels.
pub fn glyph_width(glyph: char) -> u32 {
    WIDTHS
        .iter()
        .find(|(c, _)| *c == glyph)
        .map(|(_, w)| *w)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Maps a template file stem to the glyph it depicts: `upper_A` is `A`,
/// `period` is `.`, and any single-character stem is that character.
pub fn glyph_for_stem(stem: &str) -> Option<char> {
    if let Some((_, glyph)) = NAMED_GLYPHS.iter().find(|(name, _)| *name == stem) {
        return Some(*glyph);
    }
    let name = stem.strip_prefix("upper_").unwrap_or(stem);
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(glyph), None) => Some(glyph),
        _ => None,
    }
}

/// Stem of a stretched variant: `upper_A_big` belongs to `upper_A`.
pub fn stretched_base_stem(stem: &str) -> Option<&str> {
    stem.strip_suffix("_big")
}
