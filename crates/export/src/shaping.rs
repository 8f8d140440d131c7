//! Arabic text prepared for a PDF content stream.
//!
//! PDF text operators draw glyphs left to right exactly as given, so Arabic
//! needs two passes before it is written: contextual joining (each letter
//! replaced by its isolated / final / initial / medial presentation form,
//! lam-alef as one ligature) and bidi reordering into visual order.

use unicode_bidi::BidiInfo;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Joins on both sides; four presentation forms.
    Dual,
    /// Joins only to the preceding letter; isolated and final forms.
    Right,
    /// Never joins (hamza).
    None,
    /// Joins both sides but keeps its own shape (tatweel).
    Causing,
}

const LAM: char = '\u{0644}';

/// Letter, isolated presentation form (Arabic Presentation Forms-B), joining
/// type. Final, initial and medial forms follow the isolated one.
const LETTERS: &[(char, u32, Joining)] = &[
    ('\u{0621}', 0xFE80, Joining::None),
    ('\u{0622}', 0xFE81, Joining::Right),
    ('\u{0623}', 0xFE83, Joining::Right),
    ('\u{0624}', 0xFE85, Joining::Right),
    ('\u{0625}', 0xFE87, Joining::Right),
    ('\u{0626}', 0xFE89, Joining::Dual),
    ('\u{0627}', 0xFE8D, Joining::Right),
    ('\u{0628}', 0xFE8F, Joining::Dual),
    ('\u{0629}', 0xFE93, Joining::Right),
    ('\u{062A}', 0xFE95, Joining::Dual),
    ('\u{062B}', 0xFE99, Joining::Dual),
    ('\u{062C}', 0xFE9D, Joining::Dual),
    ('\u{062D}', 0xFEA1, Joining::Dual),
    ('\u{062E}', 0xFEA5, Joining::Dual),
    ('\u{062F}', 0xFEA9, Joining::Right),
    ('\u{0630}', 0xFEAB, Joining::Right),
    ('\u{0631}', 0xFEAD, Joining::Right),
    ('\u{0632}', 0xFEAF, Joining::Right),
    ('\u{0633}', 0xFEB1, Joining::Dual),
    ('\u{0634}', 0xFEB5, Joining::Dual),
    ('\u{0635}', 0xFEB9, Joining::Dual),
    ('\u{0636}', 0xFEBD, Joining::Dual),
    ('\u{0637}', 0xFEC1, Joining::Dual),
    ('\u{0638}', 0xFEC5, Joining::Dual),
    ('\u{0639}', 0xFEC9, Joining::Dual),
    ('\u{063A}', 0xFECD, Joining::Dual),
    ('\u{0640}', 0x0640, Joining::Causing),
    ('\u{0641}', 0xFED1, Joining::Dual),
    ('\u{0642}', 0xFED5, Joining::Dual),
    ('\u{0643}', 0xFED9, Joining::Dual),
    ('\u{0644}', 0xFEDD, Joining::Dual),
    ('\u{0645}', 0xFEE1, Joining::Dual),
    ('\u{0646}', 0xFEE5, Joining::Dual),
    ('\u{0647}', 0xFEE9, Joining::Dual),
    ('\u{0648}', 0xFEED, Joining::Right),
    ('\u{0649}', 0xFEEF, Joining::Right),
    ('\u{064A}', 0xFEF1, Joining::Dual),
];

/// Alef variant following lam, and the isolated lam-alef ligature.
const LAM_ALEF: &[(char, u32)] = &[
    ('\u{0622}', 0xFEF5),
    ('\u{0623}', 0xFEF7),
    ('\u{0625}', 0xFEF9),
    ('\u{0627}', 0xFEFB),
];

fn letter(c: char) -> Option<(u32, Joining)> {
    LETTERS
        .iter()
        .find(|(l, _, _)| *l == c)
        .map(|&(_, form, joining)| (form, joining))
}

/// Harakat and other combining marks do not break a joined word.
fn is_transparent(c: char) -> bool {
    matches!(c, '\u{0610}'..='\u{061A}' | '\u{064B}'..='\u{065F}' | '\u{0670}')
}

fn joins_forward(c: char) -> bool {
    matches!(letter(c), Some((_, Joining::Dual | Joining::Causing)))
}

fn joins_backward(c: char) -> bool {
    matches!(letter(c), Some((_, Joining::Dual | Joining::Right | Joining::Causing)))
}

fn form(isolated: u32, offset: u32) -> char {
    char::from_u32(isolated + offset).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Replace Arabic letters with their contextual presentation forms, in
/// logical order. Everything else passes through.
pub(crate) fn shape(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let neighbour = |from: usize, step: isize| -> Option<char> {
        let mut i = from as isize + step;
        while i >= 0 && (i as usize) < chars.len() {
            let c = chars[i as usize];
            if !is_transparent(c) {
                return Some(c);
            }
            i += step;
        }
        None
    };

    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let Some((isolated, joining)) = letter(c) else {
            out.push(c);
            i += 1;
            continue;
        };

        let after_joiner = neighbour(i, -1).is_some_and(joins_forward);

        if c == LAM {
            if let Some(&(_, ligature)) = chars.get(i + 1).and_then(|next| LAM_ALEF.iter().find(|(a, _)| a == next)) {
                out.push(form(ligature, u32::from(after_joiner)));
                i += 2;
                continue;
            }
        }

        let shaped = match joining {
            Joining::None | Joining::Causing => c,
            Joining::Right => form(isolated, u32::from(after_joiner)),
            Joining::Dual => {
                let before_joiner = neighbour(i, 1).is_some_and(joins_backward);
                match (after_joiner, before_joiner) {
                    (false, false) => form(isolated, 0),
                    (true, false) => form(isolated, 1),
                    (false, true) => form(isolated, 2),
                    (true, true) => form(isolated, 3),
                }
            }
        };
        out.push(shaped);
        i += 1;
    }
    out
}

/// Shaped text in left-to-right drawing order.
pub(crate) fn visual(text: &str) -> String {
    let shaped = shape(text);
    let bidi = BidiInfo::new(&shaped, None);
    bidi.paragraphs
        .iter()
        .map(|para| bidi.reorder_line(para, para.range.clone()))
        .collect()
}
