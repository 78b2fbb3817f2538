//! Answer normalization
//!
//! Turns a free-text answer into a canonical, lowercase token string so that
//! "L'Éléphant", "l elephant" and "ELEPHANT" all compare equal. `normalize` is
//! pure and total: any input, including the empty string, yields a string.

/// Leading articles and contractions removed once from the start of an answer.
/// Apostrophes are spaces by then, so the elided "L'" and "D'" read "L " and
/// "D ". Longer forms come first so "DE LA " wins over "DE ".
const SPECIFIERS: &[&str] = &[
    "DE LA ", "DE L ", "LES ", "LE ", "LA ", "L ", "UNE ", "UN ", "DES ", "DU ", "DE ", "D ",
    "AUX ", "AU ", "EN ", "THE ",
];

/// Normalize an answer for comparison.
///
/// Stages, in order:
/// 1. trim surrounding whitespace and commas, uppercase
/// 2. fold accents and ligatures to ASCII, `&` becomes `ET`
/// 3. dashes, apostrophes and punctuation become spaces (a period or comma
///    between two digits is kept)
/// 4. collapse whitespace; a purely numeric answer loses its inner spaces ("1 000" -> "1000")
/// 5. strip at most one leading specifier ("LE ", "L'", "THE ", ...), unless
///    another one follows it
/// 6. convert French number words to digits ("VINGT ET UN" -> "21", "2 MILLE" -> "2000")
/// 7. collapse whitespace again, re-collapse a purely numeric result, lowercase
pub fn normalize(text: &str) -> String {
    let upper = text
        .trim_matches(|c: char| c.is_whitespace() || c == ',')
        .to_uppercase();

    let folded = fold_accents(&upper);
    let spaced = split_separators(&folded);

    let mut canonical = collapse_whitespace(&spaced);
    if let Some(numeral) = collapse_numeral(&canonical) {
        canonical = numeral;
    }

    let converted = convert_number_words(strip_specifier(&canonical));

    let mut out = collapse_whitespace(&converted);
    if let Some(numeral) = collapse_numeral(&out) {
        out = numeral;
    }
    out.to_lowercase()
}

fn fold_accents(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => out.push('A'),
            'Ç' => out.push('C'),
            'È' | 'É' | 'Ê' | 'Ë' => out.push('E'),
            'Ì' | 'Í' | 'Î' | 'Ï' => out.push('I'),
            'Ñ' => out.push('N'),
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => out.push('O'),
            'Ù' | 'Ú' | 'Û' | 'Ü' => out.push('U'),
            'Ý' | 'Ÿ' => out.push('Y'),
            'Œ' => out.push_str("OE"),
            'Æ' => out.push_str("AE"),
            '&' => out.push_str(" ET "),
            '\u{2019}' | '\u{2018}' | '`' | '\u{b4}' => out.push('\''),
            _ => out.push(c),
        }
    }
    out
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}')
}

fn is_punctuation(c: char) -> bool {
    matches!(
        c,
        '\'' | '?' | '!' | ';' | ':' | '"' | '«' | '»' | '\u{201C}' | '\u{201D}' | '(' | ')'
            | '[' | ']' | '/' | '\u{2026}' | '\u{BF}' | '\u{A1}'
    )
}

fn split_separators(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if is_dash(c) || is_punctuation(c) {
            out.push(' ');
        } else if c == '.' || c == ',' {
            let between_digits = i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(char::is_ascii_digit);
            out.push(if between_digits { c } else { ' ' });
        } else {
            out.push(c);
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the answer without inner whitespace if what remains is a plain
/// canonical numeral (digits only, no leading zero).
fn collapse_numeral(text: &str) -> Option<String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() || !compact.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: u64 = compact.parse().ok()?;
    (value.to_string() == compact).then_some(compact)
}

/// The text after one leading specifier, if there is something left
fn after_specifier(text: &str) -> Option<&str> {
    SPECIFIERS.iter().find_map(|specifier| {
        let rest = text.strip_prefix(specifier)?.trim_start();
        (!rest.is_empty()).then_some(rest)
    })
}

/// Strip one leading specifier. Stacked articles ("LE LA ...") are left alone
/// so that a second pass never finds a new one to strip. "UN"/"UNE" do not
/// count as stacked since they turn into digits.
fn strip_specifier(text: &str) -> &str {
    match after_specifier(text) {
        Some(rest) if !starts_with_article(rest) => rest,
        _ => text,
    }
}

fn starts_with_article(text: &str) -> bool {
    let first = text.split(' ').next().unwrap_or_default();
    first != "UN" && first != "UNE" && after_specifier(text).is_some()
}

fn number_word(word: &str) -> Option<u64> {
    let value = match word {
        "ZERO" => 0,
        "UN" | "UNE" => 1,
        "DEUX" => 2,
        "TROIS" => 3,
        "QUATRE" => 4,
        "CINQ" => 5,
        "SIX" => 6,
        "SEPT" => 7,
        "HUIT" => 8,
        "NEUF" => 9,
        "DIX" => 10,
        "ONZE" => 11,
        "DOUZE" => 12,
        "TREIZE" => 13,
        "QUATORZE" => 14,
        "QUINZE" => 15,
        "SEIZE" => 16,
        "VINGT" | "VINGTS" => 20,
        "TRENTE" => 30,
        "QUARANTE" => 40,
        "CINQUANTE" => 50,
        "SOIXANTE" => 60,
        "SEPTANTE" => 70,
        "HUITANTE" | "OCTANTE" => 80,
        "NONANTE" => 90,
        "CENT" | "CENTS" => 100,
        "MILLE" => 1000,
        _ => return None,
    };
    Some(value)
}

/// A French numeral being read word by word ("DEUX MILLE VINGT QUATRE").
#[derive(Debug, Clone, Default)]
struct Numeral {
    thousands: u64,
    current: u64,
    zero: bool,
}

impl Numeral {
    /// Extend the numeral with the next word's value, or return false when the
    /// word cannot continue it (it then starts a new numeral).
    fn push(&mut self, value: u64) -> bool {
        if self.zero {
            return false;
        }
        let low = self.current % 100;
        match value {
            0 => {
                if self.is_empty() {
                    self.zero = true;
                    true
                } else {
                    false
                }
            }
            1000 => {
                if self.thousands > 0 {
                    return false;
                }
                self.thousands = self.current.max(1) * 1000;
                self.current = 0;
                true
            }
            // DEUX CENTS, DIX NEUF CENT
            100 => {
                if self.current >= 100 || (self.current >= 10 && self.thousands > 0) {
                    return false;
                }
                self.current = self.current.max(1) * 100;
                true
            }
            // QUATRE VINGT
            20 if low == 4 => {
                self.current += 76;
                true
            }
            v if low == 0 => {
                self.current += v;
                true
            }
            // DIX SEPT .. DIX NEUF
            v if low == 10 && (7..10).contains(&v) => {
                self.current += v;
                true
            }
            // SOIXANTE DIX, QUATRE VINGT ONZE
            v if (low == 60 || low == 80) && v < 20 => {
                self.current += v;
                true
            }
            v if low >= 20 && low % 10 == 0 && v < 10 => {
                self.current += v;
                true
            }
            _ => false,
        }
    }

    /// This numeral continued by a digit token, if `multiplier` may follow it
    /// ("2 MILLE 5 CENTS")
    fn with_digits(mut self, value: u64, multiplier: u64) -> Option<Self> {
        if self.zero || self.current != 0 || !(1..1000).contains(&value) {
            return None;
        }
        self.current = value;
        self.clone().push(multiplier).then_some(self)
    }

    fn is_empty(&self) -> bool {
        !self.zero && self.thousands == 0 && self.current == 0
    }

    /// Whether "ET" may join this numeral to a following UN/ONZE.
    fn takes_et(&self) -> bool {
        let low = self.current % 100;
        low >= 20 && low % 10 == 0
    }

    fn value(&self) -> u64 {
        self.thousands + self.current
    }
}

/// A canonical digit token followed by CENT or MILLE ("2 MILLE", "3 CENTS")
fn digits_before_multiplier(word: &str, next: Option<&str>) -> Option<(u64, u64)> {
    let value: u64 = word.parse().ok()?;
    if value.to_string() != word {
        return None;
    }
    let multiplier = next.and_then(number_word).filter(|v| *v == 100 || *v == 1000)?;
    Some((value, multiplier))
}

fn convert_number_words(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    let mut numeral: Option<Numeral> = None;

    for (i, word) in words.iter().enumerate() {
        if let Some((value, multiplier)) = digits_before_multiplier(word, words.get(i + 1).copied())
        {
            let continued = numeral
                .clone()
                .and_then(|n| n.with_digits(value, multiplier));
            if let Some(continued) = continued {
                numeral = Some(continued);
                continue;
            }
            if let Some(fresh) = Numeral::default().with_digits(value, multiplier) {
                if let Some(done) = numeral.replace(fresh) {
                    out.push(done.value().to_string());
                }
                continue;
            }
        }

        if let Some(value) = number_word(word) {
            let extended = numeral.as_mut().is_some_and(|n| n.push(value));
            if !extended {
                if let Some(done) = numeral.take() {
                    out.push(done.value().to_string());
                }
                let mut fresh = Numeral::default();
                fresh.push(value);
                numeral = Some(fresh);
            }
            continue;
        }

        if *word == "ET" {
            let joins_next = words
                .get(i + 1)
                .and_then(|next| number_word(next))
                .is_some_and(|v| v == 1 || v == 11);
            if joins_next && numeral.as_ref().is_some_and(Numeral::takes_et) {
                continue;
            }
        }

        if let Some(done) = numeral.take() {
            out.push(done.value().to_string());
        }
        out.push((*word).to_string());
    }

    if let Some(done) = numeral {
        out.push(done.value().to_string());
    }
    out.join(" ")
}
