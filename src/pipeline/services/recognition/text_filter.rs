//! Heuristics that reject recognition artefacts from transitions and menus.

const GARBAGE_SYMBOLS: &str = "☃☀☁☂♣♦♥♠□△◇↓";
const MENU_PATTERNS: [&str; 4] = ["WINDOW TYPE", "TEXT SPEED", "BATTLE SCENE", "BATTLE STYLE"];
const POCKET_ICON: char = '■';

/// True for text that is very unlikely to be real dialogue.
pub fn is_garbage_text(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    let alnum = text.chars().filter(|c| c.is_alphanumeric()).count();
    let compact: String = text.chars().filter(|c| *c != ' ').collect();

    // An ellipsis on its own is valid dialogue, shorter dot runs are noise.
    if !compact.is_empty() && compact.chars().all(|c| c == '.') {
        return compact.chars().count() < 3;
    }

    if text.chars().any(|c| GARBAGE_SYMBOLS.contains(c)) {
        return true;
    }
    if text.chars().any(|c| u32::from(c) > 0xFFFF) {
        return true;
    }

    let upper = text.to_uppercase();
    if MENU_PATTERNS.iter().any(|p| upper.contains(p)) {
        return true;
    }

    if text.contains(POCKET_ICON) {
        let rest: String = text.chars().filter(|c| *c != POCKET_ICON).collect();
        let rest = rest.trim();
        if rest.chars().count() <= 5 {
            let has_upper = rest.chars().any(char::is_uppercase);
            let has_word = rest
                .split_whitespace()
                .any(|w| w.chars().count() >= 3 && w.chars().all(char::is_alphabetic));
            if !has_upper && !has_word {
                return true;
            }
        }
    }

    if alnum <= 2 {
        let runs = alpha_runs(text);
        if runs.len() >= 2 && runs.iter().all(|r| *r < 2) {
            return true;
        }
    }

    if let Some(first) = compact.chars().next() {
        if !first.is_alphanumeric() && compact.chars().count() <= 8 && alnum <= 4 {
            return true;
        }
    }

    if !compact.is_empty() && compact.chars().count() <= 6 {
        let has_upper = text.chars().any(char::is_uppercase);
        let has_digit = text.chars().any(|c| c.is_ascii_digit());
        let has_punct = text.chars().any(|c| ".!?,".contains(c));
        let has_quote = text.chars().any(|c| "'\u{2018}\u{2019}".contains(c));
        if !has_upper && !has_digit && !has_punct && alnum <= 4 && has_quote {
            return true;
        }
    }

    if alnum == 1 {
        let stray = text
            .chars()
            .any(|c| !c.is_alphanumeric() && !" .!?,…".contains(c));
        if stray {
            return true;
        }
        let starts_alnum = text
            .trim()
            .chars()
            .next()
            .is_some_and(char::is_alphanumeric);
        if !starts_alnum && text.chars().count() > 3 {
            return true;
        }
    }

    if alnum == 0 {
        return true;
    }

    let visible = compact.chars().count();
    visible >= 10 && (alnum as f64) / (visible as f64) < 0.30
}

/// Lengths of consecutive alphabetic runs.
fn alpha_runs(text: &str) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut current = 0;
    for c in text.chars() {
        if c.is_alphabetic() {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }
    runs
}
