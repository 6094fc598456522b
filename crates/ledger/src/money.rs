//! Currency rendering.

/// Group separator and currency-sign spacer used by the ru-RU locale.
const NBSP: char = '\u{00A0}';

/// Render a whole-ruble amount the way the ru-RU locale does, with no
/// fractional digits: `1000` becomes `"1 000 ₽"` (non-breaking spaces).
pub fn format_balance(amount: u64) -> String {
    let digits = amount.to_string();
    let len = digits.len();

    let mut out = String::with_capacity(len + len / 3 + 4);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(NBSP);
        }
        out.push(ch);
    }
    out.push(NBSP);
    out.push('₽');
    out
}
