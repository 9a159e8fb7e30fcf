//! Pythagorean numerology reductions.
//!
//! The destiny number comes from the letters of the full name, the life-path
//! number from the birth date. Master numbers 11 and 22 are never reduced
//! further. Accented Portuguese letters fold to their base letter before
//! lookup.

use chrono::{Datelike, NaiveDate};

/// Pythagorean value of a latin letter (lowercase).
const fn letter_value(c: char) -> Option<u32> {
    match c {
        'a' | 'j' | 's' => Some(1),
        'b' | 'k' | 't' => Some(2),
        'c' | 'l' | 'u' => Some(3),
        'd' | 'm' | 'v' => Some(4),
        'e' | 'n' | 'w' => Some(5),
        'f' | 'o' | 'x' => Some(6),
        'g' | 'p' | 'y' => Some(7),
        'h' | 'q' | 'z' => Some(8),
        'i' | 'r' => Some(9),
        _ => None,
    }
}

/// Fold accented Portuguese letters to their base letter.
const fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        _ => c,
    }
}

fn digit_sum(mut n: u32) -> u32 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

/// Reduce to a single digit, stopping at the master numbers 11 and 22.
fn reduce(mut n: u32) -> u32 {
    while n > 9 && n != 11 && n != 22 {
        n = digit_sum(n);
    }
    n
}

/// Destiny number for a full name, or `None` if the name has no letters.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // reduce() never exceeds 22
pub fn destiny_number(full_name: &str) -> Option<u8> {
    let total: u32 = full_name
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .filter_map(letter_value)
        .sum();

    if total == 0 {
        None
    } else {
        Some(reduce(total) as u8)
    }
}

/// Life-path number for a birth date.
///
/// Day, month, and year reduce separately before the final reduction, so
/// master numbers in the components survive.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // reduce() never exceeds 22
pub fn life_path_number(date: NaiveDate) -> u8 {
    let day = reduce(date.day());
    let month = reduce(date.month());
    let year = reduce(date.year().unsigned_abs());
    reduce(day + month + year) as u8
}

/// One-line Portuguese meaning used inside prompts.
#[must_use]
pub const fn meaning_pt(number: u8) -> &'static str {
    match number {
        1 => "liderança e pioneirismo",
        2 => "cooperação e sensibilidade",
        3 => "criatividade e comunicação",
        4 => "estrutura e trabalho",
        5 => "liberdade e mudança",
        6 => "amor e responsabilidade",
        7 => "espiritualidade e sabedoria",
        8 => "poder material e conquista",
        9 => "compaixão e encerramento de ciclos",
        11 => "intuição elevada e inspiração",
        22 => "o construtor mestre",
        _ => "caminho em aberto",
    }
}
