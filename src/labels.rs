//! Mapping between classifier class indices and the recognized symbols.
//!
//! The mapping is total and contiguous: classes `0..=25` are the letters `A`-`Z`, classes
//! `26..=35` are the digits `0`-`9`. It is built once and never mutated.

use once_cell::sync::Lazy;

/// Number of recognized symbol classes.
pub const NUM_CLASSES: usize = 36;

static SYMBOLS: Lazy<[char; NUM_CLASSES]> = Lazy::new(|| {
    let mut table = ['\0'; NUM_CLASSES];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = if i < 26 {
            (b'A' + i as u8) as char
        } else {
            (b'0' + (i - 26) as u8) as char
        };
    }
    table
});

/// Returns the symbol for a class index, or `None` if the index is out of range.
pub fn symbol(class: u8) -> Option<char> {
    SYMBOLS.get(usize::from(class)).copied()
}

/// Returns the class index for a symbol, or `None` if the symbol is not recognized.
///
/// Only uppercase letters and digits are mapped; lowercase input is not normalized here.
pub fn class_of(symbol: char) -> Option<u8> {
    match symbol {
        'A'..='Z' => Some(symbol as u8 - b'A'),
        '0'..='9' => Some(symbol as u8 - b'0' + 26),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijection() {
        for class in 0..NUM_CLASSES as u8 {
            let sym = symbol(class).unwrap();
            assert_eq!(class_of(sym), Some(class));
        }
        assert_eq!(symbol(NUM_CLASSES as u8), None);
    }

    #[test]
    fn endpoints() {
        assert_eq!(symbol(0), Some('A'));
        assert_eq!(symbol(25), Some('Z'));
        assert_eq!(symbol(26), Some('0'));
        assert_eq!(symbol(35), Some('9'));
    }

    #[test]
    fn unmapped_symbols() {
        assert_eq!(class_of('a'), None);
        assert_eq!(class_of('?'), None);
    }
}
