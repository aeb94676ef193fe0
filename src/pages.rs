//! Page counts from free-text `format` descriptions such as `"42 pages"` or
//! `"twenty-one pages : ill. ; 58 cm."`.

use std::sync::OnceLock;

use regex::Regex;

fn pages_regex() -> &'static Regex {
    static PAGES: OnceLock<Regex> = OnceLock::new();
    PAGES.get_or_init(|| Regex::new(r"(?i)(\d+|[\w\s-]+)\s*pages").expect("valid pages regex"))
}

/// Maps a single number word to its value.
fn word_value(word: &str) -> Option<u64> {
    let value = match word {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        "hundred" => 100,
        "thousand" => 1000,
        _ => return None,
    };
    Some(value)
}

/// Finds the phrase in front of the word "pages" and turns it into a page count.
///
/// Returns `None` when the description doesn't mention pages at all. `Some(0)` means the
/// phrase was found but contained no number we understand.
pub fn extract_number_of_pages(format: &str) -> Option<u64> {
    let caps = pages_regex().captures(format)?;
    let number_text = caps.get(1)?.as_str();
    Some(parse_textual_numbers(number_text))
}

/// Sums up the numbers spelled out in `text`.
///
/// Values of 100 and above multiply the running number ("three hundred" = 300), smaller
/// ones are added to it ("twenty one" = 21). Any other word closes the running number and
/// adds it to the total, so "one hundred and five" is 100 + 5. Digit runs count as
/// literal numbers.
pub fn parse_textual_numbers(text: &str) -> u64 {
    let text = text.to_lowercase().replace('-', " ");

    let mut total: u64 = 0;
    let mut current: u64 = 0;
    for word in text.split_whitespace() {
        if let Some(number) = word_value(word) {
            if number >= 100 {
                current = current.saturating_mul(number);
            } else {
                current = current.saturating_add(number);
            }
        } else if let Ok(number) = word.parse::<u64>() {
            current = current.saturating_add(number);
        } else {
            total = total.saturating_add(current);
            current = 0;
        }
    }

    total.saturating_add(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_before_pages() {
        assert_eq!(extract_number_of_pages("42 pages"), Some(42));
        assert_eq!(extract_number_of_pages("8 PAGES : ill. ; 58 cm."), Some(8));
        assert_eq!(extract_number_of_pages("1 v. (12pages)"), Some(12));
    }

    #[test]
    fn digits_inside_longer_phrase() {
        assert_eq!(extract_number_of_pages("Item consists of 16 pages"), Some(16));
    }

    #[test]
    fn spelled_out_numbers() {
        assert_eq!(extract_number_of_pages("twelve pages"), Some(12));
        assert_eq!(extract_number_of_pages("twenty one pages"), Some(21));
        assert_eq!(extract_number_of_pages("Twenty-One Pages"), Some(21));
        assert_eq!(extract_number_of_pages("three hundred pages"), Some(300));
        assert_eq!(extract_number_of_pages("three hundred twenty one pages"), Some(321));
    }

    #[test]
    fn and_splits_number_phrases() {
        assert_eq!(extract_number_of_pages("one hundred and five pages"), Some(105));
    }

    #[test]
    fn no_pages_is_none() {
        assert_eq!(extract_number_of_pages(""), None);
        assert_eq!(extract_number_of_pages("1 sheet ; 58 cm."), None);
        assert_eq!(extract_number_of_pages("Text"), None);
    }

    #[test]
    fn unknown_words_yield_zero_not_none() {
        assert_eq!(extract_number_of_pages("several pages"), Some(0));
    }

    #[test]
    fn textual_parser_edge_cases() {
        assert_eq!(parse_textual_numbers(""), 0);
        assert_eq!(parse_textual_numbers("and"), 0);
        // Multiplier with nothing accumulated stays at zero.
        assert_eq!(parse_textual_numbers("hundred"), 0);
        assert_eq!(parse_textual_numbers("two thousand"), 2000);
        assert_eq!(parse_textual_numbers("five, six"), 6);
    }
}
