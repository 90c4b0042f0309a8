use crate::model::{PageContent, Readability};

/// Vowel-group count with a silent trailing `e`; never below 1.
pub fn syllables(word: &str) -> usize {
    let w: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if w.is_empty() {
        return 0;
    }
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut count = 0;
    let mut prev_vowel = false;
    for &c in &w {
        let v = is_vowel(c);
        if v && !prev_vowel {
            count += 1;
        }
        prev_vowel = v;
    }
    let n = w.len();
    if n > 2 && w[n - 1] == 'e' && !is_vowel(w[n - 2]) && !(w[n - 2] == 'l' && !is_vowel(w[n - 3])) {
        count -= 1;
    }
    count.max(1)
}

/// Site-wide readability from aggregate counts.
pub fn readability(pages: &[PageContent]) -> Readability {
    let words: usize = pages.iter().map(|p| p.word_count).sum();
    let sentences: usize = pages.iter().map(|p| p.sentence_count).sum();
    let syllable_total: usize = pages.iter().map(|p| p.syllable_count).sum();
    let paragraphs: usize = pages.iter().map(|p| p.paragraph_count).sum();

    let ratio = |a: usize, b: usize| if b == 0 { 0.0 } else { a as f64 / b as f64 };
    let wps = ratio(words, sentences);
    let spw = ratio(syllable_total, words);
    let measurable = words > 0 && sentences > 0;

    Readability {
        flesch_kincaid_grade: measurable.then(|| 0.39 * wps + 11.8 * spw - 15.59),
        flesch_reading_ease: measurable.then(|| 206.835 - 1.015 * wps - 84.6 * spw),
        average_words_per_sentence: wps,
        average_syllables_per_word: spw,
        average_words_per_page: ratio(words, pages.len()),
        average_sentences_per_paragraph: ratio(sentences, paragraphs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllable_heuristic() {
        assert_eq!(syllables("cat"), 1);
        assert_eq!(syllables("make"), 1);
        assert_eq!(syllables("table"), 2);
        assert_eq!(syllables("readability"), 5);
        assert_eq!(syllables("the"), 1);
        assert_eq!(syllables("42"), 0);
    }

    #[test]
    fn grade_from_counts() {
        let page = PageContent {
            word_count: 100,
            sentence_count: 10,
            syllable_count: 150,
            paragraph_count: 5,
            ..Default::default()
        };
        let r = readability(&[page]);
        let grade = r.flesch_kincaid_grade.unwrap();
        assert!((grade - (0.39 * 10.0 + 11.8 * 1.5 - 15.59)).abs() < 1e-9);
        assert_eq!(r.average_sentences_per_paragraph, 2.0);
        assert_eq!(r.average_words_per_page, 100.0);
    }

    #[test]
    fn empty_site_has_no_grade() {
        let r = readability(&[]);
        assert!(r.flesch_kincaid_grade.is_none());
        assert_eq!(r.average_words_per_page, 0.0);
    }
}
