// ABOUTME: Pinyin transliteration for Mandarin vocabulary text
// ABOUTME: Converts Han characters to tone-marked syllables, preserving other text

use pinyin::ToPinyin;

/// Transliterate a Mandarin string into tone-marked pinyin.
///
/// Each Han character becomes one space-separated syllable. Characters with
/// no pinyin reading (Latin letters, digits, punctuation) are kept verbatim,
/// with adjacent ones grouped into a single token. Whitespace in the input
/// only separates tokens, it is never doubled in the output.
pub fn transliterate(text: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut run = String::new();

    for (ch, reading) in text.chars().zip(text.to_pinyin()) {
        match reading {
            Some(p) => {
                flush_run(&mut tokens, &mut run);
                tokens.push(p.with_tone().to_string());
            }
            None if ch.is_whitespace() => flush_run(&mut tokens, &mut run),
            None => run.push(ch),
        }
    }
    flush_run(&mut tokens, &mut run);

    tokens.join(" ")
}

fn flush_run(tokens: &mut Vec<String>, run: &mut String) {
    if !run.is_empty() {
        tokens.push(std::mem::take(run));
    }
}
