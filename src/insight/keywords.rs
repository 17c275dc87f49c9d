use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::storage::models::WordCount;

pub const DEFAULT_TOP_N: usize = 5;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "else", "when", "from", "with", "at",
    "by", "on", "of", "for", "in", "to", "is", "are", "was", "were", "this", "that", "as", "it",
];

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s]").expect("valid regex"))
}

/// 统计出现频率最高的 N 个词，频率相同时保留首次出现的顺序
pub fn top_words(text: &str, top_n: usize) -> Vec<WordCount> {
    let lowered = text.to_lowercase();
    let cleaned = non_word_re().replace_all(&lowered, " ");

    let mut counts: Vec<WordCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for token in cleaned.split_whitespace() {
        if token.len() <= 1 || STOPWORDS.contains(&token) {
            continue;
        }

        match index.get(token) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(token, counts.len());
                counts.push(WordCount {
                    word: token.to_string(),
                    count: 1,
                });
            }
        }
    }

    // sort_by 是稳定排序
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top_n);
    counts
}
