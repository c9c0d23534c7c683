//! 文本分段
//!
//! 把任意长度的文本切成提供商可接受的分段，同时保留段落与句子的顺序。
//! 纯函数，无副作用；长度一律按字符计数（Rust 字符串不能在码点中间切开）。
//!
//! 分段策略按优先级：
//! 1. 整段不超限 → 一个分段；
//! 2. 超限段落按句子边界（`.` `!` `?` 后跟空白）贪心装包；
//! 3. 单句仍超限时按固定字符数硬切，可能切断单词，属于已接受的有损兜底。

/// 一个有序分段
///
/// `order` 在整个返回序列上全序且稳定，重组时只依据它，与翻译完成顺序无关。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// 所属段落（原文按换行切分后的下标）
    pub paragraph_index: usize,
    /// 全局顺序号
    pub order: usize,
}

/// 将文本分段，每段字符数不超过 `max_chunk_chars`
///
/// 每个段落（包括空段落）至少产生一个分段，保证重组时能还原段落边界。
/// 段落内部的前后空白会被修剪，这是接口约定中允许的非逐字节还原。
pub fn segment(text: &str, max_chunk_chars: usize) -> Vec<Chunk> {
    assert!(max_chunk_chars > 0, "分段上限必须大于0");

    let mut chunks = Vec::new();
    let mut order = 0;

    for (paragraph_index, paragraph) in text.split('\n').enumerate() {
        let trimmed = paragraph.trim();

        if char_len(trimmed) <= max_chunk_chars {
            chunks.push(Chunk {
                text: trimmed.to_string(),
                paragraph_index,
                order,
            });
            order += 1;
            continue;
        }

        for piece in split_paragraph(trimmed, max_chunk_chars) {
            chunks.push(Chunk {
                text: piece,
                paragraph_index,
                order,
            });
            order += 1;
        }
    }

    chunks
}

/// 按 `order` 重组译文，段落间以换行连接
///
/// 输入允许乱序（并发完成的结果），内部排序后拼接。
pub fn reassemble(mut pieces: Vec<(Chunk, String)>) -> String {
    pieces.sort_by_key(|(chunk, _)| chunk.order);

    let mut result = String::new();
    let mut current_paragraph = 0;

    for (i, (chunk, translated)) in pieces.iter().enumerate() {
        if i > 0 {
            // 段落下标连续递增，每跨一个段落补一个换行
            for _ in current_paragraph..chunk.paragraph_index {
                result.push('\n');
            }
        }
        current_paragraph = chunk.paragraph_index;
        result.push_str(translated);
    }

    result
}

/// 超限段落的句子级切分与贪心装包
fn split_paragraph(paragraph: &str, max_chunk_chars: usize) -> Vec<String> {
    let mut packed: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(paragraph) {
        let sentence_len = char_len(&sentence);
        if current_len + sentence_len > max_chunk_chars && current_len > 0 {
            push_sliced(&mut packed, current.trim(), max_chunk_chars);
            current = sentence;
            current_len = sentence_len;
        } else {
            current.push_str(&sentence);
            current_len += sentence_len;
        }
    }

    if !current.trim().is_empty() {
        push_sliced(&mut packed, current.trim(), max_chunk_chars);
    }

    packed
}

/// 切出句子，标点及其后的空白保留在前一个句子里
fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = paragraph.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                current.push(chars.next().expect("peek 已确认存在"));
            }
            sentences.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        sentences.push(current);
    }

    sentences
}

/// 兜底硬切：超限的句子按固定字符数切开
fn push_sliced(packed: &mut Vec<String>, text: &str, max_chunk_chars: usize) {
    if char_len(text) <= max_chunk_chars {
        packed.push(text.to_string());
        return;
    }

    let chars: Vec<char> = text.chars().collect();
    for slice in chars.chunks(max_chunk_chars) {
        packed.push(slice.iter().collect());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
