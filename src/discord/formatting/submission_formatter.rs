// Text rendering for submissions: moderator list views and the public
// announcement. Everything user-supplied is markdown-escaped here.

use crate::core::submissions::Submission;

/// Discord rejects message content longer than this.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// List views show at most this many characters of a submission.
const LIST_PREVIEW_CHARS: usize = 200;

/// Escape Discord markdown so submitted text renders literally.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut at_line_start = true;

    for c in text.chars() {
        let needs_escape = match c {
            '\\' | '*' | '_' | '~' | '`' | '|' => true,
            // Block syntax only matters at the start of a line.
            '>' | '#' | '-' => at_line_start,
            _ => false,
        };
        if needs_escape {
            escaped.push('\\');
        }
        escaped.push(c);
        at_line_start = c == '\n' || (at_line_start && c == ' ');
    }

    escaped
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// One submission as moderators see it in `/pending` and `/latest`.
pub fn format_submission(submission: &Submission, short: bool) -> String {
    let text = if short {
        truncate_chars(&submission.text, LIST_PREVIEW_CHARS)
    } else {
        submission.text.clone()
    };

    format!(
        "**{}** [{}] *{}*\n{}\n*{}*",
        submission.id,
        escape_markdown(&submission.lang),
        submission.status,
        escape_markdown(&text),
        submission.created_at.format("%Y-%m-%d %H:%M UTC")
    )
}

pub fn format_submission_list(submissions: &[Submission]) -> String {
    submissions
        .iter()
        .map(|s| format_submission(s, true))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// What the public channel receives.
pub fn format_announcement(submission: &Submission) -> String {
    format!(
        "📝 **Anonymous submission**\n{}",
        escape_markdown(&submission.text)
    )
}

/// Split `text` into messages of at most `limit` characters, preferring to
/// break between paragraphs.
///
/// Whitespace-only chunks are dropped since Discord refuses to send them.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for block in text.split("\n\n") {
        let block_len = block.chars().count();
        let joined_len = if current.is_empty() {
            block_len
        } else {
            current_len + 2 + block_len
        };

        if joined_len <= limit {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(block);
            current_len = joined_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if block_len <= limit {
            current.push_str(block);
            current_len = block_len;
        } else {
            hard_split(block, limit, &mut chunks);
            current_len = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks.retain(|chunk| !chunk.trim().is_empty());
    chunks
}

/// Cut a single oversized paragraph on char boundaries. A cut never lands
/// between an escaping backslash and the character it escapes.
fn hard_split(block: &str, limit: usize, chunks: &mut Vec<String>) {
    let chars: Vec<char> = block.chars().collect();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + limit).min(chars.len());
        if end < chars.len() {
            let trailing = chars[start..end]
                .iter()
                .rev()
                .take_while(|c| **c == '\\')
                .count();
            // Odd run: the last backslash escapes the first char of the next piece.
            if trailing % 2 == 1 && end - start > 1 {
                end -= 1;
            }
        }
        chunks.push(chars[start..end].iter().collect());
        start = end;
    }
}
