//! Plain-text excerpts of markdown bodies, used as post summaries in
//! listings.

use pulldown_cmark::{Event, Parser, Tag};

/// The default maximum excerpt length, in characters (not counting the
/// trailing ellipsis).
pub const DEFAULT_PRUNE_LENGTH: usize = 140;

const ELLIPSIS: char = '…';

/// Extracts the text of `markdown`, collapses whitespace, and prunes the
/// result to at most `prune_length` characters. Pruning backs up to the last
/// word boundary and appends an ellipsis.
pub fn excerpt(markdown: &str, prune_length: usize) -> String {
    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(s) | Event::Code(s) => text.push_str(&s),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(_))
            | Event::End(Tag::Item)
            | Event::End(Tag::CodeBlock(_))
            | Event::End(Tag::BlockQuote) => text.push(' '),
            _ => {}
        }
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= prune_length {
        return collapsed;
    }

    let mut pruned = String::new();
    for word in words {
        let needed = match pruned.is_empty() {
            true => word.chars().count(),
            false => pruned.chars().count() + 1 + word.chars().count(),
        };
        if needed > prune_length {
            break;
        }
        if !pruned.is_empty() {
            pruned.push(' ');
        }
        pruned.push_str(word);
    }

    // A single word longer than the limit gets cut mid-word.
    if pruned.is_empty() {
        pruned = collapsed.chars().take(prune_length).collect();
    }
    pruned.push(ELLIPSIS);
    pruned
}
