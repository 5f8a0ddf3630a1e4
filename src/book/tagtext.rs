/// A song file split into its tagged header and lyric body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    /// Raw (key, value) pairs in file order, whitespace trimmed. Keys are
    /// not yet lowercased or filtered; that happens at record construction.
    pub tags: Vec<(String, String)>,
    pub body: String,
}

/// Split raw file text into header tag pairs and the body.
///
/// A line belongs to the header iff it contains a colon: the text before
/// the first colon is the key, the remainder the value. The first line
/// without a colon (a blank line always qualifies) ends the header, and
/// everything from that line on is the body. There is no escape syntax for
/// colons in values, but a blank line before the lyrics always protects a
/// first lyric line that happens to contain one.
pub fn parse(text: &str) -> ParsedFile {
    let lines: Vec<&str> = text.lines().collect();
    let mut tags = Vec::new();
    let mut boundary = lines.len();
    for (index, line) in lines.iter().enumerate() {
        match line.split_once(':') {
            Some((key, value)) => tags.push((key.trim().to_string(), value.trim().to_string())),
            None => {
                boundary = index;
                break;
            }
        }
    }
    let body = lines[boundary..].join("\n").trim_matches('\n').to_string();
    ParsedFile { tags, body }
}
