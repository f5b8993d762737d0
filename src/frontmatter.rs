/// The result of scanning a document's lines for a frontmatter block.
pub struct FrontmatterSpan {
    pub start_line: usize,
    pub end_line: usize,
    pub yaml: String,
}

/// The first line must be exactly `---` after trimming, and the block ends
/// at the first subsequent line that is exactly `---`. A document with only
/// an opening fence and no closing fence has no frontmatter.
pub fn detect(lines: &[String]) -> Option<FrontmatterSpan> {
    let first = lines.first()?;
    if first.trim() != "---" {
        return None;
    }

    let end_line = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim() == "---")
        .map(|(i, _)| i)?;

    let yaml = lines[1..end_line].join("\n");

    Some(FrontmatterSpan {
        start_line: 0,
        end_line,
        yaml,
    })
}
