use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::ops::Range;

lazy_static! {
    static ref DOUBLE_BACKTICK: Regex = Regex::new(r"``(?:[^`\n]|`[^`\n])+?``").unwrap();
    static ref SINGLE_BACKTICK: Regex = Regex::new(r"`[^`\n]+`").unwrap();
    static ref HTML_PRE: Regex = Regex::new(r"(?is)<pre\b[^>]*>.*?</pre>").unwrap();
    static ref HTML_CODE: Regex = Regex::new(r"(?is)<code\b[^>]*>.*?</code>").unwrap();
    static ref ORDERED_LIST_ITEM: Regex = Regex::new(r"^\d+\.(\s|$)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RegionKind {
    Fenced,
    Indented,
    InlineCode,
    HtmlPre,
    HtmlCode,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeRegion {
    pub start: usize,
    pub end: usize,
    pub kind: RegionKind,
}

impl CodeRegion {
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// A fenced block with its info-string language and the span between the
/// opening and closing marker lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    pub region: CodeRegion,
    pub language: Option<String>,
    pub content: Range<usize>,
    /// 1-based line of the first content line.
    pub content_line: usize,
}

/// Find every code region in `text`, sorted and non-overlapping.
pub fn find_code_regions(text: &str) -> Vec<CodeRegion> {
    // Line-based blocks
    let mut regions: Vec<CodeRegion> = fenced_blocks(text).into_iter().map(|b| b.region).collect();
    regions.extend(indented_regions(text));

    let block_regions = regions.clone();
    let inside_block = |offset: usize| block_regions.iter().any(|r| r.contains(offset));

    // Double backticks first so that ``a`b`` is not split into single spans.
    let mut inline: Vec<CodeRegion> = Vec::new();
    for m in DOUBLE_BACKTICK.find_iter(text) {
        if !inside_block(m.start()) {
            inline.push(region(m.range(), RegionKind::InlineCode));
        }
    }
    for m in SINGLE_BACKTICK.find_iter(text) {
        let overlaps_double = inline.iter().any(|r| m.start() < r.end && r.start < m.end());
        if !inside_block(m.start()) && !overlaps_double {
            inline.push(region(m.range(), RegionKind::InlineCode));
        }
    }
    regions.extend(inline);

    // HTML blocks
    for (pattern, kind) in [(&*HTML_PRE, RegionKind::HtmlPre), (&*HTML_CODE, RegionKind::HtmlCode)] {
        for m in pattern.find_iter(text) {
            if !inside_block(m.start()) {
                regions.push(region(m.range(), kind));
            }
        }
    }

    merge_regions(regions)
}

/// Sort candidates by start and coalesce any that overlap or touch.
pub fn merge_regions(mut regions: Vec<CodeRegion>) -> Vec<CodeRegion> {
    regions.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut merged: Vec<CodeRegion> = Vec::with_capacity(regions.len());
    for next in regions {
        match merged.last_mut() {
            Some(prev) if next.start <= prev.end => {
                prev.end = prev.end.max(next.end);
                if prev.kind != next.kind {
                    prev.kind = RegionKind::Mixed;
                }
            }
            _ => merged.push(next),
        }
    }
    merged
}

/// Binary search over merged regions.
pub fn is_in_code_region(regions: &[CodeRegion], offset: usize) -> bool {
    let idx = regions.partition_point(|r| r.end <= offset);
    regions.get(idx).is_some_and(|r| r.contains(offset))
}

/// Scan fenced blocks. An unclosed fence runs to the end of the text.
pub fn fenced_blocks(text: &str) -> Vec<FencedBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<OpenFence> = None;

    for (line_idx, line) in lines_with_offsets(text) {
        let trimmed = line.text.trim();
        let Some(ch) = fence_marker(trimmed) else {
            continue;
        };

        if open.as_ref().is_some_and(|fence| fence.ch == ch) {
            if let Some(fence) = open.take() {
                let content_end = line.start.max(fence.content_start);
                blocks.push(fence.close(content_end, line.end));
            }
        } else if open.is_none() {
            let info = trimmed.trim_start_matches(ch).trim();
            let language = info
                .split(|c: char| c.is_whitespace() || c == '{' || c == ',')
                .next()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_lowercase());
            open = Some(OpenFence {
                ch,
                start: line.start,
                content_start: line.next,
                content_line: line_idx + 2,
                language,
            });
        }
    }

    if let Some(fence) = open {
        blocks.push(fence.close(text.len(), text.len()));
    }

    blocks
}

/// Per-line fence/indent state, 0-indexed by line. Coarser than
/// [`find_code_regions`] and used as an additional line-level skip.
pub fn code_block_lines(text: &str) -> Vec<bool> {
    let mut flags = Vec::new();
    let mut fence: Option<char> = None;
    let mut in_indented = false;

    for (_, line) in lines_with_offsets(text) {
        let trimmed = line.text.trim();
        if let Some(ch) = fence_marker(trimmed) {
            match fence {
                None => fence = Some(ch),
                Some(open) if open == ch => fence = None,
                _ => {}
            }
            in_indented = false;
            flags.push(true);
            continue;
        }
        if fence.is_some() {
            flags.push(true);
            continue;
        }

        if trimmed.is_empty() {
            flags.push(in_indented);
        } else if is_indented_code_line(line.text) {
            in_indented = true;
            flags.push(true);
        } else {
            in_indented = false;
            flags.push(false);
        }
    }

    flags
}

fn indented_regions(text: &str) -> Vec<CodeRegion> {
    let mut regions = Vec::new();
    let mut fence: Option<char> = None;
    let mut current: Option<(usize, usize)> = None;

    for (_, line) in lines_with_offsets(text) {
        let trimmed = line.text.trim();

        if let Some(ch) = fence_marker(trimmed) {
            flush(&mut current, &mut regions);
            match fence {
                None => fence = Some(ch),
                Some(open) if open == ch => fence = None,
                _ => {}
            }
            continue;
        }
        if fence.is_some() {
            continue;
        }

        if trimmed.is_empty() {
            // Blank lines continue an open block but never start one.
            continue;
        }

        if is_indented_code_line(line.text) {
            match current.as_mut() {
                Some((_, end)) => *end = line.end,
                None => current = Some((line.start, line.end)),
            }
        } else {
            flush(&mut current, &mut regions);
        }
    }
    flush(&mut current, &mut regions);

    regions
}

fn flush(current: &mut Option<(usize, usize)>, regions: &mut Vec<CodeRegion>) {
    if let Some((start, end)) = current.take() {
        regions.push(region(start..end, RegionKind::Indented));
    }
}

fn is_indented_code_line(line: &str) -> bool {
    let indented = line.starts_with("    ") || line.starts_with('\t');
    indented && !is_list_item(line.trim_start())
}

fn is_list_item(trimmed: &str) -> bool {
    let bullet = ["- ", "* ", "+ "].iter().any(|b| trimmed.starts_with(b))
        || matches!(trimmed, "-" | "*" | "+");
    bullet || ORDERED_LIST_ITEM.is_match(trimmed)
}

fn fence_marker(trimmed: &str) -> Option<char> {
    if trimmed.starts_with("```") {
        Some('`')
    } else if trimmed.starts_with("~~~") {
        Some('~')
    } else {
        None
    }
}

fn region(range: Range<usize>, kind: RegionKind) -> CodeRegion {
    CodeRegion {
        start: range.start,
        end: range.end,
        kind,
    }
}

struct OpenFence {
    ch: char,
    start: usize,
    content_start: usize,
    content_line: usize,
    language: Option<String>,
}

impl OpenFence {
    fn close(&self, content_end: usize, region_end: usize) -> FencedBlock {
        let content_start = self.content_start.min(content_end);
        FencedBlock {
            region: region(self.start..region_end, RegionKind::Fenced),
            language: self.language.clone(),
            content: content_start..content_end,
            content_line: self.content_line,
        }
    }
}

pub(crate) struct Line<'a> {
    pub text: &'a str,
    /// Offset of the first byte of the line.
    pub start: usize,
    /// Offset of the line end, excluding the newline.
    pub end: usize,
    /// Offset where the following line starts.
    pub next: usize,
}

/// Lines with byte offsets. Handles `\n` and `\r\n`.
pub(crate) fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, Line<'_>)> {
    let mut offset = 0;
    text.split_inclusive('\n').enumerate().map(move |(idx, raw)| {
        let start = offset;
        offset += raw.len();
        let body = raw.strip_suffix('\n').unwrap_or(raw);
        let body = body.strip_suffix('\r').unwrap_or(body);
        (
            idx,
            Line {
                text: body,
                start,
                end: start + body.len(),
                next: offset,
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    fn kinds(regions: &[CodeRegion]) -> Vec<RegionKind> {
        regions.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_balanced_fence_is_one_region() {
        let text = "Intro\n```rust\nfn main() {}\n```\nOutro";
        let regions = find_code_regions(text);

        assert_eq!(kinds(&regions), vec![RegionKind::Fenced]);
        let fenced = &text[regions[0].start..regions[0].end];
        assert_eq!(fenced, "```rust\nfn main() {}\n```");
    }

    #[test]
    fn test_multiple_fences_and_tildes() {
        let text = "a\n```\none\n```\nb\n~~~py\ntwo\n~~~\nc";
        let regions = find_code_regions(text);

        assert_eq!(kinds(&regions), vec![RegionKind::Fenced, RegionKind::Fenced]);
        assert_eq!(&text[regions[1].start..regions[1].end], "~~~py\ntwo\n~~~");
    }

    #[test]
    fn test_close_marker_must_match_fence_char() {
        let text = "```\ncode\n~~~\nstill code\n```\nafter";
        let regions = find_code_regions(text);

        assert_eq!(regions.len(), 1);
        assert_eq!(&text[regions[0].start..regions[0].end], "```\ncode\n~~~\nstill code\n```");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let text = "prose\n```js\nlet x = 1;\n";
        let regions = find_code_regions(text);

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].end, text.len());
    }

    #[test]
    fn test_fenced_block_language_and_content() {
        let text = "```JavaScript {linenos}\n// hi\n```\n";
        let blocks = fenced_blocks(text);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language.as_deref(), Some("javascript"));
        assert_eq!(&text[blocks[0].content.clone()], "// hi\n");
        assert_eq!(blocks[0].content_line, 2);
    }

    #[test]
    fn test_indented_block_extends_through_blank_lines() {
        let text = "Para\n\n    code one\n\n    code two\nback to prose";
        let regions = find_code_regions(text);

        assert_eq!(kinds(&regions), vec![RegionKind::Indented]);
        assert_eq!(&text[regions[0].start..regions[0].end], "    code one\n\n    code two");
    }

    #[test]
    fn test_indented_list_items_are_not_code() {
        let text = "    - item one\n    1. item two\n\t* item three";
        assert!(find_code_regions(text).is_empty());
    }

    #[test]
    fn test_inline_and_double_backtick() {
        let text = "Use `foo` and ``a`b`` here";
        let regions = find_code_regions(text);

        assert_eq!(kinds(&regions), vec![RegionKind::InlineCode, RegionKind::InlineCode]);
        assert_eq!(&text[regions[0].start..regions[0].end], "`foo`");
        assert_eq!(&text[regions[1].start..regions[1].end], "``a`b``");
    }

    #[test]
    fn test_html_pre_with_nested_code_is_mixed() {
        let text = "x <pre><code>body</code></pre> y";
        let regions = find_code_regions(text);

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].kind, RegionKind::Mixed);
        assert_eq!(&text[regions[0].start..regions[0].end], "<pre><code>body</code></pre>");
    }

    #[test]
    fn test_merge_touching_regions() {
        let merged = merge_regions(vec![
            CodeRegion { start: 5, end: 10, kind: RegionKind::InlineCode },
            CodeRegion { start: 0, end: 5, kind: RegionKind::HtmlCode },
            CodeRegion { start: 20, end: 25, kind: RegionKind::InlineCode },
        ]);

        assert_eq!(
            merged,
            vec![
                CodeRegion { start: 0, end: 10, kind: RegionKind::Mixed },
                CodeRegion { start: 20, end: 25, kind: RegionKind::InlineCode },
            ]
        );
    }

    #[test]
    fn test_is_in_code_region() {
        let text = "a `b` c\n```\nd\n```";
        let regions = find_code_regions(text);

        assert!(!is_in_code_region(&regions, 0));
        assert!(is_in_code_region(&regions, 3));
        assert!(!is_in_code_region(&regions, 6));
        assert!(is_in_code_region(&regions, text.len() - 1));
    }

    #[test]
    fn test_code_block_lines() {
        let text = "prose\n```\ncode\n```\n    indented\n\nprose";
        assert_eq!(code_block_lines(text), vec![false, true, true, true, true, true, false]);
    }

    #[test]
    fn test_empty_text() {
        assert!(find_code_regions("").is_empty());
        assert!(fenced_blocks("").is_empty());
    }

    #[test]
    fn prop_regions_sorted_and_disjoint() {
        fn prop(text: String) -> TestResult {
            let regions = find_code_regions(&text);
            let ok = regions.windows(2).all(|w| w[0].end <= w[1].start)
                && regions.iter().all(|r| r.start <= r.end && r.end <= text.len());
            TestResult::from_bool(ok)
        }
        QuickCheck::new().tests(300).quickcheck(prop as fn(String) -> TestResult);
    }

    #[test]
    fn prop_markdown_like_regions_sorted_and_disjoint() {
        fn prop(parts: Vec<u8>) -> TestResult {
            const PIECES: [&str; 10] = ["```\n", "~~~\n", "    code\n", "\n", "`x`", "``y``", "<pre>", "</pre>", "<code>z</code>", "word "];
            let text: String = parts.iter().map(|p| PIECES[*p as usize % PIECES.len()]).collect();
            let regions = find_code_regions(&text);
            TestResult::from_bool(regions.windows(2).all(|w| w[0].end <= w[1].start))
        }
        QuickCheck::new().tests(300).quickcheck(prop as fn(Vec<u8>) -> TestResult);
    }

    #[test]
    fn test_idempotent() {
        let text = "`a` ``b``\n```\nc\n```\n    d\n<pre>e</pre>";
        assert_eq!(find_code_regions(text), find_code_regions(text));
    }
}
