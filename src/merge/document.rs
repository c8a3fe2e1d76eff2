//! An existing artifact as an ordered list of verbatim runs and sentinel-bounded regions.
//!
//! Lines keep their own endings, so `Document::parse(t, ..).render() == t` for any input.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionKind {
    TableRegistry,
    CustomRegistry,
    TypeBody,
    EnumRecords,
    ServiceBody,
}

/// Where a region starts and ends, as comment-line markers.
#[derive(Clone, Copy, Debug)]
pub struct RegionSpec {
    pub kind: RegionKind,
    pub start: &'static str,
    pub end: &'static str,
    /// Keyword of a `keyword name {` line that opens the region when the start marker is missing.
    pub opener: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub start: String,
    /// Everything between the sentinels; appended entries land at the end.
    pub content: Vec<String>,
    pub end: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Verbatim(Vec<String>),
    Region(Region),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    segments: Vec<Segment>,
}

fn enum_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*enum\s+([A-Za-z0-9_]+)").expect("static regex"))
}

/// `// Marker`, `// Marker:` or `\t// Marker` all match `Marker`.
pub fn is_sentinel(line: &str, marker: &str) -> bool {
    match line.trim().strip_prefix("//") {
        Some(rest) => rest.trim().trim_end_matches(':').trim_end() == marker,
        None => false,
    }
}

fn find(lines: &[String], from: usize, marker: &str) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, l)| is_sentinel(l, marker))
        .map(|(i, _)| i)
}

/// `service shop{` or `service shop {` opens for keyword `service`.
pub fn is_opener(line: &str, keyword: &str) -> bool {
    let t = line.trim();
    match t.strip_prefix(keyword) {
        Some(rest) => rest.starts_with(char::is_whitespace) && t.ends_with('{'),
        None => false,
    }
}

fn find_start(lines: &[String], from: usize, spec: &RegionSpec) -> Option<usize> {
    find(lines, from, spec.start).or_else(|| {
        let keyword = spec.opener?;
        let i = lines.iter().enumerate().skip(from).find(|(_, l)| is_opener(l, keyword))?.0;
        tracing::debug!(region = ?spec.kind, line = i + 1, "start sentinel missing, region opened by declaration");
        Some(i)
    })
}

impl Document {
    /// Splits `text` into regions following `specs` in order. A region whose start or end sentinel
    /// is missing is treated as absent and its lines stay verbatim.
    pub fn parse(text: &str, specs: &[RegionSpec]) -> Self {
        let lines: Vec<String> = text.split_inclusive('\n').map(String::from).collect();
        let mut segments = Vec::new();
        let mut cursor = 0;

        for spec in specs {
            let Some(start) = find_start(&lines, cursor, spec) else {
                tracing::debug!(region = ?spec.kind, "start sentinel not found, region absent");
                continue;
            };
            let Some(end) = find(&lines, start + 1, spec.end) else {
                tracing::debug!(region = ?spec.kind, "end sentinel not found, region absent");
                continue;
            };
            if start > cursor {
                segments.push(Segment::Verbatim(lines[cursor..start].to_vec()));
            }
            segments.push(Segment::Region(Region {
                kind: spec.kind,
                start: lines[start].clone(),
                content: lines[start + 1..end].to_vec(),
                end: lines[end].clone(),
            }));
            cursor = end + 1;
        }
        if cursor < lines.len() {
            segments.push(Segment::Verbatim(lines[cursor..].to_vec()));
        }
        Document { segments }
    }

    pub fn region(&self, kind: RegionKind) -> Option<&Region> {
        self.segments.iter().find_map(|s| match s {
            Segment::Region(r) if r.kind == kind => Some(r),
            _ => None,
        })
    }

    pub fn region_mut(&mut self, kind: RegionKind) -> Option<&mut Region> {
        self.segments.iter_mut().find_map(|s| match s {
            Segment::Region(r) if r.kind == kind => Some(r),
            _ => None,
        })
    }

    /// Puts `segments` right after the region of kind `anchor`. Returns false when that region is absent.
    pub fn insert_after(&mut self, anchor: RegionKind, segments: Vec<Segment>) -> bool {
        let Some(at) = self
            .segments
            .iter()
            .position(|s| matches!(s, Segment::Region(r) if r.kind == anchor))
        else {
            return false;
        };
        for (offset, segment) in segments.into_iter().enumerate() {
            self.segments.insert(at + 1 + offset, segment);
        }
        true
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Verbatim(lines) => lines.iter().for_each(|l| out.push_str(l)),
                Segment::Region(r) => {
                    out.push_str(&r.start);
                    r.content.iter().for_each(|l| out.push_str(l));
                    out.push_str(&r.end);
                }
            }
        }
        out
    }
}

impl Region {
    /// Registry entries: one name per `// Name` line.
    pub fn registry_names(&self) -> HashSet<String> {
        self.content
            .iter()
            .map(|l| {
                let t = l.trim();
                t.strip_prefix("//").unwrap_or(t).trim().to_string()
            })
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// Names of `enum Name {` declarations in the region.
    pub fn enum_names(&self) -> HashSet<String> {
        self.content
            .iter()
            .filter_map(|l| enum_decl_re().captures(l).map(|c| c[1].to_string()))
            .collect()
    }

    /// Adds text just before the end sentinel.
    pub fn append(&mut self, text: String) {
        self.content.push(text);
    }
}
