use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractError;

/// Elements that never carry a closing tag in vendor HTML.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "param", "source", "track", "wbr",
];

/// Heading level a section query searches at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
}

impl HeadingLevel {
    fn tag(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
        }
    }
}

/// Index into the document's node arena. Ids are assigned in document
/// (preorder) order, so comparing ids compares document positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
enum NodeKind {
    Element { tag: String, class: Option<String> },
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    children: Vec<usize>,
}

/// An immutable parsed HTML tree. Created once per extraction run and shared
/// read-only across section extractions.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Parse HTML text into a navigable tree.
    ///
    /// The reader is lenient the way vendor reports require: end-tag names are
    /// not enforced, void elements need no closing tag, and common HTML
    /// entities are resolved. Anything the event reader itself rejects is a
    /// `MalformedDocument`.
    pub fn parse(html: &str) -> Result<Self, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::MalformedDocument("empty input".into()));
        }

        let mut reader = Reader::from_str(html);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        // Node 0 is a synthetic root.
        let mut nodes = vec![Node {
            kind: NodeKind::Element {
                tag: String::new(),
                class: None,
            },
            children: Vec::new(),
        }];
        let mut stack: Vec<usize> = vec![0];
        let mut saw_element = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let tag = tag_name(e.name().as_ref());
                    let id = push_element(&mut nodes, &mut stack, &tag, element_class(&e));
                    saw_element = true;
                    if !VOID_TAGS.contains(&tag.as_str()) {
                        stack.push(id);
                    }
                    if tag == "br" {
                        push_text(&mut nodes, &stack, "\n");
                    }
                }
                Ok(Event::Empty(e)) => {
                    let tag = tag_name(e.name().as_ref());
                    push_element(&mut nodes, &mut stack, &tag, element_class(&e));
                    saw_element = true;
                    if tag == "br" {
                        push_text(&mut nodes, &stack, "\n");
                    }
                }
                Ok(Event::End(e)) => {
                    let tag = tag_name(e.name().as_ref());
                    // Pop to the nearest matching open element; ignore strays.
                    if let Some(pos) = stack.iter().rposition(|&id| {
                        matches!(&nodes[id].kind, NodeKind::Element { tag: t, .. } if *t == tag)
                    }) {
                        if pos > 0 {
                            stack.truncate(pos);
                        }
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .decode()
                        .map_err(|err| ExtractError::MalformedDocument(err.to_string()))?;
                    if !text.is_empty() {
                        push_text(&mut nodes, &stack, &text);
                    }
                }
                Ok(Event::GeneralRef(e)) => {
                    let name = e
                        .decode()
                        .map_err(|err| ExtractError::MalformedDocument(err.to_string()))?;
                    // Unknown entities pass through literally; vendor reports
                    // occasionally carry marks like &trade; in product names.
                    match resolve_ref(&name) {
                        Some(ch) => push_text(&mut nodes, &stack, &ch.to_string()),
                        None => push_text(&mut nodes, &stack, &format!("&{};", name)),
                    }
                }
                Ok(Event::CData(e)) => {
                    push_text(&mut nodes, &stack, &String::from_utf8_lossy(&e));
                }
                Ok(Event::Eof) => break,
                Ok(Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => {}
                Err(err) => {
                    return Err(ExtractError::MalformedDocument(format!(
                        "{} at byte {}",
                        err,
                        reader.buffer_position()
                    )))
                }
            }
        }

        if !saw_element {
            return Err(ExtractError::MalformedDocument(
                "no elements in input".into(),
            ));
        }

        Ok(Document { nodes })
    }

    /// First heading at `level` whose rendered text contains `contains`
    /// (case-sensitive substring). Absence is not an error: sections are
    /// optional in real reports.
    pub fn find_heading(&self, level: HeadingLevel, contains: &str) -> Option<NodeId> {
        let want = level.tag();
        (0..self.nodes.len())
            .filter(|&id| self.tag_of(id) == Some(want))
            .map(NodeId)
            .find(|&id| self.text(id).contains(contains))
    }

    /// First table in document order after `node`.
    pub fn next_table(&self, node: NodeId) -> Option<NodeId> {
        (node.0 + 1..self.nodes.len())
            .find(|&id| self.tag_of(id) == Some("table"))
            .map(NodeId)
    }

    /// All `tr` descendants of a table, in document order.
    pub fn rows(&self, table: NodeId) -> Vec<NodeId> {
        self.descendants(table)
            .into_iter()
            .filter(|&id| self.tag_of(id.0) == Some("tr"))
            .collect()
    }

    /// Direct `td`/`th` children of a row, in document order.
    pub fn cells(&self, row: NodeId) -> Vec<NodeId> {
        self.nodes[row.0]
            .children
            .iter()
            .filter(|&&id| matches!(self.tag_of(id), Some("td") | Some("th")))
            .map(|&id| NodeId(id))
            .collect()
    }

    /// Rendered text of a node: tags stripped, entities decoded, horizontal
    /// whitespace collapsed, embedded line breaks preserved as `\n`, ends
    /// trimmed. Several decoders split this on `\n` for sub-fields.
    pub fn text(&self, node: NodeId) -> String {
        let mut raw = String::new();
        self.collect_text(node.0, &mut raw);
        normalize_text(&raw)
    }

    /// First descendant `td` or `span` carrying the `label` class. This is
    /// the structural marker distinguishing label cells from value cells.
    pub fn label_cell(&self, row: NodeId) -> Option<NodeId> {
        self.descendants(row).into_iter().find(|&id| {
            matches!(self.tag_of(id.0), Some("td") | Some("span")) && self.has_class(id, "label")
        })
    }

    /// First `td` within `row` strictly after `after` in document order.
    pub fn next_td_after(&self, row: NodeId, after: NodeId) -> Option<NodeId> {
        self.descendants(row)
            .into_iter()
            .find(|&id| id > after && self.tag_of(id.0) == Some("td"))
    }

    /// First descendant element carrying the given class token.
    pub fn descendant_with_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .find(|&id| self.has_class(id, class))
    }

    fn has_class(&self, id: NodeId, token: &str) -> bool {
        match &self.nodes[id.0].kind {
            NodeKind::Element {
                class: Some(c), ..
            } => c.split_whitespace().any(|t| t == token),
            _ => false,
        }
    }

    fn tag_of(&self, id: usize) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    /// Element descendants of `node` (excluding `node` itself), preorder.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut work: Vec<usize> = self.nodes[node.0].children.iter().rev().copied().collect();
        while let Some(id) = work.pop() {
            if matches!(self.nodes[id].kind, NodeKind::Element { .. }) {
                out.push(NodeId(id));
            }
            work.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    fn collect_text(&self, id: usize, out: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element { .. } => {
                for &child in &self.nodes[id].children {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn element_class(e: &quick_xml::events::BytesStart) -> Option<String> {
    for attr in e.html_attributes().flatten() {
        if attr.key.as_ref().eq_ignore_ascii_case(b"class") {
            return Some(String::from_utf8_lossy(attr.value.as_ref()).into_owned());
        }
    }
    None
}

fn push_element(
    nodes: &mut Vec<Node>,
    stack: &mut [usize],
    tag: &str,
    class: Option<String>,
) -> usize {
    let id = nodes.len();
    nodes.push(Node {
        kind: NodeKind::Element {
            tag: tag.to_string(),
            class,
        },
        children: Vec::new(),
    });
    let parent = *stack.last().expect("stack never empty");
    nodes[parent].children.push(id);
    id
}

fn push_text(nodes: &mut Vec<Node>, stack: &[usize], text: &str) {
    let parent = *stack.last().expect("stack never empty");
    let id = nodes.len();
    nodes.push(Node {
        kind: NodeKind::Text(text.to_string()),
        children: Vec::new(),
    });
    nodes[parent].children.push(id);
}

/// Named HTML entities the reports use beyond the predefined XML set.
fn resolve_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" => Some("\u{a0}"),
        "copy" => Some("\u{a9}"),
        "reg" => Some("\u{ae}"),
        "deg" => Some("\u{b0}"),
        "middot" => Some("\u{b7}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201c}"),
        "rdquo" => Some("\u{201d}"),
        "bull" => Some("\u{2022}"),
        "hellip" => Some("\u{2026}"),
        _ => None,
    }
}

/// Resolve a general entity reference event (named or numeric).
fn resolve_ref(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse().ok()?
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => resolve_entity(name).and_then(|s| s.chars().next()),
    }
}

/// Collapse runs of horizontal whitespace to one space and runs containing a
/// newline to one `\n`. NBSP is kept verbatim (header cleanup is a decoder
/// concern), ends are trimmed.
fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut run_has_newline = false;
    let mut in_run = false;

    for ch in raw.chars() {
        let collapsible = matches!(ch, ' ' | '\t' | '\r' | '\n' | '\u{c}');
        if collapsible {
            in_run = true;
            run_has_newline |= ch == '\n' || ch == '\r';
        } else {
            if in_run {
                out.push(if run_has_newline { '\n' } else { ' ' });
                in_run = false;
                run_has_newline = false;
            }
            out.push(ch);
        }
    }

    out.trim_matches(|c| matches!(c, ' ' | '\n')).to_string()
}

// ── Tests ──
