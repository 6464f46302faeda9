//! Minimal namespace-agnostic XML extraction for ISAPI responses.
//!
//! ISAPI bodies are small and flat, so elements are located by scanning tags
//! and tracking depth instead of building a document tree. Namespace prefixes
//! (`<hik:DeviceInfo>`) and attributes (`<DeviceInfo version="2.0">`) are
//! ignored when matching names.

/// Return the raw inner content of the first element named `tag` that is a
/// direct child of `xml` (depth 0 for a whole document, so the root element
/// itself can be selected).
pub fn child_section<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let mut depth = 0usize;
    let mut pos = 0;

    while let Some(tag_start) = next_tag(xml, pos) {
        let tag_end = tag_start + xml[tag_start..].find('>')?;
        let inner = &xml[tag_start + 1..tag_end];
        pos = tag_end + 1;

        if is_markup_declaration(inner) {
            continue;
        }

        if inner.starts_with('/') {
            depth = depth.saturating_sub(1);
            continue;
        }

        let self_closing = inner.ends_with('/');
        if depth == 0 && local_name(inner) == tag {
            if self_closing {
                return Some("");
            }
            let close = find_close(xml, pos, tag)?;
            return Some(&xml[pos..close]);
        }

        if !self_closing {
            depth += 1;
        }
    }

    None
}

/// Local name of the document's root element.
///
/// `None` unless `xml` holds exactly one closed root element, optionally
/// preceded by a prolog or comments.
pub fn root_element(xml: &str) -> Option<&str> {
    let mut pos = 0;

    while let Some(tag_start) = next_tag(xml, pos) {
        if !xml[pos..tag_start].trim().is_empty() {
            return None;
        }
        let tag_end = tag_start + xml[tag_start..].find('>')?;
        let inner = &xml[tag_start + 1..tag_end];
        pos = tag_end + 1;

        if is_markup_declaration(inner) {
            continue;
        }
        if inner.starts_with('/') {
            return None;
        }

        let name = local_name(inner);
        let end = if inner.ends_with('/') {
            pos
        } else {
            let close = find_close(xml, pos, name)?;
            close + xml[close..].find('>')? + 1
        };
        return xml[end..].trim().is_empty().then_some(name);
    }

    None
}

/// Text value of the direct child element `tag`, entity-decoded and trimmed.
/// Empty elements and elements containing markup yield `None`.
pub fn child_text(xml: &str, tag: &str) -> Option<String> {
    let raw = child_section(xml, tag)?.trim();
    if raw.is_empty() || raw.contains('<') {
        return None;
    }
    Some(unescape(raw))
}

fn next_tag(xml: &str, from: usize) -> Option<usize> {
    xml.get(from..)?.find('<').map(|offset| from + offset)
}

fn is_markup_declaration(inner: &str) -> bool {
    inner.starts_with('?') || inner.starts_with('!')
}

/// Element name without namespace prefix or attributes.
fn local_name(inner: &str) -> &str {
    let name = inner
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("");
    name.rsplit(':').next().unwrap_or(name)
}

/// Byte offset of the `<` of the closing tag matching an element named `tag`
/// whose content starts at `from`.
fn find_close(xml: &str, from: usize, tag: &str) -> Option<usize> {
    let mut nested = 0usize;
    let mut pos = from;

    while let Some(tag_start) = next_tag(xml, pos) {
        let tag_end = tag_start + xml[tag_start..].find('>')?;
        let inner = &xml[tag_start + 1..tag_end];
        pos = tag_end + 1;

        if is_markup_declaration(inner) || local_name(inner) != tag {
            continue;
        }

        if inner.starts_with('/') {
            if nested == 0 {
                return Some(tag_start);
            }
            nested -= 1;
        } else if !inner.ends_with('/') {
            nested += 1;
        }
    }

    None
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
