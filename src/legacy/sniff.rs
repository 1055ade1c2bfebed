//! Shallow structured-document sniffing.
//!
//! Only the root element and the attributes of its direct children are
//! inspected. Anything malformed before the answer is known yields
//! [`AssetType::NULL`].

use crate::asset::AssetType;

use super::table::{
    DOCUMENT_ROOTS, OBJECT_STREAM_ROOT, OBJECT_TYPE_ATTRIBUTE, UI_CANVAS, UI_CANVAS_MARKER,
};

#[derive(Debug, PartialEq)]
enum Tag<'a> {
    Start { name: &'a str, attributes: Vec<(&'a str, &'a str)>, self_closing: bool },
    End,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_past(&mut self, terminator: &str) -> Option<()> {
        let offset = self.rest().find(terminator)?;
        self.pos += offset + terminator.len();
        Some(())
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Next tag, skipping text, comments, declarations and CDATA.
    /// `None` at end of input or on a truncated construct.
    fn next_tag(&mut self) -> Option<Tag<'a>> {
        loop {
            self.skip_past("<")?;
            let rest = self.rest();
            if rest.starts_with('?') {
                self.skip_past("?>")?;
            } else if rest.starts_with("!--") {
                self.skip_past("-->")?;
            } else if rest.starts_with("![CDATA[") {
                self.skip_past("]]>")?;
            } else if rest.starts_with('!') {
                self.skip_past(">")?;
            } else if rest.starts_with('/') {
                self.skip_past(">")?;
                return Some(Tag::End);
            } else {
                return self.start_tag();
            }
        }
    }

    fn start_tag(&mut self) -> Option<Tag<'a>> {
        let name = self.take_while(is_name_char);
        if name.is_empty() {
            return None;
        }

        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Some(Tag::Start { name, attributes, self_closing: true });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Some(Tag::Start { name, attributes, self_closing: false });
            }

            let key = self.take_while(is_name_char);
            if key.is_empty() {
                return None;
            }
            self.skip_whitespace();
            if !self.rest().starts_with('=') {
                return None;
            }
            self.pos += 1;
            self.skip_whitespace();

            let quote = self.rest().chars().next().filter(|c| *c == '"' || *c == '\'')?;
            self.pos += 1;
            let value_len = self.rest().find(quote)?;
            let value = &self.rest()[..value_len];
            self.pos += value_len + 1;
            attributes.push((key, value));
        }
    }
}

fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '/' | '>' | '=' | '<' | '"' | '\'')
}

/// Infer a product type from document content.
pub fn sniff_asset_type(content: &str) -> AssetType {
    let mut scanner = Scanner::new(content);
    let (root, self_closing) = match scanner.next_tag() {
        Some(Tag::Start { name, self_closing, .. }) => (name, self_closing),
        _ => return AssetType::NULL,
    };

    if let Some((_, ty)) = DOCUMENT_ROOTS.iter().find(|(n, _)| n.eq_ignore_ascii_case(root)) {
        return *ty;
    }

    if !root.eq_ignore_ascii_case(OBJECT_STREAM_ROOT) {
        return AssetType::NULL;
    }
    if content.contains(UI_CANVAS_MARKER) {
        return UI_CANVAS;
    }
    if self_closing {
        return AssetType::NULL;
    }

    let mut depth = 1usize;
    while let Some(tag) = scanner.next_tag() {
        match tag {
            Tag::Start { attributes, self_closing, .. } => {
                if depth == 1 {
                    let declared = attributes
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(OBJECT_TYPE_ATTRIBUTE))
                        .and_then(|(_, value)| AssetType::parse(value))
                        .filter(|ty| !ty.is_null());
                    if let Some(ty) = declared {
                        return ty;
                    }
                }
                if !self_closing {
                    depth += 1;
                }
            }
            Tag::End => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
        }
    }

    AssetType::NULL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::table::{FONT, PARTICLE_LIBRARY};

    #[test]
    fn test_known_root_case_insensitive() {
        let doc = r#"<?xml version="1.0"?><FontShader name="x"><pass/></FontShader>"#;
        assert_eq!(sniff_asset_type(doc), FONT);
        assert_eq!(sniff_asset_type("<particlelibrary/>"), PARTICLE_LIBRARY);
    }

    #[test]
    fn test_comments_before_root_are_skipped() {
        let doc = "<!-- header --><!DOCTYPE x>\n<ParticleLibrary></ParticleLibrary>";
        assert_eq!(sniff_asset_type(doc), PARTICLE_LIBRARY);
    }

    #[test]
    fn test_object_stream_ui_canvas_marker() {
        let doc = r#"<ObjectStream version="3">
            <Class name="UiCanvas" type="{50B8CF6C-B19A-4D86-AFE9-96EFB820D422}"/>
        </ObjectStream>"#;
        assert_eq!(sniff_asset_type(doc), UI_CANVAS);
    }

    #[test]
    fn test_object_stream_first_child_type() {
        let doc = r#"<ObjectStream version="3">
            <Class name="Nothing" value="1">
                <Class name="Nested" type="{11111111-1111-1111-1111-111111111111}"/>
            </Class>
            <Class name="Thing" TYPE='{22222222-2222-2222-2222-222222222222}'/>
        </ObjectStream>"#;
        let expected = AssetType::parse("{22222222-2222-2222-2222-222222222222}").unwrap();
        assert_eq!(sniff_asset_type(doc), expected);
    }

    #[test]
    fn test_object_stream_skips_nil_and_invalid_types() {
        let doc = r#"<ObjectStream>
            <Class type="{00000000-0000-0000-0000-000000000000}"/>
            <Class type="garbage"/>
        </ObjectStream>"#;
        assert_eq!(sniff_asset_type(doc), AssetType::NULL);
    }

    #[test]
    fn test_unknown_root_and_malformed() {
        assert_eq!(sniff_asset_type("<Material/>"), AssetType::NULL);
        assert_eq!(sniff_asset_type(""), AssetType::NULL);
        assert_eq!(sniff_asset_type("plain text"), AssetType::NULL);
        assert_eq!(sniff_asset_type("<ObjectStream attr=unquoted>"), AssetType::NULL);
        assert_eq!(sniff_asset_type("<!-- never closed"), AssetType::NULL);
    }
}
