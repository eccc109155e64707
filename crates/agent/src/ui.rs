//! JSX-like markup → the `{type, props, children}` tree the mobile client renders.
//!
//! The parser accepts the subset of JSX the renderer prompt asks for: nested
//! elements, literal and `{expression}` attributes, text, and `{/* comments */}`.
//! Expressions it cannot evaluate (calls, arrow functions) are kept as their
//! source text so the client can still map handler names.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} at byte {offset}")]
pub struct MarkupError {
    pub offset: usize,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UiNode {
    pub kind: String,
    pub props: Map<String, Value>,
    pub children: Vec<UiChild>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UiChild {
    Node(UiNode),
    Text(String),
}

impl UiNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), props: Map::new(), children: Vec::new() }
    }

    /// A plain `View > Text` screen showing `text`.
    pub fn text_view(text: impl Into<String>) -> Self {
        let mut label = UiNode::new("Text");
        label.children.push(UiChild::Text(text.into()));
        let mut view = UiNode::new("View");
        view.children.push(UiChild::Node(label));
        view
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for UiNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.kind)?;
        if !self.props.is_empty() {
            map.serialize_entry("props", &self.props)?;
        }
        match self.children.as_slice() {
            [] => {}
            [UiChild::Text(text)] => map.serialize_entry("children", text)?,
            children => map.serialize_entry("children", children)?,
        }
        map.end()
    }
}

/// Deepest element or literal nesting accepted before parsing gives up.
pub const MAX_NESTING_DEPTH: usize = 64;

pub fn parse_markup(source: &str) -> Result<UiNode, MarkupError> {
    let mut parser = Parser { src: source, pos: 0, depth: 0 };
    parser.skip_ws();
    let root = parser.element()?;
    parser.skip_ws();
    if parser.pos < source.len() {
        return Err(parser.error("unexpected content after the root element"));
    }
    Ok(root)
}

/// Removes a surrounding Markdown code fence (with optional language tag).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), MarkupError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", byte as char)))
        }
    }

    fn error(&self, message: impl Into<String>) -> MarkupError {
        MarkupError { offset: self.pos, message: message.into() }
    }

    fn identifier(&mut self, extra: &[u8]) -> &'a str {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$' || extra.contains(&byte)
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.src[start..self.pos]
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, MarkupError>,
    ) -> Result<T, MarkupError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(format!("nesting deeper than {MAX_NESTING_DEPTH} levels")));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn element(&mut self) -> Result<UiNode, MarkupError> {
        self.nested(Self::element_body)
    }

    fn element_body(&mut self) -> Result<UiNode, MarkupError> {
        self.expect(b'<')?;
        let name = self.identifier(b".-");
        if name.is_empty() {
            return Err(self.error("expected an element name"));
        }
        let mut node = UiNode::new(name);

        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'/') => {
                    self.pos += 1;
                    self.expect(b'>')?;
                    return Ok(node);
                }
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'{') => return Err(self.error("spread attributes are not supported")),
                Some(_) => {
                    let (key, value) = self.attribute()?;
                    node.props.insert(key, value);
                }
                None => return Err(self.error(format!("unterminated tag <{name}>"))),
            }
        }

        self.children(&mut node)?;
        Ok(node)
    }

    fn attribute(&mut self) -> Result<(String, Value), MarkupError> {
        let key = self.identifier(b"-:");
        if key.is_empty() {
            return Err(self.error("expected an attribute name"));
        }
        self.skip_ws();
        if self.peek() != Some(b'=') {
            return Ok((key.to_string(), Value::Bool(true)));
        }
        self.pos += 1;
        self.skip_ws();

        let value = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => Value::String(self.attribute_literal(quote)?),
            Some(b'{') => self.braced_expression()?,
            _ => return Err(self.error(format!("expected a value for attribute `{key}`"))),
        };
        Ok((key.to_string(), value))
    }

    fn attribute_literal(&mut self, quote: u8) -> Result<String, MarkupError> {
        let open = self.pos;
        self.pos += 1;
        let Some(length) = self.rest().find(quote as char) else {
            return Err(MarkupError { offset: open, message: "unterminated attribute value".into() });
        };
        let value = decode_entities(&self.rest()[..length]);
        self.pos += length + 1;
        Ok(value)
    }

    fn children(&mut self, node: &mut UiNode) -> Result<(), MarkupError> {
        let mut text = String::new();

        loop {
            if self.starts_with("</") {
                flush_text(&mut text, &mut node.children);
                self.pos += 2;
                let closing = self.identifier(b".-");
                if closing != node.kind {
                    return Err(self.error(format!(
                        "expected </{}> but found </{closing}>",
                        node.kind
                    )));
                }
                self.skip_ws();
                return self.expect(b'>');
            }

            match self.peek() {
                None => return Err(self.error(format!("unclosed element <{}>", node.kind))),
                Some(b'<') => {
                    flush_text(&mut text, &mut node.children);
                    let child = self.element()?;
                    node.children.push(UiChild::Node(child));
                }
                Some(b'{') => {
                    if let Some(fragment) = self.child_expression()? {
                        push_text(&mut text, &fragment);
                    }
                }
                Some(_) => {
                    let start = self.pos;
                    while self.peek().is_some_and(|byte| byte != b'<' && byte != b'{') {
                        self.pos += 1;
                    }
                    let collapsed = self.src[start..self.pos].split_whitespace().collect::<Vec<_>>();
                    push_text(&mut text, &decode_entities(&collapsed.join(" ")));
                }
            }
        }
    }

    fn child_expression(&mut self) -> Result<Option<String>, MarkupError> {
        let open = self.pos;
        self.pos += 1;
        self.skip_ws();
        if self.starts_with("/*") {
            let Some(end) = self.rest().find("*/") else {
                return Err(MarkupError { offset: open, message: "unterminated comment".into() });
            };
            self.pos += end + 2;
            self.skip_ws();
            self.expect(b'}')?;
            return Ok(None);
        }

        self.pos = open;
        Ok(match self.braced_expression()? {
            Value::Null | Value::Bool(_) => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        })
    }

    /// `{expr}`; unsupported expressions fall back to their trimmed source.
    fn braced_expression(&mut self) -> Result<Value, MarkupError> {
        let open = self.pos;
        self.expect(b'{')?;
        let start = self.pos;

        if let Ok(value) = self.expression() {
            self.skip_ws();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                return Ok(value);
            }
        }

        let end = self.matching_brace(open)?;
        let raw = self.src[start..end].trim().to_string();
        self.pos = end + 1;
        Ok(Value::String(raw))
    }

    fn matching_brace(&self, open: usize) -> Result<usize, MarkupError> {
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        let mut index = open;

        while index < bytes.len() {
            let byte = bytes[index];
            match quote {
                Some(_) if byte == b'\\' => index += 1,
                Some(active) if byte == active => quote = None,
                Some(_) => {}
                None => match byte {
                    b'"' | b'\'' | b'`' => quote = Some(byte),
                    b'{' => depth += 1,
                    b'}' => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            return Ok(index);
                        }
                    }
                    _ => {}
                },
            }
            index += 1;
        }

        Err(MarkupError { offset: open, message: "unbalanced `{`".into() })
    }

    fn expression(&mut self) -> Result<Value, MarkupError> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.nested(Self::object),
            Some(b'[') => self.nested(Self::array),
            Some(quote @ (b'"' | b'\'' | b'`')) => self.string_literal(quote).map(Value::String),
            Some(byte) if byte.is_ascii_digit() || matches!(byte, b'-' | b'+' | b'.') => {
                self.number()
            }
            Some(byte) if byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$' => {
                Ok(match self.identifier(b".") {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    "null" | "undefined" => Value::Null,
                    path => Value::String(path.to_string()),
                })
            }
            _ => Err(self.error("unsupported expression")),
        }
    }

    fn object(&mut self) -> Result<Value, MarkupError> {
        self.expect(b'{')?;
        let mut map = Map::new();

        loop {
            self.skip_ws();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }

            let key = match self.peek() {
                Some(quote @ (b'"' | b'\'')) => self.string_literal(quote)?,
                _ => {
                    let key = self.identifier(b"");
                    if key.is_empty() {
                        return Err(self.error("expected an object key"));
                    }
                    key.to_string()
                }
            };
            self.skip_ws();
            self.expect(b':')?;
            let value = self.expression()?;
            map.insert(key, value);

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {}
                _ => return Err(self.error("expected `,` or `}` in object")),
            }
        }
    }

    fn array(&mut self) -> Result<Value, MarkupError> {
        self.expect(b'[')?;
        let mut items = Vec::new();

        loop {
            self.skip_ws();
            if self.peek() == Some(b']') {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.expression()?);

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {}
                _ => return Err(self.error("expected `,` or `]` in array")),
            }
        }
    }

    fn string_literal(&mut self, quote: u8) -> Result<String, MarkupError> {
        let open = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut chars = self.rest().char_indices();

        while let Some((offset, ch)) = chars.next() {
            if ch == quote as char {
                self.pos += offset + 1;
                return Ok(value);
            }
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            }
        }

        Err(MarkupError { offset: open, message: "unterminated string literal".into() })
    }

    fn number(&mut self) -> Result<Value, MarkupError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|byte| byte.is_ascii_digit() || matches!(byte, b'-' | b'+' | b'.' | b'e' | b'E'))
        {
            self.pos += 1;
        }
        let raw = &self.src[start..self.pos];

        if let Ok(integer) = raw.parse::<i64>() {
            return Ok(Value::from(integer));
        }
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| MarkupError { offset: start, message: format!("invalid number `{raw}`") })
    }
}

fn push_text(pending: &mut String, fragment: &str) {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return;
    }
    if !pending.is_empty() {
        pending.push(' ');
    }
    pending.push_str(fragment);
}

fn flush_text(pending: &mut String, children: &mut Vec<UiChild>) {
    if !pending.is_empty() {
        children.push(UiChild::Text(std::mem::take(pending)));
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_markup, strip_code_fences, UiChild, UiNode, MAX_NESTING_DEPTH};
    use crate::prompts::WELCOME_MARKUP;

    #[test]
    fn converts_nested_views_with_styles_and_handlers() {
        let markup = r##"
            <View style={{ padding: 10, backgroundColor: "#f0f0f0", borderRadius: 8 }}>
                <Text type="subtitle" style={{ marginBottom: 10 }}>
                    Dynamic UI from JKAJHJAHSHJSH
                </Text>
                <Button title="Refresh Data" onPress={handleSubmit} />
                <View style={{ marginTop: 15 }}>
                    <Text>This entire UI was rendered from a JSON response!</Text>
                </View>
            </View>
        "##;

        let tree = parse_markup(markup).expect("markup parses").to_value();

        assert_eq!(
            tree,
            json!({
                "type": "View",
                "props": { "style": { "padding": 10, "backgroundColor": "#f0f0f0", "borderRadius": 8 } },
                "children": [
                    {
                        "type": "Text",
                        "props": { "type": "subtitle", "style": { "marginBottom": 10 } },
                        "children": "Dynamic UI from JKAJHJAHSHJSH"
                    },
                    { "type": "Button", "props": { "title": "Refresh Data", "onPress": "handleSubmit" } },
                    {
                        "type": "View",
                        "props": { "style": { "marginTop": 15 } },
                        "children": [
                            { "type": "Text", "children": "This entire UI was rendered from a JSON response!" }
                        ]
                    }
                ]
            })
        );
    }

    #[test]
    fn converts_form_inputs_with_nested_style_objects() {
        let markup = r#"
            <View
                style={{
                padding: 16,
                shadowOffset: { width: 0, height: 2 },
                shadowOpacity: 0.2,
                }}
            >
                <Text style={{ fontSize: 16 }}>Password</Text>
                <TextInput
                name="password"
                onChangeText={storeData}
                secureTextEntry={true}
                />
                <Button title="Submit" onPress={handleSubmit} />
            </View>
        "#;

        let tree = parse_markup(markup).expect("markup parses").to_value();

        assert_eq!(
            tree["props"]["style"],
            json!({ "padding": 16, "shadowOffset": { "width": 0, "height": 2 }, "shadowOpacity": 0.2 })
        );
        assert_eq!(
            tree["children"][1],
            json!({
                "type": "TextInput",
                "props": { "name": "password", "onChangeText": "storeData", "secureTextEntry": true }
            })
        );
        assert_eq!(tree["children"][0]["children"], "Password");
    }

    #[test]
    fn welcome_screen_parses() {
        let tree = parse_markup(WELCOME_MARKUP).expect("welcome markup").to_value();

        assert_eq!(tree["type"], "View");
        assert_eq!(tree["children"][0], json!({ "type": "Text", "children": "What do you want do to today?" }));
        assert_eq!(tree["children"][1]["props"]["name"], "message");
        assert_eq!(tree["children"][1]["props"]["onChangeText"], "storeData");
        assert_eq!(tree["children"][2]["props"]["title"], "Let's go!");
        assert_eq!(tree["children"][2]["props"]["onPress"], "handleSubmit");
    }

    #[test]
    fn props_keep_source_order() {
        let tree = parse_markup(r#"<TextInput placeholder="x" name="card" keyboardType="numeric" />"#)
            .expect("parses");
        let keys: Vec<&str> = tree.props.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["placeholder", "name", "keyboardType"]);
    }

    #[test]
    fn text_children_are_collapsed_and_decoded() {
        let tree = parse_markup(
            "<Text>\n  Total:   {89.99}\n  {/* amount due */}&amp; due &lt;today&gt;\n</Text>",
        )
        .expect("parses");

        assert_eq!(tree.children, vec![UiChild::Text("Total: 89.99 & due <today>".to_string())]);
    }

    #[test]
    fn calls_and_arrow_functions_keep_their_source() {
        let tree = parse_markup(r#"<Button title='Pay' onPress={() => handleSubmit("pay")} disabled />"#)
            .expect("parses")
            .to_value();

        assert_eq!(tree["props"]["onPress"], r#"() => handleSubmit("pay")"#);
        assert_eq!(tree["props"]["disabled"], true);
    }

    #[test]
    fn mismatched_closing_tag_reports_offset() {
        let error = parse_markup("<View><Text>hi</View>").expect_err("mismatch");
        assert!(error.message.contains("expected </Text>"));
        assert_eq!(error.offset, 20);
    }

    #[test]
    fn unclosed_and_trailing_content_are_errors() {
        assert!(parse_markup("<View><Text>hi</Text>").is_err());
        assert!(parse_markup("<View /><View />").is_err());
        assert!(parse_markup("Your payment was processed").is_err());
    }

    #[test]
    fn deep_nesting_is_rejected_instead_of_recursing() {
        let depth = 100_000;
        let markup = format!("{}{}", "<View>".repeat(depth), "</View>".repeat(depth));

        let error = parse_markup(&markup).expect_err("too deep");
        assert!(error.message.contains("nesting deeper than 64 levels"));
        assert_eq!(error.offset, MAX_NESTING_DEPTH * "<View>".len());

        let style = format!("<View style={{{}{}}} />", "[".repeat(depth), "]".repeat(depth));
        let tree = parse_markup(&style).expect("deep literals fall back to source text");
        assert!(tree.props["style"].is_string());

        let within = format!("{}{}", "<View>".repeat(MAX_NESTING_DEPTH), "</View>".repeat(MAX_NESTING_DEPTH));
        assert!(parse_markup(&within).is_ok());
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fences("```jsx\n<View />\n```"), "<View />");
        assert_eq!(strip_code_fences("  <View />  "), "<View />");
    }

    #[test]
    fn text_view_wraps_prose() {
        assert_eq!(
            UiNode::text_view("Payment done").to_value(),
            json!({ "type": "View", "children": [{ "type": "Text", "children": "Payment done" }] })
        );
    }
}
