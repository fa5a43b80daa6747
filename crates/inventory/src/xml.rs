//! 최소 XML 요소 트리
//!
//! 인벤토리 문서에 필요한 만큼만 다룹니다. 요소는 자식 요소 또는 텍스트 중
//! 하나만 가지며(혼합 콘텐츠 없음), 속성은 입력 순서를 유지합니다.
//! 텍스트와 속성 값에서 XML 1.0이 허용하지 않는 문자는 쓰기 전에 제거합니다.
//! 읽기/쓰기는 `quick-xml`의 `Reader`/`Writer`를 사용합니다.

use std::borrow::Cow;
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

use crate::error::InventoryError;

const INDENT_SIZE: usize = 2;

/// XML 요소
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: Option<String>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// 이름이 겹치는 속성은 나중 값이 남습니다.
    pub fn with_attributes(mut self, attributes: &[(String, String)]) -> Self {
        for (name, value) in attributes {
            self.set_attribute(name, value.as_str());
        }
        self
    }

    /// 같은 이름의 속성이 있으면 값을 바꾸고, 없으면 끝에 추가합니다.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_owned(), value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// 들여쓰기된 XML 문자열로 렌더링합니다.
    pub fn render(&self, declaration: bool) -> Result<String, InventoryError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);
        if declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
                .map_err(xml_err)?;
        }
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner()).map_err(xml_err)
    }

    /// XML 문서를 파싱해 루트 요소를 반환합니다.
    pub fn parse(xml: &str) -> Result<Self, InventoryError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event().map_err(xml_err)? {
                Event::Start(e) => {
                    if root.is_some() {
                        return Err(InventoryError::Xml("multiple root elements".to_owned()));
                    }
                    stack.push(element_from_start(&e)?);
                }
                Event::Empty(e) => {
                    let element = element_from_start(&e)?;
                    attach(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| InventoryError::Xml("unexpected closing tag".to_owned()))?;
                    attach(element, &mut stack, &mut root)?;
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(xml_err)?;
                    append_text(&mut stack, &text);
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    append_text(&mut stack, &text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(InventoryError::Xml(format!(
                "element <{}> is not closed",
                open.name
            )));
        }
        root.ok_or_else(|| InventoryError::Xml("document has no root element".to_owned()))
    }
}

/// XML 1.0 `Char` 생성 규칙에 속하는 문자인지 검사합니다.
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// XML 1.0에서 쓸 수 없는 문자를 제거합니다.
///
/// 제어 문자는 이스케이프해도 허용되지 않습니다 (탭, 줄바꿈, CR 제외).
pub fn strip_invalid_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn xml_err(e: impl std::fmt::Display) -> InventoryError {
    InventoryError::Xml(e.to_string())
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
) -> Result<(), InventoryError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), strip_invalid_chars(value).as_ref()));
    }

    if element.children.is_empty() {
        match element.text.as_deref().filter(|t| !t.is_empty()) {
            Some(text) => {
                let text = strip_invalid_chars(text);
                writer.write_event(Event::Start(start)).map_err(xml_err)?;
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(xml_err)?;
                writer
                    .write_event(Event::End(BytesEnd::new(element.name.as_str())))
                    .map_err(xml_err)?;
            }
            None => writer.write_event(Event::Empty(start)).map_err(xml_err)?,
        }
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_err)?;
    Ok(())
}

fn element_from_start(e: &BytesStart<'_>) -> Result<XmlElement, InventoryError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        element.attributes.push((name, value));
    }
    Ok(element)
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<(), InventoryError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(InventoryError::Xml("multiple root elements".to_owned())),
    }
    Ok(())
}

fn append_text(stack: &mut [XmlElement], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        current.text.get_or_insert_with(String::new).push_str(text);
    }
}
