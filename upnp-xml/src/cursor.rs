//! Forward-only document cursor over `quick_xml::Reader`.
//!
//! The cursor maintains a stack of open elements. The deserialize driver
//! descends with [`Cursor::next_child`], consumes scalar content with
//! [`Cursor::text`], and discards unrecognized subtrees with
//! [`Cursor::skip`]; [`Cursor::pop_to`] lets the driver restore a known
//! depth after dispatching to a parse hook, so a hook that under-consumes
//! its element cannot corrupt the rest of the parse.
//!
//! Namespace prefixes are stripped to local names and `xmlns` declarations
//! dropped, so descriptor tables match on plain wire names.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{XmlError, XmlResult};

struct Frame {
    name: String,
    attributes: Vec<(String, String)>,
    empty: bool,
}

/// Forward-only cursor positioned on one element of a parsed document
pub struct Cursor<'x> {
    reader: Reader<&'x [u8]>,
    frames: Vec<Frame>,
}

impl<'x> Cursor<'x> {
    /// Parse the document prolog and position the cursor on the root element
    pub fn new(xml: &'x str) -> XmlResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut cursor = Cursor {
            reader,
            frames: Vec::new(),
        };
        loop {
            match cursor.reader.read_event()? {
                Event::Start(start) => {
                    cursor.push_frame(&start, false)?;
                    return Ok(cursor);
                }
                Event::Empty(start) => {
                    cursor.push_frame(&start, true)?;
                    return Ok(cursor);
                }
                Event::Eof => {
                    return Err(XmlError::Truncated {
                        name: "document".to_string(),
                    })
                }
                Event::End(_) => {
                    return Err(XmlError::decode("document", "end tag before any element"))
                }
                _ => continue,
            }
        }
    }

    fn push_frame(&mut self, start: &BytesStart<'_>, empty: bool) -> XmlResult<()> {
        let name = String::from_utf8_lossy(start.name().local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| XmlError::decode(&name, e))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref());
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            let local = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| XmlError::decode(&name, e))?
                .into_owned();
            attributes.push((local, value));
        }
        self.frames.push(Frame {
            name,
            attributes,
            empty,
        });
        Ok(())
    }

    fn current(&self) -> XmlResult<&Frame> {
        self.frames.last().ok_or_else(|| {
            XmlError::InvalidOperation("cursor has no current element".to_string())
        })
    }

    /// Local name of the element the cursor is positioned on
    pub fn element_name(&self) -> &str {
        self.frames.last().map(|f| f.name.as_str()).unwrap_or("")
    }

    /// Number of elements currently open
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Take the current element's attributes, namespace declarations
    /// excluded; subsequent calls return an empty list
    pub fn take_attributes(&mut self) -> Vec<(String, String)> {
        self.frames
            .last_mut()
            .map(|f| std::mem::take(&mut f.attributes))
            .unwrap_or_default()
    }

    /// Advance to the next child element of the current element.
    ///
    /// Returns `Ok(true)` with the cursor positioned on the child, or
    /// `Ok(false)` once the current element's content is exhausted — the
    /// element is then consumed and the cursor is back on its parent.
    pub fn next_child(&mut self) -> XmlResult<bool> {
        if self.current()?.empty {
            self.frames.pop();
            return Ok(false);
        }
        loop {
            match self.reader.read_event()? {
                Event::Start(start) => {
                    self.push_frame(&start, false)?;
                    return Ok(true);
                }
                Event::Empty(start) => {
                    self.push_frame(&start, true)?;
                    return Ok(true);
                }
                Event::End(_) => {
                    self.frames.pop();
                    return Ok(false);
                }
                Event::Eof => {
                    return Err(XmlError::Truncated {
                        name: self.element_name().to_string(),
                    })
                }
                _ => continue,
            }
        }
    }

    /// Consume the current element and return its text content.
    ///
    /// Nested markup inside scalar content is skipped rather than rejected;
    /// a self-closing element yields an empty string. Afterwards the cursor
    /// is back on the parent element.
    pub fn text(&mut self) -> XmlResult<String> {
        if self.current()?.empty {
            self.frames.pop();
            return Ok(String::new());
        }
        let mut content = String::new();
        loop {
            match self.reader.read_event()? {
                Event::Text(text) => {
                    let name = self.element_name().to_string();
                    content.push_str(&text.unescape().map_err(|e| XmlError::decode(name, e))?);
                }
                Event::CData(cdata) => {
                    content.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
                Event::Start(start) => {
                    self.push_frame(&start, false)?;
                    self.skip()?;
                }
                Event::End(_) => {
                    self.frames.pop();
                    return Ok(content);
                }
                Event::Eof => {
                    return Err(XmlError::Truncated {
                        name: self.element_name().to_string(),
                    })
                }
                _ => continue,
            }
        }
    }

    /// Consume the current element including its whole subtree; the cursor
    /// ends up back on the parent element
    pub fn skip(&mut self) -> XmlResult<()> {
        if self.current()?.empty {
            self.frames.pop();
            return Ok(());
        }
        let mut nested = 0usize;
        loop {
            match self.reader.read_event()? {
                Event::Start(_) => nested += 1,
                Event::End(_) => {
                    if nested == 0 {
                        self.frames.pop();
                        return Ok(());
                    }
                    nested -= 1;
                }
                Event::Eof => {
                    return Err(XmlError::Truncated {
                        name: self.element_name().to_string(),
                    })
                }
                _ => continue,
            }
        }
    }

    /// Consume open elements until the stack is back to `depth`
    pub fn pop_to(&mut self, depth: usize) -> XmlResult<()> {
        while self.frames.len() > depth {
            self.skip()?;
        }
        Ok(())
    }
}
