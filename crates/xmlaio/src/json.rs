//! JSON-shaped encoding of the sink primitives.
//!
//! Elements become objects, attributes become `"@name"` keys, text
//! content becomes `"$"`, and a text-only element with no attributes
//! collapses to a plain string. Sequences force an array even for a
//! single item; repeated same-named children outside a sequence are
//! folded into an array as well. Verbatim fragments land under the
//! reserved `"$xml"` key since they are opaque to this encoding.

use std::io::Write;

use serde_json::{Map, Value, json};

use crate::errors::{Result, SinkError};
use crate::sink::{SinkEncoding, XmlaSink};

enum Frame {
    Element {
        name: String,
        map: Map<String, Value>,
        text: Option<String>,
    },
    Sequence {
        name: String,
        items: Vec<Value>,
    },
}

/// JSON-encoded sink. The tree is buffered and written on
/// [`XmlaSink::flush`].
pub struct JsonSink<W: Write> {
    out: W,
    stack: Vec<Frame>,
    root: Option<Value>,
    root_name: Option<String>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> JsonSink<W> {
        JsonSink {
            out,
            stack: Vec::new(),
            root: None,
            root_name: None,
        }
    }

    fn insert_child(&mut self, name: &str, value: Value) {
        match self.stack.last_mut() {
            Some(Frame::Element { map, .. }) => match map.get_mut(name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let prior = existing.take();
                    *existing = Value::Array(vec![prior, value]);
                }
                None => {
                    map.insert(name.to_string(), value);
                }
            },
            Some(Frame::Sequence { items, .. }) => items.push(value),
            None => {
                self.root_name = Some(name.to_string());
                self.root = Some(value);
            }
        }
    }
}

fn element_value(map: Map<String, Value>, text: Option<String>) -> Value {
    match text {
        Some(text) if map.is_empty() => Value::String(text),
        Some(text) => {
            let mut map = map;
            map.insert("$".to_string(), Value::String(text));
            Value::Object(map)
        }
        None => Value::Object(map),
    }
}

impl<W: Write> XmlaSink for JsonSink<W> {
    fn encoding(&self) -> SinkEncoding {
        SinkEncoding::Json
    }

    fn start_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut map = Map::new();
        for (k, v) in attrs {
            map.insert(format!("@{}", k), Value::String((*v).to_string()));
        }
        self.stack.push(Frame::Element {
            name: name.to_string(),
            map,
            text: None,
        });
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Element {
                name: open,
                map,
                text,
            }) if open == name => {
                let value = element_value(map, text);
                self.insert_child(name, value);
                Ok(())
            }
            Some(frame) => {
                let open = match &frame {
                    Frame::Element { name, .. } | Frame::Sequence { name, .. } => name.clone(),
                };
                self.stack.push(frame);
                Err(SinkError::Unbalanced {
                    closing: name.to_string(),
                    open,
                })
            }
            None => Err(SinkError::NoOpenElement),
        }
    }

    fn start_sequence(&mut self, name: &str) -> Result<()> {
        self.stack.push(Frame::Sequence {
            name: name.to_string(),
            items: Vec::new(),
        });
        Ok(())
    }

    fn end_sequence(&mut self, name: &str) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Sequence { name: open, items }) if open == name => {
                self.insert_child(name, Value::Array(items));
                Ok(())
            }
            Some(frame) => {
                let open = match &frame {
                    Frame::Element { name, .. } | Frame::Sequence { name, .. } => name.clone(),
                };
                self.stack.push(frame);
                Err(SinkError::Unbalanced {
                    closing: name.to_string(),
                    open,
                })
            }
            None => Err(SinkError::NoOpenElement),
        }
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Element { text: slot, .. }) => {
                match slot {
                    Some(existing) => existing.push_str(text),
                    None => *slot = Some(text.to_string()),
                }
                Ok(())
            }
            _ => Err(SinkError::NoOpenElement),
        }
    }

    fn verbatim(&mut self, fragment: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Element { map, .. }) => {
                map.insert("$xml".to_string(), Value::String(fragment.to_string()));
                Ok(())
            }
            _ => Err(SinkError::NoOpenElement),
        }
    }

    fn finish(&mut self) -> Result<()> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Element { name, map, text } => {
                    let value = element_value(map, text);
                    self.insert_child(&name, value);
                }
                Frame::Sequence { name, items } => {
                    self.insert_child(&name, Value::Array(items));
                }
            }
        }
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        if let (Some(name), Some(value)) = (self.root_name.take(), self.root.take()) {
            let doc = json!({ name: value });
            serde_json::to_writer(&mut self.out, &doc)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F>(f: F) -> Value
    where
        F: FnOnce(&mut JsonSink<&mut Vec<u8>>),
    {
        let mut out = Vec::new();
        {
            let mut sink = JsonSink::new(&mut out);
            f(&mut sink);
            sink.finish().unwrap();
        }
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn attrs_and_text() {
        let doc = render(|s| {
            s.start_element("root", &[("name", "Sales")]).unwrap();
            s.text_element("caption", &[], "Sales Cube").unwrap();
            s.end_element("root").unwrap();
        });
        assert_eq!(
            doc,
            serde_json::json!({
                "root": { "@name": "Sales", "caption": "Sales Cube" }
            })
        );
    }

    #[test]
    fn sequences_become_arrays() {
        let doc = render(|s| {
            s.start_element("rows", &[]).unwrap();
            s.start_sequence("row").unwrap();
            s.text_element("row", &[], "1").unwrap();
            s.end_sequence("row").unwrap();
            s.end_element("rows").unwrap();
        });
        assert_eq!(doc, serde_json::json!({ "rows": { "row": ["1"] } }));
    }

    #[test]
    fn repeated_children_fold_into_arrays() {
        let doc = render(|s| {
            s.start_element("rows", &[]).unwrap();
            s.text_element("row", &[], "1").unwrap();
            s.text_element("row", &[], "2").unwrap();
            s.end_element("rows").unwrap();
        });
        assert_eq!(doc, serde_json::json!({ "rows": { "row": ["1", "2"] } }));
    }
}
