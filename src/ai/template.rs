//! Named-placeholder prompt templates
//!
//! `{name}` is replaced by a value, `{{` and `}}` are literal braces. A
//! placeholder without a value or a stray brace is a template error; nothing is
//! ever left unfilled in a prompt sent to the model.

use std::collections::BTreeMap;

use crate::error::TriageError;

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    partials: BTreeMap<String, String>,
}

enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            partials: BTreeMap::new(),
        }
    }

    /// Bind a variable ahead of rendering (e.g. format instructions)
    pub fn partial(mut self, name: &str, value: impl Into<String>) -> Self {
        self.partials.insert(name.to_string(), value.into());
        self
    }

    /// Placeholder names in order of first appearance
    #[cfg(test)]
    pub fn placeholders(&self) -> Result<Vec<&str>, TriageError> {
        let mut names = Vec::new();
        for segment in self.segments()? {
            if let Segment::Placeholder(name) = segment
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Fill every placeholder from `vars`, falling back to partials.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String, TriageError> {
        let mut out = String::with_capacity(self.template.len());
        for segment in self.segments()? {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = vars
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| *v)
                        .or_else(|| self.partials.get(name).map(String::as_str))
                        .ok_or_else(|| {
                            TriageError::Template(format!("no value for placeholder {{{}}}", name))
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    fn segments(&self) -> Result<Vec<Segment<'_>>, TriageError> {
        let src = self.template.as_str();
        let bytes = src.as_bytes();
        let mut segments = Vec::new();
        let mut text_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' if bytes.get(i + 1) == Some(&b'{') => {
                    segments.push(Segment::Text(&src[text_start..i + 1]));
                    i += 2;
                    text_start = i;
                }
                b'}' if bytes.get(i + 1) == Some(&b'}') => {
                    segments.push(Segment::Text(&src[text_start..i + 1]));
                    i += 2;
                    text_start = i;
                }
                b'{' => {
                    let close = src[i + 1..].find('}').ok_or_else(|| {
                        TriageError::Template(format!("unclosed '{{' at byte {}", i))
                    })?;
                    let name = &src[i + 1..i + 1 + close];
                    if name.is_empty()
                        || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
                    {
                        return Err(TriageError::Template(format!(
                            "invalid placeholder '{{{}}}'",
                            name
                        )));
                    }
                    segments.push(Segment::Text(&src[text_start..i]));
                    segments.push(Segment::Placeholder(name));
                    i += close + 2;
                    text_start = i;
                }
                b'}' => {
                    return Err(TriageError::Template(format!(
                        "unmatched '}}' at byte {}",
                        i
                    )));
                }
                _ => i += 1,
            }
        }
        segments.push(Segment::Text(&src[text_start..]));
        Ok(segments)
    }
}
