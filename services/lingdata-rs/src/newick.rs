//! Newick parsing for the Glottolog classification.
//!
//! Glottolog publishes its forest as one Newick tree per top-level family,
//! with labels such as `'Abkhaz [abkh1244][abk]-l-':1`. Parsing is done with
//! explicit stacks so arbitrarily deep classifications cannot overflow.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A raw Newick node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewickNode {
    pub label: String,
    pub length: Option<f64>,
    pub children: Vec<NewickNode>,
}

impl Drop for NewickNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// A node of the Glottolog tree description.
///
/// Also the shape of the nested JSON export of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub glottocode: String,
    #[serde(default)]
    pub iso_639_3: Option<String>,
    /// Label carried the `-l-` language marker.
    #[serde(default)]
    pub language: bool,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(glottocode: &str) -> Self {
        Self {
            name: String::new(),
            glottocode: glottocode.to_string(),
            iso_639_3: None,
            language: false,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }
}

impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b',' | b':' | b';') || b.is_ascii_whitespace()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn error(&self, message: &'static str) -> Error {
        Error::NewickSyntax {
            position: self.pos,
            message,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn label(&mut self) -> Result<String> {
        self.skip_whitespace();
        if self.peek() != Some(b'\'') {
            let start = self.pos;
            while self.peek().is_some_and(|b| !is_delimiter(b)) {
                self.pos += 1;
            }
            return Ok(self.text[start..self.pos].replace('_', " "));
        }

        self.pos += 1;
        let mut label = String::new();
        loop {
            let start = self.pos;
            while self.peek().is_some_and(|b| b != b'\'') {
                self.pos += 1;
            }
            label.push_str(&self.text[start..self.pos]);
            if self.peek().is_none() {
                return Err(self.error("unterminated quoted label"));
            }
            self.pos += 1;
            // '' inside a quoted label is an escaped quote
            if self.peek() == Some(b'\'') {
                label.push('\'');
                self.pos += 1;
            } else {
                return Ok(label);
            }
        }
    }

    fn length(&mut self) -> Result<Option<f64>> {
        self.skip_whitespace();
        if self.peek() != Some(b':') {
            return Ok(None);
        }
        self.pos += 1;
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|b| !is_delimiter(b)) {
            self.pos += 1;
        }
        self.text[start..self.pos]
            .parse::<f64>()
            .map(Some)
            .map_err(|_| self.error("invalid branch length"))
    }

    fn node(&mut self, children: Vec<NewickNode>) -> Result<NewickNode> {
        let label = self.label()?;
        let length = self.length()?;
        Ok(NewickNode {
            label,
            length,
            children,
        })
    }

    fn forest(&mut self) -> Result<Vec<NewickNode>> {
        let mut trees = Vec::new();
        let mut open: Vec<Vec<NewickNode>> = Vec::new();
        let mut current: Option<NewickNode> = None;

        loop {
            self.skip_whitespace();
            let Some(b) = self.peek() else { break };
            match b {
                b'(' => {
                    if current.is_some() {
                        return Err(self.error("unexpected '('"));
                    }
                    open.push(Vec::new());
                    self.pos += 1;
                }
                b',' => {
                    let Some(siblings) = open.last_mut() else {
                        return Err(self.error("',' outside parentheses"));
                    };
                    siblings.push(current.take().unwrap_or_default());
                    self.pos += 1;
                }
                b')' => {
                    let Some(mut children) = open.pop() else {
                        return Err(self.error("unbalanced ')'"));
                    };
                    children.push(current.take().unwrap_or_default());
                    self.pos += 1;
                    current = Some(self.node(children)?);
                }
                b';' => {
                    if !open.is_empty() {
                        return Err(self.error("unclosed '(' before ';'"));
                    }
                    trees.push(current.take().unwrap_or_default());
                    self.pos += 1;
                }
                _ => {
                    if current.is_some() {
                        return Err(self.error("unexpected label"));
                    }
                    current = Some(self.node(Vec::new())?);
                }
            }
        }

        if !open.is_empty() || current.is_some() {
            return Err(self.error("missing ';' at end of tree"));
        }
        Ok(trees)
    }
}

/// Parse every `;`-terminated tree in `text`.
pub fn parse_forest(text: &str) -> Result<Vec<NewickNode>> {
    Parser { text, pos: 0 }.forest()
}

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^'?(?P<name>.*) \[(?P<glottocode>[a-z0-9]{8})\](?:\[(?P<iso>[a-z]{3})\])?(?P<language>-l-)?'?$",
        )
        .expect("static regex")
    })
}

/// Split a Glottolog label into a childless [`TreeNode`].
pub fn parse_label(label: &str) -> Result<TreeNode> {
    let caps = label_pattern()
        .captures(label.trim())
        .ok_or_else(|| Error::InvalidLabel(label.to_string()))?;

    Ok(TreeNode {
        name: caps["name"].to_string(),
        glottocode: caps["glottocode"].to_string(),
        iso_639_3: caps.name("iso").map(|m| m.as_str().to_string()),
        language: caps.name("language").is_some(),
        children: Vec::new(),
    })
}

enum Frame {
    Enter(NewickNode),
    Exit { node: TreeNode, n_children: usize },
}

impl TryFrom<NewickNode> for TreeNode {
    type Error = Error;

    fn try_from(root: NewickNode) -> Result<TreeNode> {
        let mut work = vec![Frame::Enter(root)];
        let mut done: Vec<TreeNode> = Vec::new();

        while let Some(frame) = work.pop() {
            match frame {
                Frame::Enter(mut raw) => {
                    let node = parse_label(&raw.label)?;
                    let children = std::mem::take(&mut raw.children);
                    work.push(Frame::Exit {
                        node,
                        n_children: children.len(),
                    });
                    work.extend(children.into_iter().rev().map(Frame::Enter));
                }
                Frame::Exit {
                    mut node,
                    n_children,
                } => {
                    node.children = done.split_off(done.len() - n_children);
                    done.push(node);
                }
            }
        }

        done.pop()
            .ok_or_else(|| Error::InvalidLabel(String::new()))
    }
}

/// Parse a Glottolog Newick export into tree descriptions.
pub fn parse_glottolog(text: &str) -> Result<Vec<TreeNode>> {
    parse_forest(text)?
        .into_iter()
        .map(TreeNode::try_from)
        .collect()
}
