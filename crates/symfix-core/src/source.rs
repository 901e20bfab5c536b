use crate::error::SyntaxError;
use crate::parser;
use crate::tree::SyntaxTree;

/// One file being rewritten: the original text and the tree built from it.
///
/// The text is never modified. Rewrites happen on the tree, and the printer
/// produces a new string.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub text: String,
    pub tree: SyntaxTree,
}

impl SourceFile {
    pub fn parse(text: impl Into<String>) -> Result<Self, SyntaxError> {
        let text = text.into();
        let tree = parser::parse(&text)?;
        Ok(Self { text, tree })
    }

    /// Whitespace and comments in front of a node
    pub fn leading_trivia(&self, id: crate::NodeId) -> &str {
        let data = self.tree.data(id);
        match (data.trivia_start, data.range) {
            (Some(start), Some(range)) if start <= range.start => {
                &self.text[start as usize..range.start_offset()]
            }
            _ => "",
        }
    }

    /// Current source text of a node, `None` for constructed nodes
    pub fn text_of(&self, id: crate::NodeId) -> Option<&str> {
        self.tree.text(id, &self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn test_leading_trivia() {
        let file = SourceFile::parse("<?php\n/** doc */\nfoo();").unwrap();
        let statement = file
            .tree
            .descendants(file.tree.root())
            .into_iter()
            .find(|id| file.tree.kind(*id) == NodeKind::ExpressionStatement)
            .unwrap();
        assert_eq!(file.leading_trivia(statement), "\n/** doc */\n");
        assert_eq!(file.text_of(statement), Some("foo();"));
    }
}
