//! Tree display for IR nodes and engine plans.

use std::fmt;

use crate::truncate_string;

/// A node in a display tree.
pub trait TreeNode {
    /// Display name of this node.
    fn name(&self) -> String;

    /// Child nodes, in display order.
    fn children(&self) -> Vec<&dyn TreeNode>;

    /// Additional details shown after the name.
    fn details(&self) -> Option<String> {
        None
    }
}

/// Renders a [`TreeNode`] with box-drawing connectors.
pub struct DisplayTree<'a> {
    root: &'a dyn TreeNode,
    max_details: Option<usize>,
}

impl<'a> DisplayTree<'a> {
    pub fn new(root: &'a dyn TreeNode) -> Self {
        Self {
            root,
            max_details: None,
        }
    }

    /// Truncate node details longer than `width` characters.
    #[must_use]
    pub fn with_max_details(mut self, width: usize) -> Self {
        self.max_details = Some(width);
        self
    }

    fn label(&self, node: &dyn TreeNode) -> String {
        match node.details() {
            Some(details) => {
                let details = match self.max_details {
                    Some(width) => truncate_string(&details, width),
                    None => details,
                };
                format!("{} ({details})", node.name())
            }
            None => node.name(),
        }
    }

    fn fmt_children(
        &self,
        f: &mut fmt::Formatter<'_>,
        node: &dyn TreeNode,
        prefix: &str,
    ) -> fmt::Result {
        let children = node.children();
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            let is_last = i + 1 == count;
            let connector = if is_last { "└─ " } else { "├─ " };
            writeln!(f, "{prefix}{connector}{}", self.label(child))?;
            let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });
            self.fmt_children(f, child, &child_prefix)?;
        }
        Ok(())
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.label(self.root))?;
        self.fmt_children(f, self.root, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        name: &'static str,
        details: Option<&'static str>,
        children: Vec<TestNode>,
    }

    impl TestNode {
        fn leaf(name: &'static str) -> Self {
            Self {
                name,
                details: None,
                children: vec![],
            }
        }
    }

    impl TreeNode for TestNode {
        fn name(&self) -> String {
            self.name.to_string()
        }

        fn children(&self) -> Vec<&dyn TreeNode> {
            self.children.iter().map(|c| c as &dyn TreeNode).collect()
        }

        fn details(&self) -> Option<String> {
            self.details.map(str::to_string)
        }
    }

    #[test]
    fn test_display_tree() {
        let tree = TestNode {
            name: "Add",
            details: Some("int64"),
            children: vec![
                TestNode {
                    name: "Negate",
                    details: None,
                    children: vec![TestNode::leaf("a")],
                },
                TestNode::leaf("b"),
            ],
        };

        let output = DisplayTree::new(&tree).to_string();
        let expected = "Add (int64)\n├─ Negate\n│  └─ a\n└─ b\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_details_truncation() {
        let tree = TestNode {
            name: "Literal",
            details: Some("a very long literal value"),
            children: vec![],
        };
        let output = DisplayTree::new(&tree).with_max_details(8).to_string();
        assert_eq!(output, "Literal (a ver...)\n");
    }
}
