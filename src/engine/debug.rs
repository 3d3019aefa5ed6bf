//! Developer tools
//!
//! - [`TreePrinter`] pretty-prints a [`MatchDetail`] tree
//! - [`AutomatonVisualizer`] renders an [`Automaton`] as GraphViz DOT or
//!   Mermaid

use super::automaton::{Automaton, Tag};
use super::result::MatchDetail;
use super::window::CodeUnit;
use std::fmt::{self, Write};

/// Match tree pretty printer
///
/// ```text
/// date "2024-02-29" @ 0..10
///   year "2024" @ 0..4
///   month "02" @ 5..7
///   day "29" @ 8..10
/// ```
pub struct TreePrinter {
    /// Indentation string
    indent: String,
    /// Maximum depth to print
    max_depth: Option<usize>,
}

impl TreePrinter {
    /// Create a new tree printer
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
        }
    }

    /// Set the indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set the maximum depth to print
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Render `detail` and its components
    pub fn print<U: CodeUnit>(&self, detail: &MatchDetail<'_, U>) -> String {
        let mut output = String::new();
        // writing to a String cannot fail
        let _ = self.print_node(detail, 0, &mut output);
        output
    }

    fn print_node<U: CodeUnit>(
        &self,
        detail: &MatchDetail<'_, U>,
        depth: usize,
        output: &mut String,
    ) -> fmt::Result {
        let indent = self.indent.repeat(depth);

        if let Some(max) = self.max_depth {
            if depth > max {
                return writeln!(output, "{}...", indent);
            }
        }

        writeln!(
            output,
            "{}{} {:?} @ {}..{}",
            indent,
            detail.name().unwrap_or("_"),
            detail.value.to_string_lossy(),
            detail.value.start(),
            detail.value.end()
        )?;

        for component in &detail.components {
            self.print_node(component, depth + 1, output)?;
        }
        Ok(())
    }
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Automaton visualizer
pub struct AutomatonVisualizer<'a> {
    automaton: &'a Automaton,
    as_hex: bool,
}

impl<'a> AutomatonVisualizer<'a> {
    /// Create a new automaton visualizer
    pub fn new(automaton: &'a Automaton) -> Self {
        Self {
            automaton,
            as_hex: false,
        }
    }

    /// Label transitions with hex escapes only
    pub fn hex_labels(mut self, as_hex: bool) -> Self {
        self.as_hex = as_hex;
        self
    }

    /// Generate a GraphViz DOT diagram
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        let _ = self.write_dot(&mut output);
        output
    }

    /// Generate a Mermaid diagram
    pub fn to_mermaid(&self) -> String {
        let mut output = String::new();
        let _ = self.write_mermaid(&mut output);
        output
    }

    fn write_dot(&self, output: &mut String) -> fmt::Result {
        let a = self.automaton;
        output.push_str("digraph Automaton {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=circle];\n");

        for node in a.nodes() {
            let i = node.id().index();
            let shape = if node.is_end() { ", shape=doublecircle" } else { "" };
            writeln!(
                output,
                "  n{} [label=\"{}\"{}];",
                i,
                dot_escape(&self.node_label(node.id().index(), node.tag())),
                shape
            )?;

            for t in node.transitions() {
                let label = a.matcher(t.matcher).describe(self.as_hex);
                writeln!(
                    output,
                    "  n{} -> n{} [label=\"{}\"];",
                    i,
                    t.target.index(),
                    dot_escape(&label)
                )?;
            }
            for (priority, target) in node.epsilons().iter().enumerate() {
                writeln!(
                    output,
                    "  n{} -> n{} [label=\"ε{}\", style=dashed];",
                    i,
                    target.index(),
                    priority
                )?;
            }
        }

        writeln!(
            output,
            "  n{} [style=filled, fillcolor=lightblue];",
            a.start().index()
        )?;
        output.push_str("}\n");
        Ok(())
    }

    fn write_mermaid(&self, output: &mut String) -> fmt::Result {
        let a = self.automaton;
        output.push_str("graph LR\n");

        for node in a.nodes() {
            let i = node.id().index();
            let label = mermaid_escape(&self.node_label(i, node.tag()));
            if node.is_end() {
                writeln!(output, "  n{}((\"{}\"))", i, label)?;
            } else {
                writeln!(output, "  n{}[\"{}\"]", i, label)?;
            }

            for t in node.transitions() {
                let label = a.matcher(t.matcher).describe(self.as_hex);
                writeln!(
                    output,
                    "  n{} -->|\"{}\"| n{}",
                    i,
                    mermaid_escape(&label),
                    t.target.index()
                )?;
            }
            for target in node.epsilons() {
                writeln!(output, "  n{} -.-> n{}", i, target.index())?;
            }
        }

        writeln!(output, "  start([start]) --> n{}", a.start().index())?;
        Ok(())
    }

    fn node_label(&self, index: usize, tag: Option<Tag>) -> String {
        match tag {
            Some(Tag::Open(g)) => format!("{} <{}", index, self.automaton.group_name(g)),
            Some(Tag::Close(g)) => format!("{} {}>", index, self.automaton.group_name(g)),
            None => index.to_string(),
        }
    }
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn mermaid_escape(s: &str) -> String {
    s.replace('"', "#quot;")
        .replace('<', "#lt;")
        .replace('>', "#gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dsl::{choice, class, lit, named, seq};
    use crate::engine::matcher::CharClass;
    use crate::engine::window::StringWindow;

    #[test]
    fn test_tree_printer() {
        let rule = named(
            "pair",
            seq(vec![
                named("key", class(CharClass::Alpha).many1()).unwrap(),
                lit("="),
                named("value", class(CharClass::Digit).many1()).unwrap(),
            ]),
        )
        .unwrap();
        let buf: Vec<char> = "ab=12".chars().collect();
        let detail = rule.at_start_of(StringWindow::new(&buf)).result.unwrap();

        let output = TreePrinter::new().print(&detail);
        assert_eq!(
            output,
            "pair \"ab=12\" @ 0..5\n  key \"ab\" @ 0..2\n  value \"12\" @ 3..5\n"
        );

        let shallow = TreePrinter::new().indent("-").max_depth(0).print(&detail);
        assert_eq!(shallow, "pair \"ab=12\" @ 0..5\n-...\n-...\n");
    }

    #[test]
    fn test_dot_lists_every_node() {
        let rule = choice(vec![lit("a"), named("b", lit("\"")).unwrap()]).unwrap();
        let automaton = rule.automaton();
        let dot = AutomatonVisualizer::new(automaton).to_dot();

        assert!(dot.starts_with("digraph Automaton {"));
        for node in automaton.nodes() {
            assert!(dot.contains(&format!("  n{} [label=", node.id().index())));
        }
        assert!(dot.contains("doublecircle"));
        assert!(dot.contains("style=dashed"));
        assert!(dot.contains("%x22"));
    }

    #[test]
    fn test_mermaid() {
        let rule = named("x", lit("ab")).unwrap();
        let automaton = rule.automaton();
        let mermaid = AutomatonVisualizer::new(automaton).hex_labels(true).to_mermaid();

        assert!(mermaid.starts_with("graph LR\n"));
        assert!(mermaid.contains("#lt;x"));
        assert!(mermaid.contains("%x61"));
        assert!(mermaid.contains("-.->"));
        assert!(mermaid.contains("start([start])"));
    }
}
