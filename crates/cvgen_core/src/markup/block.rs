//! Typeset block tree and its LaTeX text rendering.

use std::fmt::Write;

/// Label style of a list container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    /// Bullet points parsed from `- ` lines.
    Bullet,
    /// Container for nested sub-items.
    Dash,
}

impl ListStyle {
    fn options(self) -> &'static str {
        match self {
            Self::Bullet => r"label=\textbullet,leftmargin=*",
            Self::Dash => "label=-,leftmargin=*",
        }
    }
}

/// One typeset element.
///
/// Text and command arguments hold finished markup: escaping happens before
/// a block is built, never during rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `\name{arg}{arg}...`
    Command { name: &'static str, args: Vec<String> },
    /// Literal markup line.
    Text(String),
    LineBreak,
    /// One entry per `\item`.
    List { style: ListStyle, entries: Vec<Vec<Block>> },
    /// Box that keeps nested formatting together.
    MiniPage { width: String, body: Vec<Block> },
}

impl Block {
    pub fn command(name: &'static str, arg: impl Into<String>) -> Self {
        Self::Command {
            name,
            args: vec![arg.into()],
        }
    }

    pub fn render(&self, out: &mut String) {
        match self {
            Self::Command { name, args } => {
                out.push('\\');
                out.push_str(name);
                for arg in args {
                    let _ = write!(out, "{{{arg}}}");
                }
                out.push('\n');
            }
            Self::Text(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Self::LineBreak => out.push_str("\\newline\n"),
            Self::List { style, entries } => {
                let _ = writeln!(out, "\\begin{{enumerate}}[{}]", style.options());
                for entry in entries {
                    out.push_str("\\item ");
                    if entry.is_empty() {
                        out.push('\n');
                    }
                    render_blocks(entry, out);
                }
                out.push_str("\\end{enumerate}\n");
            }
            Self::MiniPage { width, body } => {
                let _ = writeln!(out, "\\begin{{minipage}}{{{width}}}");
                render_blocks(body, out);
                out.push_str("\\end{minipage}\n");
            }
        }
    }
}

pub fn render_blocks(blocks: &[Block], out: &mut String) {
    for block in blocks {
        block.render(out);
    }
}

#[cfg(test)]
mod tests {
    use super::{render_blocks, Block, ListStyle};

    #[test]
    fn renders_commands_lists_and_minipages() {
        let blocks = vec![
            Block::command("runsubsection", "Engineer"),
            Block::LineBreak,
            Block::List {
                style: ListStyle::Dash,
                entries: vec![vec![Block::MiniPage {
                    width: r"\linewidth".to_string(),
                    body: vec![Block::Text("inner".to_string())],
                }]],
            },
        ];
        let mut out = String::new();
        render_blocks(&blocks, &mut out);
        assert_eq!(
            out,
            "\\runsubsection{Engineer}\n\\newline\n\\begin{enumerate}[label=-,leftmargin=*]\n\\item \\begin{minipage}{\\linewidth}\ninner\n\\end{minipage}\n\\end{enumerate}\n"
        );
    }

    #[test]
    fn renders_multi_argument_commands() {
        let mut out = String::new();
        Block::Command {
            name: "namesection",
            args: vec!["Ada".to_string(), "Lovelace".to_string(), String::new()],
        }
        .render(&mut out);
        assert_eq!(out, "\\namesection{Ada}{Lovelace}{}\n");
    }
}
