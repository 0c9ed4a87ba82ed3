use protofilter_domain::model::Comments;

const INDENT: &str = "  ";

/// Line-oriented text sink with indentation and comment placement.
#[derive(Debug, Default)]
pub(crate) struct Printer {
    out: String,
    depth: usize,
    block_start: bool,
}

impl Printer {
    pub(crate) fn finish(self) -> String {
        self.out
    }

    pub(crate) fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
        self.block_start = false;
    }

    /// Separate the next definition with one empty line, unless it is the
    /// first thing in the file or in a block.
    pub(crate) fn blank(&mut self) {
        if self.out.is_empty() || self.block_start || self.out.ends_with("\n\n") {
            return;
        }
        self.out.push('\n');
    }

    /// Detached and leading comments, above an element.
    pub(crate) fn leading(&mut self, comments: &Comments) {
        for block in &comments.detached {
            self.comment_block(block);
            self.out.push('\n');
        }
        if let Some(text) = &comments.leading {
            self.comment_block(text);
        }
    }

    /// A single-line statement with its comments.
    pub(crate) fn statement(&mut self, text: &str, comments: &Comments) {
        self.leading(comments);
        self.with_trailing(text, comments);
    }

    /// Opens `header {` and indents what follows.
    pub(crate) fn open(&mut self, header: &str, comments: &Comments) {
        self.leading(comments);
        let text = format!("{header} {{");
        let trailing_lines = comments.trailing.as_deref().map(comment_lines);
        match trailing_lines.as_deref() {
            Some([single]) => self.line(&format!("{text} //{single}")),
            Some(lines) => {
                self.line(&text);
                self.depth += 1;
                for l in lines {
                    self.line(&format!("//{l}"));
                }
                self.depth -= 1;
            }
            None => self.line(&text),
        }
        self.depth += 1;
        self.block_start = true;
    }

    pub(crate) fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn with_trailing(&mut self, text: &str, comments: &Comments) {
        let Some(trailing) = comments.trailing.as_deref() else {
            self.line(text);
            return;
        };
        match comment_lines(trailing).as_slice() {
            [single] => self.line(&format!("{text} //{single}")),
            lines => {
                self.line(text);
                for l in lines {
                    self.line(&format!("//{l}"));
                }
            }
        }
    }

    fn comment_block(&mut self, text: &str) {
        for l in comment_lines(text) {
            self.line(&format!("//{l}"));
        }
    }
}

/// Comment text as recorded in source info ends with a newline; each line
/// becomes one `//` line.
fn comment_lines(text: &str) -> Vec<&str> {
    text.strip_suffix('\n').unwrap_or(text).split('\n').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_lines_drop_final_newline_only() {
        assert_eq!(comment_lines(" a\n b\n"), vec![" a", " b"]);
        assert_eq!(comment_lines(" a\n\n b\n"), vec![" a", "", " b"]);
        assert_eq!(comment_lines("x"), vec!["x"]);
    }

    #[test]
    fn blank_is_suppressed_at_block_start_and_after_blank() {
        let mut p = Printer::default();
        p.blank();
        p.open("message A", &Comments::default());
        p.blank();
        p.line("int32 a = 1;");
        p.blank();
        p.blank();
        p.line("int32 b = 2;");
        p.close();

        assert_eq!(p.finish(), "message A {\n  int32 a = 1;\n\n  int32 b = 2;\n}\n");
    }

    #[test]
    fn multi_line_trailing_comment_goes_below_statement() {
        let mut p = Printer::default();
        p.statement(
            "int32 a = 1;",
            &Comments {
                trailing: Some(" one\n two\n".to_string()),
                ..Comments::default()
            },
        );
        assert_eq!(p.finish(), "int32 a = 1;\n// one\n// two\n");
    }

    #[test]
    fn detached_blocks_are_followed_by_an_empty_line() {
        let mut p = Printer::default();
        p.leading(&Comments {
            detached: vec![" license\n".to_string()],
            leading: Some(" doc\n".to_string()),
            trailing: None,
        });
        assert_eq!(p.finish(), "// license\n\n// doc\n");
    }
}
