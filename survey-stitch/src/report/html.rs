//! Human-readable HTML report
//!
//! Each client block opens and closes with a rule; every field is a heading
//! followed by its answer in a preformatted block.

use crate::error::Result;
use crate::stitch::Report;
use std::fmt::Write as _;
use std::path::Path;

const PAGE_HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<style>
pre{
    white-space: pre-wrap;
}
</style>
</head>
<body>
<div>
"#;

const PAGE_TAIL: &str = "</div>\n</body>\n</html>\n";

pub fn render(report: &Report) -> String {
    let mut page = String::from(PAGE_HEAD);
    for object in &report.result.objects {
        let last = object.responses.len().saturating_sub(1);
        for (idx, response) in object.responses.iter().enumerate() {
            if idx == 0 {
                page.push_str("<hr />\n");
            }
            let _ = writeln!(page, "\t<h4>{}</h4>", escape(&response.question));
            let _ = writeln!(page, "\t<pre>{}</pre>", escape(&response.answer));
            if idx == last {
                page.push_str("<hr />\n");
            }
        }
    }
    page.push_str(PAGE_TAIL);
    page
}

pub fn write(report: &Report, path: &Path) -> Result<()> {
    std::fs::write(path, render(report))?;
    Ok(())
}

/// Escape text for element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stitch::{Response, StitchObject, StitchResult};

    fn report(answers: &[&[(&str, &str)]]) -> Report {
        Report {
            header: Vec::new(),
            result: StitchResult {
                objects: answers
                    .iter()
                    .enumerate()
                    .map(|(i, rows)| StitchObject {
                        file: format!("f{}", i),
                        client: format!("c{}", i),
                        mode: String::new(),
                        responses: rows
                            .iter()
                            .map(|(q, a)| Response {
                                question: q.to_string(),
                                answer: a.to_string(),
                            })
                            .collect(),
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&#34;x&#34; &amp; &#39;y&#39;)&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_answers_cannot_inject_markup() {
        let page = render(&report(&[&[("00. Name", "<b>bold</b>")]]));
        assert!(page.contains("<pre>&lt;b&gt;bold&lt;/b&gt;</pre>"));
        assert!(!page.contains("<b>bold</b>"));
    }

    #[test]
    fn test_each_client_block_is_fenced() {
        let page = render(&report(&[
            &[("q", "a1"), ("client", "c0")],
            &[("q", "a2"), ("client", "c1")],
        ]));
        assert_eq!(page.matches("<hr />").count(), 4);
        assert_eq!(page.matches("<h4>").count(), 4);
        let first = page.find("a1").unwrap();
        let second = page.find("a2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_single_row_block_opens_and_closes() {
        let page = render(&report(&[&[("client", "c0")]]));
        assert_eq!(page.matches("<hr />").count(), 2);
    }
}
