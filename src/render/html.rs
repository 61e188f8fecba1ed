//! The dashboard page.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{GridCell, GridView};

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: center; }
th.repo { text-align: left; }
td.success { background: #2da44e; }
td.failure { background: #cf222e; }
td.pending { background: #d4a72c; }
td.unknown { background: #eaeef2; }
td.carried { opacity: 0.6; }
td a { color: #fff; font-family: monospace; }";

/// Renders the grid as a standalone HTML page.
pub fn render_html(view: &GridView) -> String {
    let mut out = String::with_capacity(4096);

    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Build Grid</title>\n<style>\n");
    out.push_str(STYLE);
    out.push_str("\n</style>\n</head>\n<body>\n<table>\n<thead>\n<tr><th class=\"repo\">Repository</th>");
    for label in &view.date_labels {
        let _ = write!(out, "<th>{}</th>", encode_text(label));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &view.rows {
        let _ = write!(
            out,
            "<tr><th class=\"repo\"><a href=\"{}\">{}</a> <small>{}</small></th>",
            encode_double_quoted_attribute(&row.link),
            encode_text(&row.repo),
            encode_text(&row.default_branch),
        );
        for cell in &row.cells {
            render_cell(&mut out, cell);
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    out
}

fn render_cell(out: &mut String, cell: &GridCell) {
    let class = if cell.carried {
        format!("{} carried", cell.status.as_str())
    } else {
        cell.status.as_str().to_string()
    };
    let _ = write!(
        out,
        "<td class=\"{}\" title=\"{}\">",
        class,
        encode_double_quoted_attribute(&cell.day)
    );
    match (cell.reference.is_empty(), cell.detail_url.is_empty()) {
        (true, _) => {}
        (false, true) => {
            let _ = write!(out, "{}", encode_text(&cell.reference));
        }
        (false, false) => {
            let _ = write!(
                out,
                "<a href=\"{}\">{}</a>",
                encode_double_quoted_attribute(&cell.detail_url),
                encode_text(&cell.reference)
            );
        }
    }
    out.push_str("</td>");
}
