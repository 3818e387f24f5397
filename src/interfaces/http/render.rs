// ============================================================
// HTML RENDERING
// ============================================================
// Server-side pages for the upload form and the results view

use crate::application::DuplicateReport;
use crate::domain::table::Table;

const TABLE_CLASSES: &str = "table table-striped";

/// `1 row`, `2 rows`
fn count_label(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Escape text for use in HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 2rem; }}
.table {{ border-collapse: collapse; margin-bottom: 1.5rem; }}
.table th, .table td {{ border: 1px solid #ccc; padding: 0.25rem 0.5rem; }}
.table-striped tbody tr:nth-child(odd) {{ background: #f6f6f6; }}
td.numeric {{ text-align: right; }}
</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
        body = body
    )
}

/// Upload form
pub fn index_page(max_upload_bytes: usize) -> String {
    let body = format!(
        r#"<h1>CSV Duplicate Finder</h1>
<p>Upload a CSV file to list rows that are exact duplicates across all columns.</p>
<form action="/upload" method="post" enctype="multipart/form-data">
<input type="file" name="file" accept=".csv,text/csv" required>
<button type="submit">Find duplicates</button>
</form>
<p><small>Maximum upload size: {} bytes.</small></p>"#,
        max_upload_bytes
    );
    layout("CSV Duplicate Finder", &body)
}

/// Full table, duplicate table, and a download link when duplicates exist
pub fn results_page(filename: &str, report: &DuplicateReport) -> String {
    let mut body = format!(
        "<h1>Results for {}</h1>\n<h2>Original Data ({})</h2>\n{}",
        escape_html(filename),
        count_label(report.table.row_count(), "row"),
        table_html(&report.table)
    );

    if report.has_duplicates() {
        body.push_str(&format!(
            "<h2>Duplicate Rows ({} in {})</h2>\n{}\n<p><a href=\"/download_duplicates\">Download duplicates as CSV</a></p>\n",
            count_label(report.duplicates.len(), "row"),
            count_label(report.duplicates.group_count(), "group"),
            table_html(report.duplicates.table())
        ));
    } else {
        body.push_str("<h2>Duplicate Rows</h2>\n<p>No duplicates found.</p>\n");
    }

    body.push_str("<p><a href=\"/\">Upload another file</a></p>");
    layout("CSV Duplicate Finder - Results", &body)
}

/// Render a table. Nulls become empty cells; numeric columns are
/// right-aligned through the `numeric` class.
pub fn table_html(table: &Table) -> String {
    let mut html = format!("<table class=\"{}\">\n<thead>\n<tr>", TABLE_CLASSES);
    for column in table.columns() {
        html.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in table.rows() {
        html.push_str("<tr>");
        for (cell, column_type) in row.iter().zip(table.column_types()) {
            if column_type.is_numeric() {
                html.push_str("<td class=\"numeric\">");
            } else {
                html.push_str("<td>");
            }
            html.push_str(&escape_html(cell.source_text()));
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>");
    html
}
