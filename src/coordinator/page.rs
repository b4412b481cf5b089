//! HTML rendering for the listing page

use crate::common::{escape_html, format_display_time};
use crate::coordinator::store::Message;
use std::fmt::Write;

const HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Raspberry Pi Check-in</title>
<style>
body { font-family: sans-serif; margin: 2rem; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ccc; padding: 0.4rem 0.8rem; text-align: left; }
th { background: #f0f0f0; }
td.empty { color: #777; font-style: italic; }
</style>
</head>
<body>
<h1>Raspberry Pi Check-in</h1>
<p>Find your hostname, then connect to the address next to it.</p>
<table>
<thead><tr><th>Hostname</th><th>IP Address</th><th>Checked in</th></tr></thead>
<tbody>
"#;

const TAIL: &str = "</tbody>\n</table>\n</body>\n</html>\n";

/// Render every message as a table row, in the order given.
pub fn render_listing(messages: &[Message]) -> String {
    let mut page = String::with_capacity(HEAD.len() + TAIL.len() + messages.len() * 96);
    page.push_str(HEAD);

    if messages.is_empty() {
        page.push_str("<tr><td class=\"empty\" colspan=\"3\">No devices have checked in yet.</td></tr>\n");
    }

    for message in messages {
        // Writing to a String cannot fail
        let _ = writeln!(
            page,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&message.text),
            escape_html(&message.source_address),
            format_display_time(&message.created_at),
        );
    }

    page.push_str(TAIL);
    page
}
