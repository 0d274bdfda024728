//! HTML rendering for the query form.

/// Escape text for safe inclusion in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trim every line and collapse runs of blank lines into one.
pub fn format_result(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(text.len());
    let mut prev_empty = false;
    for line in text.split('\n').map(str::trim) {
        if line.is_empty() {
            if !prev_empty {
                out.push('\n');
                prev_empty = true;
            }
        } else {
            out.push_str(line);
            out.push('\n');
            prev_empty = false;
        }
    }
    out
}

/// What the page shows below the form.
#[derive(Debug, Clone, Copy, Default)]
pub enum Notice<'a> {
    #[default]
    None,
    Result(&'a str),
    Error(&'a str),
}

/// Render the full page. `query` is echoed back into the form.
pub fn render_page(query: &str, notice: Notice<'_>) -> String {
    let notice_html = match notice {
        Notice::None => String::new(),
        Notice::Result(text) => format!(
            "<section class=\"result\"><h2>Result</h2><pre>{}</pre></section>",
            escape_html(text)
        ),
        Notice::Error(text) => format!(
            "<section class=\"error\"><p>{}</p></section>",
            escape_html(text)
        ),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Material Analysis Agent</title>
<style>
body {{ font-family: sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; }}
textarea, input {{ width: 100%; box-sizing: border-box; margin-bottom: 0.75rem; }}
pre {{ white-space: pre-wrap; background: #f4f4f4; padding: 1rem; }}
.error {{ color: #a00; }}
</style>
</head>
<body>
<h1>Material Analysis Agent</h1>
<form method="post" action="/analyze">
<label for="api_key">API key</label>
<input type="password" id="api_key" name="api_key" autocomplete="off">
<label for="query">Query</label>
<textarea id="query" name="query" rows="5" placeholder="Read data/materials.csv, predict with model/gbdt_model.json, match Fe,Co and save to out/result.csv">{query}</textarea>
<button type="submit">Analyze</button>
</form>
{notice}
</body>
</html>
"#,
        query = escape_html(query),
        notice = notice_html,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_result_trims_and_collapses_blank_lines() {
        let raw = "  first line  \n\n\n   \n\tsecond\n\nthird";
        assert_eq!(format_result(raw), "first line\n\nsecond\n\nthird\n");
        assert_eq!(format_result(""), "");
        assert_eq!(format_result("one"), "one\n");
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(
            escape_html("<b>\"Fe\" & 'Co'</b>"),
            "&lt;b&gt;&quot;Fe&quot; &amp; &#39;Co&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn page_echoes_query_and_notice_escaped() {
        let html = render_page("<script>", Notice::Error("bad & worse"));
        assert!(html.contains("&lt;script&gt;</textarea>"));
        assert!(html.contains("<p>bad &amp; worse</p>"));
        assert!(!html.contains("{notice}"));

        let html = render_page("", Notice::None);
        assert!(!html.contains("class=\"result\""));
    }
}
