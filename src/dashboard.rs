//! Status page
//!
//! A single server-rendered HTML page showing the current status and
//! config, with buttons that call the JSON API.

use crate::service::StatusSnapshot;
use crate::store::ConfigMap;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use std::fmt::Write;
use std::path::PathBuf;

/// Serve the rendered status page
pub fn serve_dashboard(status: &StatusSnapshot, config: Option<&ConfigMap>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(render(status, config))))
        .expect("valid response with StatusCode enum and static header")
}

pub fn render(status: &StatusSnapshot, config: Option<&ConfigMap>) -> String {
    let (state_class, state_label) = if status.running {
        ("running", "Running")
    } else {
        ("stopped", "Stopped")
    };

    let mut paths = String::new();
    for (label, path) in [
        ("Config", &status.paths.config),
        ("Executable", &status.paths.executable),
        ("Log", &status.paths.log),
    ] {
        let _ = write!(
            paths,
            "<tr><th>{}</th><td>{}</td></tr>",
            label,
            escape_html(&display_path(path))
        );
    }

    let config_rows = match config {
        Some(config) if !config.is_empty() => {
            let mut rows = String::new();
            for (key, value) in config {
                let _ = write!(
                    rows,
                    r#"<tr><td><input class="key" value="{}"></td><td><input class="value" value="{}"></td></tr>"#,
                    escape_html(key),
                    escape_html(value)
                );
            }
            rows
        }
        Some(_) => r#"<tr><td colspan="2">Config file is empty</td></tr>"#.to_string(),
        None => r#"<tr><td colspan="2">Config file not found</td></tr>"#.to_string(),
    };

    let version = escape_html(&status.version);
    let connections = status.connections.to_string();

    fill_template(
        DASHBOARD_HTML,
        &[
            ("STATE_CLASS", state_class),
            ("STATE_LABEL", state_label),
            ("VERSION", &version),
            ("CONNECTIONS", &connections),
            ("PATHS", &paths),
            ("CONFIG_ROWS", &config_rows),
        ],
    )
}

/// Substitute `{{NAME}}` placeholders in a single pass. Inserted values are
/// never scanned again; unknown placeholders are left as they are.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let found = after.find("}}").and_then(|end| {
            values
                .iter()
                .find(|(name, _)| *name == &after[..end])
                .map(|(_, value)| (end, *value))
        });

        match found {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "not found".to_string())
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>FRPS Control</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 2rem auto; max-width: 56rem; color: #222; }
        h1 { font-size: 1.4rem; }
        section { border: 1px solid #ddd; border-radius: 6px; padding: 1rem 1.25rem; margin-bottom: 1.25rem; }
        th { text-align: left; padding-right: 1.5rem; font-weight: 600; }
        td input { width: 100%; box-sizing: border-box; }
        .state { font-weight: 600; }
        .running { color: #1a7f37; }
        .stopped { color: #cf222e; }
        button { margin-right: .5rem; padding: .35rem .9rem; }
        #message { margin-top: .75rem; min-height: 1.2rem; }
    </style>
</head>
<body>
    <h1>FRPS Control</h1>

    <section>
        <h2>Status</h2>
        <table>
            <tr><th>State</th><td class="state {{STATE_CLASS}}">{{STATE_LABEL}}</td></tr>
            <tr><th>Version</th><td>{{VERSION}}</td></tr>
            <tr><th>Connections</th><td>{{CONNECTIONS}}</td></tr>
            {{PATHS}}
        </table>
        <p>
            <button onclick="action('/api/start')">Start</button>
            <button onclick="action('/api/stop')">Stop</button>
            <button onclick="location.reload()">Refresh</button>
        </p>
    </section>

    <section>
        <h2>Configuration</h2>
        <table id="config">
            <tr><th>Key</th><th>Value</th></tr>
            {{CONFIG_ROWS}}
        </table>
        <p>
            <button onclick="addRow()">Add entry</button>
            <button onclick="saveConfig()">Save</button>
        </p>
    </section>

    <div id="message"></div>

    <script>
        function show(result) {
            document.getElementById('message').textContent = result.message || '';
        }

        async function action(url) {
            const res = await fetch(url, { method: 'POST' });
            show(await res.json());
            setTimeout(() => location.reload(), 1000);
        }

        function addRow() {
            const row = document.getElementById('config').insertRow();
            row.innerHTML = '<td><input class="key"></td><td><input class="value"></td>';
        }

        async function saveConfig() {
            const config = {};
            for (const row of document.querySelectorAll('#config tr')) {
                const key = row.querySelector('.key');
                const value = row.querySelector('.value');
                if (key && value && key.value.trim() !== '') {
                    config[key.value.trim()] = value.value;
                }
            }
            const res = await fetch('/api/config', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ config })
            });
            show(await res.json());
        }
    </script>
</body>
</html>
"##;
