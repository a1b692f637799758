//! Server-rendered status page.
//!
//! One row per registered repository, in identifier order. Repositories that
//! have never been deployed show `never`.

use deploy::{DeploymentStatus, Registry, StatusSnapshot, Timestamp};

pub(crate) fn render_status_page(registry: &Registry, status: &StatusSnapshot) -> String {
    let mut rows = String::new();
    for id in registry.ids() {
        let current = status.get(id).cloned().unwrap_or_default();
        rows.push_str(&format!(
            "<tr class=\"{class}\"><td>{id}</td><td>{attempt}</td><td>{success}</td>\
             <td>{exit_code}</td><td>{duration}</td><td>{error}</td></tr>\n",
            class = row_class(&current),
            id = escape(id.as_str()),
            attempt = timestamp_cell(current.last_attempt),
            success = timestamp_cell(current.last_success),
            exit_code = current
                .last_exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "–".to_string()),
            duration = current
                .last_duration
                .map(|d| format!("{:.1}s", d.as_secs_f64()))
                .unwrap_or_else(|| "–".to_string()),
            error = escape(current.last_error.as_deref().unwrap_or("")),
        ));
    }

    format!(
        "<!DOCTYPE html>\n\
         <html><head><meta charset=\"utf-8\"><title>Deployments</title>\n\
         <style>\
         body{{font-family:sans-serif;margin:2em}}\
         table{{border-collapse:collapse}}\
         td,th{{padding:.3em .8em;border-bottom:1px solid #ddd;text-align:left}}\
         tr.failed td{{color:#b00}}\
         </style></head>\n\
         <body><h1>Deployments</h1>\n\
         <table><thead><tr><th>Repository</th><th>Last attempt</th><th>Last success</th>\
         <th>Exit code</th><th>Duration</th><th>Error</th></tr></thead>\n\
         <tbody>\n{rows}</tbody></table>\n\
         <p><a href=\"/status.json\">status.json</a></p>\n\
         </body></html>\n"
    )
}

fn row_class(status: &DeploymentStatus) -> &'static str {
    if status.last_error.is_some() {
        "failed"
    } else {
        "ok"
    }
}

fn timestamp_cell(ts: Option<Timestamp>) -> String {
    ts.map(|t| t.to_string()).unwrap_or_else(|| "never".to_string())
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;
