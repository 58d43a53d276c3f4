//! Human-readable output for the CLI.

use std::fmt::Write;

use owo_colors::OwoColorize;
use strata::{Catalog, Field, TableInfo};

use crate::config::Settings;

/// Whether output gets ANSI colors.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub color: bool,
}

impl Style {
    /// Colors on when stdout is a terminal and `NO_COLOR` is unset.
    pub fn detect() -> Self {
        use std::io::IsTerminal;
        Self {
            color: std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn heading(&self, s: &str) -> String {
        if self.color {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn dim(&self, s: &str) -> String {
        if self.color {
            s.dimmed().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn good(&self, s: &str) -> String {
        if self.color {
            s.green().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn warn(&self, s: &str) -> String {
        if self.color {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }
}

/// Everything introspection found: tables and views with their columns,
/// then enum types.
pub fn catalog(catalog: &Catalog, style: Style) -> String {
    let mut out = String::new();

    if catalog.tables.is_empty() && catalog.enums.is_empty() {
        out.push_str("No tables, views or enum types found.\n");
        return out;
    }

    for table in catalog.iter_tables() {
        table_block(&mut out, table, style);
    }

    for e in &catalog.enums {
        let _ = writeln!(
            out,
            "{} {}",
            style.heading(&format!("[Enum]{}", e.qualified_name())),
            style.dim(&format!("-> {}", e.type_name))
        );
        let _ = writeln!(out, "    {}", e.labels.join(", "));
        out.push('\n');
    }

    out
}

fn table_block(out: &mut String, table: &TableInfo, style: Style) {
    let _ = writeln!(
        out,
        "{}",
        style.heading(&format!("[{}]{}", table.kind, table.qualified_name()))
    );
    for field in &table.fields {
        let _ = writeln!(out, "    {}", column_line(field, style));
    }
    let mut keys: Vec<&str> = table.primary_keys().map(|c| c.name.as_str()).collect();
    keys.dedup();
    for name in keys {
        let cols: Vec<&str> = table
            .primary_keys()
            .filter(|c| c.name == name)
            .map(|c| c.field.as_str())
            .collect();
        let _ = writeln!(out, "    PK: {} ({})", name, cols.join(", "));
    }
    out.push('\n');
}

fn column_line(field: &Field, style: Style) -> String {
    let mut attrs = Vec::new();
    if field.identity {
        attrs.push("PK".to_string());
    }
    if field.not_null {
        attrs.push("NOT NULL".to_string());
    }
    let attrs = if attrs.is_empty() {
        String::new()
    } else {
        format!(" [{}]", attrs.join(", "))
    };

    let mut line = format!(
        "{}: {} {}{}",
        field.name,
        style.good(&field.host_decl()),
        style.dim(&format!("({})", field.sql_type())),
        attrs
    );
    if let Some(comment) = &field.comment {
        line.push_str(&style.dim(&format!(" // {}", comment)));
    }
    line
}

/// Project, mode and masked URL, plus where models go in db-first mode.
pub fn header(settings: &Settings, style: Style) -> String {
    let mut out = format!(
        "{} {}\n",
        style.heading(&format!("{} ({})", settings.project_name, settings.mode)),
        style.dim(&mask_password(&settings.database_url))
    );
    if let Some(dir) = &settings.output_dir {
        let _ = writeln!(out, "models: {}", style.dim(&dir.display().to_string()));
    }
    out
}

/// Mask password in database URL for display
pub fn mask_password(url: &str) -> String {
    // Simple masking: replace password between :// and @
    if let Some(start) = url.find("://") {
        if let Some(at) = url.rfind('@') {
            if at > start {
                let prefix = &url[..start + 3];
                let suffix = &url[at..];
                if let Some(colon) = url[start + 3..at].find(':') {
                    let user = &url[start + 3..start + 3 + colon];
                    return format!("{}{}:***{}", prefix, user, suffix);
                }
            }
        }
    }
    url.to_string()
}
