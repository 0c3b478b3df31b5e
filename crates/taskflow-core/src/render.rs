use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use taskflow_shared::{Task, TaskPriority, TaskStatus};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::{DueLabel, due_label};
use crate::filters::TaskFilter;
use crate::list_view::TaskListView;
use crate::service::Backend;
use crate::view::{NoticeLevel, ViewState};

/// Plain-text rendering of the task dashboard.
#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    tz: Tz,
}

impl Renderer {
    /// Colour needs both the `color` setting and a terminal on stdout.
    pub fn new(cfg: &Config, tz: Tz) -> Self {
        let color = cfg.get_bool("color").unwrap_or(true) && io::stdout().is_terminal();
        Self { color, tz }
    }

    pub fn plain(tz: Tz) -> Self {
        Self { color: false, tz }
    }

    #[tracing::instrument(skip_all)]
    pub fn render_dashboard<W: Write, B: Backend>(
        &self,
        mut out: W,
        view: &ViewState<B>,
        list: &TaskListView,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let stats = view.stats();
        let theme = if view.is_dark_mode() { "dark" } else { "light" };

        writeln!(
            out,
            "TaskFlow  {} Total  {} Done  [{theme}]",
            stats.total, stats.completed
        )?;
        writeln!(
            out,
            "Pending {}  In Progress {}  Completed {}  Urgent {}",
            stats.pending, stats.in_progress, stats.completed, stats.urgent
        )?;

        let tabs = TaskFilter::ALL
            .iter()
            .map(|filter| {
                if *filter == view.active_filter() {
                    self.paint(&format!("[{}]", filter.label()), "1")
                } else {
                    filter.label().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(out, "{tabs}")?;

        let mut controls = list.sort.label().to_string();
        if !list.search.is_empty() {
            controls.push_str(&format!("  search: \"{}\"", list.search));
        }
        writeln!(out, "{controls}")?;
        writeln!(out)?;

        let visible = list.visible(&view.filtered_tasks());
        if visible.is_empty() {
            writeln!(out, "{}", list.empty_state())?;
        } else {
            let headers = vec![
                String::new(),
                "Title".to_string(),
                "Priority".to_string(),
                "Due".to_string(),
                "Category".to_string(),
                "Tags".to_string(),
            ];
            let rows = visible
                .iter()
                .map(|task| self.task_row(task, view, now))
                .collect();
            write_table(&mut out, headers, rows)?;
        }

        if let Some(error) = view.error() {
            writeln!(out)?;
            writeln!(out, "{}", self.paint(&format!("! {error}"), "31"))?;
        }

        for notice in view.notices() {
            let line = match notice.level {
                NoticeLevel::Success => self.paint(&notice.message, "32"),
                NoticeLevel::Error => self.paint(&notice.message, "31"),
            };
            writeln!(out, "{line}")?;
        }

        Ok(())
    }

    fn task_row<B: Backend>(
        &self,
        task: &Task,
        view: &ViewState<B>,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let check = match task.status {
            TaskStatus::Completed => "[x]",
            TaskStatus::InProgress => "[~]",
            TaskStatus::Pending => "[ ]",
        }
        .to_string();

        let priority = match task.priority {
            Some(TaskPriority::Urgent) => self.paint("urgent", "31"),
            Some(TaskPriority::High) => self.paint("high", "33"),
            Some(other) => other.as_str().to_string(),
            None => "-".to_string(),
        };

        let due = match task.due_date.map(|date| due_label(date, now, &self.tz)) {
            Some(DueLabel::Overdue) => self.paint("Overdue", "31"),
            Some(label) => label.text().to_string(),
            None => String::new(),
        };

        let category = view
            .category_name(task.category_id.as_deref())
            .unwrap_or_default()
            .to_string();

        let tags = task
            .tags
            .iter()
            .map(|tag| format!("#{tag}"))
            .collect::<Vec<_>>()
            .join(" ");

        vec![check, task.title.clone(), priority, due, category, tags]
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|h| UnicodeWidthStr::width(h.as_str()))
        .collect();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_width(cell));
        }
    }

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{}", header_line.trim_end())?;

    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{rule}")?;

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(cell, *w))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn pad(cell: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(cell));
    format!("{cell}{}", " ".repeat(padding))
}

fn visible_width(cell: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(cell).as_str())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
