//! Terminal UI utilities.
//!
//! A box-drawn table that shrinks its widest columns to fit the terminal,
//! used by `cget list` and `cget cache list`.
//!
//! ## Example
//!
//! ```rust
//! use cget::ui::Table;
//!
//! let mut table = Table::new(&["Name", "Version"]);
//! table.add_row(vec!["fmt".to_string(), "10.2.1".to_string()]);
//! table.print();
//! ```

use colored::*;
use console::{Alignment, measure_text_width, pad_str, truncate_str};

const MIN_COLUMN: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row.into_iter().map(|c| sanitize(&c)).collect());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) {
        let (_rows, cols) = console::Term::stdout().size();
        print!("{}", self.render(cols as usize));
    }

    /// Lays the table out within `max_width` terminal columns.
    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }
        let widths = self.column_widths(max_width);
        let mut out = String::new();

        out.push_str(&border(&widths, "┌", "┬", "┐"));
        let header: Vec<String> = self.headers.iter().map(|h| h.bold().to_string()).collect();
        out.push_str(&line(&header, &widths));
        out.push_str(&border(&widths, "├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&line(row, &widths));
        }
        out.push_str(&border(&widths, "└", "┴", "┘"));
        out
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(measure_text_width(cell));
            }
        }

        // Indent, outer borders and one space of padding around every cell.
        let overhead = 3 + 3 * widths.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some(widest) = widths.iter_mut().filter(|w| **w > MIN_COLUMN).max() else {
                break;
            };
            *widest -= 1;
        }
        widths
    }
}

fn border(widths: &[usize], left: &str, mid: &str, right: &str) -> String {
    let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("  {}{}{}\n", left, inner.join(mid), right)
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let mut out = String::from("  │");
    for (cell, &width) in cells.iter().zip(widths) {
        let fitted = truncate_str(cell, width, "...");
        out.push(' ');
        out.push_str(&pad_str(&fitted, width, Alignment::Left, None));
        out.push_str(" │");
    }
    out.push('\n');
    out
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}
