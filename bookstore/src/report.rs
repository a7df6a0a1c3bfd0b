//! Human-readable run output.
//!
//! Every step of a run produces a [`Section`]: a banner title followed by a
//! body of text lines, a table, or a JSON block. A [`Report`] keeps the sections
//! in order and, when it has a sink, writes each one as soon as it is pushed so
//! output appears while the run progresses.

use std::io::{self, Write};

use bson::{Bson, Document};
use serde_json::Value;

use bookstore_core::error::BookstoreResult;

/// Width of the `=` rules framing every banner.
pub const BANNER_WIDTH: usize = 60;

/// Printed in place of an empty line list.
pub const NO_RESULTS: &str = "No results";

/// Renders a banner: a blank line, a rule, the title, and another rule.
pub fn banner(title: &str) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("\n{rule}\n{title}\n{rule}\n")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Banner only.
    Empty,
    /// One entry per line; an empty list prints [`NO_RESULTS`].
    Lines(Vec<String>),
    Table(Table),
    Json(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub body: Body,
}

impl Section {
    pub fn header(title: impl Into<String>) -> Self {
        Section { title: title.into(), body: Body::Empty }
    }

    pub fn lines(title: impl Into<String>, lines: Vec<String>) -> Self {
        Section { title: title.into(), body: Body::Lines(lines) }
    }

    pub fn line(title: impl Into<String>, line: impl Into<String>) -> Self {
        Section::lines(title, vec![line.into()])
    }

    pub fn table(title: impl Into<String>, table: Table) -> Self {
        Section { title: title.into(), body: Body::Table(table) }
    }

    pub fn json(title: impl Into<String>, value: Value) -> Self {
        Section { title: title.into(), body: Body::Json(value) }
    }

    /// Text lines of the body, if it is a line list.
    pub fn text_lines(&self) -> Option<&[String]> {
        match &self.body {
            Body::Lines(lines) => Some(lines),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match &self.body {
            Body::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn render(&self) -> String {
        let mut out = banner(&self.title);
        match &self.body {
            Body::Empty => {}
            Body::Lines(lines) if lines.is_empty() => {
                out.push_str(NO_RESULTS);
                out.push('\n');
            }
            Body::Lines(lines) => {
                out.push_str(&lines.join("\n"));
                out.push('\n');
            }
            Body::Table(table) => out.push_str(&table.render()),
            Body::Json(value) => {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                out.push_str(&pretty);
                out.push('\n');
            }
        }
        out
    }
}

/// Rows of values under named columns, rendered like a console table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<Bson>>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table whose columns are the union of the documents' fields in
    /// order of first appearance.
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for document in documents {
            for key in document.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = Table::new(columns);
        for document in documents {
            table.push_document(document);
        }
        table
    }

    /// Appends a row taking each column's value from `document`.
    pub fn push_document(&mut self, document: &Document) {
        let row = self.columns
            .iter()
            .map(|column| document.get(column).cloned())
            .collect();
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom; missing cells are `None`.
    pub fn column(&self, name: &str) -> Vec<Option<&Bson>> {
        match self.columns.iter().position(|column| column == name) {
            Some(position) => self.rows.iter().map(|row| row[position].as_ref()).collect(),
            None => Vec::new(),
        }
    }

    pub fn render(&self) -> String {
        let headers: Vec<String> = std::iter::once("(index)".to_string())
            .chain(self.columns.iter().cloned())
            .collect();
        let cells: Vec<Vec<String>> = self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                std::iter::once(index.to_string())
                    .chain(row.iter().map(|value| value.as_ref().map(format_cell).unwrap_or_default()))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = (0..headers.len())
            .map(|column| {
                cells
                    .iter()
                    .map(|row| row[column].chars().count())
                    .chain(std::iter::once(headers[column].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let rule = |left: &str, middle: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|width| "─".repeat(width + 2)).collect();
            format!("{left}{}{right}\n", segments.join(middle))
        };
        let line = |values: &[String]| {
            let padded: Vec<String> = values
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!(" {value}{} ", " ".repeat(width - value.chars().count())))
                .collect();
            format!("│{}│\n", padded.join("│"))
        };

        let mut out = rule("┌", "┬", "┐");
        out.push_str(&line(&headers));
        out.push_str(&rule("├", "┼", "┤"));
        for row in &cells {
            out.push_str(&line(row));
        }
        out.push_str(&rule("└", "┴", "┘"));
        out
    }
}

/// Formats one table cell: strings are single-quoted, numbers use their shortest form.
pub fn format_cell(value: &Bson) -> String {
    match value {
        Bson::String(s) => format!("'{s}'"),
        Bson::Double(v) => v.to_string(),
        Bson::Int32(v) => v.to_string(),
        Bson::Int64(v) => v.to_string(),
        Bson::Boolean(v) => v.to_string(),
        Bson::Null => "null".to_string(),
        Bson::Decimal128(d) => d.to_string(),
        Bson::ObjectId(oid) => format!("ObjectId('{}')", oid.to_hex()),
        other => other.to_string(),
    }
}

/// Formats a value for a text line, without quoting strings.
pub fn format_value(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        other => format_cell(other),
    }
}

/// Formats `document[field]` for a text line; a missing field prints as `null`.
pub fn field_text(document: &Document, field: &str) -> String {
    format_value(document.get(field).unwrap_or(&Bson::Null))
}

/// Ordered collection of sections, optionally streamed to a writer.
pub struct Report {
    sections: Vec<Section>,
    sink: Option<Box<dyn Write + Send>>,
}

impl Report {
    /// A report that writes each section to standard output as it is pushed.
    pub fn stdout() -> Self {
        Report::with_sink(io::stdout())
    }

    pub fn with_sink(sink: impl Write + Send + 'static) -> Self {
        Report { sections: Vec::new(), sink: Some(Box::new(sink)) }
    }

    /// A report that only records sections.
    pub fn capture() -> Self {
        Report { sections: Vec::new(), sink: None }
    }

    pub fn push(&mut self, section: Section) -> BookstoreResult<()> {
        if let Some(sink) = self.sink.as_mut() {
            sink.write_all(section.render().as_bytes())?;
            sink.flush()?;
        }
        self.sections.push(section);

        Ok(())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The first section with the given title.
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.title == title)
    }

    pub fn render(&self) -> String {
        self.sections.iter().map(Section::render).collect()
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use serde_json::json;

    use super::*;

    #[test]
    fn banner_frames_title_with_rules() {
        let rule = "=".repeat(60);

        assert_eq!(banner("All tasks completed"), format!("\n{rule}\nAll tasks completed\n{rule}\n"));
    }

    #[test]
    fn line_fields_tolerate_missing_and_decimal_values() {
        let price: bson::Decimal128 = "12.50".parse().unwrap();
        let book = doc! { "title": "Dune", "price": price };

        assert_eq!(field_text(&book, "title"), "Dune");
        assert_eq!(field_text(&book, "price"), "12.50");
        assert_eq!(field_text(&book, "author"), "null");
        assert_eq!(format_cell(&Bson::Decimal128(price)), "12.50");
    }

    #[test]
    fn empty_line_list_prints_no_results() {
        let rendered = Section::lines("Find books by author", Vec::new()).render();

        assert!(rendered.ends_with("No results\n"));
    }

    #[test]
    fn table_uses_union_of_columns() {
        let table = Table::from_documents(&[
            doc! { "title": "1984", "price": 15.99 },
            doc! { "title": "Dune", "author": "Frank Herbert" },
        ]);

        assert_eq!(table.columns(), ["title", "price", "author"]);
        assert_eq!(table.column("price"), vec![Some(&Bson::Double(15.99)), None]);
    }

    #[test]
    fn table_renders_console_layout() {
        let table = Table::from_documents(&[doc! { "decade": 1950.0, "count": 2 }]);

        assert_eq!(
            table.render(),
            concat!(
                "┌─────────┬────────┬───────┐\n",
                "│ (index) │ decade │ count │\n",
                "├─────────┼────────┼───────┤\n",
                "│ 0       │ 1950   │ 2     │\n",
                "└─────────┴────────┴───────┘\n",
            )
        );
    }

    #[test]
    fn cells_quote_strings_and_shorten_numbers() {
        assert_eq!(format_cell(&Bson::String("1984".into())), "'1984'");
        assert_eq!(format_cell(&Bson::Double(15.99)), "15.99");
        assert_eq!(format_cell(&Bson::Double(1950.0)), "1950");
        assert_eq!(format_value(&Bson::String("1984".into())), "1984");
    }

    #[test]
    fn json_body_is_pretty_printed() {
        let rendered = Section::json("Explain", json!({ "winningPlan": "COLLSCAN" })).render();

        assert!(rendered.ends_with("{\n  \"winningPlan\": \"COLLSCAN\"\n}\n"));
    }

    #[test]
    fn sink_receives_sections_as_they_are_pushed() {
        let mut report = Report::with_sink(Vec::new());
        report.push(Section::line("Delete book by title", "Deleted: 1")).unwrap();

        assert_eq!(report.sections().len(), 1);
        assert!(report.render().contains("Deleted: 1"));
        assert!(report.section("Delete book by title").is_some());
    }
}
