use async_trait::async_trait;

use bookstore_core::{
    book::Book,
    error::BookstoreResult,
    index::IndexSpec,
    query::{Filter, Query, SortDirection},
};

use super::{AUTHOR_YEAR_INDEX, REPRICED_TITLE, TITLE_INDEX, TOLKIEN, TOLKIEN_FROM_YEAR, TaskGroup};
use crate::{
    collection::BookCollection,
    report::{Report, Section},
};

pub const DROPPED: &str = "Dropped existing indexes (if any)";
pub const NOTHING_TO_DROP: &str = "No existing indexes to drop";

/// Index reset, explain before and after a title index, and a compound index.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexingAndExplain;

pub fn title_index() -> IndexSpec {
    IndexSpec::new(TITLE_INDEX).key(Book::TITLE, SortDirection::Asc)
}

pub fn author_year_index() -> IndexSpec {
    IndexSpec::new(AUTHOR_YEAR_INDEX)
        .key(Book::AUTHOR, SortDirection::Asc)
        .key(Book::PUBLISHED_YEAR, SortDirection::Desc)
}

pub fn title_lookup() -> Query {
    Query::filtered(Filter::eq(Book::TITLE, REPRICED_TITLE))
}

pub fn author_since() -> Query {
    Query::builder()
        .filter(Filter::and([
            Filter::eq(Book::AUTHOR, TOLKIEN),
            Filter::gte(Book::PUBLISHED_YEAR, TOLKIEN_FROM_YEAR),
        ]))
        .sort(Book::PUBLISHED_YEAR, SortDirection::Desc)
        .build()
}

/// Turns the outcome of dropping all indexes into the line to print.
///
/// A missing index is a notice; any other failure is logged as a warning and
/// yields no line, so the run continues either way.
pub fn describe_index_reset(result: BookstoreResult<()>) -> Option<&'static str> {
    match result {
        Ok(()) => Some(DROPPED),
        Err(err) if err.is_index_not_found() => {
            log::info!("no indexes to drop");
            Some(NOTHING_TO_DROP)
        }
        Err(err) => {
            log::warn!("dropIndexes warning: {err}");
            None
        }
    }
}

#[async_trait]
impl TaskGroup for IndexingAndExplain {
    fn title(&self) -> &'static str {
        "Indexing and explain()"
    }

    async fn run(&self, books: BookCollection<'_>, report: &mut Report) -> BookstoreResult<()> {
        let reset = "Resetting indexes to demonstrate explain() before/after";
        report.push(match describe_index_reset(books.drop_indexes().await) {
            Some(line) => Section::line(reset, line),
            None => Section::header(reset),
        })?;

        let before = books.explain(title_lookup()).await?;
        report.push(Section::json(
            format!("Explain BEFORE index on title for query {{ title: \"{REPRICED_TITLE}\" }}"),
            before.to_json(),
        ))?;

        let name = books.create_index(title_index()).await?;
        report.push(Section::line("Create index on title", format!("Created index: {name}")))?;

        let after = books.explain(title_lookup()).await?;
        report.push(Section::json(
            format!("Explain AFTER index on title for query {{ title: \"{REPRICED_TITLE}\" }}"),
            after.to_json(),
        ))?;

        let name = books.create_index(author_year_index()).await?;
        report.push(Section::line(
            "Create compound index on { author: 1, published_year: -1 }",
            format!("Created index: {name}"),
        ))?;

        let compound = books.explain(author_since()).await?;
        report.push(Section::json(
            format!(
                "Explain for query {{ author: \"{TOLKIEN}\", published_year: {{ $gte: {TOLKIEN_FROM_YEAR} }} }}"
            ),
            compound.to_json(),
        ))?;

        Ok(())
    }
}
