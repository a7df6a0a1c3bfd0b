use async_trait::async_trait;
use bson::Document;

use bookstore_core::{
    book::Book,
    error::BookstoreResult,
    query::{Filter, Update, UpdateOutcome},
};

use super::{DELETED_TITLE, FICTION, NEW_PRICE, ORWELL, PUBLISHED_AFTER, REPRICED_TITLE, TaskGroup};
use crate::{
    collection::BookCollection,
    report::{Report, Section, field_text},
};

/// Equality and range reads, one price update and one delete.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicCrud;

pub fn genre_line(book: &Document) -> String {
    format!("{} ({})", field_text(book, Book::TITLE), field_text(book, Book::GENRE))
}

pub fn year_line(book: &Document) -> String {
    format!("{} ({})", field_text(book, Book::TITLE), field_text(book, Book::PUBLISHED_YEAR))
}

pub fn author_line(book: &Document) -> String {
    format!("{} by {}", field_text(book, Book::TITLE), field_text(book, Book::AUTHOR))
}

pub fn update_line(outcome: UpdateOutcome) -> String {
    format!("Matched: {}, Modified: {}", outcome.matched, outcome.modified)
}

/// Line printed after re-reading the repriced book.
pub fn new_price_line(title: &str, book: Option<&Document>) -> String {
    match book {
        Some(book) => format!("New price for {title}: {}", field_text(book, Book::PRICE)),
        None => format!("{title} not found"),
    }
}

#[async_trait]
impl TaskGroup for BasicCrud {
    fn title(&self) -> &'static str {
        "Basic CRUD Operations"
    }

    async fn run(&self, books: BookCollection<'_>, report: &mut Report) -> BookstoreResult<()> {
        let fiction = books.find_matching(Filter::eq(Book::GENRE, FICTION)).await?;
        report.push(Section::lines(
            format!("Find all books in genre: \"{FICTION}\""),
            fiction.iter().map(genre_line).collect(),
        ))?;

        let recent = books.find_matching(Filter::gt(Book::PUBLISHED_YEAR, PUBLISHED_AFTER)).await?;
        report.push(Section::lines(
            format!("Find books published after year: {PUBLISHED_AFTER}"),
            recent.iter().map(year_line).collect(),
        ))?;

        let by_author = books.find_matching(Filter::eq(Book::AUTHOR, ORWELL)).await?;
        report.push(Section::lines(
            format!("Find books by author: \"{ORWELL}\""),
            by_author.iter().map(author_line).collect(),
        ))?;

        let outcome = books
            .update_one(Filter::eq(Book::TITLE, REPRICED_TITLE), Update::set(Book::PRICE, NEW_PRICE))
            .await?;
        let repriced = books.find_one(Filter::eq(Book::TITLE, REPRICED_TITLE)).await?;
        report.push(Section::lines(
            format!("Update price: set price={NEW_PRICE} for title \"{REPRICED_TITLE}\""),
            vec![
                update_line(outcome),
                new_price_line(REPRICED_TITLE, repriced.as_ref()),
            ],
        ))?;

        let deleted = books.delete_one(Filter::eq(Book::TITLE, DELETED_TITLE)).await?;
        report.push(Section::line(
            format!("Delete book by title: \"{DELETED_TITLE}\""),
            format!("Deleted: {deleted}"),
        ))?;

        Ok(())
    }
}
