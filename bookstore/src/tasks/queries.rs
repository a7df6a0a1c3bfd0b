use async_trait::async_trait;

use bookstore_core::{
    book::Book,
    error::BookstoreResult,
    page::PageRequest,
    query::{Filter, Projection, Query, SortDirection},
};

use super::{FICTION, IN_STOCK_AFTER, PAGE_SIZE, PAGES_SHOWN, TaskGroup, crud::year_line};
use crate::{
    collection::BookCollection,
    report::{Report, Section, Table},
};

/// Compound filter, projection, sorting and pagination.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvancedQueries;

/// Books by price, with equal prices ordered by title in the same direction.
pub fn price_sorted(direction: SortDirection) -> Query {
    Query::builder()
        .projection(Projection::fields([Book::TITLE, Book::PRICE]))
        .sort(Book::PRICE, direction)
        .sort(Book::TITLE, direction)
        .build()
}

/// One page of titles sorted alphabetically.
pub fn title_page(request: PageRequest) -> Query {
    request.apply(
        Query::builder()
            .projection(Projection::fields([Book::TITLE]))
            .sort(Book::TITLE, SortDirection::Asc)
            .build(),
    )
}

#[async_trait]
impl TaskGroup for AdvancedQueries {
    fn title(&self) -> &'static str {
        "Advanced Queries"
    }

    async fn run(&self, books: BookCollection<'_>, report: &mut Report) -> BookstoreResult<()> {
        let in_stock = books
            .find_matching(Filter::and([
                Filter::eq(Book::IN_STOCK, true),
                Filter::gt(Book::PUBLISHED_YEAR, IN_STOCK_AFTER),
            ]))
            .await?;
        report.push(Section::lines(
            format!("Books in stock and published after {IN_STOCK_AFTER}"),
            in_stock.iter().map(year_line).collect(),
        ))?;

        let projected = books
            .find(
                Query::builder()
                    .filter(Filter::eq(Book::GENRE, FICTION))
                    .projection(Projection::fields([Book::TITLE, Book::AUTHOR, Book::PRICE]))
                    .build(),
            )
            .await?;
        report.push(Section::table(
            format!("Projection: title, author, price (genre = {FICTION})"),
            Table::from_documents(&projected),
        ))?;

        let ascending = books.find(price_sorted(SortDirection::Asc)).await?;
        report.push(Section::table("Sort by price ASC", Table::from_documents(&ascending)))?;

        let descending = books.find(price_sorted(SortDirection::Desc)).await?;
        report.push(Section::table("Sort by price DESC", Table::from_documents(&descending)))?;

        for request in PageRequest::first_pages(PAGE_SIZE, PAGES_SHOWN) {
            let page = books.find(title_page(request)).await?;
            report.push(Section::table(
                format!("Pagination: page {} (size {}) sorted by title", request.page, request.per_page),
                Table::from_documents(&page),
            ))?;
        }

        Ok(())
    }
}
