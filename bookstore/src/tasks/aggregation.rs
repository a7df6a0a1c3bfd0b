use async_trait::async_trait;
use bson::{Bson, Document, doc};

use bookstore_core::{
    book::Book,
    error::BookstoreResult,
    pipeline::{Accumulator, Expression, GROUP_KEY, Pipeline},
    query::Sort,
};

use super::TaskGroup;
use crate::{
    collection::BookCollection,
    report::{Report, Section, Table},
};

/// Average price by genre, most prolific author and books per decade.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationPipelines;

pub fn average_price_by_genre() -> Pipeline {
    Pipeline::new()
        .group(
            Expression::field(Book::GENRE),
            [
                ("avgPrice", Accumulator::Avg(Expression::field(Book::PRICE))),
                ("count", Accumulator::count()),
            ],
        )
        .sort([Sort::asc(GROUP_KEY)])
}

pub fn top_author() -> Pipeline {
    Pipeline::new()
        .group(Expression::field(Book::AUTHOR), [("books", Accumulator::count())])
        .sort([Sort::desc("books"), Sort::asc(GROUP_KEY)])
        .limit(1)
}

pub fn books_by_decade() -> Pipeline {
    Pipeline::new()
        .project([("decade", Expression::bucket_start(Book::PUBLISHED_YEAR, 10))])
        .group(Expression::field("decade"), [("count", Accumulator::count())])
        .sort([Sort::asc(GROUP_KEY)])
}

/// Rounds to two decimal places for display.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Renames the group key of each result to `key_name` and keeps `fields`, in order.
fn rename_key(results: &[Document], key_name: &str, fields: &[&str]) -> Vec<Document> {
    results
        .iter()
        .map(|result| {
            let mut row = Document::new();
            row.insert(key_name, result.get(GROUP_KEY).cloned().unwrap_or(Bson::Null));
            for field in fields {
                row.insert(*field, result.get(*field).cloned().unwrap_or(Bson::Null));
            }
            row
        })
        .collect()
}

/// Rounds a numeric average to cents. Anything else is shown as the server sent it.
fn rounded_average(value: Option<&Bson>) -> Bson {
    match value {
        Some(Bson::Double(v)) => Bson::Double(round_cents(*v)),
        Some(Bson::Int32(v)) => Bson::Double(f64::from(*v)),
        Some(Bson::Int64(v)) => Bson::Double(*v as f64),
        Some(Bson::Decimal128(d)) => match d.to_string().parse::<f64>() {
            Ok(v) => Bson::Double(round_cents(v)),
            Err(_) => Bson::Decimal128(*d),
        },
        Some(other) => other.clone(),
        None => Bson::Null,
    }
}

fn genre_rows(results: &[Document]) -> Vec<Document> {
    results
        .iter()
        .map(|result| {
            doc! {
                "genre": result.get(GROUP_KEY).cloned().unwrap_or(Bson::Null),
                "avgPrice": rounded_average(result.get("avgPrice")),
                "count": result.get("count").cloned().unwrap_or(Bson::Null),
            }
        })
        .collect()
}

#[async_trait]
impl TaskGroup for AggregationPipelines {
    fn title(&self) -> &'static str {
        "Aggregation Pipelines"
    }

    async fn run(&self, books: BookCollection<'_>, report: &mut Report) -> BookstoreResult<()> {
        let by_genre = books.aggregate(average_price_by_genre()).await?;
        report.push(Section::table(
            "Average price by genre",
            Table::from_documents(&genre_rows(&by_genre)),
        ))?;

        let top = books.aggregate(top_author()).await?;
        report.push(Section::table(
            "Author with the most books",
            Table::from_documents(&rename_key(&top, "author", &["books"])),
        ))?;

        let by_decade = books.aggregate(books_by_decade()).await?;
        report.push(Section::table(
            "Books by publication decade",
            Table::from_documents(&rename_key(&by_decade, "decade", &["count"])),
        ))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bson::Decimal128;
    use bookstore_core::pipeline::Stage;

    use super::*;
    use crate::tasks::fixtures::{COLLECTION, books, seeded};

    async fn run() -> Report {
        let store = seeded().await;
        let mut report = Report::capture();
        AggregationPipelines
            .run(BookCollection::new(COLLECTION, &store), &mut report)
            .await
            .unwrap();
        report
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_cents(10.7433333), 10.74);
        assert_eq!(round_cents(2.0 / 3.0), 0.67);
    }

    #[test]
    fn decimal_averages_are_rounded_like_doubles() {
        let average: Decimal128 = "12.4966666".parse().unwrap();
        let rows = genre_rows(&[
            doc! { "_id": "Fiction", "avgPrice": average, "count": 3 },
            doc! { "_id": "Poetry", "avgPrice": Bson::Null, "count": 1 },
            doc! { "_id": "Essays", "avgPrice": "n/a", "count": 2 },
        ]);

        assert_eq!(rows[0].get("avgPrice"), Some(&Bson::Double(12.5)));
        assert_eq!(rows[1].get("avgPrice"), Some(&Bson::Null));
        assert_eq!(rows[2].get("avgPrice"), Some(&Bson::String("n/a".into())));
        assert_eq!(rows[2].get("genre"), Some(&Bson::String("Essays".into())));
    }

    #[tokio::test]
    async fn genre_averages_match_arithmetic_mean() {
        let report = run().await;
        let table = report.section("Average price by genre").and_then(Section::as_table).unwrap();

        let mut expected: HashMap<String, (f64, i32)> = HashMap::new();
        for book in books() {
            let entry = expected.entry(book.genre).or_default();
            entry.0 += book.price;
            entry.1 += 1;
        }

        assert_eq!(table.columns(), ["genre", "avgPrice", "count"]);
        assert_eq!(table.len(), expected.len());

        let genres = table.column("genre");
        let averages = table.column("avgPrice");
        let counts = table.column("count");
        for row in 0..table.len() {
            let genre = genres[row].and_then(Bson::as_str).unwrap();
            let (total, count) = expected[genre];
            assert_eq!(averages[row].and_then(Bson::as_f64), Some(round_cents(total / f64::from(count))));
            assert_eq!(counts[row], Some(&Bson::Int32(count)));
        }

        let order: Vec<&str> = genres.iter().filter_map(|genre| genre.and_then(Bson::as_str)).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    #[tokio::test]
    async fn top_author_breaks_ties_by_name() {
        let report = run().await;
        let table = report.section("Author with the most books").and_then(Section::as_table).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.column("author"), vec![Some(&Bson::String("George Orwell".into()))]);
        assert_eq!(table.column("books"), vec![Some(&Bson::Int32(2))]);
    }

    #[tokio::test]
    async fn decades_bucket_years() {
        let report = run().await;
        let table = report.section("Books by publication decade").and_then(Section::as_table).unwrap();

        let decades: Vec<f64> = table
            .column("decade")
            .into_iter()
            .filter_map(|value| value.and_then(Bson::as_f64))
            .collect();

        assert_eq!(
            decades,
            [1810.0, 1840.0, 1850.0, 1920.0, 1930.0, 1940.0, 1950.0, 1960.0, 1980.0, 2010.0]
        );
        // 1951 and 1954 share a bucket.
        assert_eq!(table.column("count")[6], Some(&Bson::Int32(2)));
    }

    #[test]
    fn top_author_pipeline_renders_sort_and_limit() {
        let stages = top_author()
            .stages
            .iter()
            .map(Stage::to_document)
            .collect::<Vec<_>>();

        assert_eq!(
            stages,
            vec![
                doc! { "$group": { "_id": "$author", "books": { "$sum": 1 } } },
                doc! { "$sort": { "books": -1, "_id": 1 } },
                doc! { "$limit": 1_i64 },
            ]
        );
    }
}
