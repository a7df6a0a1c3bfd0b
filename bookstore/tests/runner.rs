use serde_json::Value;

use bookstore::{
    backend::BookstoreBackend,
    book::Book,
    config::RunnerConfig,
    memory::{InMemoryBookstore, SessionStats},
    query::{Filter, Query},
    report::{Report, Section},
    runner::{COMPLETED, CONNECTING, Runner},
};

const COLLECTION: &str = "books";

fn books() -> Vec<Book> {
    vec![
        Book::new("To Kill a Mockingbird", "Harper Lee", "Fiction", 1960, 12.99, true),
        Book::new("1984", "George Orwell", "Dystopian", 1949, 10.99, true),
        Book::new("The Great Gatsby", "F. Scott Fitzgerald", "Fiction", 1925, 9.99, true),
        Book::new("Brave New World", "Aldous Huxley", "Dystopian", 1932, 11.5, false),
        Book::new("The Hobbit", "J.R.R. Tolkien", "Fantasy", 1937, 14.99, true),
        Book::new("The Catcher in the Rye", "J.D. Salinger", "Fiction", 1951, 8.99, true),
        Book::new("Pride and Prejudice", "Jane Austen", "Romance", 1813, 7.99, true),
        Book::new("The Lord of the Rings", "J.R.R. Tolkien", "Fantasy", 1954, 19.99, true),
        Book::new("Animal Farm", "George Orwell", "Political Satire", 1945, 8.5, false),
        Book::new("The Alchemist", "Paulo Coelho", "Fiction", 1988, 10.99, true),
        Book::new("Moby Dick", "Herman Melville", "Adventure", 1851, 12.5, false),
        Book::new("Wuthering Heights", "Emily Brontë", "Gothic Fiction", 1847, 9.99, true),
    ]
}

async fn seeded() -> InMemoryBookstore {
    let store = InMemoryBookstore::new();
    let documents = books().iter().map(|book| book.to_document().unwrap()).collect();
    store.insert_many(COLLECTION, documents).await.unwrap();
    store
}

async fn run(store: &InMemoryBookstore) -> Report {
    let mut report = Report::capture();
    Runner::new(store.connector(), RunnerConfig::default())
        .run(&mut report)
        .await
        .unwrap();
    report
}

fn explain<'r>(report: &'r Report, title: &str) -> &'r Value {
    report.section(title).and_then(Section::as_json).unwrap()
}

#[tokio::test]
async fn full_run_prints_every_group_in_order() {
    let store = seeded().await;
    let report = run(&store).await;

    let banners: Vec<&str> = report
        .sections()
        .iter()
        .filter(|section| section.text_lines().is_none() && section.as_table().is_none() && section.as_json().is_none())
        .map(|section| section.title.as_str())
        .collect();

    assert_eq!(
        banners,
        [
            "Basic CRUD Operations",
            "Advanced Queries",
            "Aggregation Pipelines",
            "Indexing and explain()",
            COMPLETED,
        ]
    );
    assert_eq!(report.sections()[0].title, CONNECTING);
    assert_eq!(store.session_stats(), SessionStats { opened: 4, closed: 4 });

    let rendered = report.render();
    assert!(rendered.starts_with(&format!("\n{}\nConnecting to MongoDB\n", "=".repeat(60))));
    assert!(rendered.contains("URI: mongodb://localhost:27017\n"));
    assert!(rendered.contains("New price for 1984: 15.99\n"));
    assert!(rendered.contains("Deleted: 1\n"));
    assert!(rendered.contains("Created index: idx_title\n"));
    assert!(rendered.contains("Created index: idx_author_year\n"));
}

#[tokio::test]
async fn later_groups_see_earlier_mutations() {
    let store = seeded().await;
    let report = run(&store).await;

    let moby = store
        .find(COLLECTION, Query::filtered(Filter::eq("title", "Moby Dick")))
        .await
        .unwrap();
    assert!(moby.is_empty());

    let repriced = store
        .find_one(COLLECTION, Filter::eq("title", "1984"))
        .await
        .unwrap()
        .map(|document| Book::from_document(document).unwrap());
    assert_eq!(repriced.map(|book| book.price), Some(15.99));

    // Moby Dick is gone before the decade buckets are computed.
    let decades = report
        .section("Books by publication decade")
        .and_then(Section::as_table)
        .unwrap();
    assert!(!decades.column("decade").contains(&Some(&bson::Bson::Double(1850.0))));

    // The collection scan sees the eleven books left after the delete.
    let before = explain(&report, "Explain BEFORE index on title for query { title: \"1984\" }");
    assert_eq!(before["winningPlan"], "COLLSCAN");
    assert_eq!(before["totalDocsExamined"], 11);
}

#[tokio::test]
async fn indexes_change_the_winning_plan() {
    let store = seeded().await;
    let report = run(&store).await;

    let after = explain(&report, "Explain AFTER index on title for query { title: \"1984\" }");
    assert_eq!(after["inputStage"], "IXSCAN");
    assert_eq!(after["indexName"], "idx_title");
    assert!(after["totalDocsExamined"].as_u64() <= after["totalKeysExamined"].as_u64());

    let compound = explain(
        &report,
        "Explain for query { author: \"J.R.R. Tolkien\", published_year: { $gte: 1900 } }",
    );
    assert_eq!(compound["indexName"], "idx_author_year");
    assert_eq!(compound["winningPlan"], "FETCH");
    assert_eq!(compound["nReturned"], 2);

    assert_eq!(store.index_names(COLLECTION).await, ["idx_title", "idx_author_year"]);
}

#[tokio::test]
async fn second_run_resets_indexes_and_mutates_nothing() {
    let store = seeded().await;
    run(&store).await;
    let report = run(&store).await;

    let update = report
        .section("Update price: set price=15.99 for title \"1984\"")
        .and_then(Section::text_lines)
        .unwrap();
    assert_eq!(update, ["Matched: 1, Modified: 0", "New price for 1984: 15.99"]);

    let before = explain(&report, "Explain BEFORE index on title for query { title: \"1984\" }");
    assert_eq!(before["winningPlan"], "COLLSCAN");
    assert_eq!(store.session_stats(), SessionStats { opened: 8, closed: 8 });
}

#[tokio::test]
async fn empty_database_still_completes() {
    let store = InMemoryBookstore::new();
    let report = run(&store).await;

    assert!(report.section(COMPLETED).is_some());
    assert!(report.render().contains("No results"));
    assert!(report.render().contains("1984 not found"));
}
