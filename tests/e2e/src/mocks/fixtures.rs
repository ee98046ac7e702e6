//! Test Data Factory
//!
//! Fixture questions with disjoint vocabularies, so that feature-hashing
//! embeddings at 256 dimensions keep every record distinct and each topical
//! query has a single clear winner.

use janitor_core::{Record, RecordId};

/// Embedding dimensions the fixtures are tuned for
pub const FIXTURE_DIMENSIONS: usize = 256;

const QUESTIONS: [(i64, &str, &str, &str, i64); 12] = [
    (
        11,
        "How do I fix maximum recursion depth exceeded in Python?",
        "<p>My recursive <code>factorial</code> function crashes with RecursionError for large inputs.</p>",
        "<python><recursion>",
        412,
    ),
    (
        12,
        "Java NullPointerException when reading a stack trace",
        "<p>The stack trace points to a line where my object looks initialized.</p>",
        "<java><nullpointerexception>",
        97,
    ),
    (
        13,
        "Rust borrow checker complains about mutable reference in loop",
        "<p>cannot borrow <code>vec</code> as mutable more than once at a time</p>",
        "<rust><borrow-checker>",
        58,
    ),
    (
        14,
        "Git undo the most recent local commits",
        "<p>I committed the wrong files and have not pushed yet.</p>",
        "<git><git-commit>",
        25013,
    ),
    (
        15,
        "JavaScript async await inside forEach does not wait",
        "<p>The promises resolve after the loop finishes.</p>",
        "<javascript><async-await>",
        1730,
    ),
    (
        16,
        "SQL join returns duplicate rows",
        "<p>An inner join between orders and customers repeats every order.</p>",
        "<sql><join>",
        44,
    ),
    (
        17,
        "Docker container exits immediately after start",
        "<p>docker run prints nothing and the container status is Exited (0).</p>",
        "<docker>",
        388,
    ),
    (
        18,
        "CSS flexbox center a div vertically and horizontally",
        "<p>justify-content works but align-items does not.</p>",
        "<css><flexbox>",
        912,
    ),
    (
        19,
        "Pandas dataframe filter rows by column value",
        "<p>I want only rows where the price column is above 100.</p>",
        "<python><pandas>",
        3301,
    ),
    (
        20,
        "C++ segmentation fault when deleting pointer twice",
        "<p>double free detected in tcache after calling delete.</p>",
        "<c++><pointers>",
        12,
    ),
    (
        21,
        "Kubernetes pod stuck in CrashLoopBackOff",
        "<p>kubectl describe shows back-off restarting failed container.</p>",
        "<kubernetes>",
        205,
    ),
    (
        22,
        "Regex match email addresses with plus signs",
        "<p>My pattern rejects user+tag@example.com.</p>",
        "<regex>",
        8,
    ),
];

/// Factory for fixture records
pub struct TestDataFactory;

impl TestDataFactory {
    /// Twelve questions on unrelated topics, ids 11..=22
    pub fn questions() -> Vec<Record> {
        QUESTIONS
            .iter()
            .map(|&(id, title, body, tags, score)| {
                let mut record = Record::new(id, title, body);
                record.tags = tags.to_string();
                record.score = score;
                record
            })
            .collect()
    }

    /// The fixture questions minus the given ids
    pub fn questions_without(removed: &[i64]) -> Vec<Record> {
        Self::questions()
            .into_iter()
            .filter(|r| !removed.contains(&r.id.0))
            .collect()
    }

    /// Topical queries paired with the id that must rank first
    pub fn topical_queries() -> Vec<(&'static str, RecordId)> {
        vec![
            ("python recursion depth", RecordId(11)),
            ("docker container exits", RecordId(17)),
            ("undo git commit", RecordId(14)),
            ("flexbox center div", RecordId(18)),
        ]
    }

    /// Two-record corpus for the basic ranking scenario
    pub fn python_and_java() -> Vec<Record> {
        vec![
            Record::new(1, "recursion error in python", ""),
            Record::new(2, "java stack trace", ""),
        ]
    }
}
