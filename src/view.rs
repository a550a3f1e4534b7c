//! Terminal rendering of stored documents and query results, plus the
//! `docs`, `remove`, `history` and `clear` commands.

use anyhow::Result;

use crate::config::Config;
use crate::models::QueryRecord;
use crate::store;

/// Print one query result in full.
pub fn print_record(record: &QueryRecord) {
    let payload = record.outcome.payload();

    println!("query:      {}", record.query);
    println!("id:         {}", record.id);
    println!(
        "answered:   {} ({} ms)",
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        record.elapsed_ms
    );
    if record.outcome.is_fallback() {
        println!("note:       model output was not structured JSON; showing fallback result");
    }
    println!();
    println!("decision:   {}", payload.decision().unwrap_or("-"));
    if let Some(amount) = payload.amount() {
        println!("amount:     {}", amount);
    }
    if let Some(confidence) = payload.confidence() {
        println!("confidence: {:.0}%", confidence * 100.0);
    }
    if let Some(justification) = payload.justification() {
        println!();
        println!("{}", justification);
    }

    let missing = payload.missing();
    if !missing.is_empty() {
        println!();
        println!("missing information:");
        for field in &missing {
            println!("  - {}", field);
        }
    }
    if let Some(follow_up) = payload.suggested_follow_up() {
        println!("suggested follow-up: {}", follow_up);
    }

    let refs = payload.clause_references();
    if !refs.is_empty() {
        println!();
        println!("clause references:");
        for (i, r) in refs.iter().enumerate() {
            println!(
                "  [{}] {} (page {})",
                i + 1,
                r.document.as_deref().unwrap_or("unknown document"),
                r.page.as_deref().unwrap_or("N/A")
            );
            if let Some(concept) = &r.matched_concept {
                println!("      concept: {}", concept);
            }
            if let Some(snippet) = &r.clause_snippet {
                println!("      \"{}\"", snippet);
            }
        }
    }
}

/// `plens docs`: list stored documents.
pub async fn run_docs(config: &Config) -> Result<()> {
    let store = store::open(config).await?;
    let docs = store.documents();
    if docs.is_empty() {
        println!("No documents uploaded.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<32} {:>10} {:>7} {:>8}  UPLOADED",
        "ID", "NAME", "SIZE", "CHUNKS", "CLAUSES"
    );
    for d in docs {
        println!(
            "{:<36}  {:<32} {:>10} {:>7} {:>8}  {}",
            d.id,
            d.name,
            d.size,
            d.chunks,
            d.clauses,
            d.uploaded_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// `plens remove <id>`: delete one document.
pub async fn run_remove(config: &Config, id: &str) -> Result<()> {
    let mut store = store::open(config).await?;
    let Some(name) = store.find_document(id).map(|d| d.name.clone()) else {
        anyhow::bail!("document not found: {}", id);
    };
    store.remove_document(id).await?;
    println!("Removed {} ({})", name, id);
    Ok(())
}

/// `plens history`: list past queries, oldest first. With an id, show that
/// query in full.
pub async fn run_history(config: &Config, id: Option<&str>) -> Result<()> {
    let store = store::open(config).await?;
    let history = store.history();

    if let Some(id) = id {
        let record = history
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| anyhow::anyhow!("query not found: {}", id))?;
        print_record(record);
        return Ok(());
    }

    if history.is_empty() {
        println!("No queries yet.");
        return Ok(());
    }
    for r in history {
        let payload = r.outcome.payload();
        println!(
            "{}  {}  {:<20} {:>6} ms  {}",
            r.id,
            r.timestamp.format("%Y-%m-%d %H:%M"),
            payload.decision().unwrap_or("-"),
            r.elapsed_ms,
            r.query
        );
    }
    Ok(())
}

/// `plens clear`: remove every document and the query history.
pub async fn run_clear(config: &Config) -> Result<()> {
    let mut store = store::open(config).await?;
    let docs = store.documents().len();
    let queries = store.history().len();
    store.clear_all().await?;
    println!("Cleared {} documents and {} queries.", docs, queries);
    Ok(())
}
