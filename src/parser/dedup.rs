use std::collections::HashMap;

use tracing::info;

use crate::entry::Entry;

pub struct Deduped {
    pub entries: Vec<Entry>,
    pub removed: usize,
}

/// Keep the first entry for each title, in order. Later repeats are dropped and counted.
pub fn dedupe(entries: Vec<Entry>) -> Deduped {
    let mut first_source: HashMap<String, String> = HashMap::new();
    let mut kept = Vec::with_capacity(entries.len());
    let mut removed = 0;

    for entry in entries {
        if let Some(source) = first_source.get(&entry.title) {
            info!(
                title = %entry.title,
                kept_from = %source,
                dropped_from = %entry.source,
                "Dropping duplicate entry"
            );
            removed += 1;
            continue;
        }
        first_source.insert(entry.title.clone(), entry.source.clone());
        kept.push(entry);
    }

    Deduped {
        entries: kept,
        removed,
    }
}
