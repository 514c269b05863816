use anyhow::Result;

use crate::config::Config;

pub fn list_corpora(config: &Config) -> Result<()> {
    println!(
        "{:<16} {:<8} {:<8} {:<10} ROOT",
        "CORPUS", "SCHEME", "INDEXED", "HEALTHY"
    );
    for (name, corpus) in &config.corpus {
        let healthy = corpus.root.is_dir();
        let indexed = config.db_path(name).exists();
        println!(
            "{:<16} {:<8} {:<8} {:<10} {}",
            name,
            corpus.scheme,
            if indexed { "yes" } else { "no" },
            healthy,
            corpus.root.display()
        );
    }
    Ok(())
}
