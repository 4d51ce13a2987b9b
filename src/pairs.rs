use anyhow::Result;

use crate::config::Config;

pub fn list_pairs(config: &Config) -> Result<()> {
    println!("{:<24} ARTIFACT", "SUBJECT");
    for pair in &config.tracked {
        println!("{:<24} {}", pair.subject, pair.artifact);
    }
    println!("{} tracked pair(s)", config.tracked.len());
    Ok(())
}
