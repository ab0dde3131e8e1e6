//! Cache management CLI commands.

use clap::Subcommand;
use tileloader::cache::{disk_cache_stats, DiskCache, DiskCacheConfig};
use tileloader::config::display_size;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Clear the disk cache, removing all cached tiles
    Clear,
    /// Show disk cache statistics
    Stats,
}

/// Run a cache subcommand.
pub fn run(runner: &CliRunner, action: CacheAction) -> Result<(), CliError> {
    let config = runner.config();
    let cache_dir = &config.cache.directory;

    match action {
        CacheAction::Clear => {
            runner.log_startup("cache clear");
            println!("Clearing disk cache at: {}", cache_dir.display());

            let disk_config = DiskCacheConfig {
                cache_dir: cache_dir.clone(),
                max_size_bytes: config.cache.disk_size,
                enforce_limit: false,
            };
            let runtime = runner.runtime()?;
            let result = runtime.block_on(async {
                let disk = DiskCache::new(&disk_config)?;
                disk.clear().await
            });

            match result {
                Ok(result) => {
                    println!(
                        "Deleted {} files, freed {}",
                        result.files_deleted,
                        display_size(result.bytes_freed)
                    );
                    Ok(())
                }
                Err(e) => Err(CliError::CacheClear(e)),
            }
        }
        CacheAction::Stats => {
            println!("Disk cache: {}", cache_dir.display());

            let usage = disk_cache_stats(cache_dir).map_err(CliError::CacheStats)?;
            println!("  Files: {}", usage.files);
            println!(
                "  Size:  {} of {} budget{}",
                display_size(usage.bytes),
                display_size(config.cache.disk_size),
                if config.cache.enforce_disk_limit {
                    ""
                } else {
                    " (advisory)"
                }
            );

            if !usage.providers.is_empty() {
                println!();
                for provider in &usage.providers {
                    println!(
                        "  {:<16} {:>8} files  {:>10}",
                        provider.provider,
                        provider.files,
                        display_size(provider.bytes)
                    );
                }
            }
            Ok(())
        }
    }
}
