// ABOUTME: Site listing command for lms-cli
// ABOUTME: Prints every site with its slug, certificate prefix and core flag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use lms_server::database::Database;
use lms_server::errors::AppResult;

/// Print all sites
pub async fn list(database: &Database) -> AppResult<()> {
    let sites = database.tenants().list_sites().await?;

    println!("{:<38} {:<12} {:<8} {:<5} NAME", "ID", "SLUG", "PREFIX", "CORE");
    for site in &sites {
        println!(
            "{:<38} {:<12} {:<8} {:<5} {}",
            site.id,
            site.slug,
            site.certificate_prefix,
            if site.is_core { "yes" } else { "no" },
            site.name
        );
    }
    println!("\n{} site(s)", sites.len());
    Ok(())
}
